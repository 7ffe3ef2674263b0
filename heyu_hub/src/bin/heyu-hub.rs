use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use heyu_hub::HubServer;
use heyu_transport::endpoint::Endpoint;
use heyu_transport::profile_file::{split_profile_reference, CertProfileFile};
use tracing_subscriber::EnvFilter;

/// HeyU hub: accepts submitters and subscribers, fans out notifications.
#[derive(Parser, Debug)]
#[command(name = "heyu-hub")]
struct Args {
    /// Listen endpoints (host[:port]); defaults to 0.0.0.0:4859 (and
    /// [::]:4859 when IPv6 is available).
    #[arg(value_name = "ENDPOINT")]
    endpoints: Vec<String>,

    /// Certificate profile reference: PATH or PATH[PROFILE].
    #[arg(short = 'C', long = "cert-conf")]
    cert_conf: Option<String>,

    /// Disable TLS entirely. Intended only for local testing.
    #[arg(short = 'k', long = "insecure")]
    insecure: bool,

    /// Run in the foreground instead of as a background service.
    #[arg(long)]
    foreground: bool,

    /// Write the process id to this file once started.
    #[arg(long, value_name = "PATH")]
    pid_file: Option<PathBuf>,

    /// Raise the log level to debug.
    #[arg(short = 'd', long)]
    debug: bool,
}

fn install_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn resolve_endpoints(raw: &[String]) -> Vec<Endpoint> {
    if raw.is_empty() {
        let mut defaults = vec![Endpoint::new("0.0.0.0", heyu_transport::DEFAULT_PORT)];
        if let Ok(listener) = std::net::TcpListener::bind(("::", 0)) {
            drop(listener);
            defaults.push(Endpoint::new("::", heyu_transport::DEFAULT_PORT));
        }
        return defaults;
    }

    raw.iter()
        .filter_map(|spec| match Endpoint::parse(spec) {
            Ok(ep) => Some(ep),
            Err(e) => {
                tracing::error!(spec, error = %e, "invalid listen endpoint");
                None
            }
        })
        .collect()
}

fn load_tls_config(args: &Args) -> Option<Arc<rustls::ServerConfig>> {
    if args.insecure {
        return None;
    }

    let cert_conf = args
        .cert_conf
        .clone()
        .unwrap_or_else(|| default_cert_conf_path());
    let (path, profile_name) = split_profile_reference(&cert_conf);
    let profile_name = profile_name.unwrap_or("hub").to_string();

    let file = match CertProfileFile::load(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!(path, error = %e, "could not read certificate profile file");
            std::process::exit(1);
        }
    };

    let profile = match file.profile(&profile_name) {
        Some(p) => p,
        None => {
            tracing::error!(profile = %profile_name, "unknown certificate profile section");
            std::process::exit(1);
        }
    };

    match profile.server_config() {
        Ok(cfg) => Some(Arc::new(cfg)),
        Err(e) => {
            tracing::error!(error = %e, "could not build TLS server configuration");
            std::process::exit(1);
        }
    }
}

fn default_cert_conf_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.heyu.cert")
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    install_logging(args.debug);

    if let Some(pid_file) = &args.pid_file {
        if let Err(e) = std::fs::write(pid_file, std::process::id().to_string()) {
            tracing::error!(error = %e, "failed to write pid file");
        }
    }
    if !args.foreground {
        tracing::info!("--foreground not given; running in-process anyway (no double-fork daemonization)");
    }

    let endpoints = resolve_endpoints(&args.endpoints);
    let tls_config = load_tls_config(&args);

    let hub = HubServer::new(tls_config);
    if let Err(e) = hub.start(&endpoints).await {
        tracing::error!(error = %e, "hub exited with error");
        std::process::exit(1);
    }
}
