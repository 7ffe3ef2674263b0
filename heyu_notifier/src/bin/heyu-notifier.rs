use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use heyu_notifier::events::NotifierEvent;
use heyu_notifier::sink::file::FileSink;
use heyu_notifier::sink::popup::{LoggingPopupSink, PopupSink};
use heyu_notifier::sink::script::ScriptSink;
use heyu_notifier::sink::stdout::StdoutSink;
use heyu_notifier::sink::Notification;
use heyu_notifier::{Control, EventQueue, NotifierClient};
use heyu_transport::endpoint::Endpoint;
use heyu_transport::profile_file::{split_profile_reference, CertProfileFile};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// HeyU notifier: a persistent subscriber that routes notifications into a
/// local sink.
#[derive(Parser, Debug)]
#[command(name = "heyu-notifier")]
struct Args {
    /// Hub to subscribe to; defaults to the contents of ~/.heyu.hub, or
    /// 127.0.0.1:4859 if that file is absent.
    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short = 'C', long = "cert-conf")]
    cert_conf: Option<String>,

    #[arg(short = 'k', long = "insecure")]
    insecure: bool,

    #[arg(short = 'd', long)]
    debug: bool,

    #[command(subcommand)]
    driver: Driver,
}

#[derive(Subcommand, Debug)]
enum Driver {
    Stdout,
    File { path: PathBuf },
    Script { template: String },
    Popup,
}

fn install_logging(debug: bool) {
    let filter = if debug { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_hub_endpoint(host_override: Option<&str>) -> Endpoint {
    if let Some(spec) = host_override {
        return Endpoint::parse(spec).unwrap_or_else(|e| {
            tracing::error!(error = %e, "invalid --host");
            std::process::exit(1);
        });
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let hub_file = format!("{home}/.heyu.hub");
    match std::fs::read_to_string(&hub_file) {
        Ok(contents) => {
            let spec = contents.lines().next().unwrap_or("").trim();
            Endpoint::parse(spec).unwrap_or_else(|_| Endpoint::new("127.0.0.1", heyu_transport::DEFAULT_PORT))
        }
        Err(_) => Endpoint::new("127.0.0.1", heyu_transport::DEFAULT_PORT),
    }
}

fn load_tls_config(args: &Args) -> Option<Arc<rustls::ClientConfig>> {
    if args.insecure {
        return None;
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let cert_conf = args.cert_conf.clone().unwrap_or_else(|| format!("{home}/.heyu.cert"));
    let (path, profile_name) = split_profile_reference(&cert_conf);
    let profile_name = profile_name.unwrap_or("notifier").to_string();

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
    match profile.client_config() {
        Ok(cfg) => Some(Arc::new(cfg)),
        Err(e) => {
            tracing::error!(error = %e, "could not build TLS client configuration");
            std::process::exit(1);
        }
    }
}

fn spawn_signal_handlers(control: watch::Sender<Control>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigusr1 = signal(SignalKind::user_defined1()).expect("failed to install SIGUSR1 handler");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sigint.recv() => { let _ = control.send(Control::Stop); }
                    _ = sigterm.recv() => { let _ = control.send(Control::Stop); }
                    _ = sigusr1.recv() => { let _ = control.send(Control::Shutdown); }
                    else => break,
                }
            }
        });
    }
    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = control.send(Control::Stop);
            }
        });
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    install_logging(args.debug);

    let endpoint = default_hub_endpoint(args.host.as_deref());
    let tls_config = load_tls_config(&args);
    let app_id = Uuid::new_v4().to_string();

    let events = EventQueue::new();
    let (control_tx, control_rx) = watch::channel(Control::Run);
    spawn_signal_handlers(control_tx);

    let client = NotifierClient::new(endpoint, tls_config, events.clone(), control_rx);
    let client_task = tokio::spawn(client.run());

    match args.driver {
        Driver::Stdout => {
            let mut sink = StdoutSink::new();
            loop {
                let event = events.recv().await;
                if matches!(event, NotifierEvent::Shutdown) {
                    break;
                }
                if let Some(msg) = event.into_notify(&app_id) {
                    if let Some(n) = Notification::from_message(&msg) {
                        sink.show(&n);
                    }
                }
            }
            sink.finish();
        }
        Driver::File { path } => {
            let mut sink = FileSink::open(&path).unwrap_or_else(|e| {
                tracing::error!(error = %e, "could not open sink file");
                std::process::exit(1);
            });
            loop {
                let event = events.recv().await;
                if matches!(event, NotifierEvent::Shutdown) {
                    break;
                }
                if let Some(msg) = event.into_notify(&app_id) {
                    if let Some(n) = Notification::from_message(&msg) {
                        let _ = sink.show(&n);
                    }
                }
            }
        }
        Driver::Script { template } => {
            let mut sink = ScriptSink::compile(&template).unwrap_or_else(|e| {
                tracing::error!(error = %e, "invalid script template");
                std::process::exit(1);
            });
            loop {
                let event = events.recv().await;
                if matches!(event, NotifierEvent::Shutdown) {
                    break;
                }
                if let Some(msg) = event.into_notify(&app_id) {
                    if let Some(n) = Notification::from_message(&msg) {
                        let _ = sink.show(&n).await;
                    }
                }
            }
        }
        Driver::Popup => {
            let mut sink = LoggingPopupSink::new();
            loop {
                let event = events.recv().await;
                if matches!(event, NotifierEvent::Shutdown) {
                    break;
                }
                if let Some(msg) = event.into_notify(&app_id) {
                    if let Some(n) = Notification::from_message(&msg) {
                        sink.show(&n);
                    }
                }
            }
        }
    }

    let _ = client_task.await;
}
