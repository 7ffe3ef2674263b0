//! One-shot submitter: connect to the hub, send a single `notify`, print
//! the reply, exit.
//!
//! Grounded on `heyu.submitter.SubmitterApplication`/`send_notification`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use futures::{SinkExt, StreamExt};
use heyu_proto::{Message, MessageBody, Urgency};
use heyu_transport::endpoint::Endpoint;
use heyu_transport::profile_file::{split_profile_reference, CertProfileFile};
use heyu_transport::{connect, framed};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "heyu-submit")]
struct Args {
    /// Notification summary line.
    summary: String,
    /// Notification body text.
    body: String,

    /// Application name to report; defaults to this program's own name.
    #[arg(long)]
    app_name: Option<String>,

    /// One of low, normal, critical.
    #[arg(short, long, default_value = "normal")]
    urgency: String,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    id: Option<String>,

    #[arg(short = 'H', long)]
    host: Option<String>,

    #[arg(short = 'C', long = "cert-conf")]
    cert_conf: Option<String>,

    #[arg(short = 'k', long = "insecure")]
    insecure: bool,

    #[arg(short = 'd', long)]
    debug: bool,
}

fn default_hub_endpoint(host_override: Option<&str>) -> Endpoint {
    if let Some(spec) = host_override {
        return Endpoint::parse(spec).unwrap_or_else(|e| {
            tracing::error!(error = %e, "invalid --host");
            std::process::exit(1);
        });
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    match std::fs::read_to_string(format!("{home}/.heyu.hub")) {
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
    let profile_name = profile_name.unwrap_or("submitter").to_string();

    let file = CertProfileFile::load(path).unwrap_or_else(|e| {
        tracing::error!(error = %e, "could not read certificate profile file");
        std::process::exit(1);
    });
    let profile = file.profile(&profile_name).unwrap_or_else(|| {
        tracing::error!(profile = %profile_name, "unknown certificate profile section");
        std::process::exit(1);
    });
    Some(Arc::new(profile.client_config().unwrap_or_else(|e| {
        tracing::error!(error = %e, "could not build TLS client configuration");
        std::process::exit(1);
    })))
}

fn default_app_name() -> String {
    std::env::args()
        .next()
        .and_then(|p| std::path::Path::new(&p).file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "heyu-submit".to_string())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let filter = if args.debug { EnvFilter::new("debug") } else { EnvFilter::new("info") };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let urgency = Urgency::from_str(&args.urgency).unwrap_or_else(|e| {
        eprintln!("invalid urgency: {e}");
        std::process::exit(1);
    });

    let endpoint = default_hub_endpoint(args.host.as_deref());
    let tls_config = load_tls_config(&args);
    let app_name = args.app_name.clone().unwrap_or_else(default_app_name);

    let addr = endpoint.to_socket_addr_string();
    let stream = match connect::connect(&addr, &endpoint.host, tls_config, Duration::from_secs(30)).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("could not connect to hub: {e}");
            std::process::exit(1);
        }
    };

    let mut transport = framed(stream);

    let mut notify = Message::notify(app_name, args.summary, args.body).with_urgency(urgency);
    if let Some(category) = &args.category {
        notify = notify.with_category(category.clone());
    }
    if let Some(id) = &args.id {
        notify = notify.with_id(id.clone());
    }

    if transport.send(notify.to_frame()).await.is_err() {
        eprintln!("failed to send notification");
        std::process::exit(1);
    }

    match transport.next().await {
        Some(Ok(frame)) => match Message::decode(&frame) {
            Ok(reply) => match reply.body() {
                MessageBody::Accepted { id } => println!("{id}"),
                MessageBody::Error { reason } => {
                    eprintln!("{reason}");
                    std::process::exit(1);
                }
                other => {
                    eprintln!("unexpected reply: {}", other.msg_type());
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("malformed reply: {e}");
                std::process::exit(1);
            }
        },
        Some(Err(e)) => {
            eprintln!("transport error: {e}");
            std::process::exit(1);
        }
        None => {
            eprintln!("hub closed the connection without a reply");
            std::process::exit(1);
        }
    }
}
