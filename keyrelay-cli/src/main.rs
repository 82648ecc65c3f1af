use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use keyrelay_core::core_relay::{
    codec, decode_incoming, metrics, route, ChatId, Dispatcher, MessageId, RawStatusEvent,
    RelayOutcome, RelayRouter, SingleAccount, SinkError, StatusKind, TransportSink,
};
use keyrelay_core::logging::{init_logging_with_config, LogConfig};
use keyrelay_core::Config;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "keyrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Print the full status routing table
    Table,

    /// Show how one status code is routed
    Route {
        /// Numeric vault status code
        code: i64,
    },

    /// Relay one status event through a transport that prints to stdout
    Simulate {
        /// Numeric vault status code
        #[arg(long)]
        status: i64,

        /// Chat the event originated in
        #[arg(long)]
        chat: i64,

        /// Forward chat, 0 when unset
        #[arg(long, default_value_t = 0)]
        forward: i64,

        /// PDU as standard base64
        #[arg(long, default_value = "")]
        pdu: String,
    },

    /// Unwrap a received chat message into a vault request
    Decode {
        /// Message subject line
        #[arg(long)]
        subject: String,

        /// Message body
        #[arg(long)]
        text: String,

        /// Chat the message arrived in
        #[arg(long, default_value_t = 1)]
        chat: u32,
    },
}

/// Transport that prints every message as one JSON line
struct StdoutSink {
    next_id: AtomicU32,
}

#[async_trait]
impl TransportSink for StdoutSink {
    async fn send_message(&self, chat_id: ChatId, subject: &str, text: &str) -> Result<MessageId, SinkError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        println!(
            "{}",
            json!({
                "message_id": id.0,
                "chat_id": chat_id.as_u32(),
                "subject": subject,
                "text": text,
            })
        );
        Ok(id)
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::from_env().context("invalid KEYRELAY_* environment")?,
    };
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    Ok(config)
}

fn print_table() {
    println!("{:<5} {:<38} {:<9} {}", "CODE", "STATUS", "TARGET", "TYPE");
    for kind in StatusKind::ALL {
        let entry = route(kind);
        println!(
            "{:<5} {:<38} {:<9} {}",
            kind.code(),
            format!("{:?}", kind),
            entry.destination.map(|d| d.as_str()).unwrap_or("-"),
            entry.type_tag().unwrap_or("-"),
        );
    }
}

fn print_route(code: i64) -> Result<()> {
    let Some(kind) = StatusKind::from_code(code) else {
        bail!("unknown status code {}", code);
    };
    let entry = route(kind);
    println!(
        "{}",
        json!({
            "code": kind.code(),
            "status": format!("{:?}", kind),
            "description": kind.describe(),
            "produces_message": entry.produces_message,
            "destination": entry.destination.map(|d| d.as_str()),
            "type": entry.type_tag(),
        })
    );
    Ok(())
}

async fn simulate(config: &Config, status: i64, chat: i64, forward: i64, pdu: &str) -> Result<()> {
    let pdu = codec::decode(pdu).context("--pdu is not valid base64")?;

    let sink = Arc::new(StdoutSink {
        next_id: AtomicU32::new(1),
    });
    let router = Arc::new(RelayRouter::new(
        Arc::new(SingleAccount::new(sink)),
        config.dispatch.send_timeout,
    ));
    let dispatcher = Dispatcher::new(Handle::current(), router, &config.dispatch);

    let outcome = dispatcher
        .submit(RawStatusEvent::new(status, chat, forward, pdu))
        .await
        .context("relay task failed")?;

    match &outcome {
        RelayOutcome::Sent { .. } | RelayOutcome::NoMessage(_) | RelayOutcome::Ignored(_) => {
            println!("outcome: {}", outcome.label());
            Ok(())
        }
        RelayOutcome::Dropped(err) => bail!("event dropped: {}", err),
    }
}

fn decode(chat: u32, subject: &str, text: &str) -> Result<()> {
    match decode_incoming(ChatId::new(chat), subject, text)? {
        Some(event) => println!(
            "{}",
            json!({
                "event": event.kind.code(),
                "kind": format!("{:?}", event.kind),
                "chat_id": event.chat_id.as_u32(),
                "type": event.type_tag,
                "pdu": codec::encode(&event.pdu),
            })
        ),
        None => println!("not a protocol message"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let log_config = LogConfig::try_from(&config.logging)
        .with_context(|| format!("invalid log level '{}'", config.logging.level))?;
    init_logging_with_config(log_config)?;
    metrics::init_metrics();

    info!("keyrelay CLI started");

    match args.command {
        Some(Command::Table) => print_table(),
        Some(Command::Route { code }) => print_route(code)?,
        Some(Command::Simulate {
            status,
            chat,
            forward,
            pdu,
        }) => simulate(&config, status, chat, forward, &pdu).await?,
        Some(Command::Decode { subject, text, chat }) => decode(chat, &subject, &text)?,
        None => {
            info!("No command specified. Use --help for usage information.");
        }
    }

    info!("keyrelay CLI finished");

    Ok(())
}
