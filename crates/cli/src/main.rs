use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "quip")]
#[command(about = "Quip — WhatsApp witty message relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the gateway (webhook, status page, send endpoint). Credentials come
    /// from the config file or the usual env vars (TWILIO_ACCOUNT_SID,
    /// TWILIO_AUTH_TOKEN, TWILIO_WHATSAPP_NUMBER, ANTHROPIC_API_KEY).
    Serve {
        /// Config file path (default: QUIP_CONFIG_PATH or ~/.quip/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config, 5001, or PORT env)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Enhance and send a message through a running gateway.
    Send {
        /// Config file path (default: QUIP_CONFIG_PATH or ~/.quip/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Destination number, e.g. "+15559998888"
        #[arg(long)]
        to: String,

        /// Message text to enhance and send
        #[arg(long, short)]
        message: String,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("quip {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port }) => {
            if let Err(e) = run_serve(config, port).await {
                log::error!("serve failed: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            config,
            to,
            message,
        }) => {
            if let Err(e) = run_send(config, to, message).await {
                log::error!("send failed: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let mut config = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{}",
        config.gateway.bind,
        config.gateway.port
    );
    lib::gateway::run_gateway(config).await
}

/// POST /send-message on the local gateway and print the provider sid.
async fn run_send(
    config_path: Option<std::path::PathBuf>,
    to: String,
    message: String,
) -> anyhow::Result<()> {
    let config = lib::config::load_config(config_path)?;
    let port = lib::config::resolve_port(&config);
    let url = format!("http://127.0.0.1:{}/send-message", port);
    let client = reqwest::Client::new();
    let res = client
        .post(&url)
        .json(&serde_json::json!({ "to": to, "message": message }))
        .send()
        .await?;
    if !res.status().is_success() {
        let status = res.status();
        let body = res.text().await.unwrap_or_default();
        anyhow::bail!("gateway returned {}: {}", status, body);
    }
    let body: serde_json::Value = res.json().await?;
    let sid = body.get("sid").and_then(|v| v.as_str()).unwrap_or("?");
    println!("sent (sid: {})", sid);
    Ok(())
}
