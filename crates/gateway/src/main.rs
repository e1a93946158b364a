use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vizora_gateway::{DisplayGateway, GatewayConfig};

fn print_help() {
    eprintln!(
        r#"Vizora Gateway - display pairing and realtime device gateway

USAGE:
    vizora-gateway [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    HOST                Server host (default: 0.0.0.0)
    PORT                Server port (default: 3002)
    DEVICE_JWT_SECRET   Device credential signing secret (at least 32 bytes)
    WEB_URL             Dashboard base URL used in pairing links
    RUST_LOG            Log level filter

EXAMPLES:
    # Run with defaults
    vizora-gateway

    # Run with config file
    vizora-gateway --config gateway.json

    # Run with custom port
    PORT=9000 vizora-gateway
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vizora_gateway=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            GatewayConfig::from_file(&path)?
        }
        None => {
            tracing::info!("Using default configuration");
            GatewayConfig::default()
        }
    };
    config.apply_env()?;

    tracing::info!(
        "Heartbeat every {}ms, offline after {}ms of silence",
        config.heartbeat.interval_ms,
        config.heartbeat.timeout_ms()
    );
    tracing::info!("Available endpoints:");
    tracing::info!("  POST /devices/pairing/request");
    tracing::info!("  GET  /devices/pairing/status/{{code}}");
    tracing::info!("  POST /devices/pairing/complete");
    tracing::info!("  GET  /devices/pairing/active");
    tracing::info!("  POST /displays/{{id}}/push-content");
    tracing::info!("  GET  /ws/device?token=...");
    tracing::info!("  GET  /ws/events?organizationId=...");

    let gateway = DisplayGateway::new(config)?;
    gateway.run().await?;
    Ok(())
}
