use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "fleet-cli")]
#[command(about = "Management CLI for lazy-fleet", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "FLEET_API_KEY", default_value = "CHANGE_ME_IN_PRODUCTION")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check daemon status
    Status,
    /// List managed backends with mode, online state and players
    Backends,
    /// View a backend's mode, or set it when MODE is given
    Mode {
        id: String,
        /// STANDARD, SOFT_FORCE_ON, HARD_FORCE_ON, SOFT_FORCE_OFF or HARD_FORCE_OFF
        mode: Option<String>,
    },
    /// Ask the control plane to start a backend
    Start { id: String },
    /// Ask the control plane to stop a backend
    Stop { id: String },
    /// Connect a client to a backend, starting it if needed
    Connect { client: String, id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/admin/status")),
        Commands::Backends => client.get(format!("{base}/admin/backends")),
        Commands::Mode { id, mode: None } => client.get(format!("{base}/admin/backends/{id}/mode")),
        Commands::Mode { id, mode: Some(mode) } => client
            .put(format!("{base}/admin/backends/{id}/mode"))
            .json(&json!({ "mode": mode })),
        Commands::Start { id } => client.post(format!("{base}/admin/backends/{id}/start")),
        Commands::Stop { id } => client.post(format!("{base}/admin/backends/{id}/stop")),
        Commands::Connect { client: player, id } => client
            .post(format!("{base}/router/request"))
            .json(&json!({ "client": player, "target": id })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: lazy-fleet returned status {status}");
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) if !text.is_empty() => println!("{text}"),
        Err(_) => {}
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
