use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator CLI for the Tianditu tile proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness check
    Health,
    /// Upstream settings and route table
    Status,
    /// Service name and version
    Version,
    /// Fetch a tile through the proxy and summarize the response
    Tile {
        /// Path and query, e.g. "/t0/vec_w/wmts?SERVICE=WMTS&..."
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client.get(format!("{}/proxy-status", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Version => {
            let res = client.get(format!("{}/api/version", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Tile { path } => {
            let path = if path.starts_with('/') {
                path
            } else {
                format!("/{}", path)
            };
            let res = client.get(format!("{}{}", base, path)).send().await?;
            let status = res.status();
            let content_type = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            let body = res.bytes().await?;
            println!("status:       {}", status);
            println!("content-type: {}", content_type);
            println!("bytes:        {}", body.len());
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: proxy returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
