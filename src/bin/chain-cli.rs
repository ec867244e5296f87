use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "chain-cli")]
#[command(about = "Query a running chain-connect status server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full published connection state
    Status,
    /// Readiness summary (exit code 1 when not ready)
    Health,
    /// Injected extension accounts
    Accounts,
    /// Registered type names
    Types,
    /// Build a value of a registered type from JSON
    CreateType {
        name: String,
        /// JSON value, e.g. '{"nonce": 1}'
        value: String,
    },
    /// Render raw base units with the chain's token decimals and symbol
    Balance { raw: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let ok = match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", base)).send().await?;
            print_response(res).await?
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?
        }
        Commands::Accounts => {
            let res = client.get(format!("{}/accounts", base)).send().await?;
            print_response(res).await?
        }
        Commands::Types => {
            let res = client.get(format!("{}/types", base)).send().await?;
            print_response(res).await?
        }
        Commands::CreateType { name, value } => {
            let body: Value = serde_json::from_str(&value)?;
            let res = client
                .post(format!("{}/types/{}", base, name))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?
        }
        Commands::Balance { raw } => {
            let res = client.get(format!("{}/balance/{}", base, raw)).send().await?;
            print_response(res).await?
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

/// Pretty-print the body; returns whether the status was a success.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: status server returned {}", status);
        eprintln!("{}", rendered);
    }
    Ok(status.is_success())
}
