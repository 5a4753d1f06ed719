use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "provider-cli")]
#[command(about = "Management CLI for the LXD provider", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// API key, if the provider has one configured
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show provider status and snapshot counters
    Status,
    /// Dump the last published configuration snapshot
    Rawdata,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {key}"))?);
    }

    let path = match cli.command {
        Commands::Status => "/api/status",
        Commands::Rawdata => "/api/rawdata",
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(api_error(status, &text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn api_error(status: StatusCode, body: &str) -> String {
    match body.trim() {
        "" => format!("provider API returned status {}", status),
        text => format!("provider API returned status {}: {}", status, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        assert_eq!(
            api_error(StatusCode::NOT_FOUND, ""),
            "provider API returned status 404 Not Found"
        );
        assert_eq!(
            api_error(StatusCode::UNAUTHORIZED, "denied\n"),
            "provider API returned status 401 Unauthorized: denied"
        );
    }
}
