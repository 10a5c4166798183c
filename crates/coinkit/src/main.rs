mod cli;
mod setup;
mod smoke;

use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};

use coinkit_core::discriminator;
use coinkit_core::provider::{rpc_url, ApiKey, ChainData, HeliusClient, ProviderUrls};
use coinkit_core::ws::SessionConfig;
use coinkit_core::ProviderError;

use cli::{Cli, Command, DiscriminatorFormat};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Load `.env` before parsing so it can feed clap's `env` fallbacks.
    let dotenv = dotenvy::dotenv();

    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded env file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "could not load .env"),
    }

    let timeout = Duration::from_secs(args.timeout_secs);

    match &args.command {
        Command::Discriminator {
            name,
            namespace,
            format,
        } => {
            let bytes = discriminator::discriminator((*namespace).into(), name)?;
            let rendered = match format {
                DiscriminatorFormat::Array => discriminator::format_rust_array(&bytes),
                DiscriminatorFormat::Hex => discriminator::format_hex(&bytes),
            };
            println!("Name: {}:{name}", discriminator::Namespace::from(*namespace));
            println!("Discriminator: {rendered}");
        }
        Command::Address { address } => {
            let client = helius_client(&args, timeout)?;
            println!("Fetching info for address: {address}");
            let info = client
                .address_info(address)
                .await
                .map_err(|e| provider_failure(e, "address lookup"))?;
            print_document("Address Information", &info)?;
        }
        Command::Transaction { signature } => {
            let client = helius_client(&args, timeout)?;
            println!("Fetching details for transaction: {signature}");
            let details = client
                .transaction(signature)
                .await
                .map_err(|e| provider_failure(e, "transaction lookup"))?;
            print_document("Transaction Details", &details)?;
        }
        Command::Slot => {
            let client = helius_client(&args, timeout)?;
            let slot = client
                .slot()
                .await
                .map_err(|e| provider_failure(e, "getSlot"))?;
            println!("{slot}");
        }
        Command::Samples { limit } => {
            let client = helius_client(&args, timeout)?;
            let samples = client
                .recent_performance_samples(*limit)
                .await
                .map_err(|e| provider_failure(e, "getRecentPerformanceSamples"))?;
            println!(
                "{}",
                serde_json::to_string_pretty(&samples).context("render performance samples")?
            );
        }
        Command::Setup { env_file } => {
            let mut stdout = std::io::stdout();
            println!("🚀 Community Coin Server - Helius Setup");
            println!("{}", "=".repeat(50));

            let raw_key = match args.api_key.clone() {
                Some(key) => Some(key),
                None => {
                    setup::print_intro(&mut stdout)?;
                    setup::prompt_api_key(&mut std::io::stdin().lock(), &mut stdout)
                        .context("read API key from stdin")?
                }
            };
            let Some(raw_key) = raw_key else {
                setup::print_skipped(&mut stdout)?;
                return Ok(());
            };

            let api_key = ApiKey::new(raw_key)?;
            let urls = ProviderUrls::new(&args.api_base_url, &args.rpc_base_url)?;
            let rpc_url = rpc_url(&urls.rpc, &api_key)?;
            let client = HeliusClient::new(urls, api_key, timeout)?;

            let outcome = setup::run(&client, &rpc_url, env_file, &mut stdout).await?;
            if outcome == setup::SetupOutcome::ConnectionFailed {
                return Err(eyre!("Helius setup did not complete"));
            }
        }
        Command::WsSmoke {
            url,
            reply_timeout_secs,
            listen_secs,
        } => {
            let config = SessionConfig {
                url: url.clone(),
                reply_timeout: Duration::from_secs(*reply_timeout_secs),
                listen_window: Duration::from_secs(*listen_secs),
                ..SessionConfig::default()
            };
            smoke::run_ws_smoke(&config, &mut std::io::stdout())
                .await
                .wrap_err_with(|| format!("websocket smoke test against {url}"))?;
        }
        Command::ApiSmoke {
            base_url,
            listen_secs,
        } => {
            let backend = coinkit_core::backend::BackendClient::new(base_url, timeout)?;
            let summary = smoke::run_api_smoke(
                &backend,
                timeout,
                Duration::from_secs(*listen_secs),
                &mut std::io::stdout(),
            )
            .await?;
            if !summary.all_passed() {
                return Err(eyre!("API smoke run against {base_url} had failing checks"));
            }
        }
    }

    Ok(())
}

fn helius_client(args: &Cli, timeout: Duration) -> eyre::Result<HeliusClient> {
    let api_key = ApiKey::new(args.api_key.clone().unwrap_or_default())?;
    let urls = ProviderUrls::new(&args.api_base_url, &args.rpc_base_url)?;
    Ok(HeliusClient::new(urls, api_key, timeout)?)
}

fn provider_failure(err: ProviderError, what: &str) -> eyre::Report {
    let kind = err.kind();
    eyre::Report::new(err).wrap_err(format!("{what} failed ({kind})"))
}

fn print_document(title: &str, value: &serde_json::Value) -> eyre::Result<()> {
    println!("\n--- {title} ---");
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("render response JSON")?
    );
    println!("\n{}", "-".repeat(26));
    Ok(())
}
