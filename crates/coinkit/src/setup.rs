//! Interactive Helius setup: obtain a key, prove it works, and record the
//! derived RPC URL in the env file the backend server reads.

use std::io::{BufRead, Write};
use std::path::Path;

use eyre::WrapErr;

use coinkit_core::envfile::{self, UpsertAction};
use coinkit_core::provider::{ChainData, PerformanceSample};
use coinkit_core::Url;

/// Env key the backend server reads its RPC endpoint from.
pub(crate) const HELIUS_RPC_URL_KEY: &str = "HELIUS_RPC_URL";

/// Number of performance samples fetched after a successful setup.
pub(crate) const SAMPLE_LIMIT: usize = 5;

#[derive(Debug, PartialEq)]
pub(crate) enum SetupOutcome {
    /// The key did not pass the connectivity check; the env file is untouched.
    ConnectionFailed,
    Completed {
        slot: u64,
        env_action: UpsertAction,
        /// `None` when the sample fetch failed; setup still counts as done.
        samples: Option<Vec<PerformanceSample>>,
    },
}

pub(crate) fn print_intro(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "🔑 Helius API Setup")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "To use real Solana blockchain data, you need a Helius API key.")?;
    writeln!(out, "1. Go to https://www.helius.dev/")?;
    writeln!(out, "2. Sign up for a free account")?;
    writeln!(out, "3. Create a new API key")?;
    writeln!(out, "4. Copy your API key")?;
    writeln!(out)
}

/// Ask for a key on `input`. Blank input (or EOF) yields `None`.
pub(crate) fn prompt_api_key(
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> std::io::Result<Option<String>> {
    write!(out, "Enter your Helius API key: ")?;
    out.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let key = line.trim();
    Ok((!key.is_empty()).then(|| key.to_owned()))
}

pub(crate) fn print_skipped(out: &mut dyn Write) -> std::io::Result<()> {
    writeln!(out, "❌ No API key provided.")?;
    writeln!(out, "⚠️  The server will use its fallback RPC URL with mock data.")
}

/// Check connectivity with `getSlot`; on success upsert `rpc_url` into
/// `env_file` and show the latest performance sample.
pub(crate) async fn run(
    provider: &dyn ChainData,
    rpc_url: &Url,
    env_file: &Path,
    out: &mut dyn Write,
) -> eyre::Result<SetupOutcome> {
    writeln!(out, "\n🧪 Testing Helius Connection...")?;
    let slot = match provider.slot().await {
        Ok(slot) => slot,
        Err(err) => {
            tracing::warn!(kind = %err.kind(), error = %err, "helius connectivity check failed");
            writeln!(out, "❌ Connection failed: {err}")?;
            writeln!(out, "\n❌ Setup failed. Please check your API key and try again.")?;
            writeln!(out, "The server will use its fallback RPC URL with mock data.")?;
            return Ok(SetupOutcome::ConnectionFailed);
        }
    };
    writeln!(out, "✅ Connection successful! Current slot: {slot}")?;

    let env_action = envfile::upsert(env_file, HELIUS_RPC_URL_KEY, rpc_url.as_str())
        .wrap_err_with(|| format!("write {HELIUS_RPC_URL_KEY} to {}", env_file.display()))?;
    tracing::info!(path = %env_file.display(), ?env_action, "env file updated");
    writeln!(out, "✅ Updated {} with your Helius API key", env_file.display())?;

    writeln!(out, "\n📊 Fetching Sample Transactions...")?;
    let samples = match provider.recent_performance_samples(SAMPLE_LIMIT).await {
        Ok(samples) => {
            writeln!(out, "✅ Retrieved {} performance samples", samples.len())?;
            if let Some(latest) = samples.first() {
                writeln!(out, "📈 Latest sample:")?;
                writeln!(out, "   - Slot: {}", or_na(latest.slot))?;
                writeln!(out, "   - Transactions: {}", or_na(latest.num_transactions))?;
                writeln!(out, "   - Time: {} seconds", or_na(latest.sample_period_secs))?;
            }
            Some(samples)
        }
        Err(err) => {
            writeln!(out, "❌ Failed to fetch sample data: {err}")?;
            None
        }
    };

    writeln!(out, "\n🎉 Setup complete!")?;
    writeln!(out, "You can now run the backend server with real blockchain data.")?;

    Ok(SetupOutcome::Completed {
        slot,
        env_action,
        samples,
    })
}

fn or_na(value: Option<u64>) -> String {
    value.map_or_else(|| "N/A".to_owned(), |v| v.to_string())
}
