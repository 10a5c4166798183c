use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use coinkit_core::backend::DEFAULT_BACKEND_URL;
use coinkit_core::discriminator::Namespace;
use coinkit_core::provider::{DEFAULT_API_BASE_URL, DEFAULT_RPC_BASE_URL};
use coinkit_core::ws::DEFAULT_WS_URL;

/// coinkit: Helius lookups, setup, and backend smoke tests for the Community Coin platform.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Helius API key.
    #[arg(long, env = "HELIUS_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Helius REST API base URL.
    #[arg(long, default_value = DEFAULT_API_BASE_URL, env = "COINKIT_API_BASE_URL", global = true)]
    pub api_base_url: String,

    /// Helius JSON-RPC base URL.
    #[arg(long, default_value = DEFAULT_RPC_BASE_URL, env = "COINKIT_RPC_BASE_URL", global = true)]
    pub rpc_base_url: String,

    /// Timeout in seconds for every HTTP request.
    #[arg(long, default_value = "10", env = "COINKIT_TIMEOUT_SECS", global = true)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the Anchor discriminator for an instruction or account name.
    Discriminator {
        /// Snake_case instruction name, or account type name.
        name: String,

        #[arg(long, value_enum, default_value_t = NamespaceArg::Global)]
        namespace: NamespaceArg,

        #[arg(long, value_enum, default_value_t = DiscriminatorFormat::Array)]
        format: DiscriminatorFormat,
    },

    /// Fetch account information for a Solana address.
    Address { address: String },

    /// Fetch parsed details for a transaction signature.
    Transaction { signature: String },

    /// Print the current slot.
    Slot,

    /// Print recent performance samples.
    Samples {
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Verify a Helius API key and record its RPC URL in an env file.
    Setup {
        /// Env file to upsert `HELIUS_RPC_URL` into.
        #[arg(long, default_value = ".env")]
        env_file: PathBuf,
    },

    /// Send the fixed command sequence to the backend socket and listen for events.
    WsSmoke {
        #[arg(long, default_value = DEFAULT_WS_URL, env = "COINKIT_WS_URL")]
        url: String,

        /// Seconds to wait for each command's reply.
        #[arg(long, default_value = "10")]
        reply_timeout_secs: u64,

        /// Seconds to listen for events after the last reply.
        #[arg(long, default_value = "10")]
        listen_secs: u64,
    },

    /// Exercise the backend REST endpoints and socket.
    ApiSmoke {
        #[arg(long, default_value = DEFAULT_BACKEND_URL, env = "COINKIT_BACKEND_URL")]
        base_url: String,

        /// Seconds to listen for socket events at the end of the run.
        #[arg(long, default_value = "5")]
        listen_secs: u64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NamespaceArg {
    Global,
    Account,
}

impl From<NamespaceArg> for Namespace {
    fn from(arg: NamespaceArg) -> Self {
        match arg {
            NamespaceArg::Global => Namespace::Global,
            NamespaceArg::Account => Namespace::Account,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DiscriminatorFormat {
    /// Rust array literal, e.g. `[175, 175, ...]`.
    Array,
    Hex,
}
