pub mod backend;
pub mod discriminator;
pub mod envfile;
pub mod error;
pub mod provider;
pub mod ws;

pub use error::{BackendError, CoreError, EnvFileError, FailureKind, ProviderError, WsError};
pub use provider::{ApiKey, ChainData, Endpoint, HeliusClient, ProviderUrls};

pub use reqwest::Url;
