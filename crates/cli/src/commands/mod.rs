//! CLI command implementations.

pub mod backup;
pub mod migrate;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use bloom_favorites::{IdentityScopedStore, JsonFileKv, KvError};

/// Environment variable naming the JSON store file.
pub const ENV_STORE_PATH: &str = "BLOOM_STORE_PATH";

/// Errors surfaced by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// No store path was provided via flag or environment.
    #[error("no store path given; pass --store or set {ENV_STORE_PATH}")]
    MissingStorePath,

    /// The store file could not be opened or parsed.
    #[error("failed to open store: {0}")]
    Store(#[from] KvError),

    /// The user id argument was invalid.
    #[error("invalid user id: {0}")]
    InvalidUser(#[from] bloom_core::IdentityError),

    /// The operation reported failure.
    #[error("{0}")]
    OperationFailed(String),
}

/// Open the identity-scoped store over the JSON file named by `--store`
/// or `BLOOM_STORE_PATH`.
///
/// # Errors
///
/// Returns [`CliError::MissingStorePath`] when neither source names a
/// path, or [`CliError::Store`] when the file cannot be opened.
pub async fn open_store(flag: Option<PathBuf>) -> Result<IdentityScopedStore, CliError> {
    dotenvy::dotenv().ok();

    let path = flag
        .or_else(|| std::env::var(ENV_STORE_PATH).ok().map(PathBuf::from))
        .ok_or(CliError::MissingStorePath)?;

    let kv = JsonFileKv::open(path).await?;
    Ok(IdentityScopedStore::new(Arc::new(kv)))
}
