//! Backup and restore commands.

use bloom_core::UserId;
use bloom_favorites::{IdentityScopedStore, MigrationAgent};

use super::CliError;

/// Snapshot `user`'s favorites under a timestamped backup key.
pub async fn create(store: &IdentityScopedStore, user: &str) -> Result<(), CliError> {
    let user = UserId::parse(user)?;
    let agent = MigrationAgent::new(store.clone());

    match agent.backup_user(&user).await {
        Some(backup) => {
            tracing::info!(user = %user, key = %backup.storage_key(), "backup created");
            Ok(())
        }
        None => Err(CliError::OperationFailed(format!(
            "no favorites namespace for user {user}"
        ))),
    }
}

/// Restore a user's favorites from a backup key.
pub async fn restore(store: &IdentityScopedStore, key: &str) -> Result<(), CliError> {
    let agent = MigrationAgent::new(store.clone());

    if agent.restore_from_key(key).await {
        tracing::info!(key = %key, "restore complete");
        Ok(())
    } else {
        Err(CliError::OperationFailed(format!(
            "restore failed for key {key}"
        )))
    }
}
