//! Legacy favorites migration commands.

use bloom_core::UserId;
use bloom_favorites::{IdentityScopedStore, MigrationAgent};

use super::CliError;

/// Migrate the legacy global favorites list into `user`'s namespace.
///
/// A no-op (already populated, or nothing to migrate) is reported as
/// success; the migration agent logs the reason.
pub async fn run(store: &IdentityScopedStore, user: &str) -> Result<(), CliError> {
    let user = UserId::parse(user)?;
    let agent = MigrationAgent::new(store.clone());

    if agent.migrate_global_to_user(&user).await {
        tracing::info!(user = %user, "migration complete");
    } else {
        tracing::info!(user = %user, "nothing to migrate");
    }
    Ok(())
}

/// Delete the legacy global favorites list.
pub async fn cleanup(store: &IdentityScopedStore) -> Result<(), CliError> {
    let agent = MigrationAgent::new(store.clone());

    if agent.cleanup_global().await {
        tracing::info!("legacy global favorites removed");
        Ok(())
    } else {
        Err(CliError::OperationFailed(
            "failed to remove legacy global favorites".to_owned(),
        ))
    }
}
