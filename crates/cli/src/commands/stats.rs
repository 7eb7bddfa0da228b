//! Store statistics report.

use bloom_favorites::{IdentityScopedStore, MigrationAgent};

use super::CliError;

/// Print per-identity favorites counts and last-modified times.
#[allow(clippy::print_stdout)] // stats is an interactive report
pub async fn report(store: &IdentityScopedStore) -> Result<(), CliError> {
    let agent = MigrationAgent::new(store.clone());
    let stats = agent.statistics().await;

    if stats.is_empty() {
        println!("no favorites namespaces found");
        return Ok(());
    }

    println!("{:<32} {:>8}  {}", "user", "count", "last modified");
    for (user, namespace) in &stats {
        let last_modified = namespace
            .last_modified
            .map_or_else(|| "-".to_owned(), |at| at.to_rfc3339());
        println!("{:<32} {:>8}  {last_modified}", user.as_str(), namespace.count);
    }

    Ok(())
}
