//! Provision one ledger table per configured tenant.
//!
//! Usage: `credits-setup-db [--drop]`. `--drop` recreates existing tables and
//! discards their entries.

use anyhow::Context;

use credits_infra::bootstrap;
use credits_infra::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let drop = std::env::args().skip(1).any(|arg| arg == "--drop");

    let settings = Settings::load(None).context("failed to load settings")?;
    credits_observability::init(settings.debug);

    let tables = bootstrap::provision(&settings, drop)
        .await
        .context("failed to provision tenant tables")?;

    for table in &tables {
        tracing::info!(table = %table, drop, "table ready");
    }
    Ok(())
}
