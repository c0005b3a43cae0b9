//! Wait-for-db command handler

use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Store;

pub async fn cmd_wait_for_db(config: &Config, attempts: u32, delay_ms: u64) -> anyhow::Result<()> {
    let attempts = attempts.max(1);
    println!("Waiting for database...");

    for attempt in 1..=attempts {
        match try_connect(&config.general.database_path).await {
            Ok(()) => {
                info!(attempt, "Database available");
                println!("✓ Database available!");
                return Ok(());
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, "Database unavailable");
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    anyhow::bail!("Database still unavailable after {attempts} attempts")
}

async fn try_connect(db_url: &str) -> anyhow::Result<()> {
    let store = Store::connect_only(db_url).await?;
    store.ping().await
}
