//! Binary entrypoint: runs exactly one refresh cycle and exits. No loop, no
//! signal handling, no HTTP server — an external scheduler (cron, a
//! Kubernetes CronJob, ...) is expected to invoke this repeatedly
//! (SPEC_FULL §1, §2 item 9).

use std::time::Duration;

use anyhow::Context;

use rankdate::config::Config;
use rankdate::cycle;
use rankdate::platform::http::HttpPlatformApi;
use rankdate::store::postgres::PostgresStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init(); // Use log::* to write to stdout/err.

    let config = Config::load();

    let store = PostgresStore::connect(&config.postgres_connection, CONNECT_TIMEOUT)
        .await
        .context("failed to connect to the database")?;

    let platform = HttpPlatformApi::new(&config);

    log::info!("running one rank-date projection cycle...");
    let report = cycle::run(&platform, &store).await.context("cycle failed")?;
    log::info!(
        "cycle complete: {} set(s) updated, {} skipped as inconsistent",
        report.updated,
        report.skipped
    );

    Ok(())
}
