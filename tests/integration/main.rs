use std::time::Duration;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use testcontainers::*;

use rankdate::model::{Beatmap, BeatmapSet, GameMode, Scheduling};
use rankdate::store::postgres::PostgresStore;
use rankdate::store::RankDateStore;

/// Spins up a Postgres database in a Docker container and runs migrations
/// against it.
async fn clean_db() -> Result<PostgresStore> {
    let _ = env_logger::builder().is_test(true).try_init();

    let db = "rankdate-db-test";
    let user = "rankdate-user-test";
    let password = "rankdate-password-test";

    let generic_postgres = images::generic::GenericImage::new("postgres:latest")
        .with_wait_for(images::generic::WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_DB", db)
        .with_env_var("POSTGRES_USER", user)
        .with_env_var("POSTGRES_PASSWORD", password);

    let docker = clients::Cli::default();

    log::info!("starting container...");
    let container = docker.run(generic_postgres);
    log::info!("container started");

    let pg_conn_str = format!(
        "postgres://{}:{}@localhost:{}/{}",
        user,
        password,
        container
            .get_host_port(5432)
            .expect("failed to determine Postgres host port"),
        db
    );

    log::info!("connecting to container database...");
    let store = PostgresStore::connect(&pg_conn_str, Duration::from_secs(5))
        .await
        .expect("postgres not running");

    log::info!("migrate database...");
    store.migrate().await?;

    Ok(store)
}

fn sample_set(id: i64, mode: GameMode) -> BeatmapSet {
    BeatmapSet::new(
        id,
        "Camellia".to_string(),
        "Exit This Earth's Atmosphere".to_string(),
        "Mapper".to_string(),
        7,
        vec![Beatmap {
            id,
            version: "Insane".to_string(),
            spinner_count: 2,
            star_rating: 5.2,
            length_seconds: 180,
            mode,
        }],
        Scheduling {
            queue_date: Some(Utc.timestamp(1_000, 0)),
            rank_date: Some(Utc.timestamp(2_000, 0)),
            rank_date_early: Some(Utc.timestamp(1_500, 0)),
            probability: Some(0.42),
            unresolved: false,
        },
    )
}

#[tokio::test]
async fn migrate_is_idempotent() -> Result<()> {
    let store = clean_db().await?;
    store.migrate().await?;
    Ok(())
}

#[tokio::test]
async fn apply_then_qualified_round_trips() -> Result<()> {
    let store = clean_db().await?;
    let set = sample_set(1, GameMode::Osu);

    store.apply(&[set.clone()]).await?;
    let qualified = store.qualified(GameMode::Osu).await?;

    assert_eq!(qualified.len(), 1);
    assert_eq!(qualified[0], set);
    Ok(())
}

#[tokio::test]
async fn ranked_tail_excludes_unqualified_old_sets() -> Result<()> {
    let store = clean_db().await?;

    let mut ranked_recent = sample_set(2, GameMode::Osu);
    ranked_recent.scheduling.queue_date = None;
    ranked_recent.scheduling.rank_date = Some(Utc::now());

    let mut ranked_old = sample_set(3, GameMode::Osu);
    ranked_old.scheduling.queue_date = None;
    ranked_old.scheduling.rank_date = Some(Utc.timestamp(1, 0));

    store.apply(&[ranked_recent.clone(), ranked_old]).await?;

    let tail = store.recently_ranked(GameMode::Osu).await?;
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].id, ranked_recent.id);
    Ok(())
}

#[tokio::test]
async fn apply_upserts_existing_rows() -> Result<()> {
    let store = clean_db().await?;
    let mut set = sample_set(4, GameMode::Taiko);
    store.apply(&[set.clone()]).await?;

    set.scheduling.probability = Some(0.9);
    store.apply(&[set.clone()]).await?;

    let qualified = store.qualified(GameMode::Taiko).await?;
    assert_eq!(qualified.len(), 1);
    assert_eq!(qualified[0].scheduling.probability, Some(0.9));
    Ok(())
}
