mod cli;

use reelmark::{
    assets, config,
    db::with_conn,
    jobs::{SystemClock, ViewsResetTask},
    server,
};
use reelmark_common::{EpisodeId, ProfileId, SeriesId, DEFAULT_PROFILE_ID};
use reelmark_db::pool::{init_pool, DbPool};
use reelmark_db::queries::{auth_tokens, profiles};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn open_pool(config: &config::Config) -> Result<DbPool> {
    std::fs::create_dir_all(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {:?}",
            config.storage.data_dir
        )
    })?;
    let db_path = config.storage.database_path();
    let db_path_str = db_path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path_str);
    Ok(init_pool(&db_path_str)?)
}

fn parse_profile(raw: Option<&str>) -> Result<ProfileId> {
    match raw {
        Some(s) => s
            .parse()
            .with_context(|| format!("Invalid profile id: {s}")),
        None => Ok(DEFAULT_PROFILE_ID),
    }
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config::validate_config(&config)?;

    tracing::info!("Starting reelmark server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let db_pool = open_pool(&config)?;

    // Drop tokens that expired while the server was down
    let now = chrono::Utc::now();
    match with_conn(&db_pool, move |conn| auth_tokens::delete_expired_tokens(conn, now)).await {
        Ok(count) if count > 0 => tracing::info!("Removed {} expired session tokens", count),
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to remove expired session tokens: {}", e),
    }

    // Start the monthly views reset task
    let (shutdown_tx, shutdown_rx) = tokio::sync::mpsc::channel::<()>(1);
    let views_handle = if config.views.reset_enabled {
        let task = ViewsResetTask::new(db_pool.clone(), Arc::new(SystemClock));
        Some(task.spawn(
            Duration::from_secs(config.views.check_interval_secs),
            shutdown_rx,
        ))
    } else {
        None
    };

    let server_result = server::start_server(config, db_pool).await;

    // Cleanup
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(()).await;
    if let Some(handle) = views_handle {
        let _ = handle.await;
    }

    server_result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelmark=trace,reelmark_db=debug,reelmark_common=debug,tower_http=debug".to_string()
        } else {
            "reelmark=info,reelmark_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Start { host, port } => {
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CreateProfile { name } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let pool = open_pool(&config)?;
            let profile = rt.block_on(with_conn(&pool, move |conn| {
                profiles::create_profile(conn, &name)
            }))?;
            println!("{}", profile.id);
            Ok(())
        }
        Commands::IssueToken { profile_id } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let pool = open_pool(&config)?;
            let profile_id = parse_profile(Some(&profile_id))?;
            let ttl = chrono::Duration::hours(config.server.auth.token_ttl_hours);
            let token = rt.block_on(with_conn(&pool, move |conn| {
                if !profiles::profile_exists(conn, profile_id)? {
                    return Err(reelmark_common::Error::not_found("profile", profile_id));
                }
                auth_tokens::issue_token(conn, profile_id, ttl)
            }))?;
            println!("{}", token.token);
            eprintln!("expires at {}", token.expires_at);
            Ok(())
        }
        Commands::RegisterVideo {
            kind,
            path,
            duration_ms,
            owner,
            title,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let pool = open_pool(&config)?;
            let owner = parse_profile(owner.as_deref())?;
            let video = rt.block_on(assets::register_video(
                &pool,
                &path,
                kind.into(),
                duration_ms,
                owner,
                title,
            ))?;
            println!("{}", video.id);
            Ok(())
        }
        Commands::CreateSeries { title, owner } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let pool = open_pool(&config)?;
            let owner = parse_profile(owner.as_deref())?;
            let series = rt.block_on(assets::create_series(&pool, owner, title))?;
            println!("{}", series.id);
            Ok(())
        }
        Commands::AddEpisode {
            series,
            video,
            season,
            episode,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let pool = open_pool(&config)?;
            let series_id: SeriesId = series
                .parse()
                .with_context(|| format!("Invalid series id: {series}"))?;
            let episode_id: EpisodeId = video
                .parse()
                .with_context(|| format!("Invalid video id: {video}"))?;
            let series = rt.block_on(assets::add_episode(
                &pool, series_id, episode_id, season, episode,
            ))?;
            println!(
                "{}: {} episodes in {} seasons",
                series.title, series.amount_of_episodes, series.amount_of_seasons
            );
            Ok(())
        }
        Commands::Validate { config } => validate_config(config.as_deref()),
        Commands::Version => {
            println!("reelmark {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Auth enabled: {}", config.server.auth.enabled);
            println!("  Database: {:?}", config.storage.database_path());
            println!("  Previews: {:?}", config.storage.preview_dir);
            println!("  Content type: {}", config.streaming.content_type);
            println!(
                "  Views reset: {} (every {}s)",
                config.views.reset_enabled, config.views.check_interval_secs
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
