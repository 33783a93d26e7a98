use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use profile_sync::{
    config::{SyncConfig, load_config_path},
    db::migrate,
    models::UserId,
    resolver::CityResolver,
    store::{ProfileStore, sqlite::SqliteStore},
    synchronizer::ProfileSynchronizer,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Trainer profile sync CLI")]
struct Cli {
    /// TOML config file; when omitted, PROFILE_SYNC_DATABASE_URL is required
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Apply embedded migrations
    Migrate,
    /// Print a trainer's profile as JSON
    Show {
        #[arg(long)]
        user: String,
    },
    /// Edit one field and save
    Set {
        #[arg(long)]
        user: String,
        /// Dot path, e.g. `bio` or `specialties.0.is_primary`
        #[arg(long)]
        field: String,
        /// JSON value, e.g. `"text"`, `7`, `true`
        #[arg(long)]
        value: String,
    },
    /// Resolve a free-text city ("City - ST")
    ResolveCity { name: String },
    /// Print a trainer's profile completion percentage
    Completion {
        #[arg(long)]
        user: String,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<SyncConfig> {
    let Some(path) = path else {
        return SyncConfig::from_env();
    };
    let mut cfg = load_config_path(path)?;
    cfg.apply_env()?;
    Ok(cfg)
}

async fn loaded(cfg: &SyncConfig, user: String) -> Result<ProfileSynchronizer> {
    let store: Arc<dyn ProfileStore> = Arc::new(SqliteStore::open(&cfg.database_url)?);
    let mut sync = ProfileSynchronizer::new(store, cfg);
    sync.load(UserId::new(user))
        .await
        .context("load profile")?;
    Ok(sync)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    match cli.cmd {
        Cmd::Migrate => {
            migrate::run_all(&cfg.database_url)?;
            println!("migrations applied to {}", cfg.database_url);
        }
        Cmd::Show { user } => {
            let sync = loaded(&cfg, user).await?;
            println!("{}", serde_json::to_string_pretty(sync.data())?);
        }
        Cmd::Set { user, field, value } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).with_context(|| format!("--value is not JSON: {value}"))?;
            let mut sync = loaded(&cfg, user).await?;
            sync.update_field(&field, value)?;
            if !sync.save().await {
                bail!(
                    "save failed: {}",
                    sync.state().error.unwrap_or("unknown error")
                );
            }
            if let Some(handle) = sync.take_city_sync() {
                let report = handle.wait().await;
                for skipped in &report.skipped {
                    eprintln!("skipped city: {skipped}");
                }
                if let Some(err) = report.error {
                    eprintln!("service cities not saved: {}", err.user_message());
                }
            }
            println!("saved");
        }
        Cmd::ResolveCity { name } => {
            let store: Arc<dyn ProfileStore> = Arc::new(SqliteStore::open(&cfg.database_url)?);
            let resolver = CityResolver::new(store, cfg.state_cache_ttl());
            match resolver.resolve_city(&name).await {
                Some(id) => println!("{id}"),
                None => println!("unresolved"),
            }
        }
        Cmd::Completion { user } => {
            let sync = loaded(&cfg, user).await?;
            println!("{}%", sync.state().completion_percentage);
        }
    }

    Ok(())
}
