//! Lookback CLI
//!
//! # Usage
//!
//! ```bash
//! # Which commit's analysis data serves src/lib.rs at main?
//! lookback-cli resolve --config lookback.yaml --repo my-repo --head main --path src/lib.rs
//!
//! # Record that analysis data exists for a commit
//! lookback-cli record --config lookback.yaml --repo my-repo --commit HEAD
//!
//! # List recorded versions
//! lookback-cli list --config lookback.yaml --repo my-repo
//! ```
//!
//! Exit codes: 0 on success, 2 when no usable version exists, 1 on any other error.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use codegraph_lookback::config::ServiceConfig;
use codegraph_lookback::{
    AccessControl, AllowAllAccess, AnalysisVersion, GitHistoryProvider, ResolveContext,
    ResolveError, SqliteVersionStore, StaticAccessControl, VersionLookupUseCase, VersionService,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lookback-cli")]
#[command(about = "Resolve the nearest commit with reusable analysis data", long_about = None)]
struct Cli {
    /// Service configuration (YAML, version 1)
    #[arg(short, long, global = true, default_value = "lookback.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the analysis version for a path at a revision
    Resolve {
        /// Repository ID (key under `repositories:`)
        #[arg(short, long)]
        repo: String,

        /// Revision (branch, tag, hash, `HEAD~1`, ...)
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Path inside the repository (`.` for the root)
        #[arg(short, long, default_value = ".")]
        path: String,

        /// Principal the read-access check runs for
        #[arg(long, default_value = "cli")]
        principal: String,

        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record analysis data for a revision
    Record {
        #[arg(short, long)]
        repo: String,

        #[arg(long, default_value = "HEAD")]
        commit: String,
    },

    /// List recorded versions, newest first
    List {
        #[arg(short, long)]
        repo: String,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

struct App {
    config: ServiceConfig,
    store: Arc<SqliteVersionStore>,
    service: VersionService,
}

impl App {
    fn open(config_path: &PathBuf) -> Result<Self> {
        let config = ServiceConfig::from_yaml(config_path)
            .with_context(|| format!("loading {}", config_path.display()))?;

        let history = config
            .repositories
            .iter()
            .fold(GitHistoryProvider::new(), |history, (id, path)| {
                history.with_repository(id.as_str(), path)
            });

        let store = Arc::new(
            SqliteVersionStore::new(&config.store.sqlite_path)
                .with_context(|| format!("opening {}", config.store.sqlite_path.display()))?,
        );

        let access: Arc<dyn AccessControl> = match &config.access {
            Some(access) => Arc::new(StaticAccessControl::from_config(access)),
            None => Arc::new(AllowAllAccess),
        };

        let policy = config.lookback_policy();
        info!(
            limit = policy.limit(),
            source = %policy.source().describe(),
            "lookback policy"
        );

        let service = VersionService::new(Arc::new(history), store.clone(), access, policy);
        Ok(Self {
            config,
            store,
            service,
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let app = App::open(&cli.config)?;

    match cli.command {
        Commands::Resolve {
            repo,
            head,
            path,
            principal,
            timeout_ms,
            format,
        } => {
            app.config.repository_path(&repo)?;

            let mut ctx = ResolveContext::new();
            if let Some(ms) = timeout_ms {
                ctx = ctx.with_timeout(Duration::from_millis(ms));
            }

            match app
                .service
                .resolve_version(&principal, &repo, &head, &path, &ctx)
                .await
            {
                Ok(version) => {
                    match format {
                        OutputFormat::Text => {
                            println!("{}\tdistance={}", version.commit_id, version.distance)
                        }
                        OutputFormat::Json => println!("{}", serde_json::to_string(&version)?),
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(err @ ResolveError::NotFound { .. }) => {
                    eprintln!("{}", err);
                    Ok(ExitCode::from(2))
                }
                Err(err) => Err(err.into()),
            }
        }

        Commands::Record { repo, commit } => {
            app.config.repository_path(&repo)?;

            let rev = app
                .service
                .resolve_revision(&repo, &commit, &ResolveContext::new())
                .await?;
            let inserted = app
                .store
                .record_version(&AnalysisVersion::new(rev.repo.as_str(), rev.commit_id.as_str()))?;

            if inserted {
                println!("recorded {}", rev);
            } else {
                println!("already recorded {}", rev);
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::List { repo, limit } => {
            for version in app.store.list_versions(&repo, limit)? {
                println!(
                    "{}\t{}",
                    version.commit_id,
                    version.created_at.to_rfc3339()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
