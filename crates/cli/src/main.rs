//! wedsite - build, deploy and offline tooling for the wedding site
//!
//! Subcommands:
//! - `wedsite build` - Hash assets, rewrite pages, write `version.json`
//! - `wedsite purge` - Invalidate HTML/JSON on the configured CDNs
//! - `wedsite watch` - Poll a deployed site and announce new versions
//! - `wedsite cache ...` - Drive the offline cache engine

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wedsite_client::parse_site;
use wedsite_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "wedsite")]
#[command(about = "Build, deploy and offline tooling for the wedding site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Content-hash assets and write the build directory
    Build {
        /// Source assets directory
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Source pages directory
        #[arg(long)]
        pages_dir: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Build version (default: epoch milliseconds)
        #[arg(long)]
        version: Option<String>,
    },

    /// Purge HTML and JSON from every configured CDN
    Purge {
        /// Path to purge; repeat to replace the configured list
        #[arg(long = "path")]
        paths: Vec<String>,
    },

    /// Poll a deployed site and show the update banner on new builds
    Watch {
        /// Root URL of the deployed site
        #[arg(long)]
        site: String,

        /// Seconds between checks (default: configured check interval)
        #[arg(long)]
        interval_secs: Option<u64>,
    },

    /// Drive the offline cache engine against the on-disk cache database
    Cache {
        /// Site origin the worker serves
        #[arg(long, global = true, env = "WEDSITE_ORIGIN", default_value = "http://localhost:3000")]
        origin: String,

        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Precache the configured URLs into the static cache
    Install,

    /// Activate the installed worker, evicting caches from older versions
    Activate,

    /// Route one request through the worker
    Fetch {
        /// Absolute URL or site-relative path
        url: String,

        /// Treat the request as a page navigation
        #[arg(long)]
        navigate: bool,
    },

    /// Compare the deployed version with the one the worker installed
    CheckVersion,

    /// Show entry counts per cache
    Status,

    /// Delete every cache
    Clear,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = AppConfig::load()?;

    match cli.command {
        Commands::Build { assets_dir, pages_dir, out_dir, version } => {
            commands::build(&config, assets_dir, pages_dir, out_dir, version)
        }
        Commands::Purge { paths } => commands::purge(&config, paths).await,
        Commands::Watch { site, interval_secs } => commands::watch(&config, &site, interval_secs).await,
        Commands::Cache { origin, action } => {
            let origin = parse_site(&origin)?;
            let worker = commands::open_worker(&config, &origin).await?;
            match action {
                CacheAction::Install => commands::cache_install(worker).await,
                CacheAction::Activate => commands::cache_activate(worker).await,
                CacheAction::Fetch { url, navigate } => commands::cache_fetch(worker, &origin, &url, navigate).await,
                CacheAction::CheckVersion => commands::cache_check_version(worker).await,
                CacheAction::Status => commands::cache_status(worker).await,
                CacheAction::Clear => commands::cache_clear(worker).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_cache_fetch_with_trailing_origin() {
        let cli = Cli::parse_from(["wedsite", "cache", "fetch", "/pages/gifts.html", "--navigate", "--origin", "https://w.example"]);
        match cli.command {
            Commands::Cache { origin, action: CacheAction::Fetch { url, navigate } } => {
                assert_eq!(origin, "https://w.example");
                assert_eq!(url, "/pages/gifts.html");
                assert!(navigate);
            }
            _ => panic!("expected cache fetch"),
        }
    }

    #[test]
    fn test_parse_repeated_purge_paths() {
        let cli = Cli::parse_from(["wedsite", "purge", "--path", "/", "--path", "/version.json"]);
        match cli.command {
            Commands::Purge { paths } => assert_eq!(paths, vec!["/", "/version.json"]),
            _ => panic!("expected purge"),
        }
    }
}
