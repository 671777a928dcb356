//! Subcommand bodies. Results go to stdout, logs to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use url::Url;

use wedsite_client::{CdnInvalidator, FetchClient, HttpVersionSource, parse_site};
use wedsite_core::notifier::{NotifierEvent, UpdateNotifier};
use wedsite_core::offline::{ClientMessage, Network, OfflineWorker, Request, WorkerConfig, WorkerMessage};
use wedsite_core::{AppConfig, AssetBuilder, BuildReport, CacheDb};

pub fn build(
    config: &AppConfig, assets_dir: Option<PathBuf>, pages_dir: Option<PathBuf>, out_dir: Option<PathBuf>,
    version: Option<String>,
) -> Result<()> {
    let report = builder(config, assets_dir, pages_dir, out_dir, version)
        .build()
        .context("build failed")?;
    print!("{}", render_build(&report));
    Ok(())
}

fn builder(
    config: &AppConfig, assets_dir: Option<PathBuf>, pages_dir: Option<PathBuf>, out_dir: Option<PathBuf>,
    version: Option<String>,
) -> AssetBuilder {
    let mut builder = AssetBuilder::from_config(config);
    if let Some(dir) = assets_dir {
        builder = builder.with_assets_dir(dir);
    }
    if let Some(dir) = pages_dir {
        builder = builder.with_pages_dir(dir);
    }
    if let Some(dir) = out_dir {
        builder = builder.with_build_dir(dir);
    }
    if let Some(version) = version {
        builder = builder.with_version(version);
    }
    builder
}

fn render_build(report: &BuildReport) -> String {
    let mut out = format!(
        "Build {} complete in {}\n  {} assets hashed, {} copied\n",
        report.manifest.version,
        report.build_dir.display(),
        report.hashed(),
        report.copied,
    );
    for page in &report.pages {
        out.push_str(&format!("  page: {page}\n"));
    }
    for file in &report.root_files {
        out.push_str(&format!("  root: {file}\n"));
    }
    out
}

pub async fn purge(config: &AppConfig, paths: Vec<String>) -> Result<()> {
    let mut invalidator = CdnInvalidator::new(config)?;
    if !paths.is_empty() {
        invalidator = invalidator.with_paths(paths);
    }

    tracing::info!(paths = ?invalidator.paths(), "purging CDN caches");
    let report = invalidator.invalidate_all().await;
    print!("{report}");

    if report.results.is_empty() {
        tracing::warn!("no CDN provider is configured");
    }
    if !report.all_succeeded() {
        bail!("{} of {} providers failed", report.results.len() - report.success_count(), report.results.len());
    }
    Ok(())
}

pub async fn watch(config: &AppConfig, site: &str, interval_secs: Option<u64>) -> Result<()> {
    let site = parse_site(site)?;
    let source = HttpVersionSource::new(FetchClient::from_app_config(config)?, site.clone());
    let notifier = UpdateNotifier::new(source).with_banner_timeout(config.banner_timeout());
    let interval = interval_secs.map(std::time::Duration::from_secs).unwrap_or_else(|| config.check_interval());

    notifier.init().await;
    tracing::info!(%site, current = ?notifier.current_version(), interval_secs = interval.as_secs(), "watching for updates");

    let (tx, mut rx) = mpsc::channel(8);
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    let printer = async {
        while let Some(event) = rx.recv().await {
            match event {
                NotifierEvent::UpdateAvailable { version, banner } => {
                    println!("{banner}");
                    if let Some(version) = version {
                        println!("(deployed version {version})");
                    }
                }
                NotifierEvent::BannerHidden(reason) => tracing::info!(?reason, "banner hidden"),
            }
        }
    };

    tokio::join!(notifier.run(interval, tx, shutdown), printer);
    Ok(())
}

pub async fn open_worker(config: &AppConfig, origin: &Url) -> Result<OfflineWorker> {
    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open cache database {}", config.db_path.display()))?;
    let network: Arc<dyn Network> = Arc::new(FetchClient::from_app_config(config)?);
    let worker = OfflineWorker::restore(db, network, WorkerConfig::from_app_config(config, origin.clone())).await?;
    tracing::debug!(state = %worker.state(), "worker restored");
    Ok(worker)
}

pub async fn cache_install(mut worker: OfflineWorker) -> Result<()> {
    let report = worker.install().await.context("install failed")?;
    println!("Installed {} URLs into {}", report.urls.len(), report.cache);
    if let Some(version) = report.site_version {
        println!("Site version: {version}");
    }
    match report.activated {
        Some(activated) => print_message(&activated.message),
        None => {
            println!("Worker is waiting; run `wedsite cache activate` to take over.");
            Ok(())
        }
    }
}

pub async fn cache_activate(mut worker: OfflineWorker) -> Result<()> {
    let report = worker.activate().await?;
    for name in &report.deleted {
        println!("Deleted old cache {name}");
    }
    print_message(&report.message)
}

pub async fn cache_fetch(worker: OfflineWorker, origin: &Url, input: &str, navigate: bool) -> Result<()> {
    let url = Request::resolve(origin, input)?;
    let request = if navigate { Request::navigate(url) } else { Request::get(url) };

    let outcome = worker.handle_fetch(&request).await?;
    let response = &outcome.response;
    println!(
        "{} {} via {:?} ({:?}, {} bytes)",
        response.status,
        response.url,
        outcome.source,
        outcome.strategy,
        response.body.len()
    );

    if let Some(handle) = outcome.revalidation {
        handle.await.context("revalidation task panicked")?;
    }
    Ok(())
}

pub async fn cache_check_version(worker: OfflineWorker) -> Result<()> {
    send(worker, ClientMessage::CheckVersion).await
}

pub async fn cache_status(worker: OfflineWorker) -> Result<()> {
    send(worker, ClientMessage::GetCacheStatus).await
}

pub async fn cache_clear(worker: OfflineWorker) -> Result<()> {
    send(worker, ClientMessage::ClearCaches).await
}

async fn send(mut worker: OfflineWorker, message: ClientMessage) -> Result<()> {
    match worker.handle_message(message).await? {
        Some(reply) => print_message(&reply),
        None => Ok(()),
    }
}

fn print_message(message: &WorkerMessage) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(message)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> (tempfile::TempDir, AppConfig) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("assets/css")).unwrap();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("assets/css/site.css"), "body { color: navy; }").unwrap();
        fs::write(root.join("pages/rsvp.html"), r#"<link href="/assets/css/site.css">"#).unwrap();

        let config = AppConfig {
            site_root: root.to_path_buf(),
            assets_dir: root.join("assets"),
            pages_dir: root.join("pages"),
            build_dir: root.join("dist"),
            version_file: root.join("version.json"),
            ..Default::default()
        };
        (dir, config)
    }

    #[test]
    fn test_build_overrides_apply() {
        let (dir, config) = site();
        let out = dir.path().join("public");

        let report = builder(&config, None, None, Some(out.clone()), Some("v7".into())).build().unwrap();

        assert_eq!(report.manifest.version, "v7");
        assert_eq!(report.build_dir, out);
        assert!(out.join("version.json").exists());

        let rendered = render_build(&report);
        assert!(rendered.starts_with("Build v7 complete in "));
        assert!(rendered.contains("1 assets hashed, 0 copied"));
        assert!(rendered.contains("page: rsvp.html"));
    }

    #[tokio::test]
    async fn test_purge_without_providers_succeeds() {
        purge(&AppConfig::default(), vec!["/".into()]).await.unwrap();
    }
}
