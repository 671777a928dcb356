//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WEDSITE_*)
//! 2. Provider credentials under their native names (CLOUDFLARE_*, NETLIFY_*, ...)
//! 3. TOML config file (if WEDSITE_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod providers;
mod validation;

pub use providers::{CloudflareConfig, NetlifyConfig, UploadcareConfig, VercelConfig};
pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WEDSITE_*, `__` separates nested keys)
/// 2. Native provider variables (CLOUDFLARE_ZONE_ID, NETLIFY_SITE_ID, ...)
/// 3. TOML file from WEDSITE_CONFIG_FILE
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the top-level site files (index.html, sw.js, ...).
    #[serde(default = "default_site_root")]
    pub site_root: PathBuf,

    /// Source directory of static assets to hash.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Directory of HTML pages copied into the build root.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: PathBuf,

    /// Build output directory.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Root copy of the manifest, written next to the sources.
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    /// File extensions (with leading dot) that receive a content hash.
    #[serde(default = "default_hashable_extensions")]
    pub hashable_extensions: Vec<String>,

    /// Top-level files copied into the build when present.
    #[serde(default = "default_root_files")]
    pub root_files: Vec<String>,

    /// Prefix shared by both offline cache partitions.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Version suffix of the offline cache names. Bumping it evicts old caches.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// URLs stored in the static cache on install.
    #[serde(default = "default_precache_urls")]
    pub precache_urls: Vec<String>,

    /// Page served for navigations when both network and cache miss.
    #[serde(default = "default_offline_fallback")]
    pub offline_fallback: String,

    /// Path to the SQLite database backing the offline cache.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds between version checks.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Seconds before an unanswered update banner hides itself.
    #[serde(default = "default_banner_timeout_secs")]
    pub banner_timeout_secs: u64,

    /// Site paths purged from CDNs after a deploy. Hashed assets never need it.
    #[serde(default = "default_purge_paths")]
    pub purge_paths: Vec<String>,

    #[serde(default)]
    pub cloudflare: CloudflareConfig,

    #[serde(default)]
    pub netlify: NetlifyConfig,

    #[serde(default)]
    pub vercel: VercelConfig,

    #[serde(default)]
    pub uploadcare: UploadcareConfig,

    /// Listen address of the gallery server.
    #[serde(default = "default_gallery_addr")]
    pub gallery_addr: String,
}

fn default_site_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("./assets")
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("./pages")
}

fn default_build_dir() -> PathBuf {
    PathBuf::from("./dist")
}

fn default_version_file() -> PathBuf {
    PathBuf::from("./version.json")
}

fn default_hashable_extensions() -> Vec<String> {
    [".css", ".js", ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".woff", ".woff2"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_root_files() -> Vec<String> {
    ["index.html", "manifest.json", "sw.js", "robots.txt", "CNAME"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cache_prefix() -> String {
    "james-oliver-wedding".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_precache_urls() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/gifts.html",
        "/photos.html",
        "/thankyou.html",
        "/manifest.json",
        "/images/favicon.png",
        "/images/apple-touch-icon.png",
        "/images/hero-bg.jpg",
        "/images/dress-code-sketch.png",
        "/images/timeline-background.png",
        "/images/dividers/mono-divide.png",
        "/images/dividers/london.png",
        "/images/dividers/wave.png",
        "/images/flourishes/glass-cheers.png",
        "/images/flourishes/lightGreen-coupe.png",
        "/images/monograms/JO_Circle.png",
        "/images/icon-aperitivo.png",
        "/images/icon-dinner.png",
        "/images/icon-toasts.png",
        "/images/icon-dessert.png",
        "/images/icon-music.png",
        "/images/arrow-down.png",
        "https://fonts.googleapis.com/css2?family=Inter:wght@400;600&family=Playfair+Display:wght@600&display=swap",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_fallback() -> String {
    "/index.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./wedsite-cache.sqlite")
}

fn default_user_agent() -> String {
    "wedsite/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_check_interval_secs() -> u64 {
    5 * 60
}

fn default_banner_timeout_secs() -> u64 {
    30
}

fn default_purge_paths() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/pages/index.html",
        "/pages/gifts.html",
        "/pages/photos.html",
        "/pages/thankyou.html",
        "/pages/privacy.html",
        "/version.json",
        "/manifest.json",
        "/sw.js",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_gallery_addr() -> String {
    "0.0.0.0:3000".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site_root: default_site_root(),
            assets_dir: default_assets_dir(),
            pages_dir: default_pages_dir(),
            build_dir: default_build_dir(),
            version_file: default_version_file(),
            hashable_extensions: default_hashable_extensions(),
            root_files: default_root_files(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            precache_urls: default_precache_urls(),
            offline_fallback: default_offline_fallback(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            check_interval_secs: default_check_interval_secs(),
            banner_timeout_secs: default_banner_timeout_secs(),
            purge_paths: default_purge_paths(),
            cloudflare: CloudflareConfig::default(),
            netlify: NetlifyConfig::default(),
            vercel: VercelConfig::default(),
            uploadcare: UploadcareConfig::default(),
            gallery_addr: default_gallery_addr(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interval between update checks.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// How long an update banner stays up without an answer.
    pub fn banner_timeout(&self) -> Duration {
        Duration::from_secs(self.banner_timeout_secs)
    }

    /// Build the layered figment without extracting it.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WEDSITE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        for (prefix, section) in [
            ("CLOUDFLARE_", "cloudflare"),
            ("NETLIFY_", "netlify"),
            ("VERCEL_", "vercel"),
            ("UPLOADCARE_", "uploadcare"),
        ] {
            figment = figment.merge(
                Env::prefixed(prefix).map(move |key| format!("{section}.{}", key.as_str().to_lowercase()).into()),
            );
        }

        figment.merge(
            Env::prefixed("WEDSITE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment()
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Names of the two offline cache partitions for the configured version.
    pub fn cache_names(&self) -> crate::offline::CacheNames {
        crate::offline::CacheNames::new(&self.cache_prefix, &self.cache_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.build_dir, PathBuf::from("./dist"));
        assert_eq!(config.user_agent, "wedsite/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.check_interval_secs, 300);
        assert_eq!(config.banner_timeout_secs, 30);
        assert_eq!(config.hashable_extensions.len(), 10);
        assert_eq!(config.purge_paths.len(), 10);
        assert!(config.cloudflare.zone_id.is_none());
        assert_eq!(config.offline_fallback, "/index.html");
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.check_interval(), Duration::from_secs(300));
        assert_eq!(config.banner_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_cache_names_follow_version() {
        let config = AppConfig { cache_version: "v7".into(), ..Default::default() };
        let names = config.cache_names();
        assert_eq!(names.static_name(), "james-oliver-wedding-static-v7");
        assert_eq!(names.dynamic_name(), "james-oliver-wedding-dynamic-v7");
    }

    #[test]
    fn test_load_reads_native_provider_env() {
        Jail::expect_with(|jail| {
            jail.set_env("CLOUDFLARE_ZONE_ID", "zone-abc");
            jail.set_env("CLOUDFLARE_API_TOKEN", "cf-token");
            jail.set_env("NETLIFY_SITE_ID", "site-1");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cloudflare.zone_id.as_deref(), Some("zone-abc"));
            assert_eq!(config.cloudflare.api_token.as_deref(), Some("cf-token"));
            assert_eq!(config.netlify.site_id.as_deref(), Some("site-1"));
            assert!(config.netlify.access_token.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("wedsite.toml", "cache_version = \"v2\"\ntimeout_ms = 5000\n")?;
            jail.set_env("WEDSITE_CONFIG_FILE", "wedsite.toml");
            jail.set_env("WEDSITE_CACHE_VERSION", "v3");
            jail.set_env("WEDSITE_CLOUDFLARE__DOMAIN", "example.org");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_version, "v3");
            assert_eq!(config.timeout_ms, 5000);
            assert_eq!(config.cloudflare.domain, "example.org");
            Ok(())
        });
    }
}
