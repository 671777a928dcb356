//! Content-hashing asset builder.
//!
//! Copies the site into the build directory:
//! - assets with a hashable extension are renamed `stem.<hash>.ext`
//! - every other asset is copied verbatim, keeping its directory
//! - pages and the root `index.html` have their asset references rewritten
//! - the manifest is written to `<build>/version.json` and to the root version file

pub mod hash;
pub mod rewrite;

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{AppConfig, Error, Manifest};

pub use hash::{content_hash, hashed_file_name};
pub use rewrite::{ReferenceRewriter, rewrite_references};

/// Name of the manifest inside the build directory.
pub const MANIFEST_FILE: &str = "version.json";

/// Prefix of every manifest key and value.
const ASSETS_PREFIX: &str = "assets";

/// Summary of one build run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub manifest: Manifest,
    /// Number of assets copied without hashing.
    pub copied: usize,
    /// Pages written to the build root, by file name.
    pub pages: Vec<String>,
    /// Root files found and copied.
    pub root_files: Vec<String>,
    pub build_dir: PathBuf,
}

impl BuildReport {
    pub fn hashed(&self) -> usize {
        self.manifest.len()
    }
}

/// Asset builder configured from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct AssetBuilder {
    site_root: PathBuf,
    assets_dir: PathBuf,
    pages_dir: PathBuf,
    build_dir: PathBuf,
    version_file: Option<PathBuf>,
    hashable_extensions: Vec<String>,
    root_files: Vec<String>,
    version: Option<String>,
}

impl AssetBuilder {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            site_root: config.site_root.clone(),
            assets_dir: config.assets_dir.clone(),
            pages_dir: config.pages_dir.clone(),
            build_dir: config.build_dir.clone(),
            version_file: Some(config.version_file.clone()),
            hashable_extensions: config.hashable_extensions.clone(),
            root_files: config.root_files.clone(),
            version: None,
        }
    }

    /// Use a fixed manifest version instead of the build timestamp.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_build_dir(mut self, build_dir: impl Into<PathBuf>) -> Self {
        self.build_dir = build_dir.into();
        self
    }

    pub fn with_assets_dir(mut self, assets_dir: impl Into<PathBuf>) -> Self {
        self.assets_dir = assets_dir.into();
        self
    }

    pub fn with_pages_dir(mut self, pages_dir: impl Into<PathBuf>) -> Self {
        self.pages_dir = pages_dir.into();
        self
    }

    /// Skip writing the root copy of the manifest.
    pub fn without_version_file(mut self) -> Self {
        self.version_file = None;
        self
    }

    /// Whether a file name ends in one of the hashable extensions.
    ///
    /// Matching is case-sensitive: `logo.PNG` is copied, not hashed.
    pub fn is_hashable(&self, file_name: &str) -> bool {
        let Some(ext) = Path::new(file_name).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.hashable_extensions
            .iter()
            .any(|allowed| allowed.strip_prefix('.') == Some(ext))
    }

    /// Run the whole build.
    ///
    /// # Errors
    ///
    /// Returns `Error::BuildIo` when the assets or pages directory is missing
    /// or any copy fails. Missing root files are skipped.
    pub fn build(&self) -> Result<BuildReport, Error> {
        tracing::info!("building assets with content hashing into {}", self.build_dir.display());

        let mut manifest = match &self.version {
            Some(version) => Manifest::new(version.clone(), chrono::Utc::now()),
            None => Manifest::stamped_now(),
        };

        let build_assets = self.build_dir.join(ASSETS_PREFIX);
        fs::create_dir_all(&build_assets).map_err(|e| Error::io(&build_assets, e))?;

        let copied = self.process_assets(&build_assets, &mut manifest)?;

        let rewriter = ReferenceRewriter::new(&manifest)?;
        let pages = self.copy_pages(&rewriter)?;
        let root_files = self.copy_root_files(&rewriter)?;

        manifest.save(self.build_dir.join(MANIFEST_FILE))?;
        if let Some(version_file) = &self.version_file {
            manifest.save(version_file)?;
        }

        tracing::info!(
            hashed = manifest.len(),
            copied,
            pages = pages.len(),
            version = %manifest.version,
            "build complete"
        );

        Ok(BuildReport { manifest, copied, pages, root_files, build_dir: self.build_dir.clone() })
    }

    /// Walk the assets directory, hashing eligible files. Returns the number of
    /// files copied verbatim.
    fn process_assets(&self, build_assets: &Path, manifest: &mut Manifest) -> Result<usize, Error> {
        if !self.assets_dir.is_dir() {
            return Err(Error::io(&self.assets_dir, std::io::ErrorKind::NotFound.into()));
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.assets_dir).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(self.assets_dir.as_path()).to_path_buf();
                Error::io(path, e.into())
            })?;

            let rel = entry
                .path()
                .strip_prefix(&self.assets_dir)
                .map_err(|e| Error::InvalidInput(e.to_string()))?;
            let dest = build_assets.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| Error::io(&dest, e))?;
                continue;
            }

            let original = format!("{ASSETS_PREFIX}/{}", slash_path(rel));
            let file_name = entry.file_name().to_string_lossy();

            if self.is_hashable(&file_name) {
                let bytes = fs::read(entry.path()).map_err(|e| Error::io(entry.path(), e))?;
                let hashed_name = hashed_file_name(&file_name, &content_hash(&bytes));
                let hashed_dest = dest.with_file_name(&hashed_name);
                fs::write(&hashed_dest, &bytes).map_err(|e| Error::io(&hashed_dest, e))?;

                let hashed = match rel.parent().map(slash_path).filter(|p| !p.is_empty()) {
                    Some(dir) => format!("{ASSETS_PREFIX}/{dir}/{hashed_name}"),
                    None => format!("{ASSETS_PREFIX}/{hashed_name}"),
                };
                tracing::debug!("{} -> {}", original, hashed);
                manifest.insert(original, hashed);
            } else {
                fs::copy(entry.path(), &dest).map_err(|e| Error::io(&dest, e))?;
                tracing::debug!("{} (copied)", original);
                copied += 1;
            }
        }

        Ok(copied)
    }

    /// Copy `*.html` from the pages directory into the build root, rewritten.
    fn copy_pages(&self, rewriter: &ReferenceRewriter<'_>) -> Result<Vec<String>, Error> {
        let entries = fs::read_dir(&self.pages_dir).map_err(|e| Error::io(&self.pages_dir, e))?;

        let mut pages = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.pages_dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".html") && entry.path().is_file() {
                pages.push(name);
            }
        }
        pages.sort();

        for page in &pages {
            let src = self.pages_dir.join(page);
            let dest = self.build_dir.join(page);
            write_rewritten(&src, &dest, rewriter)?;
            tracing::debug!("updated {} with hashed asset references", page);
        }

        Ok(pages)
    }

    /// Copy the configured root files that exist; HTML files are rewritten.
    fn copy_root_files(&self, rewriter: &ReferenceRewriter<'_>) -> Result<Vec<String>, Error> {
        let mut copied = Vec::new();
        for name in &self.root_files {
            let src = self.site_root.join(name);
            if !src.is_file() {
                continue;
            }
            let dest = self.build_dir.join(name);
            if name.ends_with(".html") {
                write_rewritten(&src, &dest, rewriter)?;
            } else {
                fs::copy(&src, &dest).map_err(|e| Error::io(&dest, e))?;
            }
            tracing::debug!("copied {}", name);
            copied.push(name.clone());
        }
        Ok(copied)
    }
}

fn write_rewritten(src: &Path, dest: &Path, rewriter: &ReferenceRewriter<'_>) -> Result<(), Error> {
    let html = fs::read(src).map_err(|e| Error::io(src, e))?;
    fs::write(dest, rewriter.rewrite_bytes(&html)).map_err(|e| Error::io(dest, e))
}

/// Relative path joined with `/` regardless of platform.
fn slash_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
