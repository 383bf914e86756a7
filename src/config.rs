use crate::error::ZettelError;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::read_to_string,
    path::{Path, PathBuf},
    time::Duration,
};

/// Default name of the project configuration file.
pub const CONFIG_FILE: &str = "zettel.toml";

/// Project settings, read from a TOML file.
///
/// ```toml
/// src_dir = "notes"
/// build_dir = "site"
/// url_root = "/"
/// port = 3000
///
/// [copy_paths]
/// "static" = "static"
///
/// [server]
/// warmup_ms = 100
/// cooldown_ms = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Directory searched for note files.
    pub src_dir: PathBuf,
    /// Output directory. Cleared on every build.
    pub build_dir: PathBuf,
    /// Prefix of every URL the site is served under, always ending in `/`.
    pub url_root: String,
    /// Asset sources copied into the output, keyed by source path; values are relative to
    /// `build_dir`.
    pub copy_paths: BTreeMap<PathBuf, PathBuf>,
    /// Dev server port. Probed for when unset.
    pub port: Option<u16>,
    pub server: ServerConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            src_dir: PathBuf::from("notes"),
            build_dir: PathBuf::from("site"),
            url_root: "/".to_string(),
            copy_paths: BTreeMap::new(),
            port: None,
            server: ServerConfig::default(),
        }
    }
}

/// Rebuild coalescing intervals, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub warmup_ms: u64,
    pub cooldown_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            warmup_ms: 100,
            cooldown_ms: 500,
        }
    }
}

impl ServerConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl ProjectConfig {
    /// Read the configuration at `path`, resolving relative paths against its directory.
    ///
    /// A missing file yields the defaults, resolved the same way.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ProjectConfig, ZettelError> {
        let path = path.as_ref();
        let config = if path.exists() {
            tracing::debug!("Reading project configuration from {:?}", path);
            toml::from_str::<ProjectConfig>(&read_to_string(path)?)?
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", path);
            ProjectConfig::default()
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    pub fn from_toml(content: &str) -> Result<ProjectConfig, ZettelError> {
        Ok(toml::from_str(content)?)
    }

    /// Make relative paths relative to `base` instead, and normalise `url_root`.
    pub fn resolved_against(mut self, base: &Path) -> ProjectConfig {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.src_dir = resolve(&self.src_dir);
        self.build_dir = resolve(&self.build_dir);
        self.copy_paths = self
            .copy_paths
            .iter()
            .map(|(src, dest)| (resolve(src), dest.clone()))
            .collect();
        self.url_root = normalize_url_root(&self.url_root);
        self
    }
}

/// `site` and `/site` both become `/site/`; an empty root becomes `/`.
pub fn normalize_url_root(root: &str) -> String {
    let trimmed = root.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}
