//! On-disk layout of a launcher installation.
//!
//! [`PathResolver`] captures the environment once and turns it into a
//! [`Layout`]: the XDG-style config/cache/data roots plus every file the
//! launcher reads or writes beneath them.

use crate::constants::{APP_DIR_NAME, DEFAULT_SHARE_DIR, SHARE_DIR_NAME, VERSION_CHECK_URL};
use std::path::{Path, PathBuf};
use tbl_errors::Error;
use tbl_platform::fs as platform_fs;
use tracing::{debug, warn};

/// CPU architecture of the Tor Browser build to install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86_64,
    I686,
}

impl Architecture {
    /// Architecture matching the running binary
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::X86_64
        } else {
            Self::I686
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::I686 => "i686",
        }
    }

    /// Token used in release tarball names
    #[must_use]
    pub fn tarball_token(self) -> &'static str {
        match self {
            Self::X86_64 => "linux64",
            Self::I686 => "linux32",
        }
    }
}

/// The per-user base directories, all created at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirs {
    pub config: PathBuf,
    pub cache: PathBuf,
    pub local: PathBuf,
}

impl BaseDirs {
    /// All base directories in creation order
    #[must_use]
    pub fn all(&self) -> [&Path; 3] {
        [&self.config, &self.cache, &self.local]
    }
}

/// Packaged and downloaded key material, one file per pinned key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKeyPaths {
    /// Key shipped with the launcher package
    pub tor_browser_developers: PathBuf,
    /// Scratch location for a key fetched over WKD
    pub wkd_tmp: PathBuf,
}

/// Paths inside the Tor Browser install directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TbbPaths {
    pub changelog: PathBuf,
    pub dir: PathBuf,
    pub dir_tbb: PathBuf,
    pub start: PathBuf,
}

/// Version-dependent download locations for a release tarball and its signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub tarball_filename: String,
    /// Relative to a mirror base URL
    pub tarball_url: String,
    pub tarball_file: PathBuf,
    pub sig_filename: String,
    /// Relative to a mirror base URL
    pub sig_url: String,
    pub sig_file: PathBuf,
}

/// Complete on-disk layout of a launcher installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub architecture: Architecture,
    pub dirs: BaseDirs,
    /// Data directory of pre-XDG releases, only used to detect old installs
    pub old_data_dir: PathBuf,
    pub tbl_bin: PathBuf,
    pub icon_file: PathBuf,
    pub torproject_pem: PathBuf,
    pub signing_keys: SigningKeyPaths,
    /// Mirror lists in priority order: packaged first, user override second
    pub mirrors_txt: Vec<PathBuf>,
    pub download_dir: PathBuf,
    pub gnupg_homedir: PathBuf,
    pub settings_file: PathBuf,
    pub settings_file_pickle: PathBuf,
    pub version_check_url: String,
    pub version_check_file: PathBuf,
    pub tbb: TbbPaths,
}

/// A directory that could not be prepared; startup continues without it
#[derive(Debug, Clone)]
pub struct DirectoryIssue {
    pub path: PathBuf,
    pub error: Error,
}

impl Layout {
    /// Derive download paths for a specific Tor Browser version
    #[must_use]
    pub fn artifacts(&self, tbb_version: &str) -> ArtifactPaths {
        let arch = self.architecture.tarball_token();
        let tarball_filename = format!("tor-browser-{arch}-{tbb_version}_ALL.tar.xz");
        let sig_filename = format!("{tarball_filename}.asc");

        ArtifactPaths {
            tarball_url: format!("torbrowser/{tbb_version}/{tarball_filename}"),
            tarball_file: self.download_dir.join(&tarball_filename),
            sig_url: format!("torbrowser/{tbb_version}/{sig_filename}"),
            sig_file: self.download_dir.join(&sig_filename),
            tarball_filename,
            sig_filename,
        }
    }

    /// Create the base directories with owner-only permissions.
    ///
    /// Failures are logged and returned; later stages that need a missing
    /// directory fail on their own.
    pub async fn ensure_base_dirs(&self) -> Vec<DirectoryIssue> {
        ensure_dirs(&self.dirs.all()).await
    }

    /// Create the download and install directories, which depend on settings
    /// having been loaded first.
    pub async fn ensure_runtime_dirs(&self) -> Vec<DirectoryIssue> {
        ensure_dirs(&[&self.download_dir, &self.tbb.dir]).await
    }
}

async fn ensure_dirs(paths: &[&Path]) -> Vec<DirectoryIssue> {
    let mut issues = Vec::new();
    for path in paths {
        if let Err(error) = platform_fs::ensure_private_dir(path).await {
            warn!(path = %path.display(), %error, "directory unavailable");
            issues.push(DirectoryIssue {
                path: path.to_path_buf(),
                error,
            });
        }
    }
    issues
}

/// Computes a [`Layout`] from environment inputs
#[derive(Debug, Clone)]
pub struct PathResolver {
    home: Option<PathBuf>,
    user: String,
    xdg_config_home: Option<PathBuf>,
    xdg_cache_home: Option<PathBuf>,
    xdg_data_home: Option<PathBuf>,
    share_dir: PathBuf,
    tbl_bin: PathBuf,
    fallback_root: PathBuf,
    architecture: Architecture,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self {
            home: None,
            user: String::new(),
            xdg_config_home: None,
            xdg_cache_home: None,
            xdg_data_home: None,
            share_dir: PathBuf::from(DEFAULT_SHARE_DIR),
            tbl_bin: PathBuf::from("torbrowser-launcher"),
            fallback_root: PathBuf::from("/tmp"),
            architecture: Architecture::current(),
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl PathResolver {
    /// Capture `HOME`, `USER`, the `XDG_*` base directories and `TBL_SHARE`
    #[must_use]
    pub fn from_env() -> Self {
        let share_dir = env_path("TBL_SHARE")
            .map_or_else(|| PathBuf::from(DEFAULT_SHARE_DIR), |p| p.join(SHARE_DIR_NAME));

        Self {
            home: dirs::home_dir(),
            user: std::env::var("USER").unwrap_or_default(),
            xdg_config_home: env_path("XDG_CONFIG_HOME"),
            xdg_cache_home: env_path("XDG_CACHE_HOME"),
            xdg_data_home: env_path("XDG_DATA_HOME"),
            share_dir,
            tbl_bin: std::env::args_os()
                .next()
                .map_or_else(|| PathBuf::from("torbrowser-launcher"), PathBuf::from),
            ..Self::default()
        }
    }

    /// Override the home directory
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Pretend the home directory cannot be determined
    #[must_use]
    pub fn without_home(mut self) -> Self {
        self.home = None;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Override `XDG_CONFIG_HOME`, `XDG_CACHE_HOME` and `XDG_DATA_HOME`
    #[must_use]
    pub fn with_xdg(
        mut self,
        config: Option<PathBuf>,
        cache: Option<PathBuf>,
        data: Option<PathBuf>,
    ) -> Self {
        self.xdg_config_home = config;
        self.xdg_cache_home = cache;
        self.xdg_data_home = data;
        self
    }

    /// Override the packaged data directory (already including `torbrowser-launcher`)
    #[must_use]
    pub fn with_share_dir(mut self, share: impl Into<PathBuf>) -> Self {
        self.share_dir = share.into();
        self
    }

    /// Directory under which the per-user fallback home is created
    #[must_use]
    pub fn with_fallback_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fallback_root = root.into();
        self
    }

    #[must_use]
    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    /// The home directory in use, creating the temporary fallback if needed
    async fn home_dir(&self) -> PathBuf {
        if let Some(home) = &self.home {
            return home.clone();
        }

        let fallback = self
            .fallback_root
            .join(format!(".torbrowser-{}", self.user));
        warn!(path = %fallback.display(), "home directory unavailable, using fallback");
        if let Err(error) = platform_fs::create_private_dir(&fallback).await {
            warn!(path = %fallback.display(), %error, "error creating fallback home");
        }
        fallback
    }

    /// Resolve the full layout
    pub async fn resolve(&self) -> Layout {
        let home = self.home_dir().await;

        let config = self
            .xdg_config_home
            .clone()
            .unwrap_or_else(|| home.join(".config"))
            .join(APP_DIR_NAME);
        let cache = self
            .xdg_cache_home
            .clone()
            .unwrap_or_else(|| home.join(".cache"))
            .join(APP_DIR_NAME);
        let local = self
            .xdg_data_home
            .clone()
            .unwrap_or_else(|| home.join(".local").join("share"))
            .join(APP_DIR_NAME);

        let tbb_dir = local.join("tbb").join(self.architecture.as_str());
        let dir_tbb = tbb_dir.join("tor-browser");
        let icon_base = self
            .share_dir
            .parent()
            .map_or_else(|| self.share_dir.clone(), Path::to_path_buf);

        debug!(config = %config.display(), cache = %cache.display(), local = %local.display(), "resolved layout");

        Layout {
            architecture: self.architecture,
            old_data_dir: home.join(APP_DIR_NAME),
            tbl_bin: self.tbl_bin.clone(),
            icon_file: icon_base.join("pixmaps").join("torbrowser.png"),
            torproject_pem: self.share_dir.join("torproject.pem"),
            signing_keys: SigningKeyPaths {
                tor_browser_developers: self.share_dir.join("tor-browser-developers.asc"),
                wkd_tmp: cache.join("torbrowser.gpg"),
            },
            mirrors_txt: vec![
                self.share_dir.join("mirrors.txt"),
                config.join("mirrors.txt"),
            ],
            download_dir: cache.join("download"),
            gnupg_homedir: local.join("gnupg_homedir"),
            settings_file: config.join("settings.json"),
            settings_file_pickle: config.join("settings"),
            version_check_url: VERSION_CHECK_URL.to_string(),
            version_check_file: cache.join("download").join("release.xml"),
            tbb: TbbPaths {
                changelog: dir_tbb
                    .join("Browser")
                    .join("TorBrowser")
                    .join("Docs")
                    .join("ChangeLog.txt"),
                start: dir_tbb.join("start-tor-browser.desktop"),
                dir: tbb_dir,
                dir_tbb,
            },
            dirs: BaseDirs {
                config,
                cache,
                local,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(home: &Path) -> PathResolver {
        PathResolver::default()
            .with_home(home)
            .with_share_dir("/usr/share/torbrowser-launcher")
            .with_architecture(Architecture::X86_64)
    }

    #[tokio::test]
    async fn test_defaults_under_home() {
        let layout = resolver(Path::new("/home/amnesia")).resolve().await;

        assert_eq!(
            layout.dirs.config,
            PathBuf::from("/home/amnesia/.config/torbrowser")
        );
        assert_eq!(
            layout.dirs.cache,
            PathBuf::from("/home/amnesia/.cache/torbrowser")
        );
        assert_eq!(
            layout.dirs.local,
            PathBuf::from("/home/amnesia/.local/share/torbrowser")
        );
        assert_eq!(layout.old_data_dir, PathBuf::from("/home/amnesia/torbrowser"));
        assert_eq!(
            layout.settings_file,
            PathBuf::from("/home/amnesia/.config/torbrowser/settings.json")
        );
        assert_eq!(
            layout.settings_file_pickle,
            PathBuf::from("/home/amnesia/.config/torbrowser/settings")
        );
        assert_eq!(
            layout.gnupg_homedir,
            PathBuf::from("/home/amnesia/.local/share/torbrowser/gnupg_homedir")
        );
        assert_eq!(
            layout.tbb.start,
            PathBuf::from(
                "/home/amnesia/.local/share/torbrowser/tbb/x86_64/tor-browser/start-tor-browser.desktop"
            )
        );
        assert_eq!(
            layout.icon_file,
            PathBuf::from("/usr/share/pixmaps/torbrowser.png")
        );
    }

    #[tokio::test]
    async fn test_xdg_overrides() {
        let layout = resolver(Path::new("/home/amnesia"))
            .with_xdg(
                Some(PathBuf::from("/xdg/config")),
                Some(PathBuf::from("/xdg/cache")),
                None,
            )
            .resolve()
            .await;

        assert_eq!(layout.dirs.config, PathBuf::from("/xdg/config/torbrowser"));
        assert_eq!(layout.dirs.cache, PathBuf::from("/xdg/cache/torbrowser"));
        assert_eq!(
            layout.dirs.local,
            PathBuf::from("/home/amnesia/.local/share/torbrowser")
        );
        assert_eq!(
            layout.signing_keys.wkd_tmp,
            PathBuf::from("/xdg/cache/torbrowser/torbrowser.gpg")
        );
    }

    #[tokio::test]
    async fn test_mirror_priority_order() {
        let layout = resolver(Path::new("/home/amnesia")).resolve().await;
        assert_eq!(
            layout.mirrors_txt,
            vec![
                PathBuf::from("/usr/share/torbrowser-launcher/mirrors.txt"),
                PathBuf::from("/home/amnesia/.config/torbrowser/mirrors.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_fallback_home_when_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let layout = PathResolver::default()
            .without_home()
            .with_user("amnesia")
            .with_fallback_root(temp.path())
            .resolve()
            .await;

        let fallback = temp.path().join(".torbrowser-amnesia");
        assert!(fallback.is_dir());
        assert_eq!(layout.dirs.config, fallback.join(".config").join("torbrowser"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&fallback).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }
    }

    #[tokio::test]
    async fn test_artifact_paths() {
        let layout = resolver(Path::new("/home/amnesia")).resolve().await;
        let artifacts = layout.artifacts("13.0.1");

        assert_eq!(
            artifacts.tarball_filename,
            "tor-browser-linux64-13.0.1_ALL.tar.xz"
        );
        assert_eq!(
            artifacts.tarball_url,
            "torbrowser/13.0.1/tor-browser-linux64-13.0.1_ALL.tar.xz"
        );
        assert_eq!(
            artifacts.sig_url,
            "torbrowser/13.0.1/tor-browser-linux64-13.0.1_ALL.tar.xz.asc"
        );
        assert_eq!(
            artifacts.sig_file,
            PathBuf::from(
                "/home/amnesia/.cache/torbrowser/download/tor-browser-linux64-13.0.1_ALL.tar.xz.asc"
            )
        );

        let i686 = resolver(Path::new("/home/amnesia"))
            .with_architecture(Architecture::I686)
            .resolve()
            .await;
        assert_eq!(
            i686.artifacts("13.0.1").tarball_filename,
            "tor-browser-linux32-13.0.1_ALL.tar.xz"
        );
        assert!(i686.tbb.dir.ends_with("tbb/i686"));
    }

    #[tokio::test]
    async fn test_ensure_base_dirs_creates_all() {
        let temp = tempfile::tempdir().unwrap();
        let layout = resolver(temp.path()).resolve().await;

        let issues = layout.ensure_base_dirs().await;
        assert!(issues.is_empty());
        for dir in layout.dirs.all() {
            assert!(dir.is_dir());
        }

        let issues = layout.ensure_runtime_dirs().await;
        assert!(issues.is_empty());
        assert!(layout.download_dir.is_dir());
        assert!(layout.tbb.dir.is_dir());
    }

    #[tokio::test]
    async fn test_ensure_base_dirs_reports_and_continues() {
        let temp = tempfile::tempdir().unwrap();
        // A regular file where the config root should go
        std::fs::write(temp.path().join("blocked"), b"").unwrap();
        let layout = resolver(temp.path())
            .with_xdg(Some(temp.path().join("blocked")), None, None)
            .resolve()
            .await;

        let issues = layout.ensure_base_dirs().await;
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, layout.dirs.config);
        assert!(layout.dirs.cache.is_dir());
        assert!(layout.dirs.local.is_dir());
    }
}
