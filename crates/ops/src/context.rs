//! Launcher context and the startup sequence that builds it

use crate::types::BootstrapReport;
use std::sync::Arc;
use tbl_config::{
    migrate_legacy_install, ArtifactPaths, Layout, MirrorList, NetworkConfig, PathResolver,
    Settings, SettingsStore,
};
use tbl_errors::Error;
use tbl_net::{NetClient, NetConfig};
use tbl_signing::{GnupgEngine, KeyringManager, OpenPgpEngine, SigningKey};
use tracing::{debug, info, warn};

/// State established at startup, passed by reference to every operation
#[derive(Debug)]
pub struct LauncherCtx {
    /// On-disk layout
    pub layout: Layout,
    /// Settings as loaded (and migrated) at startup
    pub settings: Settings,
    /// Where settings are persisted
    pub store: SettingsStore,
    /// Merged mirror list
    pub mirrors: MirrorList,
    /// Timeouts for outbound requests
    pub network: NetworkConfig,
    /// The launcher's private keyring
    pub keyring: KeyringManager,
}

impl LauncherCtx {
    /// HTTP client honouring the timeouts and the Tor proxy setting
    ///
    /// # Errors
    ///
    /// Returns an error if the configured SOCKS address is not a valid proxy.
    pub fn net_client(&self) -> Result<NetClient, Error> {
        let config = NetConfig::from(&self.network).with_proxy(self.settings.proxy_url());
        NetClient::new(config)
    }

    /// Download locations for a given Tor Browser version
    #[must_use]
    pub fn artifacts(&self, tbb_version: &str) -> ArtifactPaths {
        self.layout.artifacts(tbb_version)
    }

    /// Persist `settings` and make them current
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be written.
    pub async fn update_settings(&mut self, settings: Settings) -> Result<(), Error> {
        self.store.save(&settings).await?;
        self.settings = settings;
        Ok(())
    }
}

/// Builder that runs the startup sequence
pub struct LauncherCtxBuilder {
    resolver: Option<PathResolver>,
    version: String,
    network: Option<NetworkConfig>,
    engine: Option<Arc<dyn OpenPgpEngine>>,
    import_keys: bool,
}

impl Default for LauncherCtxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherCtxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            network: None,
            engine: None,
            import_keys: true,
        }
    }

    /// Set path resolver (defaults to the process environment)
    #[must_use]
    pub fn with_resolver(mut self, resolver: PathResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set the launcher version recorded in settings
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set network configuration
    #[must_use]
    pub fn with_network(mut self, network: NetworkConfig) -> Self {
        self.network = Some(network);
        self
    }

    /// Set OpenPGP engine (defaults to `gpg` on `PATH`)
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn OpenPgpEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Skip importing the pinned keys
    #[must_use]
    pub fn without_key_import(mut self) -> Self {
        self.import_keys = false;
        self
    }

    /// Run startup and return the context.
    ///
    /// Startup never aborts: environment and trust problems are collected in
    /// the returned [`BootstrapReport`].
    pub async fn bootstrap(self) -> (LauncherCtx, BootstrapReport) {
        let mut report = BootstrapReport::default();
        let resolver = self.resolver.unwrap_or_else(PathResolver::from_env);

        let layout = resolver.resolve().await;
        debug!(?layout, "resolved layout");

        report.migration = migrate_legacy_install(&layout.tbb).await;
        report.directory_issues = layout.ensure_base_dirs().await;

        let mirrors = MirrorList::load(&layout.mirrors_txt).await;
        report.mirror_count = mirrors.len();

        let store = SettingsStore::from_layout(&layout, &self.version);
        let settings = store.load().await;

        report
            .directory_issues
            .extend(layout.ensure_runtime_dirs().await);

        let engine = self
            .engine
            .unwrap_or_else(|| Arc::new(GnupgEngine::default()));
        let keyring = KeyringManager::from_layout(&layout, engine);

        match keyring.ensure_keyring().await {
            Ok(()) if self.import_keys => {
                report.key_imports = Some(keyring.import_all(SigningKey::PINNED).await);
            }
            Ok(()) => {}
            Err(error) => {
                warn!(path = %keyring.keyring_dir().display(), %error, "keyring unavailable");
                report.keyring_error = Some(error);
            }
        }

        if report.is_degraded() {
            warn!("startup completed in degraded mode");
        } else {
            info!(mirrors = report.mirror_count, "startup complete");
        }

        let ctx = LauncherCtx {
            layout,
            settings,
            store,
            mirrors,
            network: self.network.unwrap_or_default(),
            keyring,
        };
        (ctx, report)
    }
}
