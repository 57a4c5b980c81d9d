//! System setup and initialization

use crate::error::CliError;
use tbl_config::NetworkConfig;
use tbl_ops::{BootstrapReport, LauncherCtx, LauncherCtxBuilder};
use tracing::{debug, info, warn};

/// Settings resolved from the environment and command line before startup
pub struct SystemSetup {
    network: NetworkConfig,
}

impl SystemSetup {
    /// Layer network settings: defaults, then environment, then `--timeout`
    pub fn new(timeout: Option<u64>) -> Result<Self, CliError> {
        let mut network = NetworkConfig::default();
        network.merge_env()?;
        if let Some(secs) = timeout {
            network.set_timeout(secs);
        }
        debug!(?network, "network configuration");
        Ok(Self { network })
    }

    /// Run the launcher startup sequence
    pub async fn initialize(
        &self,
        import_keys: bool,
    ) -> Result<(LauncherCtx, BootstrapReport), CliError> {
        info!("Initializing launcher state");

        let mut builder = LauncherCtxBuilder::new().with_network(self.network.clone());
        if !import_keys {
            builder = builder.without_key_import();
        }
        let (ctx, report) = builder.bootstrap().await;

        if let Some(error) = &report.keyring_error {
            if import_keys {
                return Err(CliError::Setup(format!(
                    "keyring {} unavailable: {error}",
                    ctx.keyring.keyring_dir().display()
                )));
            }
            warn!(%error, "continuing without keyring");
        }

        info!("Launcher initialization completed");
        Ok((ctx, report))
    }
}
