//! Key refresh and signature verification operations

use crate::{KeyImportSummary, LauncherCtx, RefreshSummary};
use std::path::Path;
use tbl_errors::Error;
use tbl_signing::{KeyRefresher, SigningKey};
use tracing::info;

/// Fetch the signing key over WKD and import it
///
/// # Errors
///
/// Returns an error if the key cannot be downloaded or written. A key that
/// downloads but does not match the pinned fingerprint is reported through
/// the summary instead.
pub async fn refresh_keys(ctx: &LauncherCtx) -> Result<RefreshSummary, Error> {
    let refresher = KeyRefresher::new(ctx.net_client()?)?;
    refresh_keys_with(ctx, &refresher).await
}

/// Same as [`refresh_keys`] with an explicit refresher
///
/// # Errors
///
/// See [`refresh_keys`].
pub async fn refresh_keys_with(
    ctx: &LauncherCtx,
    refresher: &KeyRefresher,
) -> Result<RefreshSummary, Error> {
    info!(
        url = refresher.url(),
        over_tor = ctx.settings.download_over_tor,
        "refreshing signing key"
    );
    let outcome = refresher.refresh(&ctx.keyring).await?;
    Ok(RefreshSummary {
        url: refresher.url().to_string(),
        import: KeyImportSummary::new(SigningKey::WkdTmp, &outcome),
    })
}

/// Verify `file` against its detached signature `sig`
///
/// # Errors
///
/// Returns an error if the signature is bad or could not be checked.
pub async fn verify(ctx: &LauncherCtx, file: &Path, sig: &Path) -> Result<(), Error> {
    ctx.keyring.verify_signature(file, sig).await
}
