//! Fixed names and endpoints baked into the launcher.
//!
//! None of these are exposed through settings.json; they describe where the
//! launcher itself lives and where Tor Project publishes releases.

/// Directory name used under each XDG base directory.
pub const APP_DIR_NAME: &str = "torbrowser";

/// Name of the packaged data directory (`<prefix>/share/<name>`).
pub const SHARE_DIR_NAME: &str = "torbrowser-launcher";

/// Packaged data directory when `TBL_SHARE` is not set.
pub const DEFAULT_SHARE_DIR: &str = "/usr/share/torbrowser-launcher";

/// Mirror used when settings do not name one.
pub const DEFAULT_MIRROR: &str = "https://dist.torproject.org/";

/// Local Tor SOCKS listener used when settings do not name one.
pub const DEFAULT_TOR_SOCKS_ADDRESS: &str = "127.0.0.1:9050";

/// Transport prefix older releases stored in `tor_socks_address`.
pub const LEGACY_SOCKS_PREFIX: &str = "tcp:";

/// Directory prefix of pre-12.0 localized Tor Browser installs.
pub const LEGACY_TBB_PREFIX: &str = "tor-browser_";

/// Update feed queried for the latest release.
pub const VERSION_CHECK_URL: &str =
    "https://aus1.torproject.org/torbrowser/update_3/release/Linux_x86_64-gcc3/x/ALL";
