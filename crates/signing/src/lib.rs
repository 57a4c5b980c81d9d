#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! OpenPGP trust bootstrap
//!
//! The launcher keeps its own GnuPG keyring and only trusts keys whose
//! fingerprint matches one compiled into [`FingerprintRegistry`]. Keys come
//! from packaged key material or, on demand, from the signer's Web Key
//! Directory.

mod engine;
mod fingerprint;
mod keyring;
mod refresh;
mod wkd;

pub use engine::{
    parse_import_status, parse_verify_status, GnupgEngine, ImportResult, OpenPgpEngine, VerifyResult,
};
pub use fingerprint::{
    Fingerprint, FingerprintRegistry, SigningKey, TOR_BROWSER_DEVELOPERS_FINGERPRINT,
};
pub use keyring::{ImportOutcome, ImportReport, KeyringManager};
pub use refresh::KeyRefresher;
pub use wkd::{WkdLocator, TOR_BROWSER_SIGNER};
