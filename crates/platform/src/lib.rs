#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem primitives shared by the launcher crates.
//!
//! Everything the launcher persists lives in per-user directories that must be
//! private to the owner, and every file it rewrites must never be observable
//! half-written. The helpers in [`fs`] encode both rules so callers don't have
//! to repeat them.

pub mod fs;
