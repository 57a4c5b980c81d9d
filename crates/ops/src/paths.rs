//! Flattened view of the layout for display

use crate::types::PathEntry;
use tbl_config::Layout;

fn entry(name: &str, value: impl Into<String>) -> PathEntry {
    PathEntry {
        name: name.to_string(),
        value: value.into(),
    }
}

/// Every path the launcher uses, plus download locations for `tbb_version`
#[must_use]
pub fn describe_paths(layout: &Layout, tbb_version: Option<&str>) -> Vec<PathEntry> {
    let show = |p: &std::path::Path| p.display().to_string();

    let mut entries = vec![
        entry("architecture", layout.architecture.as_str()),
        entry("config_dir", show(&layout.dirs.config)),
        entry("cache_dir", show(&layout.dirs.cache)),
        entry("local_dir", show(&layout.dirs.local)),
        entry("old_data_dir", show(&layout.old_data_dir)),
        entry("tbl_bin", show(&layout.tbl_bin)),
        entry("icon_file", show(&layout.icon_file)),
        entry("torproject_pem", show(&layout.torproject_pem)),
        entry(
            "signing_keys.tor_browser_developers",
            show(&layout.signing_keys.tor_browser_developers),
        ),
        entry("signing_keys.wkd_tmp", show(&layout.signing_keys.wkd_tmp)),
    ];
    entries.extend(
        layout
            .mirrors_txt
            .iter()
            .map(|path| entry("mirrors_txt", show(path))),
    );
    entries.extend([
        entry("download_dir", show(&layout.download_dir)),
        entry("gnupg_homedir", show(&layout.gnupg_homedir)),
        entry("settings_file", show(&layout.settings_file)),
        entry("settings_file_pickle", show(&layout.settings_file_pickle)),
        entry("version_check_url", layout.version_check_url.clone()),
        entry("version_check_file", show(&layout.version_check_file)),
        entry("tbb.dir", show(&layout.tbb.dir)),
        entry("tbb.dir_tbb", show(&layout.tbb.dir_tbb)),
        entry("tbb.start", show(&layout.tbb.start)),
        entry("tbb.changelog", show(&layout.tbb.changelog)),
    ]);

    if let Some(version) = tbb_version {
        let artifacts = layout.artifacts(version);
        entries.extend([
            entry("tarball_url", artifacts.tarball_url),
            entry("tarball_file", show(&artifacts.tarball_file)),
            entry("sig_url", artifacts.sig_url),
            entry("sig_file", show(&artifacts.sig_file)),
        ]);
    }

    entries
}
