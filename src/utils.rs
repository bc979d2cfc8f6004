use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};

/// Name of the exported context file for `now`
///
/// Characters that are invalid in file names on some platforms are replaced
/// with `-`, e.g. `host-context-data-2024-12-20T10-00-00-000Z.txt`.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("host-context-data-{}.txt", stamp)
}

/// Resolves where an export goes: a directory gets a timestamped file name, anything else is used as is
pub fn export_path(target: &Path, now: DateTime<Utc>) -> PathBuf {
    if target.is_dir() {
        target.join(export_filename(now))
    } else {
        target.to_path_buf()
    }
}
