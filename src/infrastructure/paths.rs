//! Data directory resolution.
//!
//! The data directory holds the persisted state file and the span export. It
//! comes from `Config::data_dir` when set, otherwise from the XDG base
//! directory conventions.

use crate::Config;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory name used under the platform data root.
pub const APP_DIR_NAME: &str = "reelsearch";

/// Returns the data directory for `config`.
///
/// `config.data_dir` wins when set (with `~` expanded). Otherwise see
/// [`default_data_dir`].
///
/// # Examples
///
/// ```
/// use reelsearch::infrastructure::data_dir;
/// use reelsearch::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     data_dir: Some("/var/lib/reelsearch".to_string()),
///     ..Config::default()
/// };
/// assert_eq!(data_dir(&config), PathBuf::from("/var/lib/reelsearch"));
/// ```
#[must_use]
pub fn data_dir(config: &Config) -> PathBuf {
    config
        .data_dir
        .as_deref()
        .map_or_else(default_data_dir, expand_tilde)
}

/// Returns `$XDG_DATA_HOME/reelsearch`, falling back to
/// `~/.local/share/reelsearch`, and finally to the system temp directory when
/// no home directory is known.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    resolve_default(
        std::env::var_os("XDG_DATA_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_default(xdg_data_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    // Relative XDG paths are ignored.
    if let Some(xdg) = xdg_data_home.map(PathBuf::from).filter(|p| p.is_absolute()) {
        return xdg.join(APP_DIR_NAME);
    }
    if let Some(home) = home.filter(|h| !h.is_empty()) {
        return PathBuf::from(home).join(".local").join("share").join(APP_DIR_NAME);
    }
    std::env::temp_dir().join(APP_DIR_NAME)
}

/// Expands a leading `~` using `$HOME`.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    expand_tilde_with(path, home.as_deref())
}

/// Expands a leading `~` against an explicit home directory.
///
/// Only `~` and `~/...` are expanded; `~user` forms and paths without a home
/// directory are returned unchanged.
///
/// # Examples
///
/// ```
/// use reelsearch::infrastructure::expand_tilde_with;
/// use std::path::{Path, PathBuf};
///
/// let home = Some(Path::new("/home/ana"));
/// assert_eq!(expand_tilde_with("~/data", home), PathBuf::from("/home/ana/data"));
/// assert_eq!(expand_tilde_with("~", home), PathBuf::from("/home/ana"));
/// assert_eq!(expand_tilde_with("/srv/data", home), PathBuf::from("/srv/data"));
/// ```
#[must_use]
pub fn expand_tilde_with(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (_, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        _ => PathBuf::from(path),
    }
}
