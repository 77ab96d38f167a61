use std::env;
use std::path::PathBuf;

pub fn resolve_user_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        let trimmed = home.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    if let Ok(profile) = env::var("USERPROFILE") {
        let trimmed = profile.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    None
}

/// `$TRACK_DATA_DIR` when set, otherwise `$HOME/.local/share/track`.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(value) = env::var("TRACK_DATA_DIR") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    resolve_user_home_dir().map(|home| home.join(".local").join("share").join("track"))
}

pub fn store_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("store.json"))
}
