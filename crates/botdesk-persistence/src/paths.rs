//! Locations of BotDesk's state on disk.
//!
//! ```text
//! ~/.botdesk/
//! ├── .env            # Optional environment overrides
//! └── session.json    # Key/value store: tokens, user profile, used OAuth codes
//! ```
//!
//! `BOTDESK_STATE_DIR` overrides the base directory.

use std::path::{Path, PathBuf};

/// Environment variable for a custom state directory.
pub const STATE_DIR_ENV: &str = "BOTDESK_STATE_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".botdesk";

const SESSION_FILE: &str = "session.json";
const ENV_FILE: &str = ".env";

/// Get the BotDesk state directory.
///
/// Resolved from:
/// 1. `BOTDESK_STATE_DIR` if set
/// 2. `~/.botdesk` if a home directory is available
/// 3. `.botdesk` in the current directory as fallback
pub fn state_dir() -> PathBuf {
    std::env::var(STATE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(DEFAULT_STATE_DIR))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
        })
}

/// Session store file inside `state_dir`.
pub fn session_file(state_dir: &Path) -> PathBuf {
    state_dir.join(SESSION_FILE)
}

/// Environment file inside `state_dir`.
pub fn env_file(state_dir: &Path) -> PathBuf {
    state_dir.join(ENV_FILE)
}
