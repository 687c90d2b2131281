//! BotDesk CLI library.
//!
//! Command-line front end for the BotDesk backend: account login, bot
//! management, knowledge-base uploads with status watching, and feedback
//! review.

pub mod cli;
pub mod commands;
pub mod output;

use std::path::{Path, PathBuf};

use botdesk_persistence::paths;

/// Loads environment overrides.
///
/// `.env.local` and `.env` in the working directory come first, then the
/// `.env` inside the state directory. Variables already set are never
/// overwritten. Returns the files that were loaded.
pub fn load_env_files(state_dir: &Path) -> Vec<PathBuf> {
    let candidates = [
        PathBuf::from(".env.local"),
        PathBuf::from(".env"),
        paths::env_file(state_dir),
    ];
    candidates
        .into_iter()
        .filter(|path| dotenvy::from_path(path).is_ok())
        .collect()
}
