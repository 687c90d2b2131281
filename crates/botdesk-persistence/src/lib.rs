//! Persistence layer for BotDesk.
//!
//! Client-side durable state (session tokens, cached user profile, used OAuth
//! codes) kept in a small key/value store written with atomic file
//! operations (write to temp file, then rename).
//!
//! # Example
//!
//! ```no_run
//! use botdesk_persistence::{paths, FileStore, KeyValueStore, TOKEN_KEY};
//!
//! let store = FileStore::new(paths::session_file(&paths::state_dir()));
//! store.set(TOKEN_KEY, "access-token").unwrap();
//! assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("access-token"));
//! ```

pub mod atomic;
pub mod error;
pub mod paths;
pub mod store;

pub use error::{PersistenceError, Result};
pub use store::{
    FileStore, KeyValueStore, MemoryStore, REFRESH_TOKEN_KEY, TOKEN_KEY, USED_GOOGLE_CODES_KEY,
    USER_KEY,
};
