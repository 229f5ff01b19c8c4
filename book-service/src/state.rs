//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::repository::BookRepository;

/// Application state shared across handlers
///
/// Cloning is cheap: the configuration sits behind an `Arc` and the
/// repository holds a pool handle.
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    books: BookRepository,
}

impl AppState {
    /// Create the state from a loaded configuration and a ready repository
    pub fn new(config: Config, books: BookRepository) -> Self {
        Self {
            config: Arc::new(config),
            books,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the book repository
    pub fn books(&self) -> &BookRepository {
        &self.books
    }
}

#[cfg(test)]
impl AppState {
    /// Default configuration over an empty in-memory database
    pub(crate) async fn in_memory() -> Self {
        Self::new(Config::default(), crate::repository::memory_repository().await)
    }
}
