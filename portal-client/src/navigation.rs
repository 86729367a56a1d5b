//! Effectful navigation
//!
//! Code that decides *where* to go (landing routes, guard decisions) is pure;
//! performing the move goes through this trait so it can be swapped for a
//! recorder in tests or a printer in the CLI.

use std::sync::Mutex;
use tracing::debug;

pub trait Navigator: Send + Sync {
    /// Request navigation to an application path
    fn navigate(&self, path: &str);
}

/// Records requested navigations in order
#[derive(Debug, Default)]
pub struct NavigationRecorder {
    history: Mutex<Vec<String>>,
}

impl NavigationRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        match self.history.lock() {
            Ok(history) => history.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last(&self) -> Option<String> {
        self.history().pop()
    }

    /// How many times `path` was requested
    pub fn count(&self, path: &str) -> usize {
        self.history().iter().filter(|p| p.as_str() == path).count()
    }

    pub fn clear(&self) {
        match self.history.lock() {
            Ok(mut history) => history.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl Navigator for NavigationRecorder {
    fn navigate(&self, path: &str) {
        debug!(path, "Navigation requested");
        match self.history.lock() {
            Ok(mut history) => history.push(path.to_string()),
            Err(poisoned) => poisoned.into_inner().push(path.to_string()),
        }
    }
}
