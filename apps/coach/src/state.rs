use std::sync::Arc;

use crate::llm_client::TextGenerator;
use crate::session::{Difficulty, SessionState};
use crate::store::Store;

/// Shared application context passed to every interview operation.
/// Cloning is cheap; clones share the same store and generator.
#[derive(Clone)]
pub struct AppState {
    pub store: Store<SessionState>,
    /// Pluggable generator. `GeminiClient` in production, a scripted double in tests.
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn TextGenerator>, default_difficulty: Difficulty) -> Self {
        Self {
            store: Store::new(SessionState::with_difficulty(default_difficulty)),
            generator,
        }
    }

    pub fn session(&self) -> Arc<SessionState> {
        self.store.get_state()
    }
}
