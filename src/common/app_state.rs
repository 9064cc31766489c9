use std::sync::Arc;

use crate::session::engine::QuizEngine;

pub struct AppState {
    engine: Arc<QuizEngine>,
}

impl AppState {
    pub fn new(engine: Arc<QuizEngine>) -> Arc<Self> {
        Arc::new(Self { engine })
    }

    pub fn engine(&self) -> &Arc<QuizEngine> {
        &self.engine
    }
}
