use crate::services::SwipeSession;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: SwipeSession,
}

impl AppState {
    pub fn new(session: SwipeSession) -> Self {
        Self { session }
    }
}
