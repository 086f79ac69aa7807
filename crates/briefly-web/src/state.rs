use briefly_core::SummaryPool;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pool: SummaryPool,
    /// Model name reported by `/health` and shown on the index page.
    pub model: String,
}
