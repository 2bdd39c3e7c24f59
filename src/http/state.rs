use crate::session::VoiceInput;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Registered input widgets (widget_id → capture handle)
    pub widgets: Arc<RwLock<HashMap<String, Arc<VoiceInput>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            widgets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a widget's capture handle under an id.
    pub async fn register(&self, widget_id: impl Into<String>, input: Arc<VoiceInput>) {
        self.widgets.write().await.insert(widget_id.into(), input);
    }

    pub async fn get(&self, widget_id: &str) -> Option<Arc<VoiceInput>> {
        self.widgets.read().await.get(widget_id).cloned()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
