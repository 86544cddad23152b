use std::{collections::HashMap, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

const ENABLE_LOGS: bool = true;
use crate::log_debug;

/// Identifies one navigation flow. Passed to the next screen as its route
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    pub fn new() -> Self {
        FlowId(Uuid::new_v4())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for FlowId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(FlowId)
    }
}

/// Hands a payload from one screen to the next.
///
/// Each flow stages under its own [`FlowId`], so two flows started back to
/// back keep their own payloads instead of the later one overwriting the
/// earlier.
pub struct ResultHandoff<T> {
    slots: Arc<Mutex<HashMap<FlowId, T>>>,
}

impl<T> Clone for ResultHandoff<T> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<T> Default for ResultHandoff<T> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone> ResultHandoff<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `payload` under a fresh id and returns it.
    pub async fn stage(&self, payload: T) -> FlowId {
        let id = FlowId::new();
        self.slots.lock().await.insert(id, payload);
        log_debug!("staged handoff {id}");
        id
    }

    pub async fn peek(&self, id: FlowId) -> Option<T> {
        self.slots.lock().await.get(&id).cloned()
    }

    /// Consumes the payload; a second `take` for the same flow gets `None`.
    pub async fn take(&self, id: FlowId) -> Option<T> {
        self.slots.lock().await.remove(&id)
    }

    pub async fn discard(&self, id: FlowId) {
        self.slots.lock().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.lock().await.is_empty()
    }
}
