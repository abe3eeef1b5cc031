use std::sync::Arc;

use axum::extract::Extension;

use crate::relay::RelayState;

pub async fn metrics(Extension(state): Extension<Arc<RelayState>>) -> String {
    state.metrics.lock().render()
}
