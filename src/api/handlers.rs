use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::ApiState;
use crate::dynamic::Message;
use crate::provider::PROVIDER_NAME;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderStatus {
    pub version: String,
    pub provider: String,
    pub snapshots_received: u64,
    pub instances: usize,
    pub last_update: Option<u64>,
}

pub async fn get_status(State(state): State<ApiState>) -> Json<ProviderStatus> {
    let instances = state
        .store
        .latest()
        .map(|m| m.snapshot.len())
        .unwrap_or_default();

    Json(ProviderStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: PROVIDER_NAME.to_string(),
        snapshots_received: state.store.received(),
        instances,
        last_update: state.store.last_update(),
    })
}

pub async fn get_rawdata(State(state): State<ApiState>) -> Result<Json<Message>, StatusCode> {
    state
        .store
        .latest()
        .map(|m| Json(Message::clone(&m)))
        .ok_or(StatusCode::NOT_FOUND)
}
