// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! HTTP surface of the gateway: batch prediction and health checking.
//!
//! `POST /` takes `{"samples": [{...}, ...]}` and answers
//! `{"predictions": [...]}` in sample order. `GET /healthz` reports whether
//! the backend can still serve the model.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::startup::ModelSnapshot;
use crate::translate;

#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<ModelSnapshot>,
}

/// Builds the gateway router around a completed startup snapshot.
pub fn router(snapshot: Arc<ModelSnapshot>) -> Router {
    Router::new()
        .route("/", post(predict))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { snapshot })
}

/// Synchronizes with the backend, then serves until the listener fails.
///
/// # Errors
///
/// Returns any startup error, plus listener bind and serve failures.
pub async fn run(config: Config) -> Result<()> {
    let snapshot = ModelSnapshot::initialize(&config).await?;
    let app = router(Arc::new(snapshot));

    let host = config
        .server
        .host
        .parse()
        .map_err(|e| Error::Config(format!("invalid listen host `{}`: {e}", config.server.host)))?;
    let addr = SocketAddr::new(host, config.server.port);

    info!(%addr, "serving model");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Translates a batch of JSON samples through the backend, one prediction
/// per sample, aborting the whole batch on the first failure.
async fn predict(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            error!(error = %err, "request body is not parseable JSON");
            return (StatusCode::BAD_REQUEST, Error::MalformedJson(err).to_string())
                .into_response();
        }
    };

    let samples = match batch_samples(&payload) {
        Ok(samples) => samples,
        Err(err) => {
            error!("{err}");
            return (StatusCode::NOT_ACCEPTABLE, err.to_string()).into_response();
        }
    };

    info!(samples = samples.len(), "predicting");

    let snapshot = &state.snapshot;
    let mut predictions = Vec::with_capacity(samples.len());
    for (index, sample) in samples.iter().enumerate() {
        match predict_sample(snapshot, sample).await {
            Ok(prediction) => {
                debug!(sample = index + 1, "sample predicted");
                predictions.push(prediction);
            }
            Err(err) => {
                let message = format!("prediction failed for sample {}: {err}", index + 1);
                error!("{message}");
                return (StatusCode::NOT_ACCEPTABLE, message).into_response();
            }
        }
    }

    Json(json!({ "predictions": predictions })).into_response()
}

/// Validates the top-level batch payload shape.
fn batch_samples(payload: &Value) -> Result<&Vec<Value>> {
    let samples = payload
        .as_object()
        .and_then(|object| object.get("samples"))
        .ok_or_else(|| {
            Error::Validation("top level `samples` key not found in request".to_string())
        })?;
    samples.as_array().ok_or_else(|| {
        Error::Validation("expected the value of key `samples` to be a list of json objects".to_string())
    })
}

async fn predict_sample(snapshot: &ModelSnapshot, sample: &Value) -> Result<Value> {
    let request =
        translate::build_predict_request(&snapshot.model_name, &snapshot.signature, sample)?;
    let response = snapshot.client.predict(request).await?;
    translate::parse_predict_response(&response)
}

/// Reports binary backend health from a live model-status round trip.
async fn healthz(State(state): State<AppState>) -> Response {
    let snapshot = &state.snapshot;

    let status = match snapshot.client.model_status(&snapshot.model_name).await {
        Ok(status) => status,
        Err(err) => {
            error!(error = %err, "health check failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("model status unavailable: {err}"),
            )
                .into_response();
        }
    };

    match status.model_version_status.first() {
        Some(version) => {
            // An absent status sub-message means code 0, i.e. healthy.
            let code = version.status.as_ref().map_or(0, |s| s.error_code);
            if code == 0 {
                Json(json!({ "ok": true })).into_response()
            } else {
                let detail = version
                    .status
                    .as_ref()
                    .map(|s| s.error_message.clone())
                    .unwrap_or_default();
                let message = format!(
                    "non-zero status for model version {}: code {code} ({detail})",
                    version.version
                );
                error!("{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
        None => {
            let message = "backend reported no model version status".to_string();
            error!("{message}");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_samples_requires_samples_key() {
        for payload in [json!({}), json!([1, 2]), json!("samples"), json!(null)] {
            let err = batch_samples(&payload).unwrap_err();
            assert!(err.to_string().contains("`samples` key not found"), "{err}");
        }
    }

    #[test]
    fn batch_samples_requires_a_list() {
        let err = batch_samples(&json!({ "samples": {"age": 1} })).unwrap_err();
        assert!(err.to_string().contains("list of json objects"), "{err}");
    }

    #[test]
    fn batch_samples_accepts_empty_batches() {
        let payload = json!({ "samples": [] });
        assert!(batch_samples(&payload).unwrap().is_empty());
    }
}
