// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! In-process serving backend stub shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use prost::Message;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tonic::{Request, Response, Status};

use tfs_gateway::config::Config;
use tfs_gateway::generated::tensorflow::serving::{
    model_service_server::{ModelService, ModelServiceServer},
    model_version_status,
    prediction_service_server::{PredictionService, PredictionServiceServer},
    GetModelMetadataRequest, GetModelMetadataResponse, GetModelStatusRequest,
    GetModelStatusResponse, ModelVersionStatus, PredictRequest, PredictResponse, SignatureDefMap,
    StatusProto,
};
use tfs_gateway::generated::tensorflow::{
    tensor_shape_proto, DataType, SignatureDef, TensorInfo, TensorShapeProto,
};
use tfs_gateway::{server, ModelSnapshot};

/// Serving backend stub: echoes prediction inputs back as outputs and
/// serves configurable signature metadata and version status.
#[derive(Clone)]
pub struct StubBackend {
    signatures: Vec<(String, Vec<(String, DataType)>)>,
    predict_error: Option<String>,
    version_status: Vec<(i64, i32, String)>,
    metadata_failures: Arc<AtomicU32>,
    metadata_calls: Arc<AtomicU32>,
    predict_calls: Arc<AtomicU32>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            signatures: vec![(
                "serving_default".to_string(),
                vec![
                    ("age".to_string(), DataType::DtInt32),
                    ("scores".to_string(), DataType::DtFloat),
                ],
            )],
            predict_error: None,
            version_status: vec![(1, 0, String::new())],
            metadata_failures: Arc::new(AtomicU32::new(0)),
            metadata_calls: Arc::new(AtomicU32::new(0)),
            predict_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Replaces the inputs of the sole default signature.
    pub fn with_inputs(mut self, inputs: &[(&str, DataType)]) -> Self {
        self.signatures = vec![("serving_default".to_string(), owned_inputs(inputs))];
        self
    }

    /// Adds another exported signature.
    pub fn with_signature(mut self, name: &str, inputs: &[(&str, DataType)]) -> Self {
        self.signatures.push((name.to_string(), owned_inputs(inputs)));
        self
    }

    /// Fails this many GetModelMetadata calls before succeeding.
    pub fn with_metadata_failures(self, failures: u32) -> Self {
        self.metadata_failures.store(failures, Ordering::SeqCst);
        self
    }

    /// Makes every Predict call fail with an internal error.
    pub fn with_predict_error(mut self, message: &str) -> Self {
        self.predict_error = Some(message.to_string());
        self
    }

    /// Replaces the reported per-version status list.
    pub fn with_version_status(mut self, status: &[(i64, i32, &str)]) -> Self {
        self.version_status = status
            .iter()
            .map(|(version, code, message)| (*version, *code, (*message).to_string()))
            .collect();
        self
    }

    pub fn metadata_calls(&self) -> u32 {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn predict_calls(&self) -> u32 {
        self.predict_calls.load(Ordering::SeqCst)
    }

    /// Serves both backend services on an ephemeral port.
    pub async fn spawn(self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let incoming = TcpListenerStream::new(listener);

        tokio::spawn(async move {
            Server::builder()
                .add_service(PredictionServiceServer::new(self.clone()))
                .add_service(ModelServiceServer::new(self))
                .serve_with_incoming(incoming)
                .await
                .unwrap();
        });

        addr
    }
}

fn owned_inputs(inputs: &[(&str, DataType)]) -> Vec<(String, DataType)> {
    inputs
        .iter()
        .map(|(field, dtype)| ((*field).to_string(), *dtype))
        .collect()
}

fn tensor_info(field: &str, dtype: DataType) -> TensorInfo {
    TensorInfo {
        name: format!("{field}:0"),
        dtype: dtype as i32,
        tensor_shape: Some(TensorShapeProto {
            dim: vec![tensor_shape_proto::Dim {
                size: -1,
                name: String::new(),
            }],
            unknown_rank: false,
        }),
    }
}

fn signature_def(inputs: &[(String, DataType)]) -> SignatureDef {
    SignatureDef {
        inputs: inputs
            .iter()
            .map(|(field, dtype)| (field.clone(), tensor_info(field, *dtype)))
            .collect(),
        outputs: HashMap::new(),
        method_name: "tensorflow/serving/predict".to_string(),
    }
}

#[tonic::async_trait]
impl PredictionService for StubBackend {
    async fn predict(
        &self,
        request: Request<PredictRequest>,
    ) -> Result<Response<PredictResponse>, Status> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.predict_error {
            return Err(Status::internal(message.clone()));
        }

        let request = request.into_inner();
        Ok(Response::new(PredictResponse {
            model_spec: request.model_spec,
            outputs: request.inputs,
        }))
    }

    async fn get_model_metadata(
        &self,
        request: Request<GetModelMetadataRequest>,
    ) -> Result<Response<GetModelMetadataResponse>, Status> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .metadata_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Status::unavailable("model is still loading"));
        }

        let map = SignatureDefMap {
            signature_def: self
                .signatures
                .iter()
                .map(|(name, inputs)| (name.clone(), signature_def(inputs)))
                .collect(),
        };
        let packed = prost_types::Any {
            type_url: "type.googleapis.com/tensorflow.serving.SignatureDefMap".to_string(),
            value: map.encode_to_vec(),
        };

        Ok(Response::new(GetModelMetadataResponse {
            model_spec: request.into_inner().model_spec,
            metadata: HashMap::from([("signature_def".to_string(), packed)]),
        }))
    }
}

#[tonic::async_trait]
impl ModelService for StubBackend {
    async fn get_model_status(
        &self,
        _request: Request<GetModelStatusRequest>,
    ) -> Result<Response<GetModelStatusResponse>, Status> {
        let model_version_status = self
            .version_status
            .iter()
            .map(|(version, code, message)| ModelVersionStatus {
                version: *version,
                state: model_version_status::State::Available as i32,
                status: Some(StatusProto {
                    error_code: *code,
                    error_message: message.clone(),
                }),
            })
            .collect();

        Ok(Response::new(GetModelStatusResponse {
            model_version_status,
        }))
    }
}

/// Gateway configuration pointed at a spawned stub, with a fast retry
/// schedule so tests stay quick.
pub fn test_config(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.backend.addr = format!("http://{addr}");
    config.backend.request_timeout_secs = 5;
    config.backend.connect_timeout_secs = 2;
    config.startup.max_attempts = 20;
    config.startup.interval_millis = 25;
    config
}

/// Runs the full startup synchronization against the stub and returns the
/// ready-to-serve router.
pub async fn gateway(addr: SocketAddr) -> axum::Router {
    let config = test_config(addr);
    let snapshot = ModelSnapshot::initialize(&config).await.unwrap();
    server::router(Arc::new(snapshot))
}
