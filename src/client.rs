// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! The serving backend client.
//!
//! [`BackendClient`] provides an ergonomic async API for the small slice of
//! the serving protocol the gateway needs: predictions, signature metadata,
//! and per-version model status. It wraps the auto-generated gRPC stubs.
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn example() -> tfs_gateway::error::Result<()> {
//! use tfs_gateway::client::{BackendClient, ClientOptions};
//!
//! let client = BackendClient::connect_lazy("http://localhost:9000", ClientOptions::default())?;
//! let metadata = client.model_metadata("default").await?;
//! let signatures = metadata.metadata.keys().count();
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::{Error, Result};
use crate::generated::tensorflow::serving::{
    model_service_client::ModelServiceClient,
    prediction_service_client::PredictionServiceClient, GetModelMetadataRequest,
    GetModelMetadataResponse, GetModelStatusRequest, GetModelStatusResponse, ModelSpec,
    PredictRequest, PredictResponse,
};
use crate::signature::SIGNATURE_DEF_FIELD;

/// Default maximum message size for gRPC (128 MiB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 128 * 1024 * 1024;

/// Options for configuring the backend connection.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use tfs_gateway::client::ClientOptions;
///
/// let options = ClientOptions::default()
///     .connect_timeout(Duration::from_secs(2))
///     .request_timeout(Duration::from_secs(30));
/// ```
#[derive(Debug, Clone)]
pub struct ClientOptions {
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_message_size: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(5)),
            request_timeout: Some(Duration::from_secs(10)),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl ClientOptions {
    /// Sets the timeout for establishing a connection.
    #[must_use]
    pub fn connect_timeout(self, timeout: Duration) -> Self {
        Self {
            connect_timeout: Some(timeout),
            ..self
        }
    }

    /// Sets the timeout applied to each individual RPC.
    #[must_use]
    pub fn request_timeout(self, timeout: Duration) -> Self {
        Self {
            request_timeout: Some(timeout),
            ..self
        }
    }

    /// Sets the maximum gRPC message size in bytes.
    ///
    /// Default: 128 MiB.
    #[must_use]
    pub fn max_message_size(self, size: usize) -> Self {
        Self {
            max_message_size: size,
            ..self
        }
    }
}

/// A client for the backend's prediction and model services.
///
/// The client is cheaply cloneable; clones share the same underlying gRPC
/// channel and can be used concurrently from multiple tasks.
#[derive(Debug, Clone)]
pub struct BackendClient {
    inner: PredictionServiceClient<Channel>,
    addr: String,
    options: ClientOptions,
}

impl BackendClient {
    /// Creates a client whose channel connects on first use.
    ///
    /// The backend may not be reachable yet when the gateway starts; the
    /// startup synchronizer keeps retrying until metadata comes back, so no
    /// connection is attempted here.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if `addr` is not a valid endpoint URI.
    pub fn connect_lazy(addr: &str, options: ClientOptions) -> Result<Self> {
        let channel = Self::endpoint(addr, &options)?.connect_lazy();

        let inner = PredictionServiceClient::new(channel)
            .max_decoding_message_size(options.max_message_size)
            .max_encoding_message_size(options.max_message_size);

        Ok(Self {
            inner,
            addr: addr.to_owned(),
            options,
        })
    }

    fn endpoint(addr: &str, options: &ClientOptions) -> Result<Endpoint> {
        let mut endpoint = Endpoint::from_shared(addr.to_owned())
            .map_err(|e| Error::Connection(format!("invalid backend address `{addr}`: {e}")))?;

        if let Some(timeout) = options.connect_timeout {
            endpoint = endpoint.connect_timeout(timeout);
        }
        if let Some(timeout) = options.request_timeout {
            endpoint = endpoint.timeout(timeout);
        }

        Ok(endpoint)
    }

    // -----------------------------------------------------------------------
    // Prediction
    // -----------------------------------------------------------------------

    /// Runs a single typed prediction.
    ///
    /// Use [`build_predict_request`](crate::translate::build_predict_request)
    /// to construct the request from a JSON sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails.
    pub async fn predict(&self, request: PredictRequest) -> Result<PredictResponse> {
        let response = self.inner.clone().predict(request).await?;
        Ok(response.into_inner())
    }

    // -----------------------------------------------------------------------
    // Metadata
    // -----------------------------------------------------------------------

    /// Retrieves model metadata with the signature definitions requested.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The servable to query.
    ///
    /// # Errors
    ///
    /// Returns an error if the gRPC call fails, including while the backend
    /// is still loading the model.
    pub async fn model_metadata(&self, model_name: &str) -> Result<GetModelMetadataResponse> {
        let request = GetModelMetadataRequest {
            model_spec: Some(ModelSpec {
                name: model_name.to_owned(),
                signature_name: String::new(),
            }),
            metadata_field: vec![SIGNATURE_DEF_FIELD.to_owned()],
        };
        let response = self.inner.clone().get_model_metadata(request).await?;
        Ok(response.into_inner())
    }

    // -----------------------------------------------------------------------
    // Model status
    // -----------------------------------------------------------------------

    /// Queries the load state of every version of a model.
    ///
    /// Each call dials the backend anew instead of reusing the prediction
    /// channel, and nothing is cached: the answer always reflects a live
    /// round trip.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or the gRPC call fails.
    pub async fn model_status(&self, model_name: &str) -> Result<GetModelStatusResponse> {
        let channel = Self::endpoint(&self.addr, &self.options)?.connect().await?;
        let mut client = ModelServiceClient::new(channel);

        let request = GetModelStatusRequest {
            model_spec: Some(ModelSpec {
                name: model_name.to_owned(),
                signature_name: String::new(),
            }),
        };
        let response = client.get_model_status(request).await?;
        Ok(response.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
