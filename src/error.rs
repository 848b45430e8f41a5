// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the prediction gateway.
//!
//! [`Error`] is the single error type returned by fallible operations in this
//! crate, paired with the [`Result`] alias.

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that may occur while translating requests or talking to the
/// serving backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body was not parseable JSON at all.
    #[error("Malformed JSON")]
    MalformedJson(#[source] serde_json::Error),

    /// The batch payload does not have the required top-level structure.
    #[error("{0}")]
    Validation(String),

    /// A sample could not be converted to or from the tensor protocol.
    #[error("{0}")]
    Translation(String),

    /// An element type has no entry in the type mapping table.
    #[error("{0}")]
    Mapping(String),

    /// Failed to establish or maintain a gRPC connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The gRPC transport layer returned an error.
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The backend returned a gRPC status error.
    #[error("backend error (code={code}): {message}")]
    Grpc {
        /// The gRPC status code.
        code: tonic::Code,
        /// The error message from the backend.
        message: String,
    },

    /// Model metadata never became usable within the startup retry budget.
    #[error("startup failed: {0}")]
    Startup(String),

    /// The gateway configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An underlying I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be deserialized.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Self::Grpc {
            code: status.code(),
            message: status.message().to_owned(),
        }
    }
}
