// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! HTTP JSON prediction gateway for TensorFlow Serving gRPC backends.
//!
//! This crate fronts a model-serving backend with a plain JSON batch API:
//! clients `POST {"samples": [...]}` and get `{"predictions": [...]}` back,
//! while the gateway owns the typed tensor protocol, the signature handshake,
//! and startup synchronization with the backend.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tfs_gateway::config::Config;
//!
//! # async fn example() -> tfs_gateway::error::Result<()> {
//! // Wait for the backend's model, then serve HTTP.
//! let config = Config::default();
//! tfs_gateway::server::run(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`server`] -- The HTTP surface: batch prediction and health endpoints.
//! - [`translate`] -- JSON samples to typed tensors and back.
//! - [`signature`] -- Signature metadata unpacking and designation.
//! - [`startup`] -- Synchronization with the backend before serving.
//! - [`client`] -- The [`BackendClient`](client::BackendClient) gRPC wrapper.
//! - [`config`] -- YAML configuration with environment overrides.
//! - [`error`] -- Error types and the [`Result`](error::Result) alias.
//! - [`generated`] -- Raw protobuf/gRPC generated types for advanced usage.

pub mod client;
pub mod config;
pub mod error;
pub mod generated;
pub mod server;
pub mod signature;
pub mod startup;
pub mod translate;

/// Re-export of the backend client for convenience.
pub use client::BackendClient;
/// Re-export of the startup snapshot handed to the HTTP layer.
pub use startup::ModelSnapshot;
