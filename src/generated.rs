// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Protocol types generated from the `.proto` sources under `proto/`.
//!
//! Packages keep their upstream names so type URLs and field numbers stay
//! interchangeable with stock serving backends.

/// Framework types: tensors, shapes, element types, signatures.
pub mod tensorflow {
    tonic::include_proto!("tensorflow");

    /// Serving API messages and service stubs.
    pub mod serving {
        tonic::include_proto!("tensorflow.serving");
    }
}
