// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Serving signature resolution.
//!
//! The backend publishes its exported signatures as a [`SignatureDefMap`]
//! packed into the `signature_def` metadata field. [`SignatureSpec`] unpacks
//! that map once at startup and designates the signature all predictions go
//! through, so request handling never consults backend metadata again.

use std::collections::HashMap;

use prost::Message;

use crate::error::{Error, Result};
use crate::generated::tensorflow::serving::{GetModelMetadataResponse, SignatureDefMap};
use crate::generated::tensorflow::{DataType, SignatureDef, TensorInfo};

/// Metadata field under which backends publish signature definitions.
pub const SIGNATURE_DEF_FIELD: &str = "signature_def";

/// The designated signature's input contract, resolved once at startup.
#[derive(Debug, Clone)]
pub struct SignatureSpec {
    name: String,
    inputs: HashMap<String, InputSpec>,
}

/// Declared element type and shape of one signature input.
#[derive(Debug, Clone)]
pub struct InputSpec {
    pub dtype: DataType,
    /// Declared dimension sizes; -1 marks an unknown dimension.
    pub shape: Vec<i64>,
}

impl InputSpec {
    fn from_info(info: &TensorInfo) -> Self {
        let shape = info
            .tensor_shape
            .as_ref()
            .map(|shape| shape.dim.iter().map(|dim| dim.size).collect())
            .unwrap_or_default();
        Self {
            dtype: info.dtype(),
            shape,
        }
    }
}

impl SignatureSpec {
    /// Creates a spec directly from already-resolved parts.
    #[must_use]
    pub fn new(name: impl Into<String>, inputs: HashMap<String, InputSpec>) -> Self {
        Self {
            name: name.into(),
            inputs,
        }
    }

    /// Unpacks the signature map from a metadata response and designates the
    /// signature to serve.
    ///
    /// With `configured` set, that signature must exist. Without it, the
    /// model must export exactly one signature; anything else needs an
    /// explicit choice in the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Startup`] if the response carries no usable
    /// signature map or designation fails.
    pub fn from_metadata(
        response: &GetModelMetadataResponse,
        configured: Option<&str>,
    ) -> Result<Self> {
        let packed = response.metadata.get(SIGNATURE_DEF_FIELD).ok_or_else(|| {
            Error::Startup("metadata response carries no `signature_def` field".to_string())
        })?;

        if !packed.type_url.ends_with("tensorflow.serving.SignatureDefMap") {
            return Err(Error::Startup(format!(
                "unexpected metadata payload type `{}`",
                packed.type_url
            )));
        }

        let map = SignatureDefMap::decode(packed.value.as_slice())
            .map_err(|e| Error::Startup(format!("undecodable signature map: {e}")))?;

        Self::designate(&map.signature_def, configured)
    }

    fn designate(
        signatures: &HashMap<String, SignatureDef>,
        configured: Option<&str>,
    ) -> Result<Self> {
        let (name, def) = if let Some(wanted) = configured {
            signatures.get_key_value(wanted).ok_or_else(|| {
                Error::Startup(format!(
                    "signature `{wanted}` is not exported by the model (available: {})",
                    sorted_names(signatures)
                ))
            })?
        } else if signatures.len() > 1 {
            return Err(Error::Startup(format!(
                "model exports {} signatures ({}); set `signature_name` to pick one",
                signatures.len(),
                sorted_names(signatures)
            )));
        } else {
            signatures
                .iter()
                .next()
                .ok_or_else(|| Error::Startup("model exports no signatures".to_string()))?
        };

        let inputs = def
            .inputs
            .iter()
            .map(|(field, info)| (field.clone(), InputSpec::from_info(info)))
            .collect();

        Ok(Self {
            name: name.clone(),
            inputs,
        })
    }

    /// Name of the designated signature.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared element type of an input field, if the field exists.
    pub fn input_dtype(&self, field: &str) -> Option<DataType> {
        self.inputs.get(field).map(|input| input.dtype)
    }

    /// All declared input fields.
    pub fn inputs(&self) -> &HashMap<String, InputSpec> {
        &self.inputs
    }
}

fn sorted_names(signatures: &HashMap<String, SignatureDef>) -> String {
    let mut names: Vec<&str> = signatures.keys().map(String::as_str).collect();
    names.sort_unstable();
    names.join(", ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
