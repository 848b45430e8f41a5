// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Translation between JSON samples and typed tensor messages.
//!
//! [`build_predict_request`] turns one flat JSON object into a
//! [`PredictRequest`] keyed and typed by the designated signature, and
//! [`parse_predict_response`] flattens a [`PredictResponse`] back into plain
//! JSON. [`ValueField`] is the table tying element types to the tensor
//! fields that carry their values.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//!
//! use serde_json::json;
//! use tfs_gateway::generated::tensorflow::DataType;
//! use tfs_gateway::signature::{InputSpec, SignatureSpec};
//! use tfs_gateway::translate::build_predict_request;
//!
//! let signature = SignatureSpec::new(
//!     "serving_default",
//!     HashMap::from([(
//!         "age".to_string(),
//!         InputSpec { dtype: DataType::DtInt32, shape: vec![-1] },
//!     )]),
//! );
//!
//! let request = build_predict_request("default", &signature, &json!({ "age": 31 })).unwrap();
//! assert_eq!(request.inputs["age"].int_val, vec![31]);
//! ```

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

use crate::error::{Error, Result};
use crate::generated::tensorflow::serving::{ModelSpec, PredictRequest, PredictResponse};
use crate::generated::tensorflow::{tensor_shape_proto, DataType, TensorProto, TensorShapeProto};
use crate::signature::SignatureSpec;

// ---------------------------------------------------------------------------
// ValueField
// ---------------------------------------------------------------------------

/// The `TensorProto` field that carries values for a given element type.
///
/// Every variant is readable on the inbound (response) side. Outbound,
/// [`build_predict_request`] only constructs the types JSON can express
/// natively; everything else is rejected with a mapping error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueField {
    /// `float_val` (DT_FLOAT).
    Float,
    /// `double_val` (DT_DOUBLE).
    Double,
    /// `int_val` (DT_INT32).
    Int,
    /// `int64_val` (DT_INT64).
    Int64,
    /// `bool_val` (DT_BOOL).
    Bool,
    /// `string_val` (DT_STRING).
    String,
    /// `half_val` (DT_HALF); each element is a raw 16-bit pattern.
    Half,
    /// `scomplex_val` (DT_COMPLEX64); real and imaginary parts interleaved.
    Scomplex,
    /// `dcomplex_val` (DT_COMPLEX128); real and imaginary parts interleaved.
    Dcomplex,
}

impl ValueField {
    /// Looks up the value field for an element type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Mapping`] for element types outside the table
    /// (quantized, resource, and variant types among others).
    pub fn for_dtype(dtype: DataType) -> Result<Self> {
        match dtype {
            DataType::DtFloat => Ok(Self::Float),
            DataType::DtDouble => Ok(Self::Double),
            DataType::DtInt32 => Ok(Self::Int),
            DataType::DtInt64 => Ok(Self::Int64),
            DataType::DtBool => Ok(Self::Bool),
            DataType::DtString => Ok(Self::String),
            DataType::DtHalf => Ok(Self::Half),
            DataType::DtComplex64 => Ok(Self::Scomplex),
            DataType::DtComplex128 => Ok(Self::Dcomplex),
            other => Err(Error::Mapping(format!(
                "element type {} is not in the type mapping table",
                other.as_str_name()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Request building
// ---------------------------------------------------------------------------

/// Converts one JSON sample into a typed prediction request.
///
/// Every key in `sample` must be an input of the designated signature; each
/// value must be a scalar or a flat list of scalars matching the declared
/// element type. Scalars become rank-1 tensors of length 1, lists keep their
/// length (an empty list yields shape `[0]`).
///
/// # Errors
///
/// Returns [`Error::Translation`] for undeclared fields and value/type
/// mismatches, and [`Error::Mapping`] when the declared element type has no
/// outbound construction.
pub fn build_predict_request(
    model_name: &str,
    signature: &SignatureSpec,
    sample: &Value,
) -> Result<PredictRequest> {
    let fields = sample
        .as_object()
        .ok_or_else(|| Error::Translation("sample is not a JSON object".to_string()))?;

    let mut inputs = HashMap::with_capacity(fields.len());
    for (field, value) in fields {
        let dtype = signature.input_dtype(field).ok_or_else(|| {
            Error::Translation(format!(
                "field `{field}` is not an input of signature `{}`",
                signature.name()
            ))
        })?;
        inputs.insert(field.clone(), make_tensor(field, dtype, value)?);
    }

    Ok(PredictRequest {
        model_spec: Some(ModelSpec {
            name: model_name.to_owned(),
            signature_name: signature.name().to_owned(),
        }),
        inputs,
        output_filter: Vec::new(),
    })
}

fn make_tensor(field: &str, dtype: DataType, value: &Value) -> Result<TensorProto> {
    let elements: &[Value] = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) | Value::Null => {
            return Err(Error::Translation(format!(
                "field `{field}` must be a scalar or a flat list of scalars"
            )))
        }
        scalar => std::slice::from_ref(scalar),
    };

    let mut tensor = TensorProto {
        dtype: dtype as i32,
        tensor_shape: Some(vector_shape(elements.len() as i64)),
        ..Default::default()
    };

    match dtype {
        DataType::DtInt32 => {
            tensor.int_val = convert_all(elements, |v| scalar_i32(field, v))?;
        }
        DataType::DtInt64 => {
            tensor.int64_val = convert_all(elements, |v| scalar_i64(field, v))?;
        }
        DataType::DtFloat => {
            tensor.float_val = convert_all(elements, |v| scalar_f32(field, v))?;
        }
        DataType::DtBool => {
            tensor.bool_val = convert_all(elements, |v| scalar_bool(field, v))?;
        }
        DataType::DtString => {
            tensor.string_val = convert_all(elements, |v| scalar_bytes(field, v))?;
        }
        other => {
            return Err(Error::Mapping(format!(
                "element type {} of field `{field}` has no outbound mapping",
                other.as_str_name()
            )))
        }
    }

    Ok(tensor)
}

fn vector_shape(len: i64) -> TensorShapeProto {
    TensorShapeProto {
        dim: vec![tensor_shape_proto::Dim {
            size: len,
            name: String::new(),
        }],
        unknown_rank: false,
    }
}

fn convert_all<T>(elements: &[Value], convert: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    elements.iter().map(convert).collect()
}

fn scalar_i32(field: &str, value: &Value) -> Result<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| type_mismatch(field, "a 32-bit integer", value))
}

fn scalar_i64(field: &str, value: &Value) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| type_mismatch(field, "a 64-bit integer", value))
}

fn scalar_f32(field: &str, value: &Value) -> Result<f32> {
    value
        .as_f64()
        .map(|n| n as f32)
        .ok_or_else(|| type_mismatch(field, "a number", value))
}

fn scalar_bool(field: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| type_mismatch(field, "a boolean", value))
}

fn scalar_bytes(field: &str, value: &Value) -> Result<Vec<u8>> {
    value
        .as_str()
        .map(|s| s.as_bytes().to_vec())
        .ok_or_else(|| type_mismatch(field, "a string", value))
}

fn type_mismatch(field: &str, expected: &str, got: &Value) -> Error {
    Error::Translation(format!("field `{field}`: expected {expected}, got {got}"))
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Flattens a typed prediction response into `{"response": {output: [..]}}`.
///
/// Output names are emitted in sorted order and each tensor becomes the flat
/// JSON list of its value field, whatever shape the backend declared. Half
/// values stay raw 16-bit patterns and complex values stay interleaved, as
/// they are on the wire.
///
/// # Errors
///
/// Returns [`Error::Mapping`] for element types outside the table and
/// [`Error::Translation`] for values JSON cannot carry (non-finite floats,
/// non-UTF-8 strings).
pub fn parse_predict_response(response: &PredictResponse) -> Result<Value> {
    let mut names: Vec<&String> = response.outputs.keys().collect();
    names.sort_unstable();

    let mut outputs = Map::with_capacity(names.len());
    for name in names {
        outputs.insert(name.clone(), tensor_values(name, &response.outputs[name])?);
    }

    Ok(Value::Object(Map::from_iter([(
        "response".to_string(),
        Value::Object(outputs),
    )])))
}

fn tensor_values(name: &str, tensor: &TensorProto) -> Result<Value> {
    let dtype = DataType::try_from(tensor.dtype).map_err(|_| {
        Error::Mapping(format!(
            "output `{name}` has unregistered element type {}",
            tensor.dtype
        ))
    })?;

    let values = match ValueField::for_dtype(dtype)? {
        ValueField::Float => collect_numbers(name, tensor.float_val.iter().map(|v| f64::from(*v)))?,
        ValueField::Double => collect_numbers(name, tensor.double_val.iter().copied())?,
        ValueField::Int => tensor.int_val.iter().map(|v| Value::from(*v)).collect(),
        ValueField::Int64 => tensor.int64_val.iter().map(|v| Value::from(*v)).collect(),
        ValueField::Bool => tensor.bool_val.iter().map(|v| Value::from(*v)).collect(),
        ValueField::String => collect_strings(name, &tensor.string_val)?,
        ValueField::Half => tensor.half_val.iter().map(|v| Value::from(*v)).collect(),
        ValueField::Scomplex => {
            collect_numbers(name, tensor.scomplex_val.iter().map(|v| f64::from(*v)))?
        }
        ValueField::Dcomplex => collect_numbers(name, tensor.dcomplex_val.iter().copied())?,
    };

    // An all-empty value field next to raw bytes means the backend answered
    // in a layout the gateway does not read.
    if values.is_empty() && !tensor.tensor_content.is_empty() {
        return Err(Error::Translation(format!(
            "output `{name}` carries raw tensor content instead of typed values"
        )));
    }

    Ok(Value::Array(values))
}

fn collect_numbers(name: &str, values: impl Iterator<Item = f64>) -> Result<Vec<Value>> {
    values
        .map(|v| {
            // JSON has no NaN or Infinity.
            Number::from_f64(v)
                .map(Value::Number)
                .ok_or_else(|| {
                    Error::Translation(format!("output `{name}` contains a non-finite value"))
                })
        })
        .collect()
}

fn collect_strings(name: &str, values: &[Vec<u8>]) -> Result<Vec<Value>> {
    values
        .iter()
        .map(|bytes| {
            String::from_utf8(bytes.clone())
                .map(Value::String)
                .map_err(|_| {
                    Error::Translation(format!("output `{name}` contains non-UTF-8 bytes"))
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
