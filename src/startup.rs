// SPDX-FileCopyrightText: 2026 The tfs-gateway Authors
// SPDX-License-Identifier: Apache-2.0

//! Startup synchronization with the serving backend.
//!
//! The gateway refuses to serve traffic until the backend has loaded the
//! model and its signature metadata is usable. [`await_model_signature`]
//! polls on a bounded schedule, and [`ModelSnapshot`] is the write-once
//! result handed to the HTTP layer.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::{BackendClient, ClientOptions};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::signature::SignatureSpec;

/// Bounded retry schedule for the startup metadata poll.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 300,
            interval: Duration::from_secs(1),
        }
    }
}

/// Serving state assembled once at startup and shared read-only afterwards.
///
/// Request handlers never refresh it: a model hot-swapped behind the running
/// gateway keeps being served with the signature captured here.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub client: BackendClient,
    pub signature: SignatureSpec,
    pub model_name: String,
}

impl ModelSnapshot {
    /// Builds the lazily-connecting backend client and blocks until the
    /// model's signature metadata is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Startup`] when the retry budget runs out or the
    /// metadata cannot designate a signature, and [`Error::Connection`] for
    /// an unusable backend address.
    pub async fn initialize(config: &Config) -> Result<Self> {
        let options = ClientOptions::default()
            .connect_timeout(config.backend.connect_timeout())
            .request_timeout(config.backend.request_timeout())
            .max_message_size(config.backend.max_message_size);
        let client = BackendClient::connect_lazy(&config.backend.addr, options)?;

        let policy = RetryPolicy {
            max_attempts: config.startup.max_attempts,
            interval: Duration::from_millis(config.startup.interval_millis),
        };
        let signature = await_model_signature(
            &client,
            &config.backend.model_name,
            config.backend.signature_name.as_deref(),
            policy,
        )
        .await?;

        let mut fields: Vec<_> = signature.inputs().iter().collect();
        fields.sort_by(|a, b| a.0.cmp(b.0));
        for (field, input) in fields {
            info!(
                field = %field,
                dtype = input.dtype.as_str_name(),
                shape = ?input.shape,
                "model input"
            );
        }

        Ok(Self {
            client,
            signature,
            model_name: config.backend.model_name.clone(),
        })
    }
}

/// Polls model metadata until it is usable or the retry budget is spent.
///
/// Transport and backend errors are retried. A metadata response that fails
/// signature designation is fatal immediately: retrying cannot change what
/// the model exports.
///
/// # Errors
///
/// Returns [`Error::Startup`] carrying the last poll error once the budget
/// is exhausted.
pub async fn await_model_signature(
    client: &BackendClient,
    model_name: &str,
    configured_signature: Option<&str>,
    policy: RetryPolicy,
) -> Result<SignatureSpec> {
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match client.model_metadata(model_name).await {
            Ok(response) => {
                let signature = SignatureSpec::from_metadata(&response, configured_signature)?;
                info!(
                    attempt,
                    signature = signature.name(),
                    "model metadata is available"
                );
                return Ok(signature);
            }
            Err(err) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "model metadata not available yet"
                );
                last_error = Some(err);
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.interval).await;
                }
            }
        }
    }

    let reason = last_error.map_or_else(|| "retry budget is zero".to_string(), |err| err.to_string());
    Err(Error::Startup(format!(
        "model metadata unavailable after {} attempts: {reason}",
        policy.max_attempts
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_polls_for_five_minutes() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 300);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }
}
