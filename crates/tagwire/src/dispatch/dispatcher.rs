// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request dispatcher.
//!
//! ```text
//! RECEIVED -> DECODED -> HANDLED -> ENCODED
//!    |           |           |
//!    |           |           +--> HANDLER_FAILED
//!    |           +--------------> HANDLER_NOT_FOUND
//!    +--------------------------> DECODE_FAILED
//! ```
//!
//! Every terminal state produces a well-formed payload in the negotiated
//! output format. Failures are replies carrying an [`ErrorResponse`].

use super::error::{DispatchError, DispatchResult};
use super::handler::RequestHandler;
use super::response::{DeflatedRequest, ErrorResponse};
use super::trace::catch_with_trace;
use crate::codec::CodecLimits;
use crate::error::SerializationError;
use crate::serialization::{SerializationManager, SerializationStrategy};
use crate::types::{DynamicSerialize, Envelope};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Terminal state of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Encoded,
    DecodeFailed,
    HandlerNotFound,
    HandlerFailed,
}

impl DispatchState {
    pub fn is_success(self) -> bool {
        self == Self::Encoded
    }
}

/// Outcome of [`RequestDispatcher::dispatch_report`].
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub state: DispatchState,
    /// Decoded request type, if decoding succeeded.
    pub request_type: Option<String>,
    /// Encoded response or `ErrorResponse`.
    pub response: Vec<u8>,
    pub elapsed: Duration,
}

/// Routes decoded requests to handlers by request type name.
///
/// Handlers are registered before the dispatcher is shared; `dispatch`
/// itself holds no cross-request state and runs fully in parallel.
pub struct RequestDispatcher {
    manager: Arc<SerializationManager>,
    handlers: HashMap<String, Arc<dyn RequestHandler>>,
    max_inflated_length: usize,
}

impl RequestDispatcher {
    /// Create a dispatcher, registering the built-in reply and wrapper types
    /// in the manager's registry if they are missing.
    pub fn new(manager: Arc<SerializationManager>) -> DispatchResult<Self> {
        Self::with_limits(manager, CodecLimits::default())
    }

    pub fn with_limits(
        manager: Arc<SerializationManager>,
        limits: CodecLimits,
    ) -> DispatchResult<Self> {
        let registry = manager.registry();
        registry.register_type::<ErrorResponse>()?;
        registry.register_type::<DeflatedRequest>()?;
        Ok(Self {
            manager,
            handlers: HashMap::new(),
            max_inflated_length: limits.max_read_length,
        })
    }

    pub fn manager(&self) -> &Arc<SerializationManager> {
        &self.manager
    }

    /// Register the handler for `request_type`. A second registration for the
    /// same type is rejected.
    pub fn register_handler<H: RequestHandler>(
        &mut self,
        request_type: impl Into<String>,
        handler: H,
    ) -> DispatchResult<()> {
        let request_type = request_type.into();
        if self.handlers.contains_key(&request_type) {
            return Err(DispatchError::DuplicateHandler(request_type));
        }
        log::debug!("[dispatch] registered handler for {}", request_type);
        self.handlers.insert(request_type, Arc::new(handler));
        Ok(())
    }

    /// Register a handler keyed by the request type's registered name.
    pub fn register_typed<Req: DynamicSerialize, H: RequestHandler>(
        &mut self,
        handler: H,
    ) -> DispatchResult<()> {
        self.register_handler(Req::type_descriptor().name, handler)
    }

    pub fn has_handler(&self, request_type: &str) -> bool {
        self.handlers.contains_key(request_type)
    }

    /// Request types with a handler, sorted.
    pub fn request_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Decode, handle and encode in one format.
    pub fn dispatch(&self, bytes: &[u8], format: &str) -> DispatchResult<Vec<u8>> {
        self.dispatch_with_formats(bytes, format, format)
    }

    /// Decode with `input_format`, encode the reply with `output_format`.
    pub fn dispatch_with_formats(
        &self,
        bytes: &[u8],
        input_format: &str,
        output_format: &str,
    ) -> DispatchResult<Vec<u8>> {
        self.dispatch_report(bytes, input_format, output_format)
            .map(|report| report.response)
    }

    /// Like [`Self::dispatch_with_formats`], also reporting the terminal
    /// state, request type and elapsed time.
    ///
    /// Only an unknown input or output format is returned as an error.
    pub fn dispatch_report(
        &self,
        bytes: &[u8],
        input_format: &str,
        output_format: &str,
    ) -> DispatchResult<DispatchReport> {
        let started = Instant::now();
        let input = self.manager.get_strategy(input_format)?;
        let output = self.manager.get_strategy(output_format)?;

        let (state, request_type, reply) = self.process(bytes, input);

        let response = match output.encode(&reply) {
            Ok(encoded) => encoded,
            Err(e) => {
                // the handler's own response did not encode; report that instead
                let failure = ErrorResponse::from_error(&e, request_type.as_deref());
                let encoded = output.encode(&failure.to_envelope()).map_err(DispatchError::from)?;
                let elapsed = started.elapsed();
                log::error!(
                    "failed to encode response for {}: {}",
                    request_type.as_deref().unwrap_or("<unknown>"),
                    e
                );
                return Ok(DispatchReport {
                    state: DispatchState::HandlerFailed,
                    request_type,
                    response: encoded,
                    elapsed,
                });
            }
        };

        let elapsed = started.elapsed();
        if state.is_success() {
            log::info!(
                "handled {} in {}ms, response was {} bytes",
                request_type.as_deref().unwrap_or("<unknown>"),
                elapsed.as_millis(),
                response.len()
            );
        }

        Ok(DispatchReport {
            state,
            request_type,
            response,
            elapsed,
        })
    }

    /// Run the state machine up to the reply envelope.
    fn process(
        &self,
        bytes: &[u8],
        input: &dyn SerializationStrategy,
    ) -> (DispatchState, Option<String>, Envelope) {
        let request = match self.decode_request(bytes, input) {
            Ok(request) => request,
            Err(e) => {
                log::error!("failed to decode request: {}", e);
                return (
                    DispatchState::DecodeFailed,
                    None,
                    ErrorResponse::from_error(&e, None).to_envelope(),
                );
            }
        };

        let request_type = request.type_name.clone();
        let Some(handler) = self.handlers.get(&request_type) else {
            let err = DispatchError::HandlerNotFound(request_type.clone());
            log::error!("{}", err);
            return (
                DispatchState::HandlerNotFound,
                Some(request_type.clone()),
                ErrorResponse::from_error(&err, Some(request_type.as_str())).to_envelope(),
            );
        };

        match catch_with_trace(|| handler.handle(request)) {
            Ok(Ok(response)) => (DispatchState::Encoded, Some(request_type), response),
            Ok(Err(e)) => {
                log::error!("handler for {} failed: {}", request_type, e);
                let reply = ErrorResponse::from_error(&*e, Some(request_type.as_str())).to_envelope();
                (DispatchState::HandlerFailed, Some(request_type), reply)
            }
            Err(panic) => {
                log::error!("handler for {} panicked: {}", request_type, panic.message);
                let err = DispatchError::HandlerFailed {
                    request_type: request_type.clone(),
                    message: format!("panicked: {}", panic.message),
                };
                let reply = ErrorResponse::new(err.to_string())
                    .with_request_type(request_type.as_str())
                    .with_trace(panic.trace)
                    .to_envelope();
                (DispatchState::HandlerFailed, Some(request_type), reply)
            }
        }
    }

    /// Decode, unwrapping one level of [`DeflatedRequest`].
    fn decode_request(
        &self,
        bytes: &[u8],
        input: &dyn SerializationStrategy,
    ) -> Result<Envelope, SerializationError> {
        let request = input.decode(bytes)?;
        if request.type_name != DeflatedRequest::TYPE_NAME {
            return Ok(request);
        }

        let inflated = DeflatedRequest::from_envelope(&request)?.inflate(self.max_inflated_length)?;
        let inner = input.decode(&inflated)?;
        if inner.type_name == DeflatedRequest::TYPE_NAME {
            return Err(SerializationError::malformed(0, "nested deflated request"));
        }
        Ok(inner)
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("request_types", &self.request_types())
            .field("max_inflated_length", &self.max_inflated_length)
            .finish()
    }
}
