// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::error::HandlerError;
use crate::types::{DynamicSerialize, Envelope};

/// Handler trait for processing decoded requests.
///
/// Handlers may block; the dispatcher applies no timeout.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handle a request and return the response envelope.
    fn handle(&self, request: Envelope) -> Result<Envelope, HandlerError>;
}

/// A function-based request handler.
impl<F> RequestHandler for F
where
    F: Fn(Envelope) -> Result<Envelope, HandlerError> + Send + Sync + 'static,
{
    fn handle(&self, request: Envelope) -> Result<Envelope, HandlerError> {
        self(request)
    }
}

/// Adapt a function over Rust request/response types.
///
/// ```
/// use tagwire::dispatch::{typed_handler, ErrorResponse, RequestHandler};
/// use tagwire::types::DynamicSerialize;
///
/// let echo = typed_handler(|req: ErrorResponse| Ok::<_, std::io::Error>(req));
/// let reply = echo.handle(ErrorResponse::new("ping").to_envelope()).unwrap();
/// assert_eq!(ErrorResponse::from_envelope(&reply).unwrap().error, "ping");
/// ```
pub fn typed_handler<Req, Resp, E, F>(f: F) -> impl RequestHandler
where
    Req: DynamicSerialize + 'static,
    Resp: DynamicSerialize + 'static,
    E: Into<HandlerError> + 'static,
    F: Fn(Req) -> Result<Resp, E> + Send + Sync + 'static,
{
    move |request: Envelope| -> Result<Envelope, HandlerError> {
        let request = Req::from_envelope(&request)?;
        f(request).map(|resp| resp.to_envelope()).map_err(Into::into)
    }
}
