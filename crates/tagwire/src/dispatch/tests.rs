// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::codec::CodecLimits;
use crate::error::{SerResult, SerializationError};
use crate::serialization::{SerializationManager, BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::types::{DynamicSerialize, Envelope, FieldType, TypeDescriptor, TypeRegistry, Value};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, PartialEq)]
struct Add {
    a: i64,
    b: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Sum {
    total: i64,
}

impl DynamicSerialize for Add {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("Add")
            .field("a", FieldType::Int64, 1)
            .field("b", FieldType::Int64, 2)
            .build()
    }

    fn to_envelope(&self) -> Envelope {
        Envelope::new("Add").with(1, self.a).with(2, self.b)
    }

    fn from_envelope(env: &Envelope) -> SerResult<Self> {
        Ok(Add {
            a: env.optional_field(1, "int64", Value::as_i64)?.unwrap_or(0),
            b: env.optional_field(2, "int64", Value::as_i64)?.unwrap_or(0),
        })
    }
}

impl DynamicSerialize for Sum {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::builder("Sum")
            .field("total", FieldType::Int64, 1)
            .build()
    }

    fn to_envelope(&self) -> Envelope {
        Envelope::new("Sum").with(1, self.total)
    }

    fn from_envelope(env: &Envelope) -> SerResult<Self> {
        Ok(Sum {
            total: env.optional_field(1, "int64", Value::as_i64)?.unwrap_or(0),
        })
    }
}

#[derive(Debug)]
struct Overflow;

impl std::fmt::Display for Overflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sum overflows int64")
    }
}

impl std::error::Error for Overflow {}

fn manager() -> Arc<SerializationManager> {
    let registry = Arc::new(TypeRegistry::new());
    registry.register_type::<Add>().unwrap();
    registry.register_type::<Sum>().unwrap();
    registry
        .register(TypeDescriptor::builder("Crash").build())
        .unwrap();
    registry
        .register(TypeDescriptor::builder("Orphan").build())
        .unwrap();
    Arc::new(SerializationManager::with_defaults(
        registry,
        CodecLimits::default(),
    ))
}

fn dispatcher() -> RequestDispatcher {
    let mut d = RequestDispatcher::new(manager()).unwrap();
    d.register_handler(
        "Add",
        typed_handler(|req: Add| {
            req.a
                .checked_add(req.b)
                .map(|total| Sum { total })
                .ok_or(Overflow)
        }),
    )
    .unwrap();
    d.register_handler(
        "Crash",
        |_req: Envelope| -> Result<Envelope, HandlerError> { panic!("boom") },
    )
    .unwrap();
    d
}

fn decode_error(d: &RequestDispatcher, bytes: &[u8], format: &str) -> ErrorResponse {
    d.manager()
        .deserialize_typed::<ErrorResponse>(bytes, format)
        .unwrap()
}

#[test]
fn handled_request_is_encoded() {
    let d = dispatcher();
    let request = d
        .manager()
        .serialize_typed(&Add { a: 2, b: 40 }, BINARY_CONTENT_TYPE)
        .unwrap();
    let report = d
        .dispatch_report(&request, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::Encoded);
    assert_eq!(report.request_type.as_deref(), Some("Add"));
    let sum: Sum = d
        .manager()
        .deserialize_typed(&report.response, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(sum, Sum { total: 42 });
}

#[test]
fn handler_error_becomes_error_response() {
    let d = dispatcher();
    let request = d
        .manager()
        .serialize_typed(&Add { a: i64::MAX, b: 1 }, JSON_CONTENT_TYPE)
        .unwrap();
    let report = d
        .dispatch_report(&request, JSON_CONTENT_TYPE, JSON_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::HandlerFailed);
    let err = decode_error(&d, &report.response, JSON_CONTENT_TYPE);
    assert_eq!(err.error, "sum overflows int64");
    assert_eq!(err.request_type.as_deref(), Some("Add"));
    assert!(!err.stack_trace.is_empty());
}

#[test]
fn handler_panic_is_contained() {
    let d = dispatcher();
    let request = d
        .manager()
        .serialize(&Envelope::new("Crash"), BINARY_CONTENT_TYPE)
        .unwrap();
    let report = d
        .dispatch_report(&request, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::HandlerFailed);
    let err = decode_error(&d, &report.response, BINARY_CONTENT_TYPE);
    assert!(err.error.contains("panicked: boom"), "{}", err.error);
    // first line is the panic site inside the handler, not the dispatcher
    assert!(err.stack_trace[0].starts_with("panicked at "), "{:?}", err.stack_trace);
    assert!(err.stack_trace[0].contains("tests.rs"), "{}", err.stack_trace[0]);
}

#[test]
fn missing_handler_is_reported() {
    let d = dispatcher();
    let request = d
        .manager()
        .serialize(&Envelope::new("Orphan"), BINARY_CONTENT_TYPE)
        .unwrap();
    let report = d
        .dispatch_report(&request, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::HandlerNotFound);
    let err = decode_error(&d, &report.response, BINARY_CONTENT_TYPE);
    assert_eq!(err.error, "no handler registered for request type Orphan");
}

#[test]
fn garbage_is_a_decode_failure_in_the_negotiated_format() {
    let d = dispatcher();
    for format in [BINARY_CONTENT_TYPE, JSON_CONTENT_TYPE] {
        let report = d.dispatch_report(b"\x00garbage", format, format).unwrap();
        assert_eq!(report.state, DispatchState::DecodeFailed);
        assert!(report.request_type.is_none());
        let err = decode_error(&d, &report.response, format);
        assert!(err.error.contains("malformed"), "{}", err.error);
    }
}

#[test]
fn unknown_type_is_a_decode_failure() {
    let d = dispatcher();
    let report = d
        .dispatch_report(
            br#"{"type":"Radar","fields":{}}"#,
            JSON_CONTENT_TYPE,
            JSON_CONTENT_TYPE,
        )
        .unwrap();
    assert_eq!(report.state, DispatchState::DecodeFailed);
    let err = decode_error(&d, &report.response, JSON_CONTENT_TYPE);
    assert_eq!(err.error, "unknown type: Radar");
}

#[test]
fn unsupported_format_escapes() {
    let d = dispatcher();
    assert!(matches!(
        d.dispatch(b"", "text/csv"),
        Err(DispatchError::UnsupportedFormat(f)) if f == "text/csv"
    ));
    assert!(matches!(
        d.dispatch_with_formats(b"", BINARY_CONTENT_TYPE, "text/csv"),
        Err(DispatchError::UnsupportedFormat(_))
    ));
}

#[test]
fn split_input_and_output_formats() {
    let d = dispatcher();
    let request = br#"{"type":"Add","fields":{"a":1,"b":2}}"#;
    let reply = d
        .dispatch_with_formats(request, "application/json; charset=utf-8", BINARY_CONTENT_TYPE)
        .unwrap();
    let sum: Sum = d
        .manager()
        .deserialize_typed(&reply, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(sum.total, 3);
}

#[test]
fn deflated_requests_are_unwrapped_once() {
    let d = dispatcher();
    let binary = d.manager().get_strategy(BINARY_CONTENT_TYPE).unwrap();
    let wrapped = DeflatedRequest::wrap(binary, &Add { a: 20, b: 22 }.to_envelope()).unwrap();
    let report = d
        .dispatch_report(&wrapped, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::Encoded);
    assert_eq!(report.request_type.as_deref(), Some("Add"));

    let inner = DeflatedRequest::compress(&wrapped).unwrap();
    let nested = binary.encode(&inner.to_envelope()).unwrap();
    let report = d
        .dispatch_report(&nested, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::DecodeFailed);
    let err = decode_error(&d, &report.response, BINARY_CONTENT_TYPE);
    assert!(err.error.contains("nested deflated request"));

    let corrupt = binary
        .encode(
            &DeflatedRequest {
                compressed_data: vec![0xde, 0xad],
            }
            .to_envelope(),
        )
        .unwrap();
    let report = d
        .dispatch_report(&corrupt, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::DecodeFailed);
}

#[test]
fn unbounded_limits_still_inflate() {
    let limits = CodecLimits {
        max_read_length: usize::MAX,
        ..CodecLimits::default()
    };
    let mut d = RequestDispatcher::with_limits(manager(), limits).unwrap();
    d.register_handler(
        "Add",
        typed_handler(|req: Add| Ok::<_, Overflow>(Sum { total: req.a + req.b })),
    )
    .unwrap();
    let binary = d.manager().get_strategy(BINARY_CONTENT_TYPE).unwrap();
    let wrapped = DeflatedRequest::wrap(binary, &Add { a: 1, b: 2 }.to_envelope()).unwrap();
    let report = d
        .dispatch_report(&wrapped, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::Encoded);
    let sum: Sum = d
        .manager()
        .deserialize_typed(&report.response, BINARY_CONTENT_TYPE)
        .unwrap();
    assert_eq!(sum.total, 3);
}

#[test]
fn unencodable_response_becomes_handler_failure() {
    let mut d = RequestDispatcher::new(manager()).unwrap();
    d.register_handler("Orphan", |_req: Envelope| -> Result<Envelope, HandlerError> {
        Ok(Envelope::new("NotRegistered"))
    })
    .unwrap();
    let request = d
        .manager()
        .serialize(&Envelope::new("Orphan"), JSON_CONTENT_TYPE)
        .unwrap();
    let report = d
        .dispatch_report(&request, JSON_CONTENT_TYPE, JSON_CONTENT_TYPE)
        .unwrap();
    assert_eq!(report.state, DispatchState::HandlerFailed);
    let err = decode_error(&d, &report.response, JSON_CONTENT_TYPE);
    assert_eq!(err.error, "unknown type: NotRegistered");
}

#[test]
fn duplicate_handlers_are_rejected() {
    let mut d = dispatcher();
    let again = d.register_typed::<Add, _>(|req: Envelope| -> Result<Envelope, HandlerError> {
        Ok(req)
    });
    assert!(matches!(again, Err(DispatchError::DuplicateHandler(name)) if name == "Add"));
    assert_eq!(d.request_types(), vec!["Add", "Crash"]);
}

#[test]
fn every_failure_decodes_as_error_response() {
    let d = dispatcher();
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..200 {
        let len = rng.usize(0..48);
        // half the inputs get a valid frame header so the decoder gets further in
        let mut junk: Vec<u8> = if rng.bool() {
            vec![0x54, 0x57, 0x01]
        } else {
            Vec::new()
        };
        junk.extend((0..len).map(|_| rng.u8(..)));
        let report = d
            .dispatch_report(&junk, BINARY_CONTENT_TYPE, BINARY_CONTENT_TYPE)
            .unwrap();
        if report.state != DispatchState::Encoded {
            let decoded = d
                .manager()
                .deserialize(&report.response, BINARY_CONTENT_TYPE)
                .unwrap();
            assert_eq!(decoded.type_name, ErrorResponse::TYPE_NAME);
        }
    }
}

#[test]
fn dispatch_is_shareable_across_threads() {
    let d = Arc::new(dispatcher());
    let handles: Vec<_> = (0..4i64)
        .map(|i| {
            let d = Arc::clone(&d);
            thread::spawn(move || {
                for j in 0..50i64 {
                    let request = d
                        .manager()
                        .serialize_typed(&Add { a: i, b: j }, BINARY_CONTENT_TYPE)
                        .unwrap();
                    let reply = d.dispatch(&request, BINARY_CONTENT_TYPE).unwrap();
                    let sum: Sum = d
                        .manager()
                        .deserialize_typed(&reply, BINARY_CONTENT_TYPE)
                        .unwrap();
                    assert_eq!(sum.total, i + j);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
}

#[test]
fn dispatcher_refuses_conflicting_builtin_shape() {
    let registry = Arc::new(TypeRegistry::empty());
    registry
        .register(
            TypeDescriptor::builder(ErrorResponse::TYPE_NAME)
                .field("message", FieldType::Int32, 1)
                .build(),
        )
        .unwrap();
    let manager = Arc::new(SerializationManager::with_defaults(
        registry,
        CodecLimits::default(),
    ));
    assert!(matches!(
        RequestDispatcher::new(manager),
        Err(DispatchError::Serialization(SerializationError::DuplicateType { .. }))
    ));
}
