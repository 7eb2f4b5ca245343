// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call-stack capture for error replies.
//!
//! Handler panics are caught with the backtrace of the panic site: a process
//! panic hook, installed on first use, records it into a thread-local slot
//! while a handler runs on that thread. Panics elsewhere go to the hook that
//! was installed before.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::RefCell;
use std::panic::{self, catch_unwind, AssertUnwindSafe, Location};
use std::sync::Once;

thread_local! {
    /// `Some` while a handler runs on this thread.
    static PANIC_TRACE: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// A caught panic.
#[derive(Debug)]
pub(crate) struct CaughtPanic {
    pub message: String,
    /// Panic location, then the frames at the panic site.
    pub trace: Vec<String>,
}

/// Backtrace frames of the current thread, regardless of `RUST_BACKTRACE`.
pub(crate) fn captured_backtrace() -> Vec<String> {
    render(&Backtrace::force_capture())
}

fn render(backtrace: &Backtrace) -> Vec<String> {
    if backtrace.status() != BacktraceStatus::Captured {
        return Vec::new();
    }
    backtrace
        .to_string()
        .lines()
        .map(|line| line.trim_end().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Run `f`, catching a panic together with the stack at the point it was
/// raised. Nested calls keep their own slot.
pub(crate) fn catch_with_trace<R>(f: impl FnOnce() -> R) -> Result<R, CaughtPanic> {
    HOOK.call_once(install_hook);

    let outer = PANIC_TRACE.with(|slot| slot.replace(Some(Vec::new())));
    let result = catch_unwind(AssertUnwindSafe(f));
    let trace = PANIC_TRACE
        .with(|slot| slot.replace(outer))
        .unwrap_or_default();

    result.map_err(|payload| CaughtPanic {
        message: panic_message(payload.as_ref()),
        trace,
    })
}

fn install_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if !record(info.location()) {
            previous(info);
        }
    }));
}

/// Store the panic-site trace if this thread is running a handler.
fn record(location: Option<&Location<'_>>) -> bool {
    PANIC_TRACE
        .try_with(|slot| {
            let Ok(mut slot) = slot.try_borrow_mut() else {
                return false;
            };
            let Some(trace) = slot.as_mut() else {
                return false;
            };
            trace.clear();
            if let Some(location) = location {
                trace.push(format!("panicked at {}", location));
            }
            trace.extend(captured_backtrace());
            true
        })
        .unwrap_or(false)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
