//! The report sink for contract violations.
//!
//! Hot-path operations deliberately carry no `Result` plumbing; when a
//! precondition check fails, the violation is handed to the sink installed
//! for the current thread and the operation returns without mutating
//! anything. The default sink emits the violation as a `log::error!` record.
//! Tests swap in a capturing sink via [`capture`] to assert on the exact
//! violations an operation produced.

use std::cell::RefCell;

use crate::error::Violation;

thread_local! {
    static CAPTURE: RefCell<Option<Vec<Violation>>> = const { RefCell::new(None) };
}

/// Delivers a violation to the current sink.
///
/// With a capturing sink installed the violation is recorded; otherwise it is
/// logged as an error record.
pub fn report(violation: Violation) {
    let captured = CAPTURE.with(|capture| {
        if let Some(buffer) = capture.borrow_mut().as_mut() {
            buffer.push(violation.clone());
            true
        } else {
            false
        }
    });
    if !captured {
        log::error!("{violation}");
    }
}

/// Runs `f` with a capturing sink installed on the current thread and returns
/// its result together with every violation reported while it ran.
///
/// Nested captures are supported; each capture sees only the violations
/// reported within its own scope.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Violation>) {
    let previous = CAPTURE.with(|capture| capture.borrow_mut().replace(Vec::new()));
    let result = f();
    let violations = CAPTURE.with(|capture| {
        let mut slot = capture.borrow_mut();
        let violations = slot.take().unwrap_or_default();
        *slot = previous;
        violations
    });
    (result, violations)
}
