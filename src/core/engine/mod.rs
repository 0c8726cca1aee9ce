//! The matrix and vector calculators. Both are stateless apart from the [`EventBus`] they report
//! to: every completed operation publishes exactly one [`OperationEvent`].
use crate::core::event::EventBus;
use crate::core::prelude::*;
use crate::util::vm_float;

use std::time::Instant;

pub mod matrix;
pub mod vector;

pub use matrix::{MatrixEngine, MatrixOutcome, MatrixPair};
pub use vector::{VectorEngine, VectorOutcome};

/// Runs `op` and returns its output together with the elapsed time in milliseconds.
fn timed<T>(op: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let rv = op();
    (rv, vm_float::millis(start.elapsed()))
}

fn emit(
    bus: &UniqueShared<EventBus>,
    kind: OperationKind,
    operation: &str,
    input_a: Value,
    input_b: Option<Value>,
    result: Value,
    duration_ms: f64,
) {
    bus.get().publish_operation(&OperationEvent {
        kind,
        operation: operation.to_string(),
        input_a,
        input_b,
        result,
        duration_ms,
    });
}
