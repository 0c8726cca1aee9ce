use crate::core::engine::{emit, timed};
use crate::core::event::EventBus;
use crate::core::prelude::*;

use std::fmt;

/// What [`VectorEngine::perform`] hands back to the front end.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorOutcome {
    pub operation: String,
    pub title: String,
    pub a: Vec3,
    pub b: Vec3,
    pub result: OpResult,
}

impl fmt::Display for VectorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f)?;
        writeln!(f, "Vector A: {}", self.a.to_plain_string())?;
        writeln!(f, "Vector B: {}", self.b.to_plain_string())?;
        writeln!(f)?;
        match self.result {
            OpResult::Vector(v) => {
                writeln!(f, "Vector Resultante:")?;
                writeln!(f, "   X: {:.4}", v.x)?;
                writeln!(f, "   Y: {:.4}", v.y)?;
                writeln!(f, "   Z: {:.4}", v.z)?;
                write!(f, "Magnitud: {:.4}", v.len())
            }
            OpResult::Scalar { .. } => {
                write!(f, "Resultado: {}", self.result)?;
                if self.operation.starts_with("magnitude") {
                    write!(f, "\n(Valor absoluto)")?;
                }
                Ok(())
            }
            OpResult::Matrix(_) => write!(f, "Resultado:\n{}", self.result),
        }
    }
}

pub struct VectorEngine {
    bus: UniqueShared<EventBus>,
}

impl VectorEngine {
    pub fn new(bus: UniqueShared<EventBus>) -> Self {
        Self { bus }
    }

    fn record(&self, operation: &str, a: Vec3, b: Option<Vec3>, result: Value, duration_ms: f64) {
        emit(
            &self.bus,
            OperationKind::Vector,
            operation,
            Value::Vector(a),
            b.map(Value::Vector),
            result,
            duration_ms,
        );
    }

    pub fn add(&self, a: Vec3, b: Vec3) -> Vec3 {
        let (rv, duration_ms) = timed(|| a + b);
        self.record("sum", a, Some(b), Value::Vector(rv), duration_ms);
        rv
    }

    pub fn subtract(&self, a: Vec3, b: Vec3) -> Vec3 {
        let (rv, duration_ms) = timed(|| a - b);
        self.record("subtract", a, Some(b), Value::Vector(rv), duration_ms);
        rv
    }

    pub fn dot(&self, a: Vec3, b: Vec3) -> f64 {
        let (rv, duration_ms) = timed(|| a.dot(b));
        self.record("dot", a, Some(b), Value::Scalar(rv), duration_ms);
        rv
    }

    pub fn cross(&self, a: Vec3, b: Vec3) -> Vec3 {
        let (rv, duration_ms) = timed(|| a.cross(b));
        self.record("cross", a, Some(b), Value::Vector(rv), duration_ms);
        rv
    }

    pub fn magnitude(&self, v: Vec3) -> f64 {
        let (rv, duration_ms) = timed(|| v.len());
        self.record("magnitude", v, None, Value::Scalar(rv), duration_ms);
        rv
    }

    /// The zero vector normalises to itself.
    pub fn normalize(&self, v: Vec3) -> Vec3 {
        let (rv, duration_ms) = timed(|| v.normed());
        self.record("normalize", v, None, Value::Vector(rv), duration_ms);
        rv
    }

    /// In degrees. 0 if either vector is zero.
    pub fn angle_between(&self, a: Vec3, b: Vec3) -> f64 {
        let (rv, duration_ms) = timed(|| a.angle_degrees(b));
        self.record("angle", a, Some(b), Value::Scalar(rv), duration_ms);
        rv
    }

    /// Tells the renderer which operands are on screen, without computing anything.
    pub fn show(&self, a: Vec3, b: Vec3) {
        self.bus.get().publish_vector_update(&VectorUpdate { a, b, result: None });
    }

    /// Runs the operation the front end names, one of `add`, `subtract`, `dot`, `cross`,
    /// `magnitudeA`, `magnitudeB`, `normalizeA`, `normalizeB` or `angle`, then asks the renderer
    /// to draw the operands and the result.
    pub fn perform(&self, name: &str, a: Vec3, b: Vec3) -> Result<VectorOutcome> {
        let (title, result) = match name {
            "add" => ("Suma A + B", OpResult::Vector(self.add(a, b))),
            "subtract" => ("Resta A - B", OpResult::Vector(self.subtract(a, b))),
            "dot" => ("Producto Punto A · B", OpResult::scalar(self.dot(a, b))),
            "cross" => ("Producto Cruz A × B", OpResult::Vector(self.cross(a, b))),
            "magnitudeA" => ("Magnitud |A|", OpResult::scalar(self.magnitude(a))),
            "magnitudeB" => ("Magnitud |B|", OpResult::scalar(self.magnitude(b))),
            "normalizeA" => ("Vector A Normalizado", OpResult::Vector(self.normalize(a))),
            "normalizeB" => ("Vector B Normalizado", OpResult::Vector(self.normalize(b))),
            "angle" => ("Ángulo entre A y B", OpResult::angle(self.angle_between(a, b))),
            other => bail!("unknown vector operation: `{other}`"),
        };
        info!("vector {name}: {result}");
        self.bus.get().publish_vector_update(&VectorUpdate {
            a,
            b,
            result: Some(result),
        });
        Ok(VectorOutcome {
            operation: name.to_string(),
            title: title.to_string(),
            a,
            b,
            result,
        })
    }
}
