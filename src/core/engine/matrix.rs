use crate::core::engine::{emit, timed};
use crate::core::event::EventBus;
use crate::core::prelude::*;
use crate::util::vm_float;

use std::fmt;

/// The two matrices being edited. They always have the same size.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MatrixPair {
    a: Matrix,
    b: Matrix,
}

impl Default for MatrixPair {
    fn default() -> Self {
        Self::new(MatrixSize::default())
    }
}

impl MatrixPair {
    pub fn new(size: MatrixSize) -> Self {
        Self {
            a: Matrix::zeros(size),
            b: Matrix::zeros(size),
        }
    }

    /// Builds a pair from two existing matrices, which must have the same size.
    pub fn from_matrices(a: Matrix, b: Matrix) -> Result<Self> {
        if a.size() != b.size() {
            bail!("matrix size mismatch: A is {}, B is {}", a.size(), b.size());
        }
        Ok(Self { a, b })
    }

    pub fn size(&self) -> MatrixSize {
        self.a.size()
    }

    /// Changes the size of both matrices, clearing every cell to zero.
    pub fn resize(&mut self, size: MatrixSize) {
        *self = Self::new(size);
    }

    pub fn a(&self) -> &Matrix {
        &self.a
    }
    pub fn b(&self) -> &Matrix {
        &self.b
    }

    /// Sets a single cell from user input; text that is not a number is read as 0.
    pub fn set_cell(&mut self, which: char, row: usize, col: usize, input: &str) -> Result<()> {
        let m = match which {
            'A' | 'a' => &mut self.a,
            'B' | 'b' => &mut self.b,
            other => bail!("unknown matrix: `{other}`"),
        };
        if row >= m.n() || col >= m.n() {
            bail!("cell ({row}, {col}) is outside a {} matrix", m.size());
        }
        m.set(row, col, vm_float::parse_or_zero(input));
        Ok(())
    }
}

/// What [`MatrixEngine::perform`] hands back to the front end.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixOutcome {
    pub title: String,
    pub result: OpResult,
}

impl fmt::Display for MatrixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.result {
            OpResult::Matrix(m) => write!(f, "{}:\n{}", self.title, m.to_display_string()),
            OpResult::Scalar { value, .. } => {
                write!(f, "{}: {}", self.title, vm_float::format_plain(value))
            }
            OpResult::Vector(v) => write!(f, "{}: {}", self.title, v.to_plain_string()),
        }
    }
}

pub struct MatrixEngine {
    bus: UniqueShared<EventBus>,
}

impl MatrixEngine {
    pub fn new(bus: UniqueShared<EventBus>) -> Self {
        Self { bus }
    }

    fn check_same_size(a: &Matrix, b: &Matrix) -> Result<()> {
        if a.size() != b.size() {
            bail!("matrix size mismatch: {} vs. {}", a.size(), b.size());
        }
        Ok(())
    }

    fn binary(
        &self,
        operation: &str,
        a: &Matrix,
        b: &Matrix,
        op: impl FnOnce(Matrix, Matrix) -> Matrix,
    ) -> Result<Matrix> {
        Self::check_same_size(a, b)?;
        let (result, duration_ms) = timed(|| op(*a, *b));
        emit(
            &self.bus,
            OperationKind::Matrix,
            operation,
            Value::Matrix(*a),
            Some(Value::Matrix(*b)),
            Value::Matrix(result),
            duration_ms,
        );
        Ok(result)
    }

    pub fn add(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        self.binary("sum", a, b, |a, b| a + b)
    }

    pub fn subtract(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        self.binary("subtract", a, b, |a, b| a - b)
    }

    pub fn multiply(&self, a: &Matrix, b: &Matrix) -> Result<Matrix> {
        self.binary("multiply", a, b, |a, b| a * b)
    }

    pub fn determinant(&self, m: &Matrix) -> f64 {
        let (det, duration_ms) = timed(|| m.determinant());
        emit(
            &self.bus,
            OperationKind::Matrix,
            "determinant",
            Value::Matrix(*m),
            None,
            Value::Scalar(det),
            duration_ms,
        );
        det
    }

    /// Runs the operation the front end names, one of `add`, `subtract`, `multiply`,
    /// `determinantA` or `determinantB`.
    pub fn perform(&self, name: &str, pair: &MatrixPair) -> Result<MatrixOutcome> {
        let (a, b) = (pair.a(), pair.b());
        let outcome = match name {
            "add" | "subtract" | "multiply" => {
                let m = match name {
                    "add" => self.add(a, b)?,
                    "subtract" => self.subtract(a, b)?,
                    _ => self.multiply(a, b)?,
                };
                MatrixOutcome {
                    title: format!("Resultado ({name})"),
                    result: OpResult::Matrix(m),
                }
            }
            "determinantA" => MatrixOutcome {
                title: "Determinante de Matriz A".to_string(),
                result: OpResult::scalar(self.determinant(a)),
            },
            "determinantB" => MatrixOutcome {
                title: "Determinante de Matriz B".to_string(),
                result: OpResult::scalar(self.determinant(b)),
            },
            other => bail!("unknown matrix operation: `{other}`"),
        };
        info!("matrix {name} ({}) done", pair.size());
        Ok(outcome)
    }
}
