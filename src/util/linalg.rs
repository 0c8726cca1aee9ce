#[allow(unused_imports)]
use crate::core::prelude::*;

use crate::util::vm_float;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::str::FromStr;
use std::{
    fmt,
    fmt::Formatter,
    ops::{Add, AddAssign, Div, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign},
};

/// Approximate equality, tolerant to [`EPSILON`](crate::core::config::EPSILON).
pub trait AlmostEq {
    fn almost_eq(&self, rhs: &Self) -> bool;
}

impl AlmostEq for f64 {
    fn almost_eq(&self, rhs: &Self) -> bool {
        if self.is_finite() && rhs.is_finite() {
            (self - rhs).abs() < EPSILON.max(EPSILON * self.abs().max(rhs.abs()))
        } else {
            self == rhs
        }
    }
}

/// A 3D vector with 64-bit floating point components.
///
/// [`Vec3`] is a value type: every operation returns a new vector and never mutates its
/// operands.
///
/// # Examples
///
/// ```
/// use vmatrix::util::linalg::Vec3;
///
/// let a = Vec3::new(3.0, 4.0, 2.0);
/// let b = Vec3::new(1.0, -2.0, 5.0);
/// assert_eq!(a + b, Vec3::new(4.0, 2.0, 7.0));
/// assert_eq!(a.dot(b), 5.0);
/// assert_eq!(a.cross(b), Vec3::new(24.0, -13.0, -10.0));
/// ```
///
/// # Equality
/// Two vectors are considered equal if each pair of components differs by less than
/// [`EPSILON`](crate::core::config::EPSILON). Non-finite vectors compare exactly.
#[derive(Default, Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl PartialEq for Vec3 {
    fn eq(&self, other: &Self) -> bool {
        self.almost_eq(other)
    }
}

impl Vec3 {
    #[must_use]
    pub fn new(x: f64, y: f64, z: f64) -> Vec3 {
        Vec3 { x, y, z }
    }
    #[must_use]
    pub fn zero() -> Vec3 {
        Vec3 { x: 0.0, y: 0.0, z: 0.0 }
    }
    #[must_use]
    pub fn splat(v: f64) -> Vec3 {
        Vec3 { x: v, y: v, z: v }
    }
    #[must_use]
    pub fn x_axis() -> Vec3 {
        Vec3 { x: 1.0, y: 0.0, z: 0.0 }
    }
    #[must_use]
    pub fn y_axis() -> Vec3 {
        Vec3 { x: 0.0, y: 1.0, z: 0.0 }
    }
    #[must_use]
    pub fn z_axis() -> Vec3 {
        Vec3 { x: 0.0, y: 0.0, z: 1.0 }
    }

    /// Returns the dot product of two vectors.
    #[must_use]
    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the right-handed cross product `self × other`.
    ///
    /// The result is orthogonal to both operands, and is the zero vector when the operands are
    /// parallel.
    #[must_use]
    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Returns the squared length of the vector.
    #[must_use]
    pub fn len_squared(&self) -> f64 {
        self.dot(*self)
    }

    /// Returns the length (magnitude) of the vector. Never negative, and finite for any finite
    /// vector.
    #[must_use]
    pub fn len(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// Returns a unit vector in the same direction.
    ///
    /// If the length is exactly zero, returns the zero vector instead of dividing by zero.
    /// Negative zero components are converted to positive zero.
    #[must_use]
    pub fn normed(&self) -> Vec3 {
        let mut rv = match self.len() {
            0.0 => Vec3::zero(),
            len => *self / len,
        };
        rv.x = vm_float::force_positive_zero(rv.x);
        rv.y = vm_float::force_positive_zero(rv.y);
        rv.z = vm_float::force_positive_zero(rv.z);
        rv
    }

    /// Returns the angle between two vectors in degrees, in `[0, 180]`.
    ///
    /// If either vector has zero length the angle is defined to be 0. The cosine is clamped to
    /// `[-1, 1]` before `acos` so rounding never produces `NaN`.
    ///
    /// ```
    /// use vmatrix::util::linalg::Vec3;
    /// assert!((Vec3::x_axis().angle_degrees(Vec3::y_axis()) - 90.0).abs() < 1e-9);
    /// assert_eq!(Vec3::zero().angle_degrees(Vec3::x_axis()), 0.0);
    /// ```
    #[must_use]
    pub fn angle_degrees(&self, other: Vec3) -> f64 {
        if self.len() == 0.0 || other.len() == 0.0 {
            return 0.0;
        }
        let cos_theta = self.normed().dot(other.normed()).clamp(-1.0, 1.0);
        cos_theta.acos().to_degrees()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn almost_eq(&self, rhs: &Vec3) -> bool {
        if self.is_finite() || rhs.is_finite() {
            (self.x - rhs.x).abs() < EPSILON
                && (self.y - rhs.y).abs() < EPSILON
                && (self.z - rhs.z).abs() < EPSILON
        } else {
            self.x == rhs.x && self.y == rhs.y && self.z == rhs.z
        }
    }

    /// Formats as `(x, y, z)` using the shortest representation of each component.
    pub fn to_plain_string(&self) -> String {
        format!(
            "({}, {}, {})",
            vm_float::format_plain(self.x),
            vm_float::format_plain(self.y),
            vm_float::format_plain(self.z)
        )
    }
}

impl AlmostEq for Vec3 {
    fn almost_eq(&self, rhs: &Self) -> bool {
        Vec3::almost_eq(self, rhs)
    }
}

impl Zero for Vec3 {
    fn zero() -> Self {
        Self::zero()
    }

    fn is_zero(&self) -> bool {
        self.almost_eq(&Self::zero())
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(value: [f64; 3]) -> Self {
        Vec3 {
            x: value[0],
            y: value[1],
            z: value[2],
        }
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(value: Vec3) -> Self {
        [value.x, value.y, value.z]
    }
}

impl FromStr for Vec3 {
    type Err = anyhow::Error;

    /// Parses `x,y,z`. Components that are not numbers are read as 0; a wrong number of
    /// components is an error.
    fn from_str(s: &str) -> Result<Self> {
        let parts = s.split(',').collect_vec();
        if parts.len() != 3 {
            bail!("expected 3 comma-separated components, got {}: `{s}`", parts.len());
        }
        Ok(Vec3 {
            x: vm_float::parse_or_zero(parts[0]),
            y: vm_float::parse_or_zero(parts[1]),
            z: vm_float::parse_or_zero(parts[2]),
        })
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "vec({:.*}, {:.*}, {:.*})", p, self.x, p, self.y, p, self.z),
            None => write!(f, "vec({}, {}, {})", self.x, self.y, self.z),
        }
    }
}

impl Add<Vec3> for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}
impl AddAssign<Vec3> for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub<Vec3> for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}
impl SubAssign<Vec3> for Vec3 {
    fn sub_assign(&mut self, rhs: Vec3) {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self.z -= rhs.z;
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Self::Output {
        rhs * self
    }
}
impl Mul<Vec3> for f64 {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Self::Output {
        Vec3 {
            x: self * rhs.x,
            y: self * rhs.y,
            z: self * rhs.z,
        }
    }
}
impl MulAssign<f64> for Vec3 {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
        self.z *= rhs;
    }
}

impl Div<f64> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: f64) -> Self::Output {
        Vec3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Self::Output {
        Vec3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Sum for Vec3 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Vec3::zero(), |acc, v| acc + v)
    }
}

/// A point or offset in screen space, in pixels. `y` grows downwards.
#[derive(Default, Debug, Copy, Clone, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Vec2 {
        Vec2 { x, y }
    }
    #[must_use]
    pub fn zero() -> Vec2 {
        Vec2 { x: 0.0, y: 0.0 }
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "({:.*}, {:.*})", p, self.x, p, self.y),
            None => write!(f, "({}, {})", self.x, self.y),
        }
    }
}

impl Add<Vec2> for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Self::Output {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}
impl Sub<Vec2> for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Self::Output {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// The sizes a [`Matrix`] may have.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MatrixSize {
    #[default]
    #[serde(rename = "2x2")]
    Two,
    #[serde(rename = "3x3")]
    Three,
}

impl MatrixSize {
    pub fn n(self) -> usize {
        match self {
            MatrixSize::Two => 2,
            MatrixSize::Three => 3,
        }
    }
}

impl TryFrom<usize> for MatrixSize {
    type Error = anyhow::Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            2 => Ok(MatrixSize::Two),
            3 => Ok(MatrixSize::Three),
            n => bail!("unsupported matrix size: {n}x{n} (only 2x2 and 3x3 are supported)"),
        }
    }
}

impl FromStr for MatrixSize {
    type Err = anyhow::Error;

    /// Accepts `2`, `3`, `2x2` or `3x3`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "2" | "2x2" => Ok(MatrixSize::Two),
            "3" | "3x3" => Ok(MatrixSize::Three),
            other => bail!("unsupported matrix size: `{other}`"),
        }
    }
}

impl fmt::Display for MatrixSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.n())
    }
}

/// A square, row-major matrix of size 2×2 or 3×3.
///
/// Cells outside the active `n × n` block are always zero, so operations never need to care about
/// them. Serialises as a nested array of rows, e.g. `[[1.0,2.0],[3.0,4.0]]`.
///
/// ```
/// use vmatrix::util::linalg::{Matrix, MatrixSize};
/// let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// assert_eq!(m.size(), MatrixSize::Two);
/// assert_eq!(m.determinant(), -2.0);
/// ```
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
#[must_use]
pub struct Matrix {
    size: MatrixSize,
    cells: [[f64; 3]; 3],
}

impl Matrix {
    pub fn zeros(size: MatrixSize) -> Matrix {
        Matrix {
            size,
            cells: [[0.0; 3]; 3],
        }
    }

    pub fn identity(size: MatrixSize) -> Matrix {
        let mut rv = Self::zeros(size);
        for i in 0..size.n() {
            rv.cells[i][i] = 1.0;
        }
        rv
    }

    /// Builds a matrix from its rows. Fails if the matrix is not square, or not 2×2 or 3×3.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Matrix> {
        let size = MatrixSize::try_from(rows.len())?;
        let mut rv = Self::zeros(size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size.n() {
                bail!(
                    "row {i} has {} entries, expected {} for a {size} matrix",
                    row.len(),
                    size.n()
                );
            }
            for (j, value) in row.into_iter().enumerate() {
                rv.cells[i][j] = value;
            }
        }
        Ok(rv)
    }

    pub fn size(&self) -> MatrixSize {
        self.size
    }
    pub fn n(&self) -> usize {
        self.size.n()
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.n())
            .map(|i| self.cells[i][..self.n()].to_vec())
            .collect()
    }

    /// Iterates over `(row, col)` for every active cell, row by row.
    pub fn indices(&self) -> impl Iterator<Item = (usize, usize)> {
        (0..self.n()).cartesian_product(0..self.n())
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self[(row, col)]
    }
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] = value;
    }

    /// Returns the determinant: `ad - bc` for 2×2, cofactor expansion along the first row for 3×3.
    pub fn determinant(&self) -> f64 {
        let m = &self.cells;
        match self.size {
            MatrixSize::Two => m[0][0] * m[1][1] - m[0][1] * m[1][0],
            MatrixSize::Three => {
                let [a, b, c] = m[0];
                let [d, e, f] = m[1];
                let [g, h, i] = m[2];
                a * (e * i - f * h) - b * (d * i - f * g) + c * (d * h - e * g)
            }
        }
    }

    pub fn transposed(&self) -> Matrix {
        let mut rv = Self::zeros(self.size);
        for (i, j) in self.indices() {
            rv.cells[j][i] = self.cells[i][j];
        }
        rv
    }

    /// Returns a copy with rows `a` and `b` exchanged.
    pub fn with_rows_swapped(&self, a: usize, b: usize) -> Matrix {
        check_lt!(a, self.n());
        check_lt!(b, self.n());
        let mut rv = *self;
        rv.cells.swap(a, b);
        rv
    }

    pub fn almost_eq(&self, rhs: &Matrix) -> bool {
        self.size == rhs.size
            && self
                .indices()
                .all(|(i, j)| (self.cells[i][j] - rhs.cells[i][j]).abs() < EPSILON)
    }

    /// Renders one bracketed row per line, each value right-aligned to width 3:
    /// ```text
    /// [  1   2]
    /// [  3   4]
    /// ```
    pub fn to_display_string(&self) -> String {
        self.rows()
            .iter()
            .map(|row| {
                let values = row
                    .iter()
                    .map(|&v| format!("{:>3}", vm_float::format_plain(v)))
                    .join(" ");
                format!("[{values}]")
            })
            .join("\n")
    }

    /// Formats as `[[a, b], [c, d]]`.
    pub fn to_plain_string(&self) -> String {
        let rows = self
            .rows()
            .iter()
            .map(|row| format!("[{}]", row.iter().map(|&v| vm_float::format_plain(v)).join(", ")))
            .join(", ");
        format!("[{rows}]")
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.almost_eq(other)
    }
}

impl AlmostEq for Matrix {
    fn almost_eq(&self, rhs: &Self) -> bool {
        Matrix::almost_eq(self, rhs)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = anyhow::Error;

    fn try_from(value: Vec<Vec<f64>>) -> Result<Self> {
        Self::from_rows(value)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(value: Matrix) -> Self {
        value.rows()
    }
}

impl FromStr for Matrix {
    type Err = anyhow::Error;

    /// Parses rows separated by `;` and values separated by `,`, e.g. `1,2;3,4`.
    /// Values that are not numbers are read as 0.
    fn from_str(s: &str) -> Result<Self> {
        let rows = s
            .split(';')
            .map(|row| row.split(',').map(vm_float::parse_or_zero).collect_vec())
            .collect_vec();
        Self::from_rows(rows).with_context(|| format!("invalid matrix: `{s}`"))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        check_lt!(row, self.n());
        check_lt!(col, self.n());
        &self.cells[row][col]
    }
}
impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        check_lt!(row, self.n());
        check_lt!(col, self.n());
        &mut self.cells[row][col]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}

impl Add<Matrix> for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Matrix) -> Self::Output {
        check_eq!(self.size, rhs.size);
        let mut rv = Matrix::zeros(self.size);
        for (i, j) in self.indices() {
            rv.cells[i][j] = self.cells[i][j] + rhs.cells[i][j];
        }
        rv
    }
}

impl Sub<Matrix> for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Matrix) -> Self::Output {
        check_eq!(self.size, rhs.size);
        let mut rv = Matrix::zeros(self.size);
        for (i, j) in self.indices() {
            rv.cells[i][j] = self.cells[i][j] - rhs.cells[i][j];
        }
        rv
    }
}

impl Mul<Matrix> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Matrix) -> Self::Output {
        check_eq!(self.size, rhs.size);
        let mut rv = Matrix::zeros(self.size);
        for (i, j) in self.indices() {
            rv.cells[i][j] = (0..self.n())
                .map(|k| self.cells[i][k] * rhs.cells[k][j])
                .sum();
        }
        rv
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: f64) -> Self::Output {
        let mut rv = self;
        for (i, j) in self.indices() {
            rv.cells[i][j] *= rhs;
        }
        rv
    }
}

/// The result of an engine operation.
///
/// Scalars stay scalars: `is_angle` marks results measured in degrees, so that they can be
/// formatted and coloured differently from plain numbers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OpResult {
    Vector(Vec3),
    Scalar { value: f64, is_angle: bool },
    Matrix(Matrix),
}

impl OpResult {
    pub fn scalar(value: f64) -> Self {
        Self::Scalar {
            value,
            is_angle: false,
        }
    }
    pub fn angle(degrees: f64) -> Self {
        Self::Scalar {
            value: degrees,
            is_angle: true,
        }
    }

    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar { value, .. } => Some(*value),
            _ => None,
        }
    }
    pub fn as_matrix(&self) -> Option<Matrix> {
        match self {
            Self::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    /// The arrow drawn for this result: vectors as themselves, scalars as a short arrow along X
    /// proportional to the value. Matrices are not drawn.
    pub fn graphic_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            Self::Scalar {
                value,
                is_angle: false,
            } => Some(Vec3::new(value * SCALAR_GRAPHIC_FACTOR, 0.0, 0.0)),
            Self::Scalar {
                value,
                is_angle: true,
            } => Some(Vec3::new(value * ANGLE_GRAPHIC_FACTOR, 0.0, 0.0)),
            Self::Matrix(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Vector(v) => Value::Vector(*v),
            Self::Scalar { value, .. } => Value::Scalar(*value),
            Self::Matrix(m) => Value::Matrix(*m),
        }
    }
}

impl fmt::Display for OpResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector(v) => write!(f, "({:.4}, {:.4}, {:.4})", v.x, v.y, v.z),
            Self::Scalar {
                value,
                is_angle: true,
            } => write!(f, "{value:.4}°"),
            Self::Scalar {
                value,
                is_angle: false,
            } => write!(f, "{value:.6}"),
            Self::Matrix(m) => write!(f, "{}", m.to_display_string()),
        }
    }
}

/// An operand or result as it is stored: a bare number, an `{x, y, z}` object, or a nested array
/// of matrix rows.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Vector(Vec3),
    Matrix(Matrix),
}

impl Value {
    pub fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(x) => Some(*x),
            _ => None,
        }
    }
    pub fn as_matrix(&self) -> Option<Matrix> {
        match self {
            Self::Matrix(m) => Some(*m),
            _ => None,
        }
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Self::Vector(value)
    }
}
impl From<Matrix> for Value {
    fn from(value: Matrix) -> Self {
        Self::Matrix(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a() -> Vec3 {
        Vec3::new(3.0, 4.0, 2.0)
    }
    fn b() -> Vec3 {
        Vec3::new(1.0, -2.0, 5.0)
    }

    fn sample_vectors() -> Vec<Vec3> {
        vec![
            a(),
            b(),
            Vec3::new(-7.5, 0.25, 3.0),
            Vec3::new(1e-3, -2e3, 0.0),
            Vec3::x_axis(),
            Vec3::new(-1.0, -1.0, -1.0),
        ]
    }

    fn sample_matrices(size: MatrixSize) -> Vec<Matrix> {
        match size {
            MatrixSize::Two => vec![
                Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(),
                Matrix::from_rows(vec![vec![-0.5, 7.0], vec![0.0, 2.25]]).unwrap(),
            ],
            MatrixSize::Three => vec![
                Matrix::from_rows(vec![
                    vec![2.0, -1.0, 0.0],
                    vec![4.0, 3.0, 1.0],
                    vec![0.5, 8.0, -2.0],
                ])
                .unwrap(),
                Matrix::from_rows(vec![
                    vec![1.0, 2.0, 3.0],
                    vec![0.0, 1.0, 4.0],
                    vec![5.0, 6.0, 0.0],
                ])
                .unwrap(),
            ],
        }
    }

    // ==================== Vec3 ====================

    #[test]
    fn vec3_arithmetic() {
        assert_eq!(a() + b(), Vec3::new(4.0, 2.0, 7.0));
        assert_eq!(a() - b(), Vec3::new(2.0, 6.0, -3.0));
        assert_eq!(2.0 * a(), Vec3::new(6.0, 8.0, 4.0));
        assert_eq!(a() * 2.0, Vec3::new(6.0, 8.0, 4.0));
        assert_eq!(a() / 2.0, Vec3::new(1.5, 2.0, 1.0));
        assert_eq!(-a(), Vec3::new(-3.0, -4.0, -2.0));

        let mut c = a();
        c += b();
        c -= Vec3::splat(1.0);
        c *= 2.0;
        assert_eq!(c, Vec3::new(6.0, 2.0, 12.0));

        let sum: Vec3 = vec![a(), b(), Vec3::z_axis()].into_iter().sum();
        assert_eq!(sum, Vec3::new(4.0, 2.0, 8.0));
    }

    #[test]
    fn vec3_dot_and_cross() {
        assert_eq!(a().dot(b()), 5.0);
        assert_eq!(a().cross(b()), Vec3::new(24.0, -13.0, -10.0));
        assert_eq!(Vec3::x_axis().cross(Vec3::y_axis()), Vec3::z_axis());
        assert_eq!(Vec3::y_axis().cross(Vec3::x_axis()), -Vec3::z_axis());
    }

    #[test]
    fn vec3_cross_is_orthogonal() {
        for v1 in sample_vectors() {
            for v2 in sample_vectors() {
                let c = v1.cross(v2);
                let tolerance = 1e-9 * (1.0 + v1.len_squared() * v2.len());
                assert!(c.dot(v1).abs() < tolerance, "{v1} x {v2} not orthogonal to {v1}");
                assert!(c.dot(v2).abs() < tolerance, "{v1} x {v2} not orthogonal to {v2}");
            }
        }
    }

    #[test]
    fn vec3_magnitude() {
        assert!((a().len() - 29.0_f64.sqrt()).abs() < 1e-12);
        assert!((a().len() - 5.3852).abs() < 1e-4);
        for v in sample_vectors() {
            assert!(v.len() >= 0.0);
            check_almost_eq!(v.dot(v), v.len() * v.len());
        }
        assert_eq!(Vec3::zero().len(), 0.0);
    }

    #[test]
    fn vec3_normed() {
        for v in sample_vectors() {
            check_almost_eq!(v.normed().len(), 1.0);
        }
        let zero = Vec3::zero().normed();
        assert_eq!(zero, Vec3::zero());
        assert!(zero.x.is_sign_positive() && zero.y.is_sign_positive() && zero.z.is_sign_positive());
        assert_eq!(Vec3::new(0.0, -3.0, 0.0).normed(), Vec3::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn vec3_large_components() {
        for v in [
            Vec3::new(1e200, 0.0, 0.0),
            Vec3::new(-3e200, 4e200, 0.0),
            Vec3::splat(f64::MAX / 2.0),
        ] {
            assert!(v.len().is_finite());
            check_almost_eq!(v.normed().len(), 1.0);
            assert!(v.angle_degrees(v).abs() < 1e-5);
            assert!((v.angle_degrees(-v) - 180.0).abs() < 1e-5);
        }
        check_almost_eq!(Vec3::new(-3e200, 4e200, 0.0).len() / 1e200, 5.0);
    }

    #[test]
    fn vec3_angle() {
        for v in sample_vectors() {
            assert!(v.angle_degrees(v).abs() < 1e-5);
            assert!((v.angle_degrees(-v) - 180.0).abs() < 1e-5);
        }
        assert_eq!(a().angle_degrees(Vec3::zero()), 0.0);
        assert_eq!(Vec3::zero().angle_degrees(Vec3::zero()), 0.0);
        check_almost_eq!(Vec3::x_axis().angle_degrees(Vec3::new(1.0, 1.0, 0.0)), 45.0);
    }

    #[test]
    fn vec3_parse() {
        assert_eq!("3,4,2".parse::<Vec3>().unwrap(), a());
        assert_eq!(" 1 , -2 , 5 ".parse::<Vec3>().unwrap(), b());
        assert_eq!("x,2,".parse::<Vec3>().unwrap(), Vec3::new(0.0, 2.0, 0.0));
        assert!("1,2".parse::<Vec3>().is_err());
    }

    #[test]
    fn vec3_display() {
        assert_eq!(format!("{}", Vec3::new(1.5, 2.0, -3.0)), "vec(1.5, 2, -3)");
        assert_eq!(format!("{:.2}", Vec3::new(1.23456, 7.89012, 0.0)), "vec(1.23, 7.89, 0.00)");
        assert_eq!(Vec3::new(1.5, 2.0, -0.0).to_plain_string(), "(1.5, 2, 0)");
    }

    #[test]
    fn vec3_json() {
        let json = serde_json::to_string(&a()).unwrap();
        assert_eq!(json, r#"{"x":3.0,"y":4.0,"z":2.0}"#);
        let decoded: Vec3 = serde_json::from_str(r#"{"x":3,"y":4,"z":2}"#).unwrap();
        assert_eq!(decoded, a());
    }

    // ==================== Matrix ====================

    #[test]
    fn matrix_elementwise() {
        for size in [MatrixSize::Two, MatrixSize::Three] {
            let ms = sample_matrices(size);
            let (m1, m2) = (ms[0], ms[1]);
            let sum = m1 + m2;
            let diff = m1 - m2;
            for (i, j) in m1.indices() {
                assert_eq!(sum[(i, j)], m1[(i, j)] + m2[(i, j)]);
                assert_eq!(diff[(i, j)], m1[(i, j)] - m2[(i, j)]);
            }
            assert_eq!(sum.size(), size);
        }
    }

    #[test]
    fn matrix_multiply() {
        for size in [MatrixSize::Two, MatrixSize::Three] {
            for m in sample_matrices(size) {
                assert_eq!(Matrix::identity(size) * m, m);
                assert_eq!(m * Matrix::identity(size), m);
            }
        }
        let m1 = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let m2 = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        assert_eq!(
            m1 * m2,
            Matrix::from_rows(vec![vec![19.0, 22.0], vec![43.0, 50.0]]).unwrap()
        );
    }

    #[test]
    #[should_panic(expected = "check failed")]
    fn matrix_size_mismatch_panics() {
        let _ = Matrix::identity(MatrixSize::Two) + Matrix::identity(MatrixSize::Three);
    }

    #[test]
    fn matrix_determinant() {
        assert_eq!(Matrix::identity(MatrixSize::Two).determinant(), 1.0);
        assert_eq!(Matrix::identity(MatrixSize::Three).determinant(), 1.0);
        let m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.determinant(), -2.0);

        let m = sample_matrices(MatrixSize::Three)[1];
        // 1(0 - 24) - 2(0 - 20) + 3(0 - 5) = 1
        assert_eq!(m.determinant(), 1.0);
        for (r1, r2) in [(0, 1), (0, 2), (1, 2)] {
            check_almost_eq!(m.with_rows_swapped(r1, r2).determinant(), -m.determinant());
        }
        for m in sample_matrices(MatrixSize::Three) {
            check_almost_eq!(m.transposed().determinant(), m.determinant());
        }
    }

    #[test]
    fn matrix_from_rows_rejects_bad_shapes() {
        assert!(Matrix::from_rows(vec![vec![1.0]]).is_err());
        assert!(Matrix::from_rows(vec![vec![0.0; 4]; 4]).is_err());
        assert!(Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(Matrix::from_rows(Vec::new()).is_err());
    }

    #[test]
    fn matrix_cells() {
        let mut m = Matrix::zeros(MatrixSize::Three);
        m.set(2, 1, 7.0);
        m[(0, 0)] = -1.0;
        assert_eq!(m.get(2, 1), 7.0);
        assert_eq!(m.rows(), vec![vec![-1.0, 0.0, 0.0], vec![0.0; 3], vec![0.0, 7.0, 0.0]]);
    }

    #[test]
    #[should_panic(expected = "check failed")]
    fn matrix_index_out_of_range_panics() {
        let m = Matrix::zeros(MatrixSize::Two);
        let _cell = m[(2, 0)];
    }

    #[test]
    fn matrix_parse_and_format() {
        let m: Matrix = "1,2;3,4".parse().unwrap();
        assert_eq!(m.to_display_string(), "[  1   2]\n[  3   4]");
        assert_eq!(m.to_plain_string(), "[[1, 2], [3, 4]]");
        let m: Matrix = "1,a,0;0,1,0;0,0,1.5".parse().unwrap();
        assert_eq!(m.get(0, 1), 0.0);
        assert_eq!(m.get(2, 2), 1.5);
        assert!("1,2,3;4,5".parse::<Matrix>().is_err());
    }

    #[test]
    fn matrix_json() {
        let m: Matrix = "1,2;3,4".parse().unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[1.0,2.0],[3.0,4.0]]");
        assert_eq!(serde_json::from_str::<Matrix>(&json).unwrap(), m);
        assert!(serde_json::from_str::<Matrix>("[[1.0]]").is_err());
    }

    #[test]
    fn matrix_size_parse() {
        assert_eq!("2x2".parse::<MatrixSize>().unwrap(), MatrixSize::Two);
        assert_eq!("3".parse::<MatrixSize>().unwrap(), MatrixSize::Three);
        assert!("4x4".parse::<MatrixSize>().is_err());
        assert_eq!(MatrixSize::Three.to_string(), "3x3");
    }

    // ==================== OpResult / Value ====================

    #[test]
    fn op_result_graphic_vector() {
        assert_eq!(OpResult::Vector(a()).graphic_vector(), Some(a()));
        assert_eq!(
            OpResult::scalar(5.0).graphic_vector(),
            Some(Vec3::new(0.5, 0.0, 0.0))
        );
        assert_eq!(
            OpResult::angle(90.0).graphic_vector(),
            Some(Vec3::new(0.9, 0.0, 0.0))
        );
        assert_eq!(
            OpResult::Matrix(Matrix::identity(MatrixSize::Two)).graphic_vector(),
            None
        );
    }

    #[test]
    fn op_result_display() {
        assert_eq!(OpResult::Vector(a()).to_string(), "(3.0000, 4.0000, 2.0000)");
        assert_eq!(OpResult::scalar(5.0).to_string(), "5.000000");
        assert_eq!(OpResult::angle(45.0).to_string(), "45.0000°");
    }

    #[test]
    fn value_untagged_json() {
        let values = vec![
            Value::Scalar(5.0),
            Value::Vector(a()),
            Value::Matrix("1,2;3,4".parse().unwrap()),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(
            json,
            r#"[5.0,{"x":3.0,"y":4.0,"z":2.0},[[1.0,2.0],[3.0,4.0]]]"#
        );
        let decoded: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, values);
    }
}
