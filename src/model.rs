use crate::error::Error;
use crate::linalg::{dot, Matrix};

/// Immutable problem data: maximize `c·x` subject to `A·x <= b`.
///
/// Each row of `A` is a constraint normal. The model requires at least as
/// many constraints as variables, since a vertex needs `n` tight rows.
#[derive(Debug, Clone)]
pub struct LpModel {
    a: Matrix,
    b: Vec<f64>,
    c: Vec<f64>,
}

impl LpModel {
    /// Validate and build a model. `a` must be an `m x n` matrix with
    /// `m >= n >= 1`, `b` of length `m` and `c` of length `n`.
    pub fn new(a: Vec<Vec<f64>>, b: Vec<f64>, c: Vec<f64>) -> Result<Self, Error> {
        let n = c.len();
        if n == 0 {
            return Err(Error::Dimension(
                "objective must have at least one coefficient".to_string(),
            ));
        }
        for (i, row) in a.iter().enumerate() {
            if row.len() != n {
                return Err(Error::Dimension(format!(
                    "constraint row {} has {} coefficients, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
        }
        if a.len() < n {
            return Err(Error::Dimension(format!(
                "{} constraint rows cannot pin down {} variables",
                a.len(),
                n
            )));
        }
        if b.len() != a.len() {
            return Err(Error::Dimension(format!(
                "right-hand side has length {}, expected {}",
                b.len(),
                a.len()
            )));
        }
        Ok(Self {
            a: Matrix::from_rows(a),
            b,
            c,
        })
    }

    pub fn num_constraints(&self) -> usize {
        self.b.len()
    }

    pub fn num_variables(&self) -> usize {
        self.c.len()
    }

    /// `c·x`
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        dot(&self.c, x)
    }

    pub(crate) fn a(&self) -> &Matrix {
        &self.a
    }

    pub(crate) fn b(&self) -> &[f64] {
        &self.b
    }

    pub(crate) fn c(&self) -> &[f64] {
        &self.c
    }

    /// A basis must name `n` distinct constraint rows.
    pub(crate) fn check_basis(&self, basis: &[usize]) -> Result<(), Error> {
        if basis.len() != self.num_variables() {
            return Err(Error::Dimension(format!(
                "basis has {} indices, expected {}",
                basis.len(),
                self.num_variables()
            )));
        }
        for (i, &k) in basis.iter().enumerate() {
            if k >= self.num_constraints() {
                return Err(Error::Dimension(format!(
                    "basis index {} out of range for {} constraints",
                    k,
                    self.num_constraints()
                )));
            }
            if basis[..i].contains(&k) {
                return Err(Error::Dimension(format!(
                    "basis index {} appears more than once",
                    k
                )));
            }
        }
        Ok(())
    }
}
