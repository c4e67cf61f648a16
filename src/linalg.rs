/// Tolerance shared by the optimality test, the blocking-set membership
/// test, the singular-pivot guard and the LU singularity check.
pub(crate) const EPS: f64 = 1e-8;

pub(crate) fn dot(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len());
    x.iter().zip(y).map(|(a, b)| a * b).sum()
}

/// Dense row-major matrix.
#[derive(Debug, Clone)]
pub(crate) struct Matrix {
    data: Vec<Vec<f64>>,
}

impl Matrix {
    pub(crate) fn from_rows(data: Vec<Vec<f64>>) -> Self {
        Self { data }
    }

    pub(crate) fn identity(size: usize) -> Self {
        let mut data = Vec::with_capacity(size);
        for i in 0..size {
            let mut row = vec![0.0; size];
            row[i] = 1.0;
            data.push(row)
        }
        Self { data }
    }

    /// Identity with row `r` replaced, the elementary factor of the
    /// product-form inverse update.
    pub(crate) fn elementary(size: usize, r: usize, row: Vec<f64>) -> Self {
        assert_eq!(row.len(), size);
        let mut matrix = Self::identity(size);
        matrix.data[r] = row;
        matrix
    }

    pub(crate) fn m(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn n(&self) -> usize {
        self.data[0].len()
    }

    pub(crate) fn row(&self, i: usize) -> &[f64] {
        &self.data[i]
    }

    pub(crate) fn set_row(&mut self, i: usize, row: Vec<f64>) {
        assert_eq!(row.len(), self.n());
        self.data[i] = row;
    }

    pub(crate) fn column(&self, j: usize) -> Vec<f64> {
        self.data.iter().map(|x| x[j]).collect()
    }

    /// `self * vector`
    pub(crate) fn right_mul_by(&self, vector: &[f64]) -> Vec<f64> {
        assert_eq!(vector.len(), self.n());
        self.data.iter().map(|x| dot(x, vector)).collect()
    }

    /// `transpose(vector) * self`
    pub(crate) fn left_mul_by(&self, vector: &[f64]) -> Vec<f64> {
        assert_eq!(vector.len(), self.m());
        (0..self.n())
            .map(|j| dot(vector, &self.column(j)))
            .collect()
    }

    /// `self * other`
    pub(crate) fn matmul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.n(), other.m());
        let columns = (0..other.n()).map(|j| other.column(j)).collect::<Vec<_>>();
        let data = self
            .data
            .iter()
            .map(|row| columns.iter().map(|column| dot(row, column)).collect())
            .collect();
        Matrix { data }
    }

    /// In-place LU decomposition with partial pivoting, or `None` when the
    /// matrix is singular to within `EPS`.
    ///
    /// Golub, G., & Van Loan, C. (1996). Matrix Computations.
    /// The Johns Hopkins University Press.
    pub(crate) fn factorize(mut self) -> Option<Lu> {
        assert_eq!(
            self.m(),
            self.n(),
            "non-square Matrix cannot be factorized; m={}, n={}",
            self.m(),
            self.n()
        );
        let n = self.m();
        let mut p = Vec::with_capacity(n);

        for k in 0..n {
            let mut mu = k;
            let mut magnitude = self.data[k][k].abs();
            for i in k + 1..n {
                if self.data[i][k].abs() > magnitude {
                    mu = i;
                    magnitude = self.data[i][k].abs();
                }
            }
            if magnitude <= EPS {
                return None;
            }
            // interchange columns k.. only: the multipliers already stored
            // to the left must stay with their rows for `Lu::solve` to
            // replay the swaps mid-elimination
            if mu != k {
                let (upper, lower) = self.data.split_at_mut(mu);
                for j in k..n {
                    std::mem::swap(&mut upper[k][j], &mut lower[0][j]);
                }
            }
            p.push(mu);

            let pivot = self.data[k][k];
            for i in k + 1..n {
                self.data[i][k] /= pivot;
                for j in k + 1..n {
                    let adjustment = self.data[i][k] * self.data[k][j];
                    self.data[i][j] -= adjustment;
                }
            }
        }
        Some(Lu { p, matrix: self })
    }
}

pub(crate) struct Lu {
    p: Vec<usize>,
    matrix: Matrix,
}

impl Lu {
    /// Solve `self * x = b` for `x`.
    pub(crate) fn solve(&self, mut b: Vec<f64>) -> Vec<f64> {
        let n = self.matrix.m();
        assert_eq!(n, b.len());
        for k in 0..n {
            b.swap(k, self.p[k]);
            for i in k + 1..n {
                b[i] -= b[k] * self.matrix.data[i][k]
            }
        }
        for i in (0..n).rev() {
            for j in i + 1..n {
                b[i] -= self.matrix.data[i][j] * b[j];
            }
            b[i] /= self.matrix.data[i][i]
        }
        b
    }

    /// Assemble the full inverse, one unit-vector solve per column.
    pub(crate) fn inverse(&self) -> Matrix {
        let n = self.matrix.m();
        let mut inverse = Matrix::identity(n);
        for j in 0..n {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            let column = self.solve(e);
            for i in 0..n {
                inverse.data[i][j] = column[i];
            }
        }
        inverse
    }
}
