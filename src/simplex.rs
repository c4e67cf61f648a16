use crate::error::Error;
use crate::linalg::{dot, Matrix, EPS};
use crate::model::LpModel;

/// Terminal state of a solve. Faults surface as [`Error`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every reduced cost is non-negative; the vertex is optimal.
    Optimal,
    /// The objective increases without bound along an edge leaving the
    /// reported vertex.
    Unbounded,
}

/// Snapshot returned to the caller once the engine reaches a terminal state.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: Status,
    /// The optimal vertex, or the last vertex visited when unbounded.
    pub vertex: Vec<f64>,
    pub objective_value: f64,
    /// Completed pivots.
    pub iterations: usize,
}

/// Revised simplex engine.
///
/// Owns the mutable solve state: the basis `B`, the tight submatrix `AB`,
/// its cached inverse and the current vertex. Each pivot swaps one basis row
/// and patches the inverse with an elementary factor in O(n²) instead of
/// re-inverting.
///
/// Feasibility of the starting basis is the caller's responsibility; an
/// infeasible start yields numerical garbage, not a diagnostic.
pub struct SimplexEngine<'a> {
    model: &'a LpModel,
    basis: Vec<usize>,
    basis_matrix: Matrix,
    basis_rhs: Vec<f64>,
    basis_inverse: Matrix,
    x: Vec<f64>,
    iterations: usize,
    iteration_limit: Option<usize>,
    observer: Option<Box<dyn FnMut(usize, &[f64]) + 'a>>,
}

impl<'a> SimplexEngine<'a> {
    /// Validate the basis against the model, then factorize the tight
    /// submatrix to recover the starting vertex and its inverse.
    pub fn new(model: &'a LpModel, basis: Vec<usize>) -> Result<Self, Error> {
        model.check_basis(&basis)?;

        let rows = basis
            .iter()
            .map(|&k| model.a().row(k).to_vec())
            .collect::<Vec<_>>();
        let basis_matrix = Matrix::from_rows(rows);
        let basis_rhs = basis.iter().map(|&k| model.b()[k]).collect::<Vec<_>>();

        let lu = basis_matrix
            .clone()
            .factorize()
            .ok_or(Error::SingularBasis)?;
        let x = lu.solve(basis_rhs.clone());
        let basis_inverse = lu.inverse();

        Ok(Self {
            model,
            basis,
            basis_matrix,
            basis_rhs,
            basis_inverse,
            x,
            iterations: 0,
            iteration_limit: None,
            observer: None,
        })
    }

    /// Cap the number of pivots. Exceeding the cap is reported as
    /// [`Error::IterationLimit`], never silently truncated.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Install a tracing callback invoked once per completed pivot with the
    /// iteration number and the new vertex. The callback must not block.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(usize, &[f64]) + 'a,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Pivot until optimal or unbounded.
    pub fn solve(mut self) -> Result<Solution, Error> {
        let status = loop {
            if let Some(status) = self.step()? {
                break status;
            }
            if let Some(limit) = self.iteration_limit {
                if self.iterations >= limit {
                    return Err(Error::IterationLimit { limit });
                }
            }
        };
        let objective_value = self.model.objective_value(&self.x);
        log::debug!(
            "{:?} after {} iterations, objective {}",
            status,
            self.iterations,
            objective_value
        );
        Ok(Solution {
            status,
            vertex: self.x,
            objective_value,
            iterations: self.iterations,
        })
    }

    /// One iteration: `Ok(Some(status))` when a terminal state is reached
    /// before pivoting, `Ok(None)` after a completed pivot.
    fn step(&mut self) -> Result<Option<Status>, Error> {
        // reduced costs: the objective in basis-inverse coordinates
        let reduced = self.basis_inverse.left_mul_by(self.model.c());
        let r = match reduced.iter().position(|&l| l < -EPS) {
            None => return Ok(Some(Status::Optimal)),
            Some(r) => r,
        };

        // relaxing the constraint in slot `r` moves the vertex along `d`
        let direction = self
            .basis_inverse
            .column(r)
            .iter()
            .map(|v| -v)
            .collect::<Vec<_>>();

        let (entering, step_length) = match self.ratio_test(&direction) {
            None => return Ok(Some(Status::Unbounded)),
            Some(found) => found,
        };

        self.pivot(r, entering, &direction, step_length)?;
        self.iterations += 1;
        log::trace!(
            "iteration {}: row {} entered slot {}, vertex {:?}",
            self.iterations,
            entering,
            r,
            self.x
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(self.iterations, &self.x);
        }
        Ok(None)
    }

    /// Smallest slack-over-rate ratio among rows whose slack shrinks along
    /// `direction`; the first such row wins ties. `None` means no row blocks
    /// the move and the objective is unbounded.
    fn ratio_test(&self, direction: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for k in 0..self.model.num_constraints() {
            let row = self.model.a().row(k);
            let rate = dot(row, direction);
            if rate <= EPS {
                continue;
            }
            let ratio = (self.model.b()[k] - dot(row, &self.x)) / rate;
            match best {
                Some((_, smallest)) if ratio >= smallest => {}
                _ => best = Some((k, ratio)),
            }
        }
        best
    }

    /// Replace basis slot `r` with constraint row `entering`, patch the
    /// inverse with the product-form elementary factor, and advance the
    /// vertex.
    fn pivot(
        &mut self,
        r: usize,
        entering: usize,
        direction: &[f64],
        step_length: f64,
    ) -> Result<(), Error> {
        let n = self.model.num_variables();
        let row = self.model.a().row(entering).to_vec();

        // the entering row expressed in basis-inverse coordinates
        let spike = self.basis_inverse.left_mul_by(&row);
        if spike[r].abs() <= EPS {
            return Err(Error::SingularPivot {
                iterations: self.iterations,
            });
        }

        self.basis[r] = entering;
        self.basis_rhs[r] = self.model.b()[entering];
        self.basis_matrix.set_row(r, row);

        let mut scaled = spike.iter().map(|v| -v / spike[r]).collect::<Vec<_>>();
        scaled[r] = 1.0 / spike[r];
        self.basis_inverse = self
            .basis_inverse
            .matmul(&Matrix::elementary(n, r, scaled));

        for (x_i, d_i) in self.x.iter_mut().zip(direction) {
            *x_i += step_length * d_i;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> LpModel {
        LpModel::new(
            vec![
                vec![1.0, 0.0],
                vec![0.0, 1.0],
                vec![-1.0, 0.0],
                vec![0.0, -1.0],
            ],
            vec![1.0, 1.0, 0.0, 0.0],
            vec![1.0, 1.0],
        )
        .unwrap()
    }

    fn staircase() -> LpModel {
        LpModel::new(
            vec![
                vec![1.0, 0.0, 0.0, 0.0],
                vec![20.0, 1.0, 0.0, 0.0],
                vec![200.0, 20.0, 1.0, 0.0],
                vec![2000.0, 200.0, 20.0, 1.0],
                vec![-1.0, 0.0, 0.0, 0.0],
                vec![0.0, -1.0, 0.0, 0.0],
                vec![0.0, 0.0, -1.0, 0.0],
                vec![0.0, 0.0, 0.0, -1.0],
            ],
            vec![1.0, 100.0, 10_000.0, 1_000_000.0, 0.0, 0.0, 0.0, 0.0],
            vec![1000.0, 100.0, 10.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn maximizes_over_unit_square() {
        let model = unit_square();
        let solution = SimplexEngine::new(&model, vec![2, 3])
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(solution.status, Status::Optimal);
        assert_relative_eq!(solution.vertex[0], 1.0);
        assert_relative_eq!(solution.vertex[1], 1.0);
        assert_relative_eq!(solution.objective_value, 2.0);
        assert_eq!(solution.iterations, 2);
    }

    #[test]
    fn climbs_the_staircase() {
        let model = staircase();
        let solution = SimplexEngine::new(&model, vec![4, 5, 6, 7])
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(solution.status, Status::Optimal);
        assert_relative_eq!(solution.vertex[0], 0.0);
        assert_relative_eq!(solution.vertex[1], 0.0);
        assert_relative_eq!(solution.vertex[2], 0.0);
        assert_relative_eq!(solution.vertex[3], 1_000_000.0);
        assert_relative_eq!(solution.objective_value, 1_000_000.0);
        // the lowest-index rule walks all 15 vertices of this Klee-Minty cube
        assert_eq!(solution.iterations, 15);

        // a vertex has exactly n tight constraints
        let tight = (0..model.num_constraints())
            .filter(|&k| {
                let row_dot = dot(model.a().row(k), &solution.vertex);
                (row_dot - model.b()[k]).abs() <= 1e-6
            })
            .count();
        assert_eq!(tight, 4);
    }

    #[test]
    fn solves_from_basis_needing_row_interchanges() {
        // the starting submatrix is dense and LU-pivots across rows, unlike
        // the sign-flipped identity bases of the scenario fixtures
        let model = LpModel::new(
            vec![
                vec![3.0, 17.0, 10.0],
                vec![2.0, 4.0, -2.0],
                vec![6.0, 18.0, -12.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![-1.0, 0.0, 0.0],
                vec![0.0, -1.0, 0.0],
                vec![0.0, 0.0, -1.0],
            ],
            vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        )
        .unwrap();
        let engine = SimplexEngine::new(&model, vec![0, 1, 2]).unwrap();

        // the starting vertex really lies on its three basic constraints
        let tight = engine.basis_matrix.right_mul_by(&engine.x);
        for (lhs, rhs) in tight.iter().zip(&engine.basis_rhs) {
            assert_relative_eq!(*lhs, *rhs, epsilon = 1e-9);
        }
        assert_relative_eq!(engine.x[0], -37.0 / 144.0, epsilon = 1e-9);
        assert_relative_eq!(engine.x[1], 13.0 / 144.0, epsilon = 1e-9);
        assert_relative_eq!(engine.x[2], -11.0 / 144.0, epsilon = 1e-9);

        let solution = engine.solve().unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.iterations, 2);
        assert_relative_eq!(solution.vertex[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(solution.vertex[1], -13.0 / 17.0, epsilon = 1e-9);
        assert_relative_eq!(solution.vertex[2], 1.0, epsilon = 1e-9);
        assert_relative_eq!(solution.objective_value, 21.0 / 17.0, epsilon = 1e-9);
        for k in 0..model.num_constraints() {
            assert!(dot(model.a().row(k), &solution.vertex) <= model.b()[k] + EPS);
        }
    }

    #[test]
    fn reports_unbounded_ray() {
        // maximize x + y with only the non-negativity rows: nothing blocks
        let model = LpModel::new(
            vec![vec![-1.0, 0.0], vec![0.0, -1.0]],
            vec![0.0, 0.0],
            vec![1.0, 1.0],
        )
        .unwrap();
        let solution = SimplexEngine::new(&model, vec![0, 1])
            .unwrap()
            .solve()
            .unwrap();

        assert_eq!(solution.status, Status::Unbounded);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.vertex, vec![0.0, 0.0]);
    }

    #[test]
    fn observer_sees_monotone_feasible_vertices() {
        let model = staircase();
        let mut seen: Vec<(usize, Vec<f64>)> = Vec::new();
        let solution = SimplexEngine::new(&model, vec![4, 5, 6, 7])
            .unwrap()
            .with_observer(|iteration, x| seen.push((iteration, x.to_vec())))
            .solve()
            .unwrap();

        assert_eq!(seen.len(), solution.iterations);

        let mut previous = f64::NEG_INFINITY;
        for (i, (iteration, x)) in seen.iter().enumerate() {
            assert_eq!(*iteration, i + 1);

            // feasibility is preserved at every visited vertex
            for k in 0..model.num_constraints() {
                assert!(dot(model.a().row(k), x) <= model.b()[k] + EPS);
            }

            // maximization: the objective never decreases
            let objective = model.objective_value(x);
            assert!(objective >= previous);
            previous = objective;
        }
    }

    #[test]
    fn iteration_cap_is_a_fault() {
        let model = unit_square();
        let result = SimplexEngine::new(&model, vec![2, 3])
            .unwrap()
            .with_iteration_limit(1)
            .solve();

        assert_eq!(result.unwrap_err(), Error::IterationLimit { limit: 1 });
    }

    #[test]
    fn generous_cap_does_not_interfere() {
        let model = unit_square();
        let solution = SimplexEngine::new(&model, vec![2, 3])
            .unwrap()
            .with_iteration_limit(100)
            .solve()
            .unwrap();

        assert_eq!(solution.status, Status::Optimal);
    }

    #[test]
    fn rejects_singular_starting_basis() {
        let model = LpModel::new(
            vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![0.0, 1.0]],
            vec![1.0, 2.0, 1.0],
            vec![1.0, 0.0],
        )
        .unwrap();

        let result = SimplexEngine::new(&model, vec![0, 1]);
        assert!(matches!(result, Err(Error::SingularBasis)));
    }

    #[test]
    fn rejects_malformed_basis_before_iterating() {
        let model = unit_square();
        assert!(matches!(
            SimplexEngine::new(&model, vec![2, 7]),
            Err(Error::Dimension(_))
        ));
        assert!(matches!(
            SimplexEngine::new(&model, vec![3, 3]),
            Err(Error::Dimension(_))
        ));
    }

    #[test]
    fn inverse_and_vertex_stay_consistent() {
        let model = staircase();
        let mut engine = SimplexEngine::new(&model, vec![4, 5, 6, 7]).unwrap();

        let status = loop {
            match engine.step().unwrap() {
                Some(status) => break status,
                None => {
                    // AB * ABi ~ I after every completed pivot
                    let product = engine.basis_matrix.matmul(&engine.basis_inverse);
                    for i in 0..4 {
                        for j in 0..4 {
                            let expected = if i == j { 1.0 } else { 0.0 };
                            assert_relative_eq!(
                                product.row(i)[j],
                                expected,
                                epsilon = 1e-6
                            );
                        }
                    }
                    // the basic constraints stay tight: AB * x ~ b[B]
                    let tight = engine.basis_matrix.right_mul_by(&engine.x);
                    for (lhs, rhs) in tight.iter().zip(&engine.basis_rhs) {
                        assert_relative_eq!(*lhs, *rhs, epsilon = 1e-6);
                    }
                }
            }
        };

        // the optimality certificate: no reduced cost is negative
        assert_eq!(status, Status::Optimal);
        let reduced = engine.basis_inverse.left_mul_by(model.c());
        assert!(reduced.iter().all(|&l| l >= -EPS));
    }
}
