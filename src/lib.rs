//! Vertex-following (revised) simplex over polytopes in inequality form.
//!
//! The caller supplies an [`LpModel`] (maximize `c·x` subject to `A·x <= b`)
//! together with a feasible starting basis: `n` row indices whose constraints
//! are tight at a vertex. [`SimplexEngine`] then pivots from vertex to vertex,
//! maintaining the basis inverse with a product-form rank-one update, until
//! the objective is certified optimal or an unbounded ray is found.
//!
//! ```
//! use vertex_simplex::{LpModel, SimplexEngine, Status};
//!
//! // maximize x + y over the unit square
//! let model = LpModel::new(
//!     vec![
//!         vec![1.0, 0.0],
//!         vec![0.0, 1.0],
//!         vec![-1.0, 0.0],
//!         vec![0.0, -1.0],
//!     ],
//!     vec![1.0, 1.0, 0.0, 0.0],
//!     vec![1.0, 1.0],
//! )?;
//!
//! // start at the origin, where both non-negativity rows are tight
//! let solution = SimplexEngine::new(&model, vec![2, 3])?.solve()?;
//! assert_eq!(solution.status, Status::Optimal);
//! assert_eq!(solution.vertex, vec![1.0, 1.0]);
//! assert_eq!(solution.objective_value, 2.0);
//! # Ok::<(), vertex_simplex::Error>(())
//! ```
//!
//! There is no phase-1 procedure: feasibility of the starting basis is a
//! precondition, not something the engine checks.

mod error;
mod linalg;
mod model;
mod simplex;

pub use crate::error::Error;
pub use crate::model::LpModel;
pub use crate::simplex::{SimplexEngine, Solution, Status};
