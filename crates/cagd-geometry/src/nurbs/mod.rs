//! NURBS core algorithms: knot vector utilities and De Boor evaluation.

pub mod deboor;
pub mod knot;

pub use deboor::*;
pub use knot::{
    basis_function_derivatives, basis_functions, clamped_uniform_knots, find_span, validate_knots,
};
