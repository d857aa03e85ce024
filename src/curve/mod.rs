//! Curve primitives and the expression tree every distortion formula is
//! written in.
//!
//! A formula is authored once as an [`Expr`]; the host evaluates the tree
//! directly and the shader generator prints it as WGSL, so both sides share
//! one definition.

mod expr;
pub mod primitives;

pub use expr::{
    cos, nsin, pow_abs, sin, Component, EvalContext, Expr, UniformLookup, UniformRef,
    PROGRESS_IDENT, TIME_IDENT,
};
