//! Expression tree for distortion formulas.

use std::f32::consts::PI;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::primitives;

/// WGSL name of the per-vertex progress argument
pub const PROGRESS_IDENT: &str = "progress";

/// WGSL name of the shared elapsed-time uniform
pub const TIME_IDENT: &str = "uTime";

/// Vector component addressed by a uniform reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    X,
    Y,
    Z,
    W,
}

impl Component {
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
            Self::W => 3,
        }
    }

    pub fn swizzle(self) -> char {
        match self {
            Self::X => 'x',
            Self::Y => 'y',
            Self::Z => 'z',
            Self::W => 'w',
        }
    }
}

/// One scalar read from a named uniform vector, e.g. `uFreq.x`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformRef {
    pub name: &'static str,
    pub component: Component,
}

/// Source of uniform values during host evaluation
pub trait UniformLookup {
    fn component(&self, name: &str, component: Component) -> Option<f32>;
}

/// Inputs for one host evaluation
pub struct EvalContext<'a> {
    pub progress: f32,
    pub time: f32,
    pub uniforms: &'a dyn UniformLookup,
}

/// Scalar formula over progress, time and uniform components
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Progress,
    Time,
    Const(f32),
    Uniform(UniformRef),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Sin(Box<Expr>),
    Cos(Box<Expr>),
    NSin(Box<Expr>),
    PowAbs(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub const PI: Expr = Expr::Const(PI);

    pub fn uniform(name: &'static str, component: Component) -> Self {
        Self::Uniform(UniformRef { name, component })
    }

    /// Evaluate on the host.
    ///
    /// Uniform references are checked when a profile is built; a missing one
    /// evaluates to NaN so it cannot pass a parity check silently.
    pub fn eval(&self, ctx: &EvalContext<'_>) -> f32 {
        match self {
            Self::Progress => ctx.progress,
            Self::Time => ctx.time,
            Self::Const(v) => *v,
            Self::Uniform(r) => ctx
                .uniforms
                .component(r.name, r.component)
                .unwrap_or(f32::NAN),
            Self::Neg(a) => -a.eval(ctx),
            Self::Add(a, b) => a.eval(ctx) + b.eval(ctx),
            Self::Sub(a, b) => a.eval(ctx) - b.eval(ctx),
            Self::Mul(a, b) => a.eval(ctx) * b.eval(ctx),
            Self::Div(a, b) => a.eval(ctx) / b.eval(ctx),
            Self::Sin(a) => a.eval(ctx).sin(),
            Self::Cos(a) => a.eval(ctx).cos(),
            Self::NSin(a) => primitives::nsin(a.eval(ctx)),
            Self::PowAbs(a, b) => primitives::pow_abs(a.eval(ctx), b.eval(ctx)),
        }
    }

    /// Print as a WGSL expression.
    ///
    /// Every binary node is parenthesised so the GPU applies the operations
    /// in exactly the tree's order.
    pub fn write_wgsl(&self, out: &mut String) {
        match self {
            Self::Progress => out.push_str(PROGRESS_IDENT),
            Self::Time => out.push_str(TIME_IDENT),
            Self::Const(v) => out.push_str(&wgsl_float(*v)),
            Self::Uniform(r) => {
                out.push_str(r.name);
                out.push('.');
                out.push(r.component.swizzle());
            }
            Self::Neg(a) => {
                out.push_str("(-");
                a.write_wgsl(out);
                out.push(')');
            }
            Self::Add(a, b) => write_binary(out, a, "+", b),
            Self::Sub(a, b) => write_binary(out, a, "-", b),
            Self::Mul(a, b) => write_binary(out, a, "*", b),
            Self::Div(a, b) => write_binary(out, a, "/", b),
            Self::Sin(a) => write_call(out, "sin", a),
            Self::Cos(a) => write_call(out, "cos", a),
            Self::NSin(a) => write_call(out, "nsin", a),
            Self::PowAbs(a, b) => {
                out.push_str("pow(abs(");
                a.write_wgsl(out);
                out.push_str("), ");
                b.write_wgsl(out);
                out.push(')');
            }
        }
    }

    pub fn to_wgsl(&self) -> String {
        let mut out = String::new();
        self.write_wgsl(&mut out);
        out
    }

    /// Depth-first walk over every node, parents first
    pub fn visit(&self, f: &mut impl FnMut(&Expr)) {
        f(self);
        match self {
            Self::Progress | Self::Time | Self::Const(_) | Self::Uniform(_) => {}
            Self::Neg(a) | Self::Sin(a) | Self::Cos(a) | Self::NSin(a) => a.visit(f),
            Self::Add(a, b)
            | Self::Sub(a, b)
            | Self::Mul(a, b)
            | Self::Div(a, b)
            | Self::PowAbs(a, b) => {
                a.visit(f);
                b.visit(f);
            }
        }
    }

    pub fn uses_time(&self) -> bool {
        let mut found = false;
        self.visit(&mut |e: &Expr| found |= matches!(e, Expr::Time));
        found
    }

    pub fn uniform_refs(&self) -> Vec<UniformRef> {
        let mut refs = Vec::new();
        self.visit(&mut |e: &Expr| {
            if let Expr::Uniform(r) = e {
                refs.push(*r);
            }
        });
        refs
    }

    pub fn constants(&self) -> Vec<f32> {
        let mut values = Vec::new();
        self.visit(&mut |e: &Expr| {
            if let Expr::Const(v) = e {
                values.push(*v);
            }
        });
        values
    }
}

fn write_binary(out: &mut String, a: &Expr, op: &str, b: &Expr) {
    out.push('(');
    a.write_wgsl(out);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    b.write_wgsl(out);
    out.push(')');
}

fn write_call(out: &mut String, name: &str, a: &Expr) {
    out.push_str(name);
    out.push('(');
    a.write_wgsl(out);
    out.push(')');
}

/// Shortest literal that parses back to the same f32
pub(crate) fn wgsl_float(v: f32) -> String {
    let text = format!("{:?}", v);
    if v.is_sign_negative() {
        format!("({})", text)
    } else {
        text
    }
}

impl From<f32> for Expr {
    fn from(v: f32) -> Self {
        Self::Const(v)
    }
}

impl<R: Into<Expr>> Add<R> for Expr {
    type Output = Expr;

    fn add(self, rhs: R) -> Expr {
        Expr::Add(Box::new(self), Box::new(rhs.into()))
    }
}

impl<R: Into<Expr>> Sub<R> for Expr {
    type Output = Expr;

    fn sub(self, rhs: R) -> Expr {
        Expr::Sub(Box::new(self), Box::new(rhs.into()))
    }
}

impl<R: Into<Expr>> Mul<R> for Expr {
    type Output = Expr;

    fn mul(self, rhs: R) -> Expr {
        Expr::Mul(Box::new(self), Box::new(rhs.into()))
    }
}

impl<R: Into<Expr>> Div<R> for Expr {
    type Output = Expr;

    fn div(self, rhs: R) -> Expr {
        Expr::Div(Box::new(self), Box::new(rhs.into()))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

pub fn sin(x: impl Into<Expr>) -> Expr {
    Expr::Sin(Box::new(x.into()))
}

pub fn cos(x: impl Into<Expr>) -> Expr {
    Expr::Cos(Box::new(x.into()))
}

pub fn nsin(x: impl Into<Expr>) -> Expr {
    Expr::NSin(Box::new(x.into()))
}

pub fn pow_abs(base: impl Into<Expr>, exponent: impl Into<Expr>) -> Expr {
    Expr::PowAbs(Box::new(base.into()), Box::new(exponent.into()))
}
