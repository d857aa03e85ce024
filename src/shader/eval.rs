//! Host-side interpreter for the naga IR of `getDistortion`.
//!
//! Runs the shader text itself (after naga parsing and validation) rather
//! than the expression tree it was generated from, so a parity check compares
//! two independent evaluations. Only the constructs distortion fragments use
//! are supported: float literals, function arguments, uniform loads with
//! component access, negation, `+ - * /`, `sin`, `cos`, `abs`, `pow`, vector
//! construction and calls to other functions.

use std::collections::HashMap;

use glam::Vec3;
use naga::{
    BinaryOperator, Block, Expression, Function, GlobalVariable, Handle, Literal, MathFunction,
    Module, Statement, TypeInner, UnaryOperator,
};

use crate::curve::TIME_IDENT;
use crate::error::{DistortionError, Result};
use crate::profile::DistortionProfile;

const ENTRY_POINT: &str = "getDistortion";

/// Values bound to the shader's uniform globals, by name
#[derive(Debug, Clone, Default)]
pub struct ShaderBindings {
    values: HashMap<String, Vec<f32>>,
}

impl ShaderBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The profile's uniforms plus `uTime`
    pub fn for_profile(profile: &DistortionProfile, time: f32) -> Self {
        let mut bindings = Self::new();
        for (name, value) in profile.uniforms().iter() {
            bindings.set(name, &value.to_padded()[..value.arity()]);
        }
        bindings.set_time(time);
        bindings
    }

    pub fn set(&mut self, name: &str, components: &[f32]) {
        self.values.insert(name.to_string(), components.to_vec());
    }

    pub fn set_time(&mut self, time: f32) {
        self.set(TIME_IDENT, &[time]);
    }

    fn get(&self, name: &str) -> Option<&[f32]> {
        self.values.get(name).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Scalar(f32),
    Vector(Vec<f32>),
    /// Reference to a uniform global, optionally narrowed to one component
    Pointer {
        global: Handle<GlobalVariable>,
        index: Option<u32>,
    },
}

struct Frame<'f> {
    function: &'f Function,
    args: Vec<Value>,
    results: HashMap<Handle<Expression>, Value>,
}

/// Validated WGSL module with a `getDistortion(f32) -> vec3<f32>` function
pub struct ShaderEvaluator {
    module: Module,
    entry: Handle<Function>,
}

impl ShaderEvaluator {
    pub fn new(source: &str) -> Result<Self> {
        let module = super::validate(source)?;
        let entry = module
            .functions
            .iter()
            .find(|(_, f)| f.name.as_deref() == Some(ENTRY_POINT))
            .map(|(handle, _)| handle)
            .ok_or_else(|| {
                DistortionError::Shader(format!("no function named '{}'", ENTRY_POINT))
            })?;
        Ok(Self { module, entry })
    }

    /// Evaluator for the profile's generated fragment
    pub fn for_profile(profile: &DistortionProfile) -> Result<Self> {
        Self::new(&super::module_source(profile))
    }

    pub fn get_distortion(&self, progress: f32, bindings: &ShaderBindings) -> Result<Vec3> {
        match self.call(self.entry, vec![Value::Scalar(progress)], bindings)? {
            Value::Vector(c) if c.len() == 3 => Ok(Vec3::new(c[0], c[1], c[2])),
            other => Err(DistortionError::Shader(format!(
                "{} returned {:?}, expected vec3<f32>",
                ENTRY_POINT, other
            ))),
        }
    }

    fn call(
        &self,
        handle: Handle<Function>,
        args: Vec<Value>,
        bindings: &ShaderBindings,
    ) -> Result<Value> {
        let function = &self.module.functions[handle];
        let mut frame = Frame {
            function,
            args,
            results: HashMap::new(),
        };
        self.run_block(&function.body, &mut frame, bindings)?
            .ok_or_else(|| {
                DistortionError::Shader(format!(
                    "function '{}' finished without returning a value",
                    function.name.as_deref().unwrap_or("?")
                ))
            })
    }

    fn run_block(
        &self,
        block: &Block,
        frame: &mut Frame<'_>,
        bindings: &ShaderBindings,
    ) -> Result<Option<Value>> {
        for statement in block.iter() {
            match statement {
                // Expressions are pure; they are evaluated on demand
                Statement::Emit(_) => {}
                Statement::Block(inner) => {
                    if let Some(value) = self.run_block(inner, frame, bindings)? {
                        return Ok(Some(value));
                    }
                }
                Statement::Call {
                    function,
                    arguments,
                    result,
                } => {
                    let view: &Frame<'_> = frame;
                    let args = arguments
                        .iter()
                        .map(|&arg| self.eval(arg, view, bindings))
                        .collect::<Result<Vec<_>>>()?;
                    let value = self.call(*function, args, bindings)?;
                    if let Some(handle) = result {
                        frame.results.insert(*handle, value);
                    }
                }
                Statement::Return { value: Some(handle) } => {
                    return self.eval(*handle, frame, bindings).map(Some);
                }
                other => return Err(unsupported("statement", other)),
            }
        }
        Ok(None)
    }

    fn eval(
        &self,
        handle: Handle<Expression>,
        frame: &Frame<'_>,
        bindings: &ShaderBindings,
    ) -> Result<Value> {
        let scalar = |h: Handle<Expression>| -> Result<f32> {
            match self.eval(h, frame, bindings)? {
                Value::Scalar(v) => Ok(v),
                other => Err(DistortionError::Shader(format!(
                    "expected a scalar, found {:?}",
                    other
                ))),
            }
        };

        let expression = &frame.function.expressions[handle];
        match expression {
            Expression::Literal(literal) => literal_value(literal).map(Value::Scalar),
            Expression::FunctionArgument(index) => {
                frame.args.get(*index as usize).cloned().ok_or_else(|| {
                    DistortionError::Shader(format!("missing function argument {}", index))
                })
            }
            Expression::GlobalVariable(global) => Ok(Value::Pointer {
                global: *global,
                index: None,
            }),
            Expression::AccessIndex { base, index } => match self.eval(*base, frame, bindings)? {
                Value::Pointer {
                    global,
                    index: None,
                } => Ok(Value::Pointer {
                    global,
                    index: Some(*index),
                }),
                Value::Vector(components) => components
                    .get(*index as usize)
                    .copied()
                    .map(Value::Scalar)
                    .ok_or_else(|| {
                        DistortionError::Shader(format!("component {} out of range", index))
                    }),
                other => Err(DistortionError::Shader(format!(
                    "cannot index {:?}",
                    other
                ))),
            },
            Expression::Load { pointer } => match self.eval(*pointer, frame, bindings)? {
                Value::Pointer { global, index } => self.load(global, index, bindings),
                other => Err(DistortionError::Shader(format!(
                    "cannot load from {:?}",
                    other
                ))),
            },
            Expression::CallResult(_) => frame.results.get(&handle).cloned().ok_or_else(|| {
                DistortionError::Shader("call result used before the call ran".to_string())
            }),
            Expression::Unary {
                op: UnaryOperator::Negate,
                expr,
            } => Ok(Value::Scalar(-scalar(*expr)?)),
            Expression::Binary { op, left, right } => {
                let (l, r) = (scalar(*left)?, scalar(*right)?);
                let v = match op {
                    BinaryOperator::Add => l + r,
                    BinaryOperator::Subtract => l - r,
                    BinaryOperator::Multiply => l * r,
                    BinaryOperator::Divide => l / r,
                    other => return Err(unsupported("binary operator", other)),
                };
                Ok(Value::Scalar(v))
            }
            Expression::Math { fun, arg, arg1, .. } => {
                let x = scalar(*arg)?;
                let v = match fun {
                    MathFunction::Sin => x.sin(),
                    MathFunction::Cos => x.cos(),
                    MathFunction::Abs => x.abs(),
                    MathFunction::Pow => {
                        let exponent = arg1.ok_or_else(|| {
                            DistortionError::Shader("pow without exponent".to_string())
                        })?;
                        x.powf(scalar(exponent)?)
                    }
                    other => return Err(unsupported("math function", other)),
                };
                Ok(Value::Scalar(v))
            }
            Expression::Compose { components, .. } => {
                let mut out = Vec::with_capacity(components.len());
                for &component in components {
                    match self.eval(component, frame, bindings)? {
                        Value::Scalar(v) => out.push(v),
                        Value::Vector(vs) => out.extend(vs),
                        other => return Err(unsupported("vector component", &other)),
                    }
                }
                Ok(Value::Vector(out))
            }
            Expression::Splat { size, value } => {
                Ok(Value::Vector(vec![scalar(*value)?; *size as usize]))
            }
            other => Err(unsupported("expression", other)),
        }
    }

    fn load(
        &self,
        handle: Handle<GlobalVariable>,
        index: Option<u32>,
        bindings: &ShaderBindings,
    ) -> Result<Value> {
        let global = &self.module.global_variables[handle];
        let name = global.name.as_deref().unwrap_or("");
        let bound = bindings.get(name).ok_or_else(|| {
            DistortionError::Shader(format!("no value bound for uniform '{}'", name))
        })?;

        let declared = match self.module.types[global.ty].inner {
            TypeInner::Scalar(_) => 1,
            TypeInner::Vector { size, .. } => size as usize,
            ref other => return Err(unsupported("uniform type", other)),
        };
        if bound.len() != declared {
            return Err(DistortionError::Shader(format!(
                "uniform '{}' declares {} components but {} are bound",
                name,
                declared,
                bound.len()
            )));
        }

        match index {
            Some(i) => bound.get(i as usize).copied().map(Value::Scalar).ok_or_else(|| {
                DistortionError::Shader(format!("component {} of '{}' out of range", i, name))
            }),
            None if declared == 1 => Ok(Value::Scalar(bound[0])),
            None => Ok(Value::Vector(bound.to_vec())),
        }
    }
}

fn literal_value(literal: &Literal) -> Result<f32> {
    match *literal {
        Literal::F32(v) => Ok(v),
        Literal::F64(v) => Ok(v as f32),
        Literal::AbstractFloat(v) => Ok(v as f32),
        ref other => Err(unsupported("literal", other)),
    }
}

fn unsupported(kind: &str, what: &impl std::fmt::Debug) -> DistortionError {
    DistortionError::Shader(format!("unsupported {}: {:?}", kind, what))
}
