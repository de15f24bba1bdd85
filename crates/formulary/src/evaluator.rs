//! Tree-walking evaluator
//!
//! Walks an operation tree against a flat variable binding, producing an
//! `f64`. Evaluation is read-only with respect to the tree and registries and
//! recurses one frame per node, bounded by tree depth.

use crate::ast::{BinaryOp, Operation};
use crate::error::EvalError;
use crate::registry::{FunctionRegistry, NativeFunction};
use ahash::AHashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Case-normalized variable name → value, rebuilt per evaluation call.
pub type Bindings = AHashMap<String, f64>;

/// Evaluate `op` against `vars`. Errors propagate from any depth; no failing
/// subtree is silently defaulted to zero.
pub fn execute(
    op: &Operation,
    vars: &Bindings,
    functions: &FunctionRegistry,
) -> Result<f64, EvalError> {
    match op {
        Operation::Constant { value, .. } => Ok(*value),
        Operation::Variable { name } => vars
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::UndefinedVariable(name.clone())),
        Operation::UnaryMinus { operand, .. } => Ok(-execute(operand, vars, functions)?),
        Operation::Binary { op, left, right, .. } => {
            let left = execute(left, vars, functions)?;
            let right = execute(right, vars, functions)?;
            Ok(apply_binary(*op, left, right))
        }
        Operation::Function { name, args, .. } => {
            // The builder only emits function nodes for registered names;
            // absence here is an internal defect, not a user error.
            let info = functions
                .get(name)
                .ok_or_else(|| EvalError::UnresolvedFunction(name.clone()))?;
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(execute(arg, vars, functions)?);
            }
            call(name, &info.body, &values)
        }
    }
}

fn apply_binary(op: BinaryOp, left: f64, right: f64) -> f64 {
    match op {
        BinaryOp::Add => left + right,
        BinaryOp::Subtract => left - right,
        BinaryOp::Multiply => left * right,
        BinaryOp::Divide => left / right,
        BinaryOp::Modulo => left % right,
        BinaryOp::Power => left.powf(right),
        BinaryOp::And => truth(left != 0.0 && right != 0.0),
        BinaryOp::Or => truth(left != 0.0 || right != 0.0),
        BinaryOp::LessThan => truth(left < right),
        BinaryOp::LessOrEqual => truth(left <= right),
        BinaryOp::GreaterThan => truth(left > right),
        BinaryOp::GreaterOrEqual => truth(left >= right),
        BinaryOp::Equal => truth(left == right),
        BinaryOp::NotEqual => truth(left != right),
    }
}

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Invoke a registered callable. A returned error and a panic both surface
/// as a function runtime error; a panic must never unwind past the
/// evaluator.
fn call(name: &str, body: &NativeFunction, args: &[f64]) -> Result<f64, EvalError> {
    match catch_unwind(AssertUnwindSafe(|| body(args))) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(EvalError::FunctionRuntime {
            name: name.to_string(),
            message: source.to_string(),
        }),
        Err(panic) => Err(EvalError::FunctionRuntime {
            name: name.to_string(),
            message: panic_message(&panic),
        }),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "function panicked".to_string()
    }
}
