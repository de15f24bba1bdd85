//! Constant folding
//!
//! A single post-order pass over the operation tree. Any subtree that does
//! not depend on variables and is idempotent is evaluated once with empty
//! bindings and replaced by the resulting constant; non-idempotent calls
//! (and everything above them) are left to run at evaluation time.

use crate::ast::{BinaryOp, Operation};
use crate::evaluator::{execute, Bindings};
use crate::registry::FunctionRegistry;

pub fn optimize(op: Operation, functions: &FunctionRegistry) -> Operation {
    let meta = op.metadata();
    if !op.is_constant() && !meta.depends_on_variables && meta.is_idempotent {
        // Folding cannot fail here: the subtree has no variables and every
        // call in it was resolved at parse time. If a callable still errors,
        // keep the node and let evaluation surface it.
        return match execute(&op, &Bindings::new(), functions) {
            Ok(value) => Operation::float(value),
            Err(_) => op,
        };
    }

    match op {
        Operation::Binary { op: BinaryOp::Multiply, left, right, .. } => {
            let left = optimize(*left, functions);
            let right = optimize(*right, functions);
            if is_zero(&left) || is_zero(&right) {
                Operation::float(0.0)
            } else {
                Operation::binary(BinaryOp::Multiply, left, right)
            }
        }
        // `and`/`or` with a decided operand short-circuits without touching
        // the other side, mirroring evaluation of the full node
        Operation::Binary { op: BinaryOp::And, left, right, .. } => {
            let left = optimize(*left, functions);
            let right = optimize(*right, functions);
            if is_zero(&left) || is_zero(&right) {
                Operation::float(0.0)
            } else {
                Operation::binary(BinaryOp::And, left, right)
            }
        }
        Operation::Binary { op: BinaryOp::Or, left, right, .. } => {
            let left = optimize(*left, functions);
            let right = optimize(*right, functions);
            if is_nonzero(&left) || is_nonzero(&right) {
                Operation::float(1.0)
            } else {
                Operation::binary(BinaryOp::Or, left, right)
            }
        }
        Operation::Binary { op, left, right, .. } => Operation::binary(
            op,
            optimize(*left, functions),
            optimize(*right, functions),
        ),
        Operation::UnaryMinus { operand, .. } => {
            Operation::unary_minus(optimize(*operand, functions))
        }
        Operation::Function { name, args, meta } => {
            let args = args
                .into_iter()
                .map(|arg| optimize(arg, functions))
                .collect();
            // Rebuilding through the constructor would recompute identical
            // metadata; the callable's idempotence is already baked in.
            Operation::Function { name, args, meta }
        }
        leaf => leaf,
    }
}

fn is_zero(op: &Operation) -> bool {
    op.constant_value() == Some(0.0)
}

fn is_nonzero(op: &Operation) -> bool {
    matches!(op.constant_value(), Some(value) if value != 0.0)
}
