//! Default math function library and default constants
//!
//! Everything here follows the arity-free calling contract of
//! [`NativeFunction`](crate::registry::NativeFunction): arguments arrive as
//! an already-evaluated slice. All defaults are registered non-overwritable
//! and idempotent, except `random`.

use crate::error::ConfigError;
use crate::registry::{ConstantRegistry, FunctionRegistry, NativeFunction};
use std::sync::Arc;

fn unary(f: fn(f64) -> f64) -> NativeFunction {
    Arc::new(move |args: &[f64]| Ok(f(args.first().copied().unwrap_or(0.0))))
}

/// Register the default function library: trigonometry, rounding, `min`,
/// `max` and an eager `if`.
pub fn register_defaults(registry: &mut FunctionRegistry) -> Result<(), ConfigError> {
    registry.register("sin", unary(f64::sin), false, true)?;
    registry.register("cos", unary(f64::cos), false, true)?;
    registry.register("asin", unary(f64::asin), false, true)?;
    registry.register("acos", unary(f64::acos), false, true)?;
    registry.register("tan", unary(f64::tan), false, true)?;
    registry.register("atan", unary(f64::atan), false, true)?;
    registry.register("log", unary(f64::ln), false, true)?;
    registry.register("sqrt", unary(f64::sqrt), false, true)?;
    registry.register("trunc", unary(f64::trunc), false, true)?;
    registry.register("ceil", unary(f64::ceil), false, true)?;
    registry.register("floor", unary(f64::floor), false, true)?;

    // round(x) or round(x, digits)
    registry.register(
        "round",
        Arc::new(|args: &[f64]| {
            let x = args.first().copied().unwrap_or(0.0);
            if args.len() <= 1 {
                Ok(x.round())
            } else {
                let pow = 10f64.powf(args[1]);
                Ok((x * pow).round() / pow)
            }
        }),
        false,
        true,
    )?;

    // Uniform in [0, 1); the seed argument is accepted for call-site
    // compatibility and ignored. Never folded.
    registry.register(
        "random",
        Arc::new(|_args: &[f64]| Ok(rand::random::<f64>())),
        false,
        false,
    )?;

    registry.register(
        "max",
        Arc::new(|args: &[f64]| match args.split_first() {
            Some((first, rest)) => Ok(rest.iter().copied().fold(*first, f64::max)),
            None => Ok(0.0),
        }),
        false,
        true,
    )?;

    registry.register(
        "min",
        Arc::new(|args: &[f64]| match args.split_first() {
            Some((first, rest)) => Ok(rest.iter().copied().fold(*first, f64::min)),
            None => Ok(0.0),
        }),
        false,
        true,
    )?;

    // All three arguments are evaluated before the call; `if` selects, it
    // does not short-circuit.
    registry.register(
        "if",
        Arc::new(|args: &[f64]| {
            if args.len() == 3 {
                Ok(if args[0] != 0.0 { args[1] } else { args[2] })
            } else {
                Ok(0.0)
            }
        }),
        false,
        true,
    )?;

    Ok(())
}

/// Register the default constants `e` and `pi`.
pub fn register_default_constants(registry: &mut ConstantRegistry) -> Result<(), ConfigError> {
    registry.register("e", std::f64::consts::E, false)?;
    registry.register("pi", std::f64::consts::PI, false)?;
    Ok(())
}
