//! End-to-end engine tests: formula text in, numbers (or typed errors) out.

use formulary::{
    variables, ConfigError, Engine, EngineError, EngineOptions, EvalError, LexError, ParseError,
    Variables,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn calc(formula: &str) -> f64 {
    Engine::new().calculate(formula, &Variables::new()).unwrap()
}

#[test]
fn test_basic_arithmetic() {
    assert_eq!(calc("2.0+3.0"), 5.0);
    assert_eq!(calc("2+3"), 5.0);
    assert_eq!(calc("0-6"), -6.0);
    assert_eq!(calc("5 % 3"), 2.0);
    assert_eq!(calc("5 % 3.2"), 5.0 % 3.2);
    assert_eq!(calc("2^3"), 8.0);
}

#[test]
fn test_operator_precedence() {
    assert_eq!(calc("2+8*2"), 18.0);
    assert_eq!(calc("(2+8)*2"), 20.0);
    assert_eq!(calc("2+8/2"), 6.0);
    assert_eq!(calc("1+2-3*4/5+6-7*8/9+0"), 1.0 + 2.0 - 3.0 * 4.0 / 5.0 + 6.0 - 7.0 * 8.0 / 9.0);
    assert_eq!(calc("2^3^2"), 512.0);
}

#[test]
fn test_unary_minus() {
    assert_eq!(calc("-100"), -100.0);
    assert_eq!(calc("5*-100"), -500.0);
    assert_eq!(calc("-(1*2)"), -2.0);
    assert_eq!(calc("-(1*2)^3"), -8.0);
    assert_eq!(calc("3 - 2"), 1.0);
    assert_eq!(calc("3--2"), 5.0);
}

#[test]
fn test_scientific_notation() {
    assert_eq!(calc("2E5"), 200_000.0);
    assert_eq!(calc("1e-3*5+2"), 1e-3 * 5.0 + 2.0);
    assert_eq!(calc("1e+2"), 100.0);
}

#[test]
fn test_relational_and_logical_operators() {
    assert_eq!(calc("32.9 < -10"), 0.0);
    assert_eq!(calc("5 >= 5"), 1.0);
    assert_eq!(calc("5 <= 4"), 0.0);
    assert_eq!(calc("2 == 2"), 1.0);
    assert_eq!(calc("2 != 3"), 1.0);
    assert_eq!(calc("1 && 0"), 0.0);
    assert_eq!(calc("1 || 0"), 1.0);
    assert_eq!(calc("2 < 3 && 3 < 4"), 1.0);
}

#[test]
fn test_variables_flow_into_evaluation() {
    let engine = Engine::new();
    let result = engine
        .calculate("var1 + 2 * (3 * age)", &variables([("var1", 2), ("age", 4)]))
        .unwrap();
    assert_eq!(result, 26.0);

    let result = engine
        .calculate("$var1 + v_var2", &variables([("$var1", 1.5), ("v_var2", 0.5)]))
        .unwrap();
    assert_eq!(result, 2.0);
}

#[test]
fn test_default_functions_and_constants() {
    assert_eq!(calc("max(5,6,3,-4,100)"), 100.0);
    assert_eq!(calc("min(5,6,3,-4,100)"), -4.0);
    assert_eq!(calc("sin(0)"), 0.0);
    assert_eq!(calc("sqrt(16)+floor(1.9)"), 5.0);
    assert_eq!(calc("round(1.234567, 2)"), 1.23);
    assert_eq!(calc("if(2 < 3, 10, 5)"), 10.0);
    assert_eq!(calc("pi"), std::f64::consts::PI);
    assert_eq!(calc("e^1"), std::f64::consts::E);
}

#[test]
fn test_random_stays_in_unit_interval() {
    let engine = Engine::new();
    for _ in 0..32 {
        let value = engine.calculate("random(5)", &Variables::new()).unwrap();
        assert!((0.0..1.0).contains(&value), "random out of range: {value}");
    }
}

#[test]
fn test_case_insensitive_by_default() {
    let engine = Engine::new();
    let result = engine
        .calculate("VaR1*2", &variables([("var1", 3)]))
        .unwrap();
    assert_eq!(result, 6.0);
    assert_eq!(engine.calculate("COS(0)", &Variables::new()).unwrap(), 1.0);
    assert_eq!(engine.calculate("PI", &Variables::new()).unwrap(), std::f64::consts::PI);
}

#[test]
fn test_case_sensitive_mode() {
    let engine = Engine::with_options(EngineOptions {
        case_sensitive: true,
        ..Default::default()
    })
    .unwrap();

    let result = engine
        .calculate("VaR1*2", &variables([("VaR1", 3)]))
        .unwrap();
    assert_eq!(result, 6.0);

    let err = engine
        .calculate("VaR1*2", &variables([("var1", 3)]))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Eval(EvalError::UndefinedVariable("VaR1".into()))
    );
}

#[test]
fn test_custom_function() {
    let mut engine = Engine::new();
    engine
        .add_function("addTwo", Arc::new(|args| Ok(args[0] + 2.0)), true)
        .unwrap();
    let result = engine
        .calculate("addtwo(var1)", &variables([("var1", 2.0)]))
        .unwrap();
    assert_eq!(result, 4.0);
}

#[test]
fn test_compiled_constants_fold_at_build_time() {
    let engine = Engine::new();
    let formula = engine
        .build_with_constants("if(2+2==$a, 10, 5)", &variables([("$a", 4)]))
        .unwrap();
    assert_eq!(formula.evaluate(&Variables::new()).unwrap(), 10.0);
    assert!(formula.variables().is_empty());
}

#[test]
fn test_built_formulas_keep_their_constant_snapshot() {
    let mut engine = Engine::new();
    engine.add_constant("age", 10.0, true).unwrap();
    let old = engine.build("age + 1").unwrap();
    assert_eq!(old.evaluate(&Variables::new()).unwrap(), 11.0);

    engine.add_constant("age", 20.0, true).unwrap();
    let new = engine.build("age + 1").unwrap();
    assert_eq!(new.evaluate(&Variables::new()).unwrap(), 21.0);
    // The earlier formula folded against the registry it was built with.
    assert_eq!(old.evaluate(&Variables::new()).unwrap(), 11.0);
}

#[test]
fn test_defaults_cannot_be_overwritten() {
    let mut engine = Engine::new();
    assert_eq!(
        engine.add_constant("pi", 3.0, true),
        Err(ConfigError::ConstantNotOverwritable("pi".into()))
    );
    assert_eq!(
        engine.add_function("sin", Arc::new(|_| Ok(0.0)), true),
        Err(ConfigError::FunctionNotOverwritable("sin".into()))
    );
}

#[test]
fn test_short_circuit_constant_avoids_undefined_variable() {
    let engine = Engine::new();
    assert_eq!(engine.calculate("0 && err", &Variables::new()).unwrap(), 0.0);
    assert_eq!(engine.calculate("err && 0", &Variables::new()).unwrap(), 0.0);
    assert_eq!(engine.calculate("1 || err", &Variables::new()).unwrap(), 1.0);

    let unoptimized = Engine::with_options(EngineOptions {
        optimize_enabled: false,
        ..Default::default()
    })
    .unwrap();
    assert_eq!(
        unoptimized.calculate("0 && err", &Variables::new()).unwrap_err(),
        EngineError::Eval(EvalError::UndefinedVariable("err".into()))
    );
}

#[test]
fn test_empty_formula_is_rejected() {
    let engine = Engine::new();
    assert_eq!(
        engine.calculate("", &Variables::new()).unwrap_err(),
        EngineError::Lex(LexError::EmptyFormula)
    );
    assert_eq!(
        engine.calculate("   ", &Variables::new()).unwrap_err(),
        EngineError::Lex(LexError::EmptyFormula)
    );
}

#[test]
fn test_missing_variable_is_named() {
    let engine = Engine::new();
    let err = engine
        .calculate("var1*var2", &variables([("var1", 1.0)]))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Eval(EvalError::UndefinedVariable("var2".into()))
    );
}

#[test]
fn test_parse_errors() {
    let engine = Engine::new();
    assert_eq!(
        engine.calculate("(1+2", &Variables::new()).unwrap_err(),
        EngineError::Parse(ParseError::UnmatchedLeftBracket { position: 0 })
    );
    assert_eq!(
        engine.calculate("1+2)", &Variables::new()).unwrap_err(),
        EngineError::Parse(ParseError::UnmatchedRightBracket { position: 3 })
    );
    assert_eq!(
        engine.calculate("1,2", &Variables::new()).unwrap_err(),
        EngineError::Parse(ParseError::MisplacedArgumentSeparator { position: 1 })
    );
    assert_eq!(
        engine.calculate("1 2", &Variables::new()).unwrap_err(),
        EngineError::Parse(ParseError::InvalidSyntax)
    );
}

#[test]
fn test_comma_decimal_separator() {
    let engine = Engine::with_options(EngineOptions {
        decimal_separator: ',',
        argument_separator: ';',
        ..Default::default()
    })
    .unwrap();
    assert_eq!(engine.calculate("1,5+2", &Variables::new()).unwrap(), 3.5);
    assert_eq!(engine.calculate("max(1; 2,5)", &Variables::new()).unwrap(), 2.5);
}

#[test]
fn test_formula_reuse_across_bindings() {
    let engine = Engine::new();
    let formula = engine.build("side^2").unwrap();
    assert_eq!(formula.variables(), &["side".to_string()]);
    for side in 1..=5 {
        let result = formula
            .evaluate(&variables([("side", side)]))
            .unwrap();
        assert_eq!(result, (side * side) as f64);
    }
}

#[test]
fn test_concurrent_calculation_shares_cache() {
    let engine = Engine::new();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for i in 0..100 {
                    let result = engine
                        .calculate("x^2 + 1", &variables([("x", i)]))
                        .unwrap();
                    assert_eq!(result, (i * i + 1) as f64);
                }
            });
        }
    });
}

#[test]
fn test_non_numeric_binding_is_rejected() {
    let engine = Engine::new();
    let err = engine
        .calculate("x+1", &variables([("x", "twelve")]))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Eval(EvalError::NotNumeric { name: "x".into() })
    );

    let result = engine
        .calculate("x+1", &variables([("x", "12.5")]))
        .unwrap();
    assert_eq!(result, 13.5);
}
