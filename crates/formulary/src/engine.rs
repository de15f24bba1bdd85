//! Engine facade
//!
//! Wires the pipeline together: lexer → AST builder → optimizer → reusable
//! formula, with a thread-safe cache keyed by formula text (and, for
//! compiled-constant builds, a canonicalized constant serialization).

use crate::ast::Operation;
use crate::cache::FormulaCache;
use crate::error::{ConfigError, EngineError, EngineResult, EvalError, LexError};
use crate::evaluator;
use crate::functions;
use crate::lexer::Lexer;
use crate::optimizer::optimize;
use crate::parser::AstBuilder;
use crate::registry::{ConstantRegistry, FunctionRegistry, NativeFunction};
use crate::value::{self, Variables};
use log::debug;
use std::sync::Arc;

/// Engine configuration. Separator choices are validated at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Decimal separator for numeric literals: `.` or `,`
    pub decimal_separator: char,
    /// Function argument separator: `,` or `;`
    pub argument_separator: char,
    /// When false, identifiers and registry lookups are lower-cased
    pub case_sensitive: bool,
    /// Run the constant-folding pass after parsing
    pub optimize_enabled: bool,
    /// Register `e` and `pi`
    pub load_default_constants: bool,
    /// Register the default math function library
    pub load_default_functions: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            argument_separator: ',',
            case_sensitive: false,
            optimize_enabled: true,
            load_default_constants: true,
            load_default_functions: true,
        }
    }
}

impl EngineOptions {
    fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.decimal_separator, '.' | ',') {
            return Err(ConfigError::InvalidDecimalSeparator(self.decimal_separator));
        }
        if !matches!(self.argument_separator, ',' | ';') {
            return Err(ConfigError::InvalidArgumentSeparator(self.argument_separator));
        }
        if self.decimal_separator == self.argument_separator {
            return Err(ConfigError::SeparatorConflict(self.decimal_separator));
        }
        Ok(())
    }
}

/// A compiled, reusable formula: the optimized tree bound to the registry
/// snapshot it was built against. Cloning is cheap and clones share the
/// tree.
#[derive(Clone)]
pub struct Formula {
    root: Arc<Operation>,
    functions: Arc<FunctionRegistry>,
    variables: Arc<[String]>,
    case_sensitive: bool,
}

impl Formula {
    /// Evaluate against a fresh set of bindings. Compile-time constants are
    /// already baked into the tree and cannot be overridden here.
    pub fn evaluate(&self, vars: &Variables) -> Result<f64, EvalError> {
        let bindings = value::flatten(vars, self.case_sensitive)?;
        evaluator::execute(&self.root, &bindings, &self.functions)
    }

    /// Unbound variable names referenced by the formula, in first-appearance
    /// order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// The compiled operation tree.
    pub fn operation(&self) -> &Operation {
        &self.root
    }
}

/// The calculation engine: compiles formula text into reusable formulas and
/// memoizes them. Shared read access (`calculate`, `build`) is thread-safe;
/// registering functions or constants needs exclusive access and invalidates
/// the cache.
pub struct Engine {
    options: EngineOptions,
    cache: FormulaCache,
    functions: Arc<FunctionRegistry>,
    constants: Arc<ConstantRegistry>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        match Self::with_options(EngineOptions::default()) {
            Ok(engine) => engine,
            // Default options always validate and default registries start
            // empty, so registration cannot collide.
            Err(_) => unreachable!("default engine options are valid"),
        }
    }

    pub fn with_options(options: EngineOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        let mut function_registry = FunctionRegistry::new(options.case_sensitive);
        if options.load_default_functions {
            functions::register_defaults(&mut function_registry)?;
        }

        let mut constant_registry = ConstantRegistry::new(options.case_sensitive);
        if options.load_default_constants {
            functions::register_default_constants(&mut constant_registry)?;
        }

        Ok(Self {
            options,
            cache: FormulaCache::new(),
            functions: Arc::new(function_registry),
            constants: Arc::new(constant_registry),
        })
    }

    /// Compile (or fetch from cache) and evaluate once.
    pub fn calculate(&self, formula_text: &str, vars: &Variables) -> EngineResult<f64> {
        let formula = self.build(formula_text)?;
        Ok(formula.evaluate(vars)?)
    }

    /// Compile (or fetch from cache) without evaluating.
    pub fn build(&self, formula_text: &str) -> EngineResult<Formula> {
        self.build_cached(formula_text, None)
    }

    /// Compile with caller constants pre-bound and folded into the tree.
    /// The same text with different constants compiles to distinct cache
    /// entries.
    pub fn build_with_constants(
        &self,
        formula_text: &str,
        constants: &Variables,
    ) -> EngineResult<Formula> {
        let mut compiled = ConstantRegistry::new(self.options.case_sensitive);
        for (name, val) in constants {
            let number = val
                .as_number()
                .ok_or_else(|| EvalError::NotNumeric { name: name.clone() })?;
            compiled.register(name, number, true)?;
        }
        self.build_cached(formula_text, Some(&compiled))
    }

    /// Register a constant. Invalidates the whole cache: cached trees may
    /// have folded against the previous registry contents. Formulas already
    /// built keep the values they closed over.
    pub fn add_constant(
        &mut self,
        name: &str,
        value: f64,
        overwritable: bool,
    ) -> Result<(), ConfigError> {
        Arc::make_mut(&mut self.constants).register(name, value, overwritable)?;
        debug!("constant '{name}' registered, invalidating formula cache");
        self.cache.clear();
        Ok(())
    }

    /// Register a function under the arity-free calling contract.
    /// Invalidates the whole cache. Mark `idempotent` false for anything
    /// that must never be constant-folded.
    pub fn add_function(
        &mut self,
        name: &str,
        body: NativeFunction,
        idempotent: bool,
    ) -> Result<(), ConfigError> {
        Arc::make_mut(&mut self.functions).register(name, body, true, idempotent)?;
        debug!("function '{name}' registered, invalidating formula cache");
        self.cache.clear();
        Ok(())
    }

    fn build_cached(
        &self,
        formula_text: &str,
        compiled_constants: Option<&ConstantRegistry>,
    ) -> EngineResult<Formula> {
        if formula_text.trim().is_empty() {
            return Err(LexError::EmptyFormula.into());
        }

        let key = cache_key(formula_text, compiled_constants);
        if let Some(hit) = self.cache.get(&key) {
            debug!("formula cache hit: {formula_text:?}");
            return Ok(hit);
        }

        debug!("formula cache miss, compiling: {formula_text:?}");
        let root = self.compile(formula_text, compiled_constants)?;
        let formula = Formula {
            variables: root.variable_names().into(),
            root: Arc::new(root),
            functions: Arc::clone(&self.functions),
            case_sensitive: self.options.case_sensitive,
        };
        // Benign race: another thread may have compiled the same formula in
        // the meantime; whichever entry landed first is kept.
        Ok(self.cache.insert_if_absent(key, formula))
    }

    fn compile(
        &self,
        formula_text: &str,
        compiled_constants: Option<&ConstantRegistry>,
    ) -> Result<Operation, EngineError> {
        let lexer = Lexer::new(self.options.decimal_separator, self.options.argument_separator);
        let tokens = lexer.read(formula_text)?;

        let builder = AstBuilder::new(
            self.options.case_sensitive,
            &self.functions,
            &self.constants,
            compiled_constants,
        );
        let root = builder.build(tokens)?;

        if self.options.optimize_enabled {
            Ok(optimize(root, &self.functions))
        } else {
            Ok(root)
        }
    }

    #[cfg(test)]
    pub(crate) fn cached_formulas(&self) -> usize {
        self.cache.len()
    }
}

/// Raw formula text, or text plus a deterministic serialization of the
/// pre-bound constants (names sorted) so that different constant sets do not
/// collide.
fn cache_key(formula_text: &str, compiled_constants: Option<&ConstantRegistry>) -> String {
    match compiled_constants {
        None => formula_text.to_string(),
        Some(registry) => {
            let mut key = String::from(formula_text);
            key.push('@');
            for (name, value) in registry.sorted_entries() {
                key.push_str(name);
                key.push(':');
                key.push_str(&value.to_string());
                key.push('@');
            }
            key
        }
    }
}
