//! Operation tree
//!
//! The compiled form of a formula: a closed set of node variants, each owning
//! its operand subtrees. Every composite node carries metadata derived once at
//! construction; the optimizer and the engine consult it to decide constant
//! folding, so constructors are the only place it is computed.

/// Numeric tag carried by nodes, used only while folding literals. The
/// evaluator always produces `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    FloatingPoint,
}

/// Derived node facts.
///
/// A node is eligible for constant folding iff it is not already a constant,
/// `depends_on_variables` is false and `is_idempotent` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub data_type: DataType,
    /// True if any descendant is a variable reference
    pub depends_on_variables: bool,
    /// True if re-evaluating with the same inputs always yields the same
    /// result; false anywhere below a non-idempotent function call
    pub is_idempotent: bool,
}

/// Binary operator kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

/// A node of the compiled operation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Constant {
        value: f64,
        data_type: DataType,
    },
    Variable {
        /// Already case-folded per the engine's case-sensitivity setting
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Operation>,
        right: Box<Operation>,
        meta: Metadata,
    },
    UnaryMinus {
        operand: Box<Operation>,
        meta: Metadata,
    },
    Function {
        name: String,
        args: Vec<Operation>,
        meta: Metadata,
    },
}

impl Operation {
    pub fn integer(value: i64) -> Self {
        Operation::Constant {
            value: value as f64,
            data_type: DataType::Integer,
        }
    }

    pub fn float(value: f64) -> Self {
        Operation::Constant {
            value,
            data_type: DataType::FloatingPoint,
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Operation::Variable { name: name.into() }
    }

    pub fn binary(op: BinaryOp, left: Operation, right: Operation) -> Self {
        let lm = left.metadata();
        let rm = right.metadata();
        let data_type = match op {
            // True division, floating-point remainder and power regardless
            // of operand tags
            BinaryOp::Divide | BinaryOp::Modulo | BinaryOp::Power => DataType::FloatingPoint,
            _ => promote(lm.data_type, rm.data_type),
        };
        Operation::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            meta: Metadata {
                data_type,
                depends_on_variables: lm.depends_on_variables || rm.depends_on_variables,
                is_idempotent: lm.is_idempotent && rm.is_idempotent,
            },
        }
    }

    pub fn unary_minus(operand: Operation) -> Self {
        let meta = operand.metadata();
        Operation::UnaryMinus {
            operand: Box::new(operand),
            meta,
        }
    }

    /// `idempotent` is the registered callable's own idempotence; the node is
    /// idempotent only if the callable and every argument are.
    pub fn function(name: impl Into<String>, args: Vec<Operation>, idempotent: bool) -> Self {
        let mut depends_on_variables = false;
        let mut is_idempotent = idempotent;
        for arg in &args {
            let m = arg.metadata();
            depends_on_variables = depends_on_variables || m.depends_on_variables;
            is_idempotent = is_idempotent && m.is_idempotent;
        }
        Operation::Function {
            name: name.into(),
            args,
            meta: Metadata {
                data_type: DataType::FloatingPoint,
                depends_on_variables,
                is_idempotent,
            },
        }
    }

    pub fn metadata(&self) -> Metadata {
        match self {
            Operation::Constant { data_type, .. } => Metadata {
                data_type: *data_type,
                depends_on_variables: false,
                is_idempotent: true,
            },
            Operation::Variable { .. } => Metadata {
                data_type: DataType::FloatingPoint,
                depends_on_variables: true,
                is_idempotent: false,
            },
            Operation::Binary { meta, .. }
            | Operation::UnaryMinus { meta, .. }
            | Operation::Function { meta, .. } => *meta,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Operation::Constant { .. })
    }

    pub(crate) fn constant_value(&self) -> Option<f64> {
        match self {
            Operation::Constant { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Referenced variable names in first-appearance order.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut Vec<String>) {
        match self {
            Operation::Constant { .. } => {}
            Operation::Variable { name } => {
                if !names.iter().any(|n| n == name) {
                    names.push(name.clone());
                }
            }
            Operation::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
            Operation::UnaryMinus { operand, .. } => operand.collect_variables(names),
            Operation::Function { args, .. } => {
                for arg in args {
                    arg.collect_variables(names);
                }
            }
        }
    }
}

fn promote(a: DataType, b: DataType) -> DataType {
    if a == DataType::FloatingPoint || b == DataType::FloatingPoint {
        DataType::FloatingPoint
    } else {
        DataType::Integer
    }
}
