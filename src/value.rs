//! Runtime value model.
//!
//! `Value` is the tagged dynamic value every expression evaluates to.  Data
//! values (`nil`, booleans, numbers, strings) compare structurally; callables
//! and instances compare by identity (`Rc::ptr_eq`), matching reference
//! semantics for objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;

/// A tagged dynamic runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,

    Bool(bool),

    Number(f64),

    Str(String),

    /// Host‑provided function with a fixed arity.
    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },

    /// User function: declaration + captured closure.
    Function(Rc<LoxFunction>),

    /// Class object; calling it constructs an instance.
    Class(Rc<LoxClass>),

    /// Instance with mutable field storage.
    Instance(Rc<RefCell<LoxInstance>>),
}

impl Value {
    /// `nil` and `false` are falsey; every other value (including `0` and
    /// `""`) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (
                Value::NativeFunction { name: a, .. },
                Value::NativeFunction { name: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // Integral‑looking numbers print without a trailing ".0".
            Value::Number(n) => {
                if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "<fn {}>", fun.declaration.name.lexeme),

            Value::Class(class) => write!(f, "{}", class.name),

            Value::Instance(instance) => {
                write!(f, "{} instance", instance.borrow().class.name)
            }
        }
    }
}

/// A user‑defined function paired with the environment frame that was active
/// at its definition site (its closure).
#[derive(Debug)]
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,

    /// `init` methods implicitly return the bound instance.
    pub is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Declared parameter count.
    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this function whose closure is extended by one frame
    /// holding the given implicit bindings (`this`, and `self` for class
    /// methods).  The resolver opens exactly one matching scope, so the extra
    /// frame keeps the lexical distances in sync.
    pub fn bind(&self, bindings: &[(&str, Value)]) -> LoxFunction {
        let frame = Rc::new(RefCell::new(Environment::with_enclosing(
            self.closure.clone(),
        )));

        for (name, value) in bindings {
            frame.borrow_mut().define(name, Some(value.clone()));
        }

        LoxFunction {
            declaration: self.declaration.clone(),
            closure: frame,
            is_initializer: self.is_initializer,
        }
    }
}
