//! Classes and instances.
//!
//! A class holds two method tables: instance methods (bound to `this` on
//! access) and class methods (bound to the class itself via both `this` and
//! `self`, giving static‑like behavior).  Instances hold their own field map
//! plus a shared reference back to the class; field storage starts empty and
//! is populated by `set` or by the `init` method.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::{LoxFunction, Value};

#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    methods: HashMap<String, Rc<LoxFunction>>,
    class_methods: HashMap<String, Rc<LoxFunction>>,
}

impl LoxClass {
    pub fn new(
        name: String,
        methods: HashMap<String, Rc<LoxFunction>>,
        class_methods: HashMap<String, Rc<LoxFunction>>,
    ) -> Self {
        Self {
            name,
            methods,
            class_methods,
        }
    }

    pub fn find_method(&self, identifier: &str) -> Option<Rc<LoxFunction>> {
        self.methods.get(identifier).cloned()
    }

    pub fn find_class_method(&self, identifier: &str) -> Option<Rc<LoxFunction>> {
        self.class_methods.get(identifier).cloned()
    }

    /// Constructor arity: `init`'s parameter count, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Property access *on the class itself* resolves class methods only,
    /// bound to the class via both `this` and `self`.
    pub fn get(class: &Rc<LoxClass>, name: &Token) -> Result<Value> {
        let identifier: &str = &name.lexeme;

        if let Some(method) = class.find_class_method(identifier) {
            debug!("Bound class method '{}.{}'", class.name, identifier);

            let receiver = Value::Class(class.clone());
            let bound = method.bind(&[("this", receiver.clone()), ("self", receiver)]);

            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", identifier),
        ))
    }
}

#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Property lookup order: own fields, then instance methods (bound to
    /// `this`), then class methods (bound to the class).
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        let identifier: &str = &name.lexeme;

        if let Some(value) = instance.borrow().fields.get(identifier) {
            return Ok(value.clone());
        }

        let class: Rc<LoxClass> = instance.borrow().class.clone();

        if let Some(method) = class.find_method(identifier) {
            let bound = method.bind(&[("this", Value::Instance(instance.clone()))]);

            return Ok(Value::Function(Rc::new(bound)));
        }

        if let Some(method) = class.find_class_method(identifier) {
            let receiver = Value::Class(class.clone());
            let bound = method.bind(&[("this", receiver.clone()), ("self", receiver)]);

            return Ok(Value::Function(Rc::new(bound)));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", identifier),
        ))
    }

    /// Field write; creates the field if absent.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}
