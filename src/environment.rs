//! Runtime scope frames.
//!
//! An [`Environment`] is one frame of the lexical chain: a name→value map, a
//! set tracking which names have actually been assigned, and an optional link
//! to the enclosing frame.  Frames are shared (`Rc<RefCell<_>>`) because a
//! closure may keep its defining frame alive long after the block or call
//! that created it has returned; there is a single mutator at any time since
//! execution is single‑threaded.
//!
//! A name that was declared (`var x;`) but never assigned is present in
//! `values` and absent from `assigned`; reading it is a runtime error, which
//! is stricter than silently yielding `nil`.

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

use log::debug;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    assigned: HashSet<String>,
    pub enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A fresh global (chain‑root) frame.
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            assigned: HashSet::new(),
            enclosing: None,
        }
    }

    /// A child frame whose lookups fall through to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            assigned: HashSet::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Declare `name` in this frame.  `Some(value)` also marks it assigned;
    /// `None` leaves it declared‑but‑uninitialized (`var x;`).
    pub fn define(&mut self, name: &str, value: Option<Value>) {
        debug!("define '{}' (initialized: {})", name, value.is_some());

        match value {
            Some(value) => {
                self.values.insert(name.to_string(), value);
                self.assigned.insert(name.to_string());
            }

            None => {
                self.values.insert(name.to_string(), Value::Nil);
                self.assigned.remove(name);
            }
        }
    }

    /// Number of bindings declared in *this* frame only.
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Number of bindings declared across the whole chain.
    pub fn count_all(&self) -> usize {
        let enclosed: usize = match &self.enclosing {
            Some(parent) => parent.borrow().count_all(),
            None => 0,
        };

        enclosed + self.count()
    }

    /// Look `name` up, walking the chain innermost‑first.  Declared but
    /// never‑assigned names are an error rather than `nil`.
    pub fn get(&self, name: &Token) -> Result<Value> {
        let identifier: &str = &name.lexeme;

        if let Some(value) = self.values.get(identifier) {
            if self.assigned.contains(identifier) {
                return Ok(value.clone());
            }

            return Err(LoxError::runtime(
                name.line,
                format!("Uninitialized variable '{}'.", identifier),
            ));
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow().get(name);
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined variable '{}'.", identifier),
        ))
    }

    /// Overwrite an *existing* binding, walking the chain innermost‑first.
    /// Assignment never creates new bindings.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        let identifier: &str = &name.lexeme;

        if self.values.contains_key(identifier) {
            self.values.insert(identifier.to_string(), value);
            self.assigned.insert(identifier.to_string());
            return Ok(());
        }

        if let Some(enclosing) = &self.enclosing {
            return enclosing.borrow_mut().assign(name, value);
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined variable '{}'.", identifier),
        ))
    }

    /// Walk exactly `distance` `enclosing` links up from `this_env` and read
    /// `name` there.  The resolver guarantees the binding exists, so a miss
    /// here indicates a scoping bug between resolver and evaluator.
    pub fn get_at(this_env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value> {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(this_env, distance);
        let frame = frame.borrow();

        let identifier: &str = &name.lexeme;

        if frame.values.contains_key(identifier) && !frame.assigned.contains(identifier) {
            return Err(LoxError::runtime(
                name.line,
                format!("Uninitialized variable '{}'.", identifier),
            ));
        }

        frame
            .values
            .get(identifier)
            .cloned()
            .ok_or_else(|| {
                LoxError::runtime(
                    name.line,
                    format!("Unresolved variable '{}' at depth {}.", identifier, distance),
                )
            })
    }

    /// Walk exactly `distance` links up and overwrite `name` there.
    pub fn assign_at(
        this_env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<()> {
        let frame: Rc<RefCell<Environment>> = Self::ancestor(this_env, distance);
        let mut frame = frame.borrow_mut();

        let identifier: &str = &name.lexeme;

        if !frame.values.contains_key(identifier) {
            return Err(LoxError::runtime(
                name.line,
                format!("Unresolved variable '{}' at depth {}.", identifier, distance),
            ));
        }

        frame.values.insert(identifier.to_string(), value);
        frame.assigned.insert(identifier.to_string());
        Ok(())
    }

    fn ancestor(this_env: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut env: Rc<RefCell<Environment>> = this_env.clone();

        for _ in 0..distance {
            let parent = env
                .borrow()
                .enclosing
                .as_ref()
                .cloned()
                .unwrap_or_else(|| env.clone());
            env = parent;
        }

        env
    }
}
