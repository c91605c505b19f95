//! Tree‑walking evaluator.
//!
//! Executes statements against the environment chain, using the lexical
//! distances recorded by the resolver for O(distance) variable access.
//! Non‑local control flow (`return`, `break`) is an explicit [`Signal`]
//! threaded through every statement executor instead of an unwinding
//! exception, so exits are visible in the type system and environment
//! restoration stays unconditional.
//!
//! Recursion depth is bounded only by the host call stack: a deeply recursive
//! program (or a pathologically nested expression) can overflow it.  That is
//! an accepted failure mode, not a guarded one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, error, info};

use crate::ast::{Expr, ExprId, LiteralValue, Stmt};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::{LoxFunction, Value};

/// Outcome of executing a single statement.  Every executor must propagate
/// non‑`Normal` signals until the owning boundary intercepts them: the
/// function‑call boundary for `Returned`, the loop‑body boundary for `Broke`.
#[derive(Debug)]
pub enum Signal {
    Normal,
    Returned(Value),
    Broke,
}

pub struct Interpreter {
    /// Root frame holding native functions and top‑level declarations.
    pub globals: Rc<RefCell<Environment>>,

    /// Innermost frame at the current point of execution.
    environment: Rc<RefCell<Environment>>,

    /// Side table populated by the resolver: expression id → lexical distance.
    /// Absence means "dynamic lookup against globals".
    locals: HashMap<ExprId, usize>,

    /// Sink for `print` statements; stdout by default, injectable for tests.
    output: Box<dyn Write>,
}

impl Interpreter {
    /// Creates a new Interpreter printing to stdout, with native functions
    /// such as `clock` predefined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates a new Interpreter writing `print` output to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'clock'");

        globals.borrow_mut().define(
            "clock",
            Some(Value::NativeFunction {
                name: "clock".to_string(),
                arity: 0,
                func: |_args: &[Value]| {
                    let seconds: f64 = chrono::Utc::now().timestamp_micros() as f64 / 1e6;
                    Ok(Value::Number(seconds))
                },
            }),
        );

        Self {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Record a resolver‑computed lexical distance for an expression.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("locals[{}] = {}", id, depth);

        self.locals.insert(id, depth);
    }

    /// Interprets a list of statements (a "program").  A runtime error aborts
    /// the remaining statements; the caller reports it.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt)? {
                Signal::Normal => {}

                // The resolver rejects top‑level `return`/`break`; a signal
                // arriving here means a pass was skipped or has a bug.
                signal => error!("control‑flow signal escaped to top level: {:?}", signal),
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────── statements ───────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Signal> {
        match stmt {
            Stmt::Expression(expr) => {
                let _ = self.evaluate(expr)?;
                Ok(Signal::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                Ok(Signal::Normal)
            }

            Stmt::Var { name, initializer } => {
                debug!("Defining variable '{}'", name.lexeme);

                let value: Option<Value> = match initializer {
                    Some(expr) => Some(self.evaluate(expr)?),
                    None => None, // declared but uninitialized
                };

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Signal::Normal)
            }

            Stmt::Block(statements) => {
                let child = Rc::new(RefCell::new(Environment::with_enclosing(
                    self.environment.clone(),
                )));

                self.execute_block(statements, child)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Signal::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Signal::Normal => {}

                        // `break` terminates this loop and goes no further.
                        Signal::Broke => break,

                        returned @ Signal::Returned(_) => return Ok(returned),
                    }
                }

                Ok(Signal::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // The frame active right now becomes the closure.
                let function = LoxFunction::new(decl.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Some(Value::Function(Rc::new(function))));
                Ok(Signal::Normal)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Signal::Returned(value))
            }

            Stmt::Break { .. } => Ok(Signal::Broke),

            Stmt::Class {
                name,
                methods,
                class_methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
                for decl in methods {
                    let is_initializer: bool = decl.name.lexeme == "init";
                    let function =
                        LoxFunction::new(decl.clone(), self.environment.clone(), is_initializer);
                    method_map.insert(decl.name.lexeme.clone(), Rc::new(function));
                }

                let mut class_method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
                for decl in class_methods {
                    let function = LoxFunction::new(decl.clone(), self.environment.clone(), false);
                    class_method_map.insert(decl.name.lexeme.clone(), Rc::new(function));
                }

                let class = LoxClass::new(name.lexeme.clone(), method_map, class_method_map);

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Some(Value::Class(Rc::new(class))));
                Ok(Signal::Normal)
            }
        }
    }

    /// Run `statements` inside `env`, restoring the previous environment on
    /// *every* exit path (normal, signal, or runtime error) so the chain stays
    /// consistent after failures.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        env: Rc<RefCell<Environment>>,
    ) -> Result<Signal> {
        let previous: Rc<RefCell<Environment>> = std::mem::replace(&mut self.environment, env);

        let mut result: Result<Signal> = Ok(Signal::Normal);

        for stmt in statements {
            match self.execute(stmt) {
                Ok(Signal::Normal) => continue,

                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    // ─────────────────────────── expressions ───────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(lit) => Ok(match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                // Short‑circuit: yield the deciding operand itself, not a
                // coerced boolean.
                match operator.token_type {
                    TokenType::OR if left_val.is_truthy() => Ok(left_val),
                    TokenType::AND if !left_val.is_truthy() => Ok(left_val),
                    _ => self.evaluate(right),
                }
            }

            Expr::Variable { name, id } => self.look_up_variable(name, *id),

            Expr::Assign { name, value, id } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?;
                    }

                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),

                Value::Class(class) => LoxClass::get(&class, name),

                _ => Err(LoxError::runtime(
                    name.line,
                    "Only instances have properties.",
                )),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value: Value = self.evaluate(value)?;
                    instance.borrow_mut().set(name, value.clone());
                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.")),
            },

            Expr::This { keyword, id } => self.look_up_variable(keyword, *id),
        }
    }

    /// Resolve a variable read: distance‑addressed when the resolver noted a
    /// local, dynamic against globals otherwise.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> Result<Value> {
        let right_val = self.evaluate(expr)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(LoxError::runtime(op.line, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(LoxError::runtime(op.line, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary (non‑logical) expression.  A type error on `+`
    /// aborts the expression immediately.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> Result<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::MINUS => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;

                // Explicit guard: no IEEE infinity/NaN propagation.
                if b == 0.0 {
                    return Err(LoxError::runtime(op.line, "Division by zero."));
                }

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = Self::number_operands(op, left_val, right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(LoxError::runtime(op.line, "Invalid binary operator.")),
        }
    }

    fn number_operands(op: &Token, left: Value, right: Value) -> Result<(f64, f64)> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((a, b)),
            _ => Err(LoxError::runtime(op.line, "Operands must be numbers.")),
        }
    }

    // ─────────────────────────── calls ───────────────────────────

    /// Invokes a callable (native function, user function, or class).
    fn invoke_callable(&mut self, callee: Value, paren: &Token, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                Self::check_arity(arity, args.len(), paren)?;

                func(&args).map_err(|msg| LoxError::runtime(paren.line, msg))
            }

            Value::Function(function) => {
                debug!("Calling function '{}'", function.declaration.name.lexeme);

                Self::check_arity(function.arity(), args.len(), paren)?;

                self.call_function(&function, args)
            }

            Value::Class(class) => {
                debug!("Instantiating class '{}'", class.name);

                Self::check_arity(class.arity(), args.len(), paren)?;

                let instance = Rc::new(RefCell::new(LoxInstance::new(class.clone())));

                // Run a bound `init` if present; its return value is ignored
                // and the fresh instance always wins.
                if let Some(init) = class.find_method("init") {
                    let bound = init.bind(&[("this", Value::Instance(instance.clone()))]);
                    self.call_function(&bound, args)?;
                }

                Ok(Value::Instance(instance))
            }

            _ => Err(LoxError::runtime(
                paren.line,
                "Can only call functions and classes.",
            )),
        }
    }

    fn check_arity(expected: usize, got: usize, paren: &Token) -> Result<()> {
        if expected != got {
            return Err(LoxError::runtime(
                paren.line,
                format!("Expected {} arguments but got {}.", expected, got),
            ));
        }

        Ok(())
    }

    /// Call a user function: fresh frame parented at the *closure* (not the
    /// caller's environment — that is what makes closures correct), positional
    /// parameter binding, then the body.
    fn call_function(&mut self, function: &LoxFunction, args: Vec<Value>) -> Result<Value> {
        let local = Rc::new(RefCell::new(Environment::with_enclosing(
            function.closure.clone(),
        )));

        for (param, arg) in function.declaration.params.iter().zip(args) {
            local.borrow_mut().define(&param.lexeme, Some(arg));
        }

        let signal: Signal = self.execute_block(&function.declaration.body, local)?;

        if function.is_initializer {
            // Initializers yield the bound instance no matter what the body
            // returned; `this` lives in the bind frame at distance 0.
            let this_token = Token::new(TokenType::THIS, "this", function.declaration.name.line);
            return Environment::get_at(&function.closure, 0, &this_token);
        }

        match signal {
            Signal::Returned(value) => Ok(value),

            Signal::Normal => Ok(Value::Nil),

            Signal::Broke => {
                // The resolver keeps `break` inside loop bodies; reaching this
                // arm means the static pass was skipped.
                error!("'break' signal escaped a function body");

                Err(LoxError::runtime(
                    function.declaration.name.line,
                    "Internal error: 'break' escaped its loop.",
                ))
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
