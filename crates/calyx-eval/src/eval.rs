//! The evaluator.
//!
//! Statement execution threads a [`Flow`] result upward: `Return`
//! carries the value of a `return` statement and is interpreted only at
//! the call boundary; anywhere else it keeps propagating, and at the
//! top level it is an error.
//!
//! Expression nodes marked `caching` by the DAG pass store their value
//! in a per-run table on first evaluation and serve it afterwards. The
//! table belongs to the evaluator and is cleared at the start of every
//! run, so caches never leak across runs.

use std::io::Write;
use std::rc::Rc;

use calyx_par::{Ast, BinOp, Lit, NodeId, NodeKind, UnOp};
use calyx_util::{FxHashMap, Symbol};

use crate::builtins::Builtin;
use crate::env::{Callable, Env, Function};
use crate::error::RuntimeError;
use crate::value::Value;

/// Outcome of executing a statement.
pub enum Flow {
    Normal,
    Return(Value),
}

/// Tree-walking evaluator. Program output goes to `out`.
pub struct Evaluator<'w> {
    env: Env,
    cache: FxHashMap<NodeId, Value>,
    out: &'w mut dyn Write,
}

impl<'w> Evaluator<'w> {
    pub fn new(out: &'w mut dyn Write) -> Self {
        Self {
            env: Env::global(),
            cache: FxHashMap::default(),
            out,
        }
    }

    /// Run a whole program in a fresh global environment.
    pub fn run(&mut self, ast: &Ast) -> Result<(), RuntimeError> {
        self.env = Env::global();
        self.cache.clear();
        for &stmt in &ast.roots {
            if let Flow::Return(_) = self.exec(ast, stmt)? {
                return Err(RuntimeError::ReturnOutsideFunction);
            }
        }
        Ok(())
    }

    fn exec(&mut self, ast: &Ast, id: NodeId) -> Result<Flow, RuntimeError> {
        match ast.kind(id) {
            NodeKind::Block { statements } => {
                let prev = self.env.clone();
                self.env = Env::with_enclosing(&prev);
                let result = self.exec_sequence(ast, statements);
                self.env = prev;
                result
            },
            NodeKind::FnDef {
                name, params, body, ..
            } => {
                let param_names: Vec<Symbol> = params
                    .iter()
                    .filter_map(|&p| match ast.kind(p) {
                        NodeKind::Param { name, .. } => Some(*name),
                        _ => None,
                    })
                    .collect();
                let function = Function {
                    params: param_names,
                    body: *body,
                    closure: self.env.downgrade(),
                };
                self.env
                    .define_fun(*name, Callable::Function(Rc::new(function)))?;
                Ok(Flow::Normal)
            },
            NodeKind::VarDecl { name, init, .. } => {
                // Redeclaration is checked before the initializer runs.
                let init = *init;
                let name = *name;
                let value = match init {
                    Some(init) => {
                        if self.env.resolve_var(name, 0).is_ok() {
                            return Err(RuntimeError::VariableRedeclared(name));
                        }
                        Some(self.eval(ast, init)?)
                    },
                    None => None,
                };
                self.env.declare_var(name, value)?;
                Ok(Flow::Normal)
            },
            NodeKind::Assign {
                name,
                value,
                scope_depth,
            } => {
                let depth = scope_depth.ok_or(RuntimeError::UnresolvedVariable(*name))?;
                let value = self.eval(ast, *value)?;
                self.env.assign_var(*name, depth, value)?;
                Ok(Flow::Normal)
            },
            NodeKind::Print { expr } => {
                let value = self.eval(ast, *expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            },
            NodeKind::Assert { expr } => {
                if self.eval_condition(ast, *expr)? {
                    Ok(Flow::Normal)
                } else {
                    Err(RuntimeError::AssertionFailed)
                }
            },
            NodeKind::Return { expr } => {
                let value = self.eval(ast, *expr)?;
                Ok(Flow::Return(value))
            },
            NodeKind::If { condition, body } => {
                if self.eval_condition(ast, *condition)? {
                    self.exec(ast, *body)
                } else {
                    Ok(Flow::Normal)
                }
            },
            NodeKind::While { condition, body } => {
                while self.eval_condition(ast, *condition)? {
                    if let Flow::Return(value) = self.exec(ast, *body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let (initializer, condition, increment, body) =
                    (*initializer, *condition, *increment, *body);
                let prev = self.env.clone();
                self.env = Env::with_enclosing(&prev);
                let result = self.exec_for(ast, initializer, condition, increment, body);
                self.env = prev;
                result
            },
            // A bare expression in statement position: evaluate for its
            // effects and discard the value.
            _ => {
                self.eval(ast, id)?;
                Ok(Flow::Normal)
            },
        }
    }

    fn exec_sequence(&mut self, ast: &Ast, statements: &[NodeId]) -> Result<Flow, RuntimeError> {
        for &stmt in statements {
            if let Flow::Return(value) = self.exec(ast, stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for(
        &mut self,
        ast: &Ast,
        initializer: NodeId,
        condition: NodeId,
        increment: NodeId,
        body: NodeId,
    ) -> Result<Flow, RuntimeError> {
        if let Flow::Return(value) = self.exec(ast, initializer)? {
            return Ok(Flow::Return(value));
        }
        while self.eval_condition(ast, condition)? {
            if let Flow::Return(value) = self.exec(ast, body)? {
                return Ok(Flow::Return(value));
            }
            if let Flow::Return(value) = self.exec(ast, increment)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_condition(&mut self, ast: &Ast, id: NodeId) -> Result<bool, RuntimeError> {
        match self.eval(ast, id)? {
            Value::Bool(value) => Ok(value),
            _ => Err(RuntimeError::NonBooleanCondition),
        }
    }

    fn eval(&mut self, ast: &Ast, id: NodeId) -> Result<Value, RuntimeError> {
        match ast.kind(id) {
            NodeKind::Lit { value } => Ok(match value {
                Lit::Bool(v) => Value::Bool(*v),
                Lit::Int(v) => Value::Int(*v),
                Lit::Float(v) => Value::Float(*v),
                Lit::Str(s) => Value::Str(s.clone()),
            }),
            NodeKind::Var { name, scope_depth } => {
                let depth = scope_depth.ok_or(RuntimeError::UnresolvedVariable(*name))?;
                self.env.resolve_var(*name, depth)
            },
            NodeKind::Binary {
                left,
                op,
                right,
                caching,
            } => {
                let (left, op, right, caching) = (*left, *op, *right, *caching);
                if caching {
                    if let Some(value) = self.cache.get(&id) {
                        return Ok(value.clone());
                    }
                }
                let lhs = self.eval(ast, left)?;
                let rhs = self.eval(ast, right)?;
                let value = binary_op(op, lhs, rhs)?;
                if caching {
                    self.cache.insert(id, value.clone());
                }
                Ok(value)
            },
            NodeKind::Unary { op, expr, caching } => {
                let (op, expr, caching) = (*op, *expr, *caching);
                if caching {
                    if let Some(value) = self.cache.get(&id) {
                        return Ok(value.clone());
                    }
                }
                let operand = self.eval(ast, expr)?;
                let value = unary_op(op, operand)?;
                if caching {
                    self.cache.insert(id, value.clone());
                }
                Ok(value)
            },
            NodeKind::Call {
                name,
                args,
                scope_depth,
            } => {
                let name = *name;
                let args = args.clone();
                let depth = scope_depth.ok_or(RuntimeError::UnresolvedFunction(name))?;
                let callable = self.env.resolve_fun(name, depth)?;

                // Arguments are evaluated in the caller's environment.
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(ast, arg)?);
                }

                match callable {
                    Callable::Builtin(builtin) => builtin.call(&values),
                    Callable::Function(function) => self.call_function(ast, &function, values),
                }
            },
            _ => Err(RuntimeError::InvalidOperands { op: "statement" }),
        }
    }

    /// Call a user function: a fresh frame enclosed by the *captured*
    /// closure, not the caller's environment.
    fn call_function(
        &mut self,
        ast: &Ast,
        function: &Function,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let closure = function
            .closure
            .upgrade()
            .ok_or(RuntimeError::ClosureGone)?;
        let frame = Env::with_enclosing(&closure);
        for (&param, value) in function.params.iter().zip(args) {
            frame.declare_var(param, Some(value))?;
        }

        let prev = self.env.clone();
        self.env = frame;
        let flow = self.exec(ast, function.body);
        self.env = prev;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Unit),
        }
    }
}

fn binary_op(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    use Value::*;
    match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => a
            .checked_add(b)
            .map(Int)
            .ok_or(RuntimeError::IntegerOverflow { op: "+" }),
        (BinOp::Sub, Int(a), Int(b)) => a
            .checked_sub(b)
            .map(Int)
            .ok_or(RuntimeError::IntegerOverflow { op: "-" }),
        (BinOp::Mul, Int(a), Int(b)) => a
            .checked_mul(b)
            .map(Int)
            .ok_or(RuntimeError::IntegerOverflow { op: "*" }),
        (BinOp::Rem, Int(_), Int(0)) => Err(RuntimeError::ModuloByZero),
        (BinOp::Rem, Int(a), Int(b)) => a
            .checked_rem(b)
            .map(Int)
            .ok_or(RuntimeError::IntegerOverflow { op: "%" }),
        (BinOp::Pow, Int(a), Int(b)) => {
            if b < 0 {
                return Err(RuntimeError::NegativeExponent);
            }
            u32::try_from(b)
                .ok()
                .and_then(|exp| a.checked_pow(exp))
                .map(Int)
                .ok_or(RuntimeError::IntegerOverflow { op: "^" })
        },

        (BinOp::Add, Float(a), Float(b)) => Ok(Float(a + b)),
        (BinOp::Sub, Float(a), Float(b)) => Ok(Float(a - b)),
        (BinOp::Mul, Float(a), Float(b)) => Ok(Float(a * b)),
        (BinOp::Div, Float(_), Float(b)) if b == 0.0 => Err(RuntimeError::DivisionByZero),
        (BinOp::Div, Float(a), Float(b)) => Ok(Float(a / b)),
        (BinOp::Pow, Float(a), Float(b)) => Ok(Float(a.powf(b))),

        (BinOp::Add, Str(a), Str(b)) => Ok(Str(format!("{}{}", a, b).into())),

        (BinOp::Eq, a, b) => Ok(Bool(a == b)),
        (BinOp::Ne, a, b) => Ok(Bool(a != b)),
        (BinOp::Lt, Int(a), Int(b)) => Ok(Bool(a < b)),
        (BinOp::Le, Int(a), Int(b)) => Ok(Bool(a <= b)),
        (BinOp::Gt, Int(a), Int(b)) => Ok(Bool(a > b)),
        (BinOp::Ge, Int(a), Int(b)) => Ok(Bool(a >= b)),
        (BinOp::Lt, Float(a), Float(b)) => Ok(Bool(a < b)),
        (BinOp::Le, Float(a), Float(b)) => Ok(Bool(a <= b)),
        (BinOp::Gt, Float(a), Float(b)) => Ok(Bool(a > b)),
        (BinOp::Ge, Float(a), Float(b)) => Ok(Bool(a >= b)),

        (op, _, _) => Err(RuntimeError::InvalidOperands { op: op.as_str() }),
    }
}

fn unary_op(op: UnOp, operand: Value) -> Result<Value, RuntimeError> {
    match (op, operand) {
        (UnOp::Neg, Value::Int(v)) => v
            .checked_neg()
            .map(Value::Int)
            .ok_or(RuntimeError::IntegerOverflow { op: "-" }),
        (UnOp::Neg, Value::Float(v)) => Ok(Value::Float(-v)),
        (UnOp::Neg, _) => Err(RuntimeError::InvalidOperands { op: "-" }),
    }
}
