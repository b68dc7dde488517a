//! Runtime environments and callables.
//!
//! An [`Env`] is a shared, mutable frame with an optional enclosing
//! link; the chain realizes lexical scoping. After static resolution
//! every lookup knows how many links to skip, so `resolve_*` and
//! `assign_var` descend exactly `level` frames and then look locally.
//!
//! A user function is stored inside the very frame it captures, so the
//! callable's back-reference to its closure is weak; it is upgradable
//! whenever the callable itself is still reachable.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use calyx_par::NodeId;
use calyx_util::Symbol;
use indexmap::IndexMap;

use crate::builtins::Builtin;
use crate::error::RuntimeError;
use crate::value::Value;

/// A user-defined function value.
pub struct Function {
    /// Parameter names in order.
    pub params: Vec<Symbol>,
    /// The body block.
    pub body: NodeId,
    /// The environment in effect at the definition site.
    pub closure: WeakEnv,
}

/// Anything callable by name.
#[derive(Clone)]
pub enum Callable {
    Function(Rc<Function>),
    Builtin(Builtin),
}

struct Frame {
    /// `None` marks a declared-but-uninitialized variable.
    variables: IndexMap<Symbol, Option<Value>>,
    functions: IndexMap<Symbol, Callable>,
    enclosing: Option<Env>,
}

/// A shared environment frame.
#[derive(Clone)]
pub struct Env(Rc<RefCell<Frame>>);

/// Weak handle used by callables to refer back to their defining frame.
#[derive(Clone)]
pub struct WeakEnv(Weak<RefCell<Frame>>);

impl WeakEnv {
    pub fn upgrade(&self) -> Option<Env> {
        self.0.upgrade().map(Env)
    }
}

impl Env {
    /// The global frame, with all builtins bound.
    pub fn global() -> Self {
        let env = Self::root();
        let mut frame = env.0.borrow_mut();
        for (name, builtin) in Builtin::all() {
            frame.functions.insert(name, Callable::Builtin(builtin));
        }
        drop(frame);
        env
    }

    fn root() -> Self {
        Env(Rc::new(RefCell::new(Frame {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
            enclosing: None,
        })))
    }

    /// A fresh frame enclosed by `parent`.
    pub fn with_enclosing(parent: &Env) -> Self {
        Env(Rc::new(RefCell::new(Frame {
            variables: IndexMap::new(),
            functions: IndexMap::new(),
            enclosing: Some(parent.clone()),
        })))
    }

    pub fn downgrade(&self) -> WeakEnv {
        WeakEnv(Rc::downgrade(&self.0))
    }

    /// The frame exactly `level` enclosing links up.
    fn ancestor(&self, level: u32) -> Option<Env> {
        let mut env = self.clone();
        for _ in 0..level {
            let parent = env.0.borrow().enclosing.clone()?;
            env = parent;
        }
        Some(env)
    }

    /// Declare a variable in this frame. `None` = uninitialized.
    pub fn declare_var(&self, name: Symbol, value: Option<Value>) -> Result<(), RuntimeError> {
        let mut frame = self.0.borrow_mut();
        if frame.variables.contains_key(&name) {
            return Err(RuntimeError::VariableRedeclared(name));
        }
        frame.variables.insert(name, value);
        Ok(())
    }

    /// Read the variable `level` frames up.
    pub fn resolve_var(&self, name: Symbol, level: u32) -> Result<Value, RuntimeError> {
        let env = self
            .ancestor(level)
            .ok_or(RuntimeError::UnresolvedVariable(name))?;
        let frame = env.0.borrow();
        match frame.variables.get(&name) {
            Some(Some(value)) => Ok(value.clone()),
            Some(None) => Err(RuntimeError::UninitializedVariable(name)),
            None => Err(RuntimeError::UnresolvedVariable(name)),
        }
    }

    /// Write the variable `level` frames up.
    pub fn assign_var(&self, name: Symbol, level: u32, value: Value) -> Result<(), RuntimeError> {
        let env = self
            .ancestor(level)
            .ok_or(RuntimeError::UnresolvedVariable(name))?;
        let mut frame = env.0.borrow_mut();
        match frame.variables.get_mut(&name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            },
            None => Err(RuntimeError::UnresolvedVariable(name)),
        }
    }

    /// Define a function in this frame.
    pub fn define_fun(&self, name: Symbol, callable: Callable) -> Result<(), RuntimeError> {
        let mut frame = self.0.borrow_mut();
        if frame.functions.contains_key(&name) {
            return Err(RuntimeError::FunctionRedefined(name));
        }
        frame.functions.insert(name, callable);
        Ok(())
    }

    /// Look up the function `level` frames up.
    pub fn resolve_fun(&self, name: Symbol, level: u32) -> Result<Callable, RuntimeError> {
        let env = self
            .ancestor(level)
            .ok_or(RuntimeError::UnresolvedFunction(name))?;
        let frame = env.0.borrow();
        frame
            .functions
            .get(&name)
            .cloned()
            .ok_or(RuntimeError::UnresolvedFunction(name))
    }
}
