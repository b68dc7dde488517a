//! Type checker.
//!
//! Walks the resolved AST with a scope stack of (variable type, function
//! signature) frames. Binary and unary operators are verified against a
//! fixed table; calls against recorded signatures, with polymorphic
//! builtins resolved first-match-wins.
//!
//! A `return` statement raises an upward return-type signal, rendered
//! here as `Ok(Some(ty))` threaded out of statement checking. Only the
//! enclosing function definition interprets it; the rest of that body is
//! not checked, and a signal escaping the top level is an error.

use calyx_par::{Ast, BinOp, NodeId, NodeKind, Ty, UnOp};
use calyx_util::Symbol;
use indexmap::IndexMap;

use crate::builtins;
use crate::error::TypeError;
use crate::types::{FnSig, Signature};

/// Result of the allowed binary operator combinations.
fn binary_result(left: Ty, right: Ty, op: BinOp) -> Option<Ty> {
    use BinOp::*;
    match (left, right) {
        (Ty::Int, Ty::Int) => match op {
            Add | Sub | Mul | Rem | Pow => Some(Ty::Int),
            Eq | Ne | Lt | Le | Gt | Ge => Some(Ty::Bool),
            Div => None,
        },
        (Ty::Float, Ty::Float) => match op {
            Add | Sub | Mul | Div | Pow => Some(Ty::Float),
            Eq | Ne | Lt | Le | Gt | Ge => Some(Ty::Bool),
            Rem => None,
        },
        (Ty::Bool, Ty::Bool) => match op {
            Eq | Ne => Some(Ty::Bool),
            _ => None,
        },
        (Ty::Str, Ty::Str) => match op {
            Add => Some(Ty::Str),
            Eq | Ne => Some(Ty::Bool),
            _ => None,
        },
        _ => None,
    }
}

/// Result of the allowed unary operator combinations.
fn unary_result(ty: Ty, op: UnOp) -> Option<Ty> {
    match (ty, op) {
        (Ty::Int, UnOp::Neg) => Some(Ty::Int),
        (Ty::Float, UnOp::Neg) => Some(Ty::Float),
        _ => None,
    }
}

#[derive(Default)]
struct Frame {
    variables: IndexMap<Symbol, Ty>,
    functions: IndexMap<Symbol, Signature>,
}

/// The type checker.
pub struct TypeChecker {
    frames: Vec<Frame>,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut global = Frame::default();
        global.functions.extend(builtins::signatures());
        Self {
            frames: vec![global],
        }
    }

    /// Checks the whole program.
    pub fn run(&mut self, ast: &Ast) -> Result<(), TypeError> {
        for &stmt in &ast.roots {
            if self.check_stmt(ast, stmt)?.is_some() {
                return Err(TypeError::ReturnOutsideFunction);
            }
        }
        Ok(())
    }

    fn push_frame(&mut self) {
        self.frames.push(Frame::default());
    }

    fn pop_frame(&mut self) {
        self.frames.pop();
    }

    fn declare_var(&mut self, name: Symbol, ty: Ty) {
        if let Some(frame) = self.frames.last_mut() {
            frame.variables.insert(name, ty);
        }
    }

    fn define_fun(&mut self, name: Symbol, signature: Signature) {
        if let Some(frame) = self.frames.last_mut() {
            frame.functions.insert(name, signature);
        }
    }

    /// Variable type at exactly `depth` frames up.
    fn resolve_var(&self, name: Symbol, depth: Option<u32>) -> Result<Ty, TypeError> {
        let depth = depth.ok_or(TypeError::UnresolvedVariable(name))? as usize;
        self.frames
            .len()
            .checked_sub(depth + 1)
            .and_then(|idx| self.frames[idx].variables.get(&name))
            .copied()
            .ok_or(TypeError::UnresolvedVariable(name))
    }

    /// Function signature at exactly `depth` frames up.
    fn resolve_fun(&self, name: Symbol, depth: Option<u32>) -> Result<&Signature, TypeError> {
        let depth = depth.ok_or(TypeError::UnresolvedFunction(name))? as usize;
        self.frames
            .len()
            .checked_sub(depth + 1)
            .and_then(|idx| self.frames[idx].functions.get(&name))
            .ok_or(TypeError::UnresolvedFunction(name))
    }

    /// Check a statement. `Ok(Some(ty))` is the return-type signal.
    fn check_stmt(&mut self, ast: &Ast, id: NodeId) -> Result<Option<Ty>, TypeError> {
        match ast.kind(id) {
            NodeKind::Block { statements } => {
                self.push_frame();
                for &stmt in statements {
                    match self.check_stmt(ast, stmt) {
                        Ok(None) => {},
                        // A signal or error abandons the rest of the block.
                        other => {
                            self.pop_frame();
                            return other;
                        },
                    }
                }
                self.pop_frame();
                Ok(None)
            },
            NodeKind::FnDef {
                name,
                params,
                ret_ty,
                body,
            } => {
                let name = *name;
                let declared = *ret_ty;

                self.push_frame();
                let mut param_types = Vec::with_capacity(params.len());
                for &param in params {
                    if let NodeKind::Param { name, ty } = ast.kind(param) {
                        self.declare_var(*name, *ty);
                        param_types.push(*ty);
                    }
                }
                let flow = self.check_stmt(ast, *body);
                self.pop_frame();

                let found = match flow? {
                    Some(ty) => ty,
                    None => Ty::Unit,
                };
                if found != declared {
                    return Err(TypeError::ReturnTypeMismatch {
                        name,
                        declared,
                        found,
                    });
                }

                self.define_fun(name, Signature::Mono(FnSig::new(param_types, found)));
                Ok(None)
            },
            NodeKind::VarDecl { name, ty, init } => {
                if let Some(init) = init {
                    let found = self.check_expr(ast, *init)?;
                    if found != *ty {
                        return Err(TypeError::ValueMismatch {
                            name: *name,
                            expected: *ty,
                            found,
                        });
                    }
                }
                self.declare_var(*name, *ty);
                Ok(None)
            },
            NodeKind::Assign {
                name,
                value,
                scope_depth,
            } => {
                let expected = self.resolve_var(*name, *scope_depth)?;
                let found = self.check_expr(ast, *value)?;
                if expected != found {
                    return Err(TypeError::ValueMismatch {
                        name: *name,
                        expected,
                        found,
                    });
                }
                Ok(None)
            },
            NodeKind::Print { expr } => {
                self.check_expr(ast, *expr)?;
                Ok(None)
            },
            NodeKind::Assert { expr } => {
                let found = self.check_expr(ast, *expr)?;
                if found != Ty::Bool {
                    return Err(TypeError::AssertNotBool { found });
                }
                Ok(None)
            },
            NodeKind::Return { expr } => {
                let ty = self.check_expr(ast, *expr)?;
                Ok(Some(ty))
            },
            NodeKind::If { condition, body } => {
                if self.check_expr(ast, *condition)? != Ty::Bool {
                    return Err(TypeError::NonBooleanCondition { construct: "if" });
                }
                self.check_stmt(ast, *body)
            },
            NodeKind::While { condition, body } => {
                if self.check_expr(ast, *condition)? != Ty::Bool {
                    return Err(TypeError::NonBooleanCondition { construct: "while" });
                }
                self.check_stmt(ast, *body)
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.push_frame();
                let result = self.check_for(ast, *initializer, *condition, *increment, *body);
                self.pop_frame();
                result
            },
            // A bare expression in statement position.
            _ => {
                self.check_expr(ast, id)?;
                Ok(None)
            },
        }
    }

    fn check_for(
        &mut self,
        ast: &Ast,
        initializer: NodeId,
        condition: NodeId,
        increment: NodeId,
        body: NodeId,
    ) -> Result<Option<Ty>, TypeError> {
        if let Some(ty) = self.check_stmt(ast, initializer)? {
            return Ok(Some(ty));
        }
        if self.check_expr(ast, condition)? != Ty::Bool {
            return Err(TypeError::NonBooleanCondition { construct: "for" });
        }
        if let Some(ty) = self.check_stmt(ast, body)? {
            return Ok(Some(ty));
        }
        self.check_stmt(ast, increment)
    }

    fn check_expr(&mut self, ast: &Ast, id: NodeId) -> Result<Ty, TypeError> {
        match ast.kind(id) {
            NodeKind::Lit { value } => Ok(value.ty()),
            NodeKind::Var { name, scope_depth } => self.resolve_var(*name, *scope_depth),
            NodeKind::Binary {
                left, op, right, ..
            } => {
                let l = self.check_expr(ast, *left)?;
                let r = self.check_expr(ast, *right)?;
                binary_result(l, r, *op).ok_or(TypeError::BadOperandTypes {
                    op: *op,
                    left: l,
                    right: r,
                })
            },
            NodeKind::Unary { op, expr, .. } => {
                let ty = self.check_expr(ast, *expr)?;
                unary_result(ty, *op).ok_or(TypeError::BadUnaryOperand { op: *op, ty })
            },
            NodeKind::Call {
                name,
                args,
                scope_depth,
            } => {
                let signature = self.resolve_fun(*name, *scope_depth)?.clone();
                let mut arg_types = Vec::with_capacity(args.len());
                for &arg in args {
                    arg_types.push(self.check_expr(ast, arg)?);
                }
                signature.verify(*name, &arg_types)
            },
            _ => Err(TypeError::NotAnExpression),
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}
