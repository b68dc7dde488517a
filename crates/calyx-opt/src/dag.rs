//! Common-subexpression sharing.
//!
//! Turns the expression trees into a DAG: subexpressions with equal
//! *fingerprints* are shared by repointing the later parent at the
//! earlier node, and the shared node is marked for evaluation caching.
//!
//! A fingerprint identifies an expression's meaning:
//!
//! - a literal fingerprints by value (floats by bit pattern);
//! - a variable fingerprints by the identity of its unique reaching
//!   definition; with zero or several reaching definitions the use is
//!   *opaque* and nothing containing it is shareable;
//! - calls are always opaque (unknown side effects);
//! - binary/unary nodes combine their children's fingerprints with the
//!   operator.
//!
//! Sharing is valid exactly when both occurrences read the same unique
//! definitions, which is what the construction guarantees. The first
//! occurrence in program order wins. Loop conditions of `while`/`for`
//! and `for` increments re-evaluate with fresh values each iteration
//! and do not participate.

use std::rc::Rc;

use calyx_par::{Ast, BinOp, Lit, NodeId, NodeKind, UnOp};
use calyx_util::FxHashMap;

use crate::dataflow::Dataflow;
use crate::OptError;

/// Hashable stand-in for a literal value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum LitKey {
    Bool(bool),
    Int(i64),
    /// Bit pattern; distinguishes 0.0 from -0.0, which only makes
    /// sharing rarer, never wrong.
    Float(u64),
    Str(Rc<str>),
}

/// Expression fingerprint. Opaque expressions have no fingerprint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Fingerprint {
    Lit(LitKey),
    /// The unique reaching definition of a variable use.
    Def(NodeId),
    Binary(Box<Fingerprint>, Box<Fingerprint>, BinOp),
    Unary(Box<Fingerprint>, UnOp),
}

/// The expression-DAG optimizer.
pub struct ExpressionDagOptimizer<'a> {
    dataflow: &'a Dataflow,
    /// First node seen with each fingerprint, in program order.
    subexprs: FxHashMap<Fingerprint, NodeId>,
}

impl<'a> ExpressionDagOptimizer<'a> {
    pub fn new(dataflow: &'a Dataflow) -> Self {
        Self {
            dataflow,
            subexprs: FxHashMap::default(),
        }
    }

    pub fn run(mut self, ast: &mut Ast) -> Result<(), OptError> {
        for stmt in ast.roots.clone() {
            self.visit_statement(ast, stmt)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, ast: &mut Ast, id: NodeId) -> Result<(), OptError> {
        match ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                for stmt in statements {
                    self.visit_statement(ast, stmt)?;
                }
                Ok(())
            },
            NodeKind::FnDef { body, .. } => self.visit_statement(ast, body),
            NodeKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    let (new, _) = self.visit_expr(ast, init)?;
                    if let NodeKind::VarDecl { init, .. } = ast.kind_mut(id) {
                        *init = Some(new);
                    }
                }
                Ok(())
            },
            NodeKind::Assign { value, .. } => {
                let (new, _) = self.visit_expr(ast, value)?;
                if let NodeKind::Assign { value, .. } = ast.kind_mut(id) {
                    *value = new;
                }
                Ok(())
            },
            NodeKind::Print { expr } => {
                let (new, _) = self.visit_expr(ast, expr)?;
                if let NodeKind::Print { expr } = ast.kind_mut(id) {
                    *expr = new;
                }
                Ok(())
            },
            NodeKind::Assert { expr } => {
                let (new, _) = self.visit_expr(ast, expr)?;
                if let NodeKind::Assert { expr } = ast.kind_mut(id) {
                    *expr = new;
                }
                Ok(())
            },
            NodeKind::Return { expr } => {
                let (new, _) = self.visit_expr(ast, expr)?;
                if let NodeKind::Return { expr } = ast.kind_mut(id) {
                    *expr = new;
                }
                Ok(())
            },
            NodeKind::If { condition, body } => {
                let (new, _) = self.visit_expr(ast, condition)?;
                if let NodeKind::If { condition, .. } = ast.kind_mut(id) {
                    *condition = new;
                }
                self.visit_statement(ast, body)
            },
            // Loop conditions and increments are re-evaluated with fresh
            // values each iteration; only the bodies participate (and
            // the for initializer, which runs once).
            NodeKind::While { body, .. } => self.visit_statement(ast, body),
            NodeKind::For {
                initializer, body, ..
            } => {
                self.visit_statement(ast, initializer)?;
                self.visit_statement(ast, body)
            },
            // Bare expression in statement position.
            NodeKind::Binary { .. } | NodeKind::Unary { .. } | NodeKind::Call { .. } => {
                self.visit_expr(ast, id).map(|_| ())
            },
            _ => Ok(()),
        }
    }

    /// Rewrites an expression, returning the node the parent should now
    /// point at and the expression's fingerprint (`None` = opaque).
    fn visit_expr(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
    ) -> Result<(NodeId, Option<Fingerprint>), OptError> {
        match ast.kind(id).clone() {
            NodeKind::Lit { value } => {
                let key = match value {
                    Lit::Bool(v) => LitKey::Bool(v),
                    Lit::Int(v) => LitKey::Int(v),
                    Lit::Float(v) => LitKey::Float(v.to_bits()),
                    Lit::Str(s) => LitKey::Str(s),
                };
                Ok((id, Some(Fingerprint::Lit(key))))
            },
            NodeKind::Var { .. } => {
                let defs = self.dataflow.reaching_definitions(ast, id);
                if let [unique] = defs[..] {
                    Ok((id, Some(Fingerprint::Def(unique))))
                } else {
                    Ok((id, None))
                }
            },
            NodeKind::Binary {
                left, op, right, ..
            } => {
                let (new_left, left_fp) = self.visit_expr(ast, left)?;
                let (new_right, right_fp) = self.visit_expr(ast, right)?;
                if let NodeKind::Binary { left, right, .. } = ast.kind_mut(id) {
                    *left = new_left;
                    *right = new_right;
                }

                let fp = match (left_fp, right_fp) {
                    (Some(l), Some(r)) => {
                        Some(Fingerprint::Binary(Box::new(l), Box::new(r), op))
                    },
                    _ => None,
                };
                Ok(self.share(ast, id, fp))
            },
            NodeKind::Unary { op, expr, .. } => {
                let (new_expr, expr_fp) = self.visit_expr(ast, expr)?;
                if let NodeKind::Unary { expr, .. } = ast.kind_mut(id) {
                    *expr = new_expr;
                }

                let fp = expr_fp.map(|fp| Fingerprint::Unary(Box::new(fp), op));
                Ok(self.share(ast, id, fp))
            },
            NodeKind::Call { args, .. } => {
                for (index, &arg) in args.iter().enumerate() {
                    let (new, _) = self.visit_expr(ast, arg)?;
                    if let NodeKind::Call { args, .. } = ast.kind_mut(id) {
                        args[index] = new;
                    }
                }
                // Unknown side effects: never shared, never a subterm of
                // anything shared.
                Ok((id, None))
            },
            _ => Err(OptError::NotAnExpression(id)),
        }
    }

    /// Either record `id` as the first occurrence of `fp` or redirect to
    /// the earlier occurrence, marking it as caching.
    fn share(
        &mut self,
        ast: &mut Ast,
        id: NodeId,
        fp: Option<Fingerprint>,
    ) -> (NodeId, Option<Fingerprint>) {
        let Some(fp) = fp else {
            return (id, None);
        };
        match self.subexprs.get(&fp) {
            Some(&prior) => {
                match ast.kind_mut(prior) {
                    NodeKind::Binary { caching, .. } | NodeKind::Unary { caching, .. } => {
                        *caching = true;
                    },
                    _ => {},
                }
                (prior, Some(fp))
            },
            None => {
                self.subexprs.insert(fp.clone(), id);
                (id, Some(fp))
            },
        }
    }
}
