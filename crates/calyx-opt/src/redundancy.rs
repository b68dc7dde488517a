//! Redundancy elimination.
//!
//! Computes the set of *effective* nodes (those whose evaluation can
//! contribute to an observable effect) and prunes every statement
//! outside it. Four cooperating sub-passes:
//!
//! 1. **Roots.** Outside function bodies, every `print`/`assert` is
//!    effective, as is any statement whose expressions call a function
//!    that (transitively) prints. For each function definition, collect
//!    the `follow` set: the statements that must remain if the function
//!    is ever needed (its prints/asserts, returns, and statements that
//!    call effectful functions).
//! 2. **Use-def following.** From every root, mark the expression
//!    subtree; for each variable use, mark every reaching definition of
//!    that name (transitively through the definitions' own values); for
//!    each call, re-enter the callee by marking its follow set. A
//!    visited check stops the recursion over loop-shaped chains.
//! 3. **Structural extension.** Any parent of an effective node becomes
//!    effective; an effective function definition also keeps its
//!    parameters.
//! 4. **Condition following.** For every effective `if`/`while`/`for`,
//!    every reaching definition of every variable in its condition
//!    becomes effective. The loop-condition IN sets already include the
//!    body's GEN, so loop-feedback definitions are caught here.
//!
//! Passes 3 and 4 can expose work for each other and iterate to a
//! fixpoint. Pruning then rewrites the statement lists of the program
//! and of every block. Arena slots are never freed, so definitions still
//! referenced from the dataflow tables stay addressable.

use calyx_par::{Ast, NodeId, NodeKind};
use calyx_sem::builtins;
use calyx_util::{FxHashMap, FxHashSet, Symbol};

use crate::dataflow::Dataflow;
use crate::OptError;

/// What a function contributes once it is known to be needed.
#[derive(Default)]
struct FnInfo {
    /// Whether calling this function can produce an observable effect.
    is_effective: bool,
    /// Statements in its body that must remain if the function is kept.
    follow_nodes: Vec<NodeId>,
}

/// Accumulator for one function body (or the top level).
#[derive(Default)]
struct Accum {
    has_effect: bool,
    follow: Vec<NodeId>,
}

/// The redundancy optimizer.
pub struct RedundancyOptimizer<'a> {
    dataflow: &'a Dataflow,
    fn_infos: FxHashMap<NodeId, FnInfo>,
    /// Call node to the function definition it targets (absent for
    /// builtins and unresolvable recursion).
    call_targets: FxHashMap<NodeId, NodeId>,
    effective: FxHashSet<NodeId>,
}

impl<'a> RedundancyOptimizer<'a> {
    pub fn new(dataflow: &'a Dataflow) -> Self {
        Self {
            dataflow,
            fn_infos: FxHashMap::default(),
            call_targets: FxHashMap::default(),
            effective: FxHashSet::default(),
        }
    }

    /// Find effective nodes and prune everything else.
    pub fn run(mut self, ast: &mut Ast) -> Result<(), OptError> {
        // Pass 1: function info and effective roots.
        let mut scopes: Vec<FxHashMap<Symbol, Option<NodeId>>> = vec![FxHashMap::default()];
        for name in builtins::symbols() {
            scopes[0].insert(name, None);
        }
        let top = self.scan_statements(ast, &ast.roots.clone(), &mut scopes);

        // Pass 2: follow use-definition chains from the roots.
        for root in top.follow {
            self.mark_statement(ast, root);
        }

        // Passes 3 and 4 feed each other; iterate until stable.
        loop {
            let before = self.effective.len();
            for &root in &ast.roots {
                self.extend_structurally(ast, root);
            }
            self.follow_conditions(ast);
            if self.effective.len() == before {
                break;
            }
        }

        self.prune(ast);
        Ok(())
    }

    // Pass 1 ---------------------------------------------------------------

    fn scan_statements(
        &mut self,
        ast: &Ast,
        statements: &[NodeId],
        scopes: &mut Vec<FxHashMap<Symbol, Option<NodeId>>>,
    ) -> Accum {
        let mut acc = Accum::default();
        for &stmt in statements {
            self.scan_statement(ast, stmt, scopes, &mut acc);
        }
        acc
    }

    fn scan_statement(
        &mut self,
        ast: &Ast,
        id: NodeId,
        scopes: &mut Vec<FxHashMap<Symbol, Option<NodeId>>>,
        acc: &mut Accum,
    ) {
        match ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                scopes.push(FxHashMap::default());
                let inner = self.scan_statements(ast, &statements, scopes);
                scopes.pop();
                acc.has_effect |= inner.has_effect;
                acc.follow.extend(inner.follow);
            },
            NodeKind::FnDef { name, body, .. } => {
                scopes.push(FxHashMap::default());
                let statements = ast.block_statements(body).to_vec();
                let inner = self.scan_statements(ast, &statements, scopes);
                scopes.pop();

                self.fn_infos.insert(
                    id,
                    FnInfo {
                        is_effective: inner.has_effect,
                        follow_nodes: inner.follow,
                    },
                );
                // Defined only after its own body: a self-recursive call
                // does not resolve, like in the other analyses.
                if let Some(scope) = scopes.last_mut() {
                    scope.insert(name, Some(id));
                }
            },
            NodeKind::Print { expr } | NodeKind::Assert { expr } => {
                acc.has_effect = true;
                acc.follow.push(id);
                self.scan_expr(ast, expr, scopes);
            },
            NodeKind::Return { expr } => {
                acc.follow.push(id);
                acc.has_effect |= self.scan_expr(ast, expr, scopes);
            },
            NodeKind::VarDecl { init, .. } => {
                let effectful = match init {
                    Some(init) => self.scan_expr(ast, init, scopes),
                    None => false,
                };
                if effectful {
                    acc.has_effect = true;
                    acc.follow.push(id);
                }
            },
            NodeKind::Assign { value, .. } => {
                if self.scan_expr(ast, value, scopes) {
                    acc.has_effect = true;
                    acc.follow.push(id);
                }
            },
            NodeKind::If { condition, body } | NodeKind::While { condition, body } => {
                // An effectful call in the condition forces the whole
                // statement to stay.
                if self.scan_expr(ast, condition, scopes) {
                    acc.has_effect = true;
                    acc.follow.push(id);
                }
                let statements = ast.block_statements(body).to_vec();
                scopes.push(FxHashMap::default());
                let inner = self.scan_statements(ast, &statements, scopes);
                scopes.pop();
                acc.has_effect |= inner.has_effect;
                acc.follow.extend(inner.follow);
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                scopes.push(FxHashMap::default());
                let mut inner = Accum::default();
                self.scan_statement(ast, initializer, scopes, &mut inner);
                if self.scan_expr(ast, condition, scopes) {
                    inner.has_effect = true;
                    inner.follow.push(id);
                }
                self.scan_statement(ast, increment, scopes, &mut inner);
                let statements = ast.block_statements(body).to_vec();
                let body_acc = self.scan_statements(ast, &statements, scopes);
                scopes.pop();

                acc.has_effect |= inner.has_effect | body_acc.has_effect;
                acc.follow.extend(inner.follow);
                acc.follow.extend(body_acc.follow);
            },
            // A bare expression in statement position: effective iff it
            // calls something effective.
            _ => {
                if self.scan_expr(ast, id, scopes) {
                    acc.has_effect = true;
                    acc.follow.push(id);
                }
            },
        }
    }

    /// Record call targets inside an expression; true if the expression
    /// calls an effective function.
    fn scan_expr(
        &mut self,
        ast: &Ast,
        id: NodeId,
        scopes: &mut Vec<FxHashMap<Symbol, Option<NodeId>>>,
    ) -> bool {
        match ast.kind(id).clone() {
            NodeKind::Binary { left, right, .. } => {
                let l = self.scan_expr(ast, left, scopes);
                let r = self.scan_expr(ast, right, scopes);
                l || r
            },
            NodeKind::Unary { expr, .. } => self.scan_expr(ast, expr, scopes),
            NodeKind::Call { name, args, .. } => {
                let mut effectful = false;
                for &arg in &args {
                    effectful |= self.scan_expr(ast, arg, scopes);
                }
                let target = scopes
                    .iter()
                    .rev()
                    .find_map(|scope| scope.get(&name))
                    .copied()
                    .flatten();
                if let Some(def) = target {
                    self.call_targets.insert(id, def);
                    effectful |= self
                        .fn_infos
                        .get(&def)
                        .is_some_and(|info| info.is_effective);
                }
                effectful
            },
            _ => false,
        }
    }

    // Pass 2 ---------------------------------------------------------------

    /// Mark a statement effective and follow everything it depends on.
    fn mark_statement(&mut self, ast: &Ast, id: NodeId) {
        if !self.effective.insert(id) {
            return;
        }
        match ast.kind(id).clone() {
            NodeKind::Print { expr } | NodeKind::Assert { expr } | NodeKind::Return { expr } => {
                self.follow_expr(ast, expr);
            },
            NodeKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    self.follow_expr(ast, init);
                }
            },
            NodeKind::Assign { value, .. } => self.follow_expr(ast, value),
            NodeKind::If { condition, .. }
            | NodeKind::While { condition, .. }
            | NodeKind::For { condition, .. } => {
                self.follow_expr(ast, condition);
            },
            // Bare expression statements.
            NodeKind::Binary { .. } | NodeKind::Unary { .. } | NodeKind::Call { .. } => {
                // Already inserted; walk it as an expression. Remove
                // first so the visited check in follow_expr passes.
                self.effective.remove(&id);
                self.follow_expr(ast, id);
            },
            _ => {},
        }
    }

    /// Mark an expression subtree and everything its evaluation reads.
    fn follow_expr(&mut self, ast: &Ast, id: NodeId) {
        if !self.effective.insert(id) {
            return;
        }
        match ast.kind(id).clone() {
            NodeKind::Binary { left, right, .. } => {
                self.follow_expr(ast, left);
                self.follow_expr(ast, right);
            },
            NodeKind::Unary { expr, .. } => self.follow_expr(ast, expr),
            NodeKind::Var { .. } => {
                for def in self.dataflow.reaching_definitions(ast, id) {
                    self.mark_statement(ast, def);
                }
            },
            NodeKind::Call { args, .. } => {
                for &arg in &args {
                    self.follow_expr(ast, arg);
                }
                if let Some(&def) = self.call_targets.get(&id) {
                    // The definition itself must survive for the call to
                    // resolve, and its follow set must be re-entered.
                    self.effective.insert(def);
                    let follow = match self.fn_infos.get(&def) {
                        Some(info) => info.follow_nodes.clone(),
                        None => Vec::new(),
                    };
                    for node in follow {
                        self.mark_statement(ast, node);
                    }
                }
            },
            _ => {},
        }
    }

    // Pass 3 ---------------------------------------------------------------

    /// Returns whether `id` or any statement under it is effective,
    /// marking parents of effective nodes along the way.
    fn extend_structurally(&mut self, ast: &Ast, id: NodeId) -> bool {
        let mut any = self.effective.contains(&id);
        match ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                for &stmt in &statements {
                    any |= self.extend_structurally(ast, stmt);
                }
            },
            NodeKind::FnDef { params, body, .. } => {
                let body_effective = self.extend_structurally(ast, body);
                if body_effective {
                    for &param in &params {
                        self.effective.insert(param);
                    }
                }
                any |= body_effective;
            },
            NodeKind::If { body, .. } | NodeKind::While { body, .. } => {
                any |= self.extend_structurally(ast, body);
            },
            NodeKind::For {
                initializer,
                increment,
                body,
                ..
            } => {
                any |= self.extend_structurally(ast, initializer);
                any |= self.extend_structurally(ast, increment);
                any |= self.extend_structurally(ast, body);
            },
            _ => {},
        }
        if any {
            self.effective.insert(id);
        }
        any
    }

    // Pass 4 ---------------------------------------------------------------

    /// Every reaching definition of every variable in the condition of
    /// an effective `if`/`while`/`for` becomes effective.
    fn follow_conditions(&mut self, ast: &Ast) {
        let conditions: Vec<NodeId> = ast
            .iter()
            .filter_map(|(id, node)| match node.kind {
                NodeKind::If { condition, .. }
                | NodeKind::While { condition, .. }
                | NodeKind::For { condition, .. }
                    if self.effective.contains(&id) =>
                {
                    Some(condition)
                },
                _ => None,
            })
            .collect();

        for condition in conditions {
            self.mark_condition_defs(ast, condition);
        }
    }

    fn mark_condition_defs(&mut self, ast: &Ast, id: NodeId) {
        match ast.kind(id).clone() {
            NodeKind::Binary { left, right, .. } => {
                self.mark_condition_defs(ast, left);
                self.mark_condition_defs(ast, right);
            },
            NodeKind::Unary { expr, .. } => self.mark_condition_defs(ast, expr),
            NodeKind::Var { .. } => {
                for def in self.dataflow.reaching_definitions(ast, id) {
                    self.mark_statement(ast, def);
                }
            },
            NodeKind::Call { args, .. } => {
                for &arg in &args {
                    self.mark_condition_defs(ast, arg);
                }
            },
            _ => {},
        }
    }

    // Prune ----------------------------------------------------------------

    fn prune(&self, ast: &mut Ast) {
        let effective = &self.effective;
        ast.roots.retain(|id| effective.contains(id));

        let blocks: Vec<NodeId> = ast
            .iter()
            .filter_map(|(id, node)| match node.kind {
                NodeKind::Block { .. } => Some(id),
                _ => None,
            })
            .collect();
        for block in blocks {
            if let NodeKind::Block { statements } = ast.kind_mut(block) {
                statements.retain(|id| effective.contains(id));
            }
        }
    }
}
