//! IN and OUT set construction.
//!
//! Seeded with an empty IN at the top of the program, then one pass in
//! program order: straight-line neighbors chain `in[s+1] = out[s]`, the
//! transfer function is the classic `out = gen ∪ (in − kill)`, branches
//! join `out = out[condition] ∪ out[body]`, and loop back edges are
//! folded in by seeding the condition's IN with the body's (or
//! increment's) GEN instead of iterating.

use calyx_par::{Ast, NodeId, NodeKind};
use calyx_util::{FxHashMap, FxHashSet};

use crate::OptError;

type DefSet = FxHashSet<NodeId>;

type InOutTables = (
    FxHashMap<NodeId, DefSet>,
    FxHashMap<NodeId, DefSet>,
    DefSet,
);

/// Builds IN/OUT sets for every node, given the GEN/KILL tables.
pub struct InOutBuilder<'a> {
    ast: &'a Ast,
    gen: &'a FxHashMap<NodeId, DefSet>,
    kill: &'a FxHashMap<NodeId, DefSet>,
    in_sets: FxHashMap<NodeId, DefSet>,
    out_sets: FxHashMap<NodeId, DefSet>,
}

impl<'a> InOutBuilder<'a> {
    pub fn new(
        ast: &'a Ast,
        gen: &'a FxHashMap<NodeId, DefSet>,
        kill: &'a FxHashMap<NodeId, DefSet>,
    ) -> Self {
        Self {
            ast,
            gen,
            kill,
            in_sets: FxHashMap::default(),
            out_sets: FxHashMap::default(),
        }
    }

    /// Run the builder, returning `(in_sets, out_sets, top_out)`.
    pub fn run(mut self) -> Result<InOutTables, OptError> {
        let top_out = self.visit_sequence(&self.ast.roots.clone(), DefSet::default())?;
        Ok((self.in_sets, self.out_sets, top_out))
    }

    fn gen_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.gen.get(&id).ok_or(OptError::MissingGenKill(id))
    }

    fn kill_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.kill.get(&id).ok_or(OptError::MissingGenKill(id))
    }

    fn in_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.in_sets.get(&id).ok_or(OptError::MissingIn(id))
    }

    fn out_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.out_sets.get(&id).ok_or(OptError::MissingIn(id))
    }

    /// Chain a statement sequence from `in_set`, returning the OUT of
    /// the last statement (or `in_set` for an empty sequence).
    fn visit_sequence(&mut self, statements: &[NodeId], in_set: DefSet) -> Result<DefSet, OptError> {
        let Some(&first) = statements.first() else {
            return Ok(in_set);
        };
        self.in_sets.insert(first, in_set);

        for window in statements.windows(2) {
            self.visit(window[0])?;
            let out = self.out_of(window[0])?.clone();
            self.in_sets.insert(window[1], out);
        }

        let &last = statements.last().unwrap_or(&first);
        self.visit(last)?;
        Ok(self.out_of(last)?.clone())
    }

    /// The classic transfer function.
    fn transfer(&mut self, id: NodeId) -> Result<(), OptError> {
        let out = self.gen_of(id)? | &(self.in_of(id)? - self.kill_of(id)?);
        self.out_sets.insert(id, out);
        Ok(())
    }

    /// Seed `child` with `id`'s IN and visit it.
    fn inherit(&mut self, id: NodeId, child: NodeId) -> Result<(), OptError> {
        let in_set = self.in_of(id)?.clone();
        self.in_sets.insert(child, in_set);
        self.visit(child)
    }

    fn visit(&mut self, id: NodeId) -> Result<(), OptError> {
        match self.ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                let in_set = self.in_of(id)?.clone();
                self.visit_sequence(&statements, in_set)?;
                self.transfer(id)
            },
            NodeKind::FnDef { body, .. } => {
                // The body inherits the definition site's IN; per-call
                // flow is folded in by the call transfer instead.
                self.inherit(id, body)?;
                self.transfer(id)
            },
            NodeKind::VarDecl { init, .. } => {
                if let Some(init) = init {
                    self.inherit(id, init)?;
                }
                self.transfer(id)
            },
            NodeKind::Assign { value, .. } => {
                self.inherit(id, value)?;
                self.transfer(id)
            },
            NodeKind::Print { expr } | NodeKind::Assert { expr } | NodeKind::Return { expr } => {
                self.inherit(id, expr)?;
                self.transfer(id)
            },
            NodeKind::If { condition, body } => {
                self.inherit(id, condition)?;
                let cond_out = self.out_of(condition)?.clone();
                self.in_sets.insert(body, cond_out);
                self.visit(body)?;
                let out = self.out_of(condition)? | self.out_of(body)?;
                self.out_sets.insert(id, out);
                Ok(())
            },
            NodeKind::While { condition, body } => {
                // Fold the back edge: the condition also sees whatever
                // the body generates.
                let cond_in = self.in_of(id)? | self.gen_of(body)?;
                self.in_sets.insert(condition, cond_in);
                self.visit(condition)?;

                let cond_out = self.out_of(condition)?.clone();
                self.in_sets.insert(body, cond_out);
                self.visit(body)?;

                let out = self.out_of(condition)? | self.out_of(body)?;
                self.out_sets.insert(id, out);
                Ok(())
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.inherit(id, initializer)?;

                let cond_in = self.out_of(initializer)? | self.gen_of(increment)?;
                self.in_sets.insert(condition, cond_in);
                self.visit(condition)?;

                let cond_out = self.out_of(condition)?.clone();
                self.in_sets.insert(body, cond_out);
                self.visit(body)?;

                let body_out = self.out_of(body)?.clone();
                self.in_sets.insert(increment, body_out);
                self.visit(increment)?;

                let out = self.out_of(condition)? | self.out_of(body)?;
                self.out_sets.insert(id, out);
                Ok(())
            },
            NodeKind::Binary { left, right, .. } => {
                let in_set = self.in_of(id)?.clone();
                let out = self.visit_sequence(&[left, right], in_set)?;
                self.out_sets.insert(id, out);
                Ok(())
            },
            NodeKind::Unary { expr, .. } => {
                self.inherit(id, expr)?;
                self.transfer(id)
            },
            NodeKind::Call { args, .. } => {
                let in_set = self.in_of(id)?.clone();
                self.visit_sequence(&args, in_set)?;
                self.transfer(id)
            },
            NodeKind::Var { .. } | NodeKind::Lit { .. } | NodeKind::Param { .. } => {
                self.transfer(id)
            },
        }
    }
}
