//! GEN and KILL set construction.
//!
//! For every node `n`, `gen[n]` holds the definitions inside `n` that
//! reach its exit and `kill[n]` the definitions anywhere in the program
//! that a redefinition inside `n` invalidates. Sequences compose left to
//! right; branch and loop shapes use the approximations documented in
//! the module root.

use calyx_par::{Ast, NodeId, NodeKind};
use calyx_sem::builtins;
use calyx_util::{FxHashMap, FxHashSet, Symbol};

use super::locate_var_defs;
use crate::OptError;

type DefSet = FxHashSet<NodeId>;

/// Per-scope table of function name to the (GEN, KILL) its calls
/// contribute.
type FnScope = FxHashMap<Symbol, (DefSet, DefSet)>;

/// Builds GEN/KILL sets for every node of the program.
pub struct GenKillBuilder<'a> {
    ast: &'a Ast,
    var_defs: FxHashMap<Symbol, DefSet>,
    /// Scope stack holding GEN/KILL contributions of visible functions.
    scopes: Vec<FnScope>,
    gen: FxHashMap<NodeId, DefSet>,
    kill: FxHashMap<NodeId, DefSet>,
}

type GenKillTables = (
    FxHashMap<Symbol, DefSet>,
    FxHashMap<NodeId, DefSet>,
    FxHashMap<NodeId, DefSet>,
);

impl<'a> GenKillBuilder<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        // Builtins contribute no definitions.
        let mut global = FnScope::default();
        for name in builtins::symbols() {
            global.insert(name, (DefSet::default(), DefSet::default()));
        }

        Self {
            ast,
            var_defs: locate_var_defs(ast),
            scopes: vec![global],
            gen: FxHashMap::default(),
            kill: FxHashMap::default(),
        }
    }

    /// Run the builder, returning `(var_defs, gen, kill)`.
    pub fn run(mut self) -> Result<GenKillTables, OptError> {
        self.visit_sequence(&self.ast.roots.clone())?;
        Ok((self.var_defs, self.gen, self.kill))
    }

    fn defs_of(&self, name: Symbol) -> DefSet {
        self.var_defs.get(&name).cloned().unwrap_or_default()
    }

    fn gen_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.gen.get(&id).ok_or(OptError::MissingGenKill(id))
    }

    fn kill_of(&self, id: NodeId) -> Result<&DefSet, OptError> {
        self.kill.get(&id).ok_or(OptError::MissingGenKill(id))
    }

    /// GEN/KILL of a function's body as seen from a call site: the
    /// body's sets minus definitions of the parameter names.
    ///
    /// Functions not yet recorded (recursive or forward references)
    /// contribute empty sets.
    fn resolve_fn(&self, name: Symbol) -> (DefSet, DefSet) {
        for scope in self.scopes.iter().rev() {
            if let Some(sets) = scope.get(&name) {
                return sets.clone();
            }
        }
        (DefSet::default(), DefSet::default())
    }

    /// Straight-line composition over a statement sequence.
    fn visit_sequence(&mut self, statements: &[NodeId]) -> Result<(DefSet, DefSet), OptError> {
        let mut gen = DefSet::default();
        let mut kill = DefSet::default();
        let Some((&first, rest)) = statements.split_first() else {
            return Ok((gen, kill));
        };

        self.visit(first)?;
        gen.extend(self.gen_of(first)?.iter().copied());
        kill.extend(self.kill_of(first)?.iter().copied());

        for &stmt in rest {
            self.visit(stmt)?;
            gen = &(&gen - self.kill_of(stmt)?) | self.gen_of(stmt)?;
            kill = &(&kill - self.gen_of(stmt)?) | self.kill_of(stmt)?;
        }

        Ok((gen, kill))
    }

    fn store(&mut self, id: NodeId, gen: DefSet, kill: DefSet) {
        self.gen.insert(id, gen);
        self.kill.insert(id, kill);
    }

    /// Give `id` the sets of its single child `source`.
    fn carry(&mut self, id: NodeId, source: NodeId) -> Result<(), OptError> {
        self.visit(source)?;
        let gen = self.gen_of(source)?.clone();
        let kill = self.kill_of(source)?.clone();
        self.store(id, gen, kill);
        Ok(())
    }

    fn visit(&mut self, id: NodeId) -> Result<(), OptError> {
        match self.ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                self.scopes.push(FnScope::default());
                let result = self.visit_sequence(&statements);
                self.scopes.pop();
                let (gen, _) = result?;
                // KILL is deliberately empty: a conservative lower bound
                // that respects inner-scope invisibility.
                self.store(id, gen, DefSet::default());
                Ok(())
            },
            NodeKind::FnDef {
                name, params, body, ..
            } => {
                self.visit(body)?;
                // The definition itself generates and kills nothing; its
                // body's sets surface at call sites instead.
                let param_names: FxHashSet<Symbol> = params
                    .iter()
                    .filter_map(|&p| match self.ast.kind(p) {
                        NodeKind::Param { name, .. } => Some(*name),
                        _ => None,
                    })
                    .collect();

                let filter = |set: &DefSet| -> DefSet {
                    set.iter()
                        .copied()
                        .filter(|&d| {
                            self.ast
                                .def_name(d)
                                .is_some_and(|n| !param_names.contains(&n))
                        })
                        .collect()
                };
                let f_gen = filter(self.gen_of(body)?);
                let f_kill = filter(self.kill_of(body)?);

                if let Some(scope) = self.scopes.last_mut() {
                    scope.insert(name, (f_gen, f_kill));
                }
                self.store(id, DefSet::default(), DefSet::default());
                Ok(())
            },
            NodeKind::VarDecl { name, init, .. } => {
                match init {
                    Some(init) => self.visit_def(id, name, init),
                    None => {
                        // An uninitialized declaration still defines the
                        // name and kills other definitions of it.
                        let mut kill = self.defs_of(name);
                        kill.remove(&id);
                        let gen = std::iter::once(id).collect();
                        self.store(id, gen, kill);
                        Ok(())
                    },
                }
            },
            NodeKind::Assign { name, value, .. } => self.visit_def(id, name, value),
            NodeKind::Print { expr } | NodeKind::Assert { expr } | NodeKind::Return { expr } => {
                self.carry(id, expr)
            },
            NodeKind::If { condition, body } => {
                // Straight-line over-approximation.
                let (gen, kill) = self.visit_sequence(&[condition, body])?;
                self.store(id, gen, kill);
                Ok(())
            },
            NodeKind::While { condition, body } => {
                self.visit(condition)?;
                self.visit(body)?;
                let gen = self.gen_of(condition)? | self.gen_of(body)?;
                // Only definitions killed on every path stay killed.
                let kill = self.kill_of(condition)? & self.kill_of(body)?;
                self.store(id, gen, kill);
                Ok(())
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.visit(initializer)?;
                self.visit(condition)?;
                self.visit(increment)?;
                self.visit(body)?;

                // The initializer dominates; body and increment
                // contribute additively.
                let mut gen = self.gen_of(initializer)? - self.kill_of(condition)?;
                gen.extend(self.gen_of(body)?.iter().copied());
                gen.extend(self.gen_of(increment)?.iter().copied());

                let loop_gen: DefSet = self
                    .gen_of(condition)?
                    .iter()
                    .chain(self.gen_of(body)?.iter())
                    .chain(self.gen_of(increment)?.iter())
                    .copied()
                    .collect();
                let kill = self.kill_of(initializer)? - &loop_gen;

                self.store(id, gen, kill);
                Ok(())
            },
            NodeKind::Binary { left, right, .. } => {
                let (gen, kill) = self.visit_sequence(&[left, right])?;
                self.store(id, gen, kill);
                Ok(())
            },
            NodeKind::Unary { expr, .. } => self.carry(id, expr),
            NodeKind::Call { name, args, .. } => {
                let (arg_gen, arg_kill) = self.visit_sequence(&args)?;
                // Definitions reach through calls: union in the callee's
                // contribution.
                let (f_gen, f_kill) = self.resolve_fn(name);
                let gen = &f_gen | &(&arg_gen - &f_kill);
                let kill = &f_kill | &(&arg_kill - &f_gen);
                self.store(id, gen, kill);
                Ok(())
            },
            NodeKind::Var { .. } | NodeKind::Lit { .. } | NodeKind::Param { .. } => {
                self.store(id, DefSet::default(), DefSet::default());
                Ok(())
            },
        }
    }

    /// Shared rule for `VarDecl`-with-initializer and `Assign`.
    fn visit_def(&mut self, id: NodeId, name: Symbol, value: NodeId) -> Result<(), OptError> {
        self.visit(value)?;
        let name_defs = self.defs_of(name);

        let mut gen: DefSet = self.gen_of(value)? - &name_defs;
        gen.insert(id);

        let mut kill = &name_defs | self.kill_of(value)?;
        kill.remove(&id);

        self.store(id, gen, kill);
        Ok(())
    }
}
