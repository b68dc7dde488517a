//! Reaching-definitions dataflow over the AST.
//!
//! The AST is treated directly as a control-flow structure, which buys a
//! single bottom-up traversal instead of a fixpoint over a CFG and costs
//! some precision. The deliberate approximations, which the optimizers
//! are calibrated to, are:
//!
//! - a block's KILL is empty (inner scopes are invisible outside, and
//!   kills of outer variables are dropped as a conservative lower bound);
//! - `if` composes condition and body as straight-line code;
//! - `while` keeps only definitions killed on *every* path (kill sets
//!   intersect) and feeds the body's GEN back into the condition's IN to
//!   model the back edge in one shot;
//! - function bodies contribute their GEN/KILL (minus parameter names)
//!   at every call site; this is the only non-local flow.
//!
//! The imprecision only ever *admits* extra reaching definitions, which
//! is safe for the elimination passes built on top.

mod gen_kill;
mod in_out;

pub use gen_kill::GenKillBuilder;
pub use in_out::InOutBuilder;

use calyx_par::{Ast, NodeId, NodeKind};
use calyx_util::{FxHashMap, FxHashSet, Symbol};

use crate::OptError;

/// The combined dataflow tables, computed once per program and shared by
/// every optimizer.
///
/// All sets hold AST node identities of definitions (`VarDecl`/`Assign`
/// nodes), never copies.
pub struct Dataflow {
    /// All definitions of each variable name, program-wide.
    pub var_defs: FxHashMap<Symbol, FxHashSet<NodeId>>,
    /// Definitions inside a node that reach its exit.
    pub gen: FxHashMap<NodeId, FxHashSet<NodeId>>,
    /// Definitions anywhere that a redefinition inside the node kills.
    pub kill: FxHashMap<NodeId, FxHashSet<NodeId>>,
    /// Definitions reaching a node's entry.
    pub in_sets: FxHashMap<NodeId, FxHashSet<NodeId>>,
    /// Definitions reaching a node's exit.
    pub out_sets: FxHashMap<NodeId, FxHashSet<NodeId>>,
    /// Definitions reaching the end of the whole program.
    pub top_out: FxHashSet<NodeId>,
}

impl Dataflow {
    /// Run GEN/KILL and then IN/OUT over the program.
    pub fn analyze(ast: &Ast) -> Result<Dataflow, OptError> {
        let (var_defs, gen, kill) = GenKillBuilder::new(ast).run()?;
        let (in_sets, out_sets, top_out) = InOutBuilder::new(ast, &gen, &kill).run()?;
        Ok(Dataflow {
            var_defs,
            gen,
            kill,
            in_sets,
            out_sets,
            top_out,
        })
    }

    /// The definitions of `use_id`'s variable name that reach it: members
    /// of its IN set whose defined name matches.
    ///
    /// Returns an empty vector for nodes that are not variable uses.
    pub fn reaching_definitions(&self, ast: &Ast, use_id: NodeId) -> Vec<NodeId> {
        let name = match ast.kind(use_id) {
            NodeKind::Var { name, .. } => *name,
            _ => return Vec::new(),
        };
        self.defs_of_name_in(ast, use_id, name)
    }

    /// Members of `at`'s IN set defining `name`.
    pub fn defs_of_name_in(&self, ast: &Ast, at: NodeId, name: Symbol) -> Vec<NodeId> {
        match self.in_sets.get(&at) {
            Some(in_set) => {
                let mut defs: Vec<NodeId> = in_set
                    .iter()
                    .copied()
                    .filter(|&d| ast.def_name(d) == Some(name))
                    .collect();
                // Deterministic order for downstream consumers.
                defs.sort();
                defs
            },
            None => Vec::new(),
        }
    }
}

/// Collects every `VarDecl`/`Assign` node in the program, grouped by the
/// variable name it writes.
pub(crate) fn locate_var_defs(ast: &Ast) -> FxHashMap<Symbol, FxHashSet<NodeId>> {
    let mut defs: FxHashMap<Symbol, FxHashSet<NodeId>> = FxHashMap::default();
    for &root in &ast.roots {
        locate_in_statement(ast, root, &mut defs);
    }
    defs
}

fn locate_in_statement(
    ast: &Ast,
    id: NodeId,
    defs: &mut FxHashMap<Symbol, FxHashSet<NodeId>>,
) {
    match ast.kind(id) {
        NodeKind::Block { statements } => {
            for &stmt in statements {
                locate_in_statement(ast, stmt, defs);
            }
        },
        NodeKind::FnDef { body, .. } => locate_in_statement(ast, *body, defs),
        NodeKind::VarDecl { name, .. } | NodeKind::Assign { name, .. } => {
            defs.entry(*name).or_default().insert(id);
        },
        NodeKind::If { body, .. } | NodeKind::While { body, .. } => {
            locate_in_statement(ast, *body, defs);
        },
        NodeKind::For {
            initializer,
            increment,
            body,
            ..
        } => {
            locate_in_statement(ast, *initializer, defs);
            locate_in_statement(ast, *increment, defs);
            locate_in_statement(ast, *body, defs);
        },
        _ => {},
    }
}
