//! Lexical resolver.
//!
//! For each name use (variable, assignment target, call) determines how
//! many enclosing scopes must be skipped to reach the declaring scope,
//! and writes that depth into the node. Scoping rules:
//!
//! - blocks open a scope;
//! - a function definition puts its name in the *enclosing* scope, then
//!   opens a scope holding the parameters before its body (which opens
//!   its own block scope);
//! - `for` opens a scope around all four of its parts;
//! - a declaration defines its name *after* its initializer is resolved,
//!   so `var x = x` refers to an outer `x`.

use calyx_par::{Ast, NodeId, NodeKind};
use calyx_util::{FxHashSet, Symbol};

use crate::builtins;
use crate::error::ResolveError;

/// What kind of name is being resolved.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Namespace {
    Variable,
    Function,
}

#[derive(Default)]
struct Scope {
    variables: FxHashSet<Symbol>,
    functions: FxHashSet<Symbol>,
}

impl Scope {
    fn names(&self, ns: Namespace) -> &FxHashSet<Symbol> {
        match ns {
            Namespace::Variable => &self.variables,
            Namespace::Function => &self.functions,
        }
    }

    fn names_mut(&mut self, ns: Namespace) -> &mut FxHashSet<Symbol> {
        match ns {
            Namespace::Variable => &mut self.variables,
            Namespace::Function => &mut self.functions,
        }
    }
}

/// Scope-depth resolver.
pub struct Resolver {
    scopes: Vec<Scope>,
}

impl Resolver {
    pub fn new() -> Self {
        let mut global = Scope::default();
        global.functions.extend(builtins::symbols());
        Self {
            scopes: vec![global],
        }
    }

    /// Resolves the whole program, annotating the tree in place.
    pub fn run(&mut self, ast: &mut Ast) -> Result<(), ResolveError> {
        for stmt in ast.roots.clone() {
            self.resolve(ast, stmt)?;
        }
        Ok(())
    }

    fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: Symbol, ns: Namespace) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names_mut(ns).insert(name);
        }
    }

    /// Number of scopes to skip to reach the one declaring `name`.
    fn depth_of(&self, name: Symbol, ns: Namespace) -> Result<u32, ResolveError> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.names(ns).contains(&name) {
                return Ok(depth as u32);
            }
        }
        Err(match ns {
            Namespace::Variable => ResolveError::UnresolvedVariable(name),
            Namespace::Function => ResolveError::UnresolvedFunction(name),
        })
    }

    fn resolve(&mut self, ast: &mut Ast, id: NodeId) -> Result<(), ResolveError> {
        match ast.kind(id).clone() {
            NodeKind::Block { statements } => {
                self.push_scope();
                let result = statements.iter().try_for_each(|&s| self.resolve(ast, s));
                self.pop_scope();
                result
            },
            NodeKind::FnDef {
                name, params, body, ..
            } => {
                self.define(name, Namespace::Function);

                self.push_scope();
                for &param in &params {
                    if let NodeKind::Param { name, .. } = ast.kind(param) {
                        let name = *name;
                        self.define(name, Namespace::Variable);
                    }
                }
                let result = self.resolve(ast, body);
                self.pop_scope();
                result
            },
            NodeKind::VarDecl { name, init, .. } => {
                if let Some(init) = init {
                    self.resolve(ast, init)?;
                }
                self.define(name, Namespace::Variable);
                Ok(())
            },
            NodeKind::Assign { name, value, .. } => {
                let depth = self.depth_of(name, Namespace::Variable)?;
                if let NodeKind::Assign { scope_depth, .. } = ast.kind_mut(id) {
                    *scope_depth = Some(depth);
                }
                self.resolve(ast, value)
            },
            NodeKind::Print { expr } | NodeKind::Assert { expr } | NodeKind::Return { expr } => {
                self.resolve(ast, expr)
            },
            NodeKind::If { condition, body } | NodeKind::While { condition, body } => {
                self.resolve(ast, condition)?;
                self.resolve(ast, body)
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                self.push_scope();
                let result = self
                    .resolve(ast, initializer)
                    .and_then(|_| self.resolve(ast, condition))
                    .and_then(|_| self.resolve(ast, body))
                    .and_then(|_| self.resolve(ast, increment));
                self.pop_scope();
                result
            },
            NodeKind::Binary { left, right, .. } => {
                self.resolve(ast, left)?;
                self.resolve(ast, right)
            },
            NodeKind::Unary { expr, .. } => self.resolve(ast, expr),
            NodeKind::Call { name, args, .. } => {
                let depth = self.depth_of(name, Namespace::Function)?;
                if let NodeKind::Call { scope_depth, .. } = ast.kind_mut(id) {
                    *scope_depth = Some(depth);
                }
                args.iter().try_for_each(|&arg| self.resolve(ast, arg))
            },
            NodeKind::Var { name, .. } => {
                let depth = self.depth_of(name, Namespace::Variable)?;
                if let NodeKind::Var { scope_depth, .. } = ast.kind_mut(id) {
                    *scope_depth = Some(depth);
                }
                Ok(())
            },
            NodeKind::Lit { .. } | NodeKind::Param { .. } => Ok(()),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_par::parse_program;
    use calyx_util::Handler;

    fn resolve(source: &str) -> Result<Ast, ResolveError> {
        let handler = Handler::new();
        let mut ast = parse_program(source, &handler);
        assert!(!handler.has_errors(), "parse failed: {:?}", handler.diagnostics());
        Resolver::new().run(&mut ast)?;
        Ok(ast)
    }

    /// Scope depths of every `Var` node named `name`, in allocation order.
    fn var_depths(ast: &Ast, name: &str) -> Vec<u32> {
        let sym = Symbol::intern(name);
        ast.iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Var {
                    name, scope_depth, ..
                } if *name == sym => Some(scope_depth.expect("unresolved var")),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_global_use_has_depth_zero() {
        let ast = resolve("var x : int = 1; print x").unwrap();
        assert_eq!(var_depths(&ast, "x"), vec![0]);
    }

    #[test]
    fn test_block_use_of_outer_variable() {
        let ast = resolve("var x : int = 1; { print x }").unwrap();
        assert_eq!(var_depths(&ast, "x"), vec![1]);
    }

    #[test]
    fn test_shadowing_resolves_locally() {
        let ast = resolve("var x : int = 1; { var x : int = 2; print x }").unwrap();
        assert_eq!(var_depths(&ast, "x"), vec![0]);
    }

    #[test]
    fn test_declaration_initializer_sees_outer() {
        // `var x = x` refers to the outer x: the name is defined only
        // after its initializer is resolved.
        let ast = resolve("var x : int = 1; { var x : int = x }").unwrap();
        assert_eq!(var_depths(&ast, "x"), vec![1]);
    }

    #[test]
    fn test_function_body_reaches_through_scopes() {
        // Inside showA's body: body block (0), parameter scope (1),
        // enclosing block (2), global (3).
        let ast = resolve("var a : string = 'g'; { def showA() { print a } showA() }").unwrap();
        assert_eq!(var_depths(&ast, "a"), vec![3]);
    }

    #[test]
    fn test_parameter_use_depth() {
        let ast = resolve("def f(n : int) : int { return n }").unwrap();
        assert_eq!(var_depths(&ast, "n"), vec![1]);
    }

    #[test]
    fn test_call_depths() {
        let ast = resolve("def f() { print 1 } { f() } f()").unwrap();
        let sym = Symbol::intern("f");
        let depths: Vec<u32> = ast
            .iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Call {
                    name, scope_depth, ..
                } if *name == sym => Some(scope_depth.expect("unresolved call")),
                _ => None,
            })
            .collect();
        assert_eq!(depths, vec![1, 0]);
    }

    #[test]
    fn test_builtins_resolve_at_global_depth() {
        let ast = resolve("print tostring(1)").unwrap();
        let sym = Symbol::intern("tostring");
        let depth = ast.iter().find_map(|(_, node)| match &node.kind {
            NodeKind::Call {
                name, scope_depth, ..
            } if *name == sym => *scope_depth,
            _ => None,
        });
        assert_eq!(depth, Some(0));
    }

    #[test]
    fn test_assignment_depth() {
        let ast = resolve("var y : int = 1; { y = 2 }").unwrap();
        let sym = Symbol::intern("y");
        let depth = ast.iter().find_map(|(_, node)| match &node.kind {
            NodeKind::Assign {
                name, scope_depth, ..
            } if *name == sym => *scope_depth,
            _ => None,
        });
        assert_eq!(depth, Some(1));
    }

    #[test]
    fn test_unresolved_variable_is_fatal() {
        assert_eq!(
            resolve("print ghost").unwrap_err(),
            ResolveError::UnresolvedVariable(Symbol::intern("ghost"))
        );
    }

    #[test]
    fn test_unresolved_function_is_fatal() {
        assert_eq!(
            resolve("summon()").unwrap_err(),
            ResolveError::UnresolvedFunction(Symbol::intern("summon"))
        );
    }

    #[test]
    fn test_for_scope_covers_all_parts() {
        let ast = resolve("for (var i : int = 0; i < 3; i = i + 1) { print i }").unwrap();
        // Condition/increment uses sit in the for scope (depth 0 from
        // there); the body use is one block deeper.
        assert_eq!(var_depths(&ast, "i"), vec![0, 0, 1]);
    }
}
