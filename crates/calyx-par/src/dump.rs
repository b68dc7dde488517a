//! Textual AST dump.
//!
//! A deterministic, indented rendering of the tree used by `--emit-ast`
//! and by tests that compare optimized ASTs for byte equality. Node ids
//! are included so subexpression sharing is visible: two parents printing
//! the same `#id` point at the same arena slot.

use std::fmt::Write;

use crate::ast::{Ast, NodeId, NodeKind};

impl Ast {
    /// Render the whole program.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.dump_node(root, 0, &mut out);
        }
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str("  ");
        }

        match self.kind(id) {
            NodeKind::Block { statements } => {
                let _ = writeln!(out, "block #{}", id.0);
                for &stmt in statements {
                    self.dump_node(stmt, depth + 1, out);
                }
            },
            NodeKind::FnDef {
                name,
                params,
                ret_ty,
                body,
            } => {
                let _ = writeln!(out, "fn-def {} : {} #{}", name, ret_ty, id.0);
                for &param in params {
                    self.dump_node(param, depth + 1, out);
                }
                self.dump_node(*body, depth + 1, out);
            },
            NodeKind::Param { name, ty } => {
                let _ = writeln!(out, "param {} : {} #{}", name, ty, id.0);
            },
            NodeKind::VarDecl { name, ty, init } => {
                let _ = writeln!(out, "var-decl {} : {} #{}", name, ty, id.0);
                if let Some(init) = init {
                    self.dump_node(*init, depth + 1, out);
                }
            },
            NodeKind::Assign {
                name, value, scope_depth, ..
            } => {
                let _ = writeln!(out, "assign {}{} #{}", name, depth_suffix(*scope_depth), id.0);
                self.dump_node(*value, depth + 1, out);
            },
            NodeKind::Print { expr } => {
                let _ = writeln!(out, "print #{}", id.0);
                self.dump_node(*expr, depth + 1, out);
            },
            NodeKind::Assert { expr } => {
                let _ = writeln!(out, "assert #{}", id.0);
                self.dump_node(*expr, depth + 1, out);
            },
            NodeKind::Return { expr } => {
                let _ = writeln!(out, "return #{}", id.0);
                self.dump_node(*expr, depth + 1, out);
            },
            NodeKind::If { condition, body } => {
                let _ = writeln!(out, "if #{}", id.0);
                self.dump_node(*condition, depth + 1, out);
                self.dump_node(*body, depth + 1, out);
            },
            NodeKind::While { condition, body } => {
                let _ = writeln!(out, "while #{}", id.0);
                self.dump_node(*condition, depth + 1, out);
                self.dump_node(*body, depth + 1, out);
            },
            NodeKind::For {
                initializer,
                condition,
                increment,
                body,
            } => {
                let _ = writeln!(out, "for #{}", id.0);
                self.dump_node(*initializer, depth + 1, out);
                self.dump_node(*condition, depth + 1, out);
                self.dump_node(*increment, depth + 1, out);
                self.dump_node(*body, depth + 1, out);
            },
            NodeKind::Binary {
                left,
                op,
                right,
                caching,
            } => {
                let mark = if *caching { " caching" } else { "" };
                let _ = writeln!(out, "binary {}{} #{}", op, mark, id.0);
                self.dump_node(*left, depth + 1, out);
                self.dump_node(*right, depth + 1, out);
            },
            NodeKind::Unary { op, expr, caching } => {
                let mark = if *caching { " caching" } else { "" };
                let _ = writeln!(out, "unary {}{} #{}", op, mark, id.0);
                self.dump_node(*expr, depth + 1, out);
            },
            NodeKind::Call {
                name, args, scope_depth, ..
            } => {
                let _ = writeln!(out, "call {}{} #{}", name, depth_suffix(*scope_depth), id.0);
                for &arg in args {
                    self.dump_node(arg, depth + 1, out);
                }
            },
            NodeKind::Var { name, scope_depth } => {
                let _ = writeln!(out, "var {}{} #{}", name, depth_suffix(*scope_depth), id.0);
            },
            NodeKind::Lit { value } => {
                let _ = writeln!(out, "lit {} #{}", value, id.0);
            },
        }
    }
}

fn depth_suffix(depth: Option<u32>) -> String {
    match depth {
        Some(d) => format!(" @{}", d),
        None => String::new(),
    }
}
