//! Tests for the dataflow engine and the three optimizers.

use calyx_par::{parse_program, Ast, NodeId, NodeKind};
use calyx_sem::Resolver;
use calyx_util::{Handler, Symbol};

use crate::{AlgebraicOptimizer, Dataflow, ExpressionDagOptimizer, RedundancyOptimizer};

/// Parse and resolve a source program.
fn prepare(source: &str) -> Ast {
    let handler = Handler::new();
    let mut ast = parse_program(source, &handler);
    assert!(
        !handler.has_errors(),
        "parse failed: {:?}",
        handler.diagnostics()
    );
    Resolver::new().run(&mut ast).expect("resolution failed");
    ast
}

/// All definitions of `name`, in allocation (program) order.
fn defs_named(ast: &Ast, name: &str) -> Vec<NodeId> {
    let sym = Symbol::intern(name);
    ast.iter()
        .filter_map(|(id, _)| (ast.def_name(id) == Some(sym)).then_some(id))
        .collect()
}

/// First `Var` node with the given name.
fn var_use(ast: &Ast, name: &str) -> NodeId {
    let sym = Symbol::intern(name);
    ast.iter()
        .find_map(|(id, node)| match &node.kind {
            NodeKind::Var { name, .. } if *name == sym => Some(id),
            _ => None,
        })
        .expect("no such variable use")
}

/// Statement ids reachable from the (possibly pruned) program.
fn surviving_statements(ast: &Ast) -> Vec<NodeId> {
    fn walk(ast: &Ast, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        match ast.kind(id) {
            NodeKind::Block { statements } => {
                for &s in statements {
                    walk(ast, s, out);
                }
            },
            NodeKind::FnDef { body, .. } => walk(ast, *body, out),
            NodeKind::If { body, .. } | NodeKind::While { body, .. } => walk(ast, *body, out),
            NodeKind::For {
                initializer,
                increment,
                body,
                ..
            } => {
                walk(ast, *initializer, out);
                walk(ast, *increment, out);
                walk(ast, *body, out);
            },
            _ => {},
        }
    }
    let mut out = Vec::new();
    for &root in &ast.roots {
        walk(ast, root, &mut out);
    }
    out
}

/// Names of the surviving definitions, for prune assertions.
fn surviving_def_names(ast: &Ast) -> Vec<String> {
    surviving_statements(ast)
        .into_iter()
        .filter_map(|id| ast.def_name(id).map(|s| s.as_str().to_string()))
        .collect()
}

// Dataflow ---------------------------------------------------------------

#[test]
fn test_gen_kill_straight_line() {
    let ast = prepare("var x : int = 1; x = 2; print x");
    let df = Dataflow::analyze(&ast).unwrap();

    let defs = defs_named(&ast, "x");
    assert_eq!(defs.len(), 2);
    let (decl, assign) = (defs[0], defs[1]);

    assert_eq!(df.gen[&decl], std::iter::once(decl).collect());
    assert_eq!(df.kill[&decl], std::iter::once(assign).collect());
    assert_eq!(df.gen[&assign], std::iter::once(assign).collect());
    assert_eq!(df.kill[&assign], std::iter::once(decl).collect());
}

#[test]
fn test_only_latest_definition_reaches() {
    let ast = prepare("var x : int = 1; x = 2; print x");
    let df = Dataflow::analyze(&ast).unwrap();

    let defs = defs_named(&ast, "x");
    assert_eq!(
        df.reaching_definitions(&ast, var_use(&ast, "x")),
        vec![defs[1]]
    );
}

#[test]
fn test_uninitialized_declaration_gens_and_kills() {
    let ast = prepare("var x : int; x = 2");
    let df = Dataflow::analyze(&ast).unwrap();

    let defs = defs_named(&ast, "x");
    assert_eq!(df.gen[&defs[0]], std::iter::once(defs[0]).collect());
    assert_eq!(df.kill[&defs[0]], std::iter::once(defs[1]).collect());
}

#[test]
fn test_block_kill_is_empty() {
    let ast = prepare("var x : int = 1; { x = 2 }");
    let df = Dataflow::analyze(&ast).unwrap();

    let block = ast.roots[1];
    assert!(matches!(ast.kind(block), NodeKind::Block { .. }));
    // GEN passes through, KILL is deliberately empty.
    assert!(!df.gen[&block].is_empty());
    assert!(df.kill[&block].is_empty());
}

#[test]
fn test_while_condition_sees_loop_body_definitions() {
    let ast = prepare("var i : int = 1; while (i < 10) { i = i + 2 }");
    let df = Dataflow::analyze(&ast).unwrap();

    let defs = defs_named(&ast, "i");
    assert_eq!(defs.len(), 2);
    // The use in the condition is the first Var i allocated.
    let cond_use = var_use(&ast, "i");
    let reaching = df.reaching_definitions(&ast, cond_use);
    assert_eq!(reaching, defs, "back edge must feed body GEN into the condition");
}

#[test]
fn test_while_kill_is_path_intersection() {
    let ast = prepare("var x : int = 1; while (x < 3) { x = x + 1 }");
    let df = Dataflow::analyze(&ast).unwrap();

    let whiles: Vec<NodeId> = ast
        .iter()
        .filter_map(|(id, node)| matches!(node.kind, NodeKind::While { .. }).then_some(id))
        .collect();
    // The loop may not run at all: nothing is killed on every path.
    assert!(df.kill[&whiles[0]].is_empty());
}

#[test]
fn test_definitions_reach_through_calls() {
    let ast = prepare(
        "var b : int = 1;
         def fun() : int {
             b = 2;
             return 1
         }
         var d : int = fun();
         print b",
    );
    let df = Dataflow::analyze(&ast).unwrap();

    let b_defs = defs_named(&ast, "b");
    assert_eq!(b_defs.len(), 2);
    let print_stmt = *ast.roots.last().unwrap();
    let expr = match ast.kind(print_stmt) {
        NodeKind::Print { expr } => *expr,
        other => panic!("expected print, got {:?}", other),
    };
    // The call surfaces b = 2, whose kill removes the declaration.
    let reaching = df.reaching_definitions(&ast, expr);
    assert_eq!(reaching, vec![b_defs[1]]);
}

#[test]
fn test_function_gen_excludes_parameters() {
    let ast = prepare(
        "def f(n : int) : int {
             n = 3;
             var m : int = 1;
             return m
         }
         var x : int = f(1)",
    );
    let df = Dataflow::analyze(&ast).unwrap();

    let call = ast
        .iter()
        .find_map(|(id, node)| matches!(node.kind, NodeKind::Call { .. }).then_some(id))
        .unwrap();
    let n_defs = defs_named(&ast, "n");
    let m_defs = defs_named(&ast, "m");
    assert!(!df.gen[&call].contains(&n_defs[0]), "parameter defs stay local");
    assert!(df.gen[&call].contains(&m_defs[0]));
}

#[test]
fn test_transfer_invariant() {
    let source = "
        var i : int = 1;
        var x : int = 7;
        var y : int = x - 2;
        def fun(a : int) : int {
            var t : int = a;
            return t
        }
        while (i < x - 2) {
            i = i + 2
        }
        if (i == 5) {
            print fun(i)
        }
        assert i == y
    ";
    let ast = prepare(source);
    let df = Dataflow::analyze(&ast).unwrap();

    for (id, node) in ast.iter() {
        // Branch joins and expression sequences have their own OUT rule.
        if matches!(
            node.kind,
            NodeKind::If { .. } | NodeKind::While { .. } | NodeKind::For { .. }
                | NodeKind::Binary { .. }
        ) {
            continue;
        }
        let (Some(in_set), Some(out_set)) = (df.in_sets.get(&id), df.out_sets.get(&id)) else {
            continue;
        };
        let expected = &df.gen[&id] | &(in_set - &df.kill[&id]);
        assert_eq!(*out_set, expected, "transfer violated at {:?}", node.kind);
    }
}

// Redundancy -------------------------------------------------------------

fn optimize_redundancy(source: &str) -> Ast {
    let mut ast = prepare(source);
    let df = Dataflow::analyze(&ast).unwrap();
    RedundancyOptimizer::new(&df).run(&mut ast).unwrap();
    ast
}

#[test]
fn test_unused_declaration_removed() {
    let ast = optimize_redundancy("var x : int = 1; var y : int = 2; print x");
    assert_eq!(surviving_def_names(&ast), vec!["x"]);
    assert_eq!(ast.roots.len(), 2);
}

#[test]
fn test_unused_assignment_removed() {
    let ast = optimize_redundancy("var y : int = 2; print y; y = 3");
    assert_eq!(surviving_def_names(&ast), vec!["y"]);
}

#[test]
fn test_unused_function_removed() {
    let ast = optimize_redundancy(
        "var b : int = 1;
         def useless() : int {
             return 1
         }
         var d : int = 100;
         print b + d",
    );
    let has_fn = surviving_statements(&ast)
        .iter()
        .any(|&id| matches!(ast.kind(id), NodeKind::FnDef { .. }));
    assert!(!has_fn, "uncalled function must be pruned");
    assert_eq!(surviving_def_names(&ast), vec!["b", "d"]);
}

#[test]
fn test_unused_inner_function_removed() {
    let ast = optimize_redundancy(
        "var b : int = 1;
         def useful() : int {
             def useless() {
                 print 'I am completely useless!'
             }
             return 1
         }
         print b + useful()",
    );
    let fns: Vec<&str> = surviving_statements(&ast)
        .iter()
        .filter_map(|&id| match ast.kind(id) {
            NodeKind::FnDef { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(fns, vec!["useful"], "inner function is never called");
}

#[test]
fn test_unused_loop_variable_removed() {
    let ast = optimize_redundancy(
        "var i : int = 1;
         var p : int = 1;
         var x : int = 2;
         while (i < 10) {
             print p;
             p = p * 2;
             x = x + 100;
             i = i + 1
         }",
    );
    let mut names = surviving_def_names(&ast);
    names.sort();
    names.dedup();
    assert_eq!(names, vec!["i", "p"], "x contributes to nothing observable");
}

#[test]
fn test_loop_condition_feedback_kept() {
    let ast = optimize_redundancy(
        "var i : int = 1;
         var x : int = 7;
         var y : int = x - 2;
         while (i < x - 2) {
             i = i + 2
         }
         assert i == y;
         assert i == 5",
    );
    let mut names = surviving_def_names(&ast);
    names.sort();
    assert_eq!(names, vec!["i", "i", "x", "y"]);
    let has_while = surviving_statements(&ast)
        .iter()
        .any(|&id| matches!(ast.kind(id), NodeKind::While { .. }));
    assert!(has_while);
}

#[test]
fn test_statement_position_call_to_effectful_function_kept() {
    let ast = optimize_redundancy(
        "def useful() : int {
             print 'totally useless';
             return 1
         }
         var x : int = 1;
         useful();
         var y : int = useful();
         print x;
         y = y + 2",
    );
    let calls = surviving_statements(&ast)
        .iter()
        .filter(|&&id| matches!(ast.kind(id), NodeKind::Call { .. }))
        .count();
    assert_eq!(calls, 1, "the bare call stays");
    let mut names = surviving_def_names(&ast);
    names.sort();
    // y = y + 2 is dead, but var y carries a call with effects.
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn test_asserts_are_roots() {
    let ast = optimize_redundancy("var x : int = 1; assert x == 1; var y : int = 2");
    assert_eq!(surviving_def_names(&ast), vec!["x"]);
}

#[test]
fn test_pruned_ast_keeps_reaching_definitions_for_survivors() {
    let source = "
        var i : int = 1;
        var p : int = 1;
        var x : int = 2;
        while (i < 10) {
            print p;
            p = p * 2;
            x = x + 100;
            i = i + 1
        }
    ";
    let mut ast = prepare(source);
    let df = Dataflow::analyze(&ast).unwrap();
    RedundancyOptimizer::new(&df).run(&mut ast).unwrap();

    let surviving: Vec<NodeId> = surviving_statements(&ast);
    let surviving_set: calyx_util::FxHashSet<NodeId> = surviving.iter().copied().collect();

    // For every surviving variable use that had reaching definitions,
    // at least one of them must have survived.
    fn walk_exprs(ast: &Ast, id: NodeId, uses: &mut Vec<NodeId>) {
        match ast.kind(id) {
            NodeKind::Var { .. } => uses.push(id),
            NodeKind::Binary { left, right, .. } => {
                walk_exprs(ast, *left, uses);
                walk_exprs(ast, *right, uses);
            },
            NodeKind::Unary { expr, .. } => walk_exprs(ast, *expr, uses),
            NodeKind::Call { args, .. } => {
                for &arg in args {
                    walk_exprs(ast, arg, uses);
                }
            },
            _ => {},
        }
    }

    let mut uses = Vec::new();
    for &stmt in &surviving {
        match ast.kind(stmt) {
            NodeKind::Print { expr } | NodeKind::Assert { expr } | NodeKind::Return { expr } => {
                walk_exprs(&ast, *expr, &mut uses)
            },
            NodeKind::VarDecl {
                init: Some(init), ..
            } => walk_exprs(&ast, *init, &mut uses),
            NodeKind::Assign { value, .. } => walk_exprs(&ast, *value, &mut uses),
            NodeKind::While { condition, .. } | NodeKind::If { condition, .. } => {
                walk_exprs(&ast, *condition, &mut uses)
            },
            _ => {},
        }
    }

    for use_id in uses {
        let reaching = df.reaching_definitions(&ast, use_id);
        if reaching.is_empty() {
            continue;
        }
        assert!(
            reaching.iter().any(|d| surviving_set.contains(d)),
            "surviving use lost every reaching definition"
        );
    }
}

// Expression DAG ---------------------------------------------------------

fn optimize_dag(source: &str) -> Ast {
    let mut ast = prepare(source);
    let df = Dataflow::analyze(&ast).unwrap();
    ExpressionDagOptimizer::new(&df).run(&mut ast).unwrap();
    ast
}

fn caching_nodes(ast: &Ast) -> Vec<NodeId> {
    ast.iter()
        .filter_map(|(id, node)| match node.kind {
            NodeKind::Binary { caching: true, .. } | NodeKind::Unary { caching: true, .. } => {
                Some(id)
            },
            _ => None,
        })
        .collect()
}

#[test]
fn test_common_subexpression_shared() {
    let ast = optimize_dag(
        "var a : int = 3;
         var b : int = 1;
         var c : int = 10;
         var l : int = b - c;
         var d : int = 100;
         var x : int = (b - c) * a + (b - c) * d + a",
    );

    // l's initializer is the first b - c in program order.
    let l_init = match ast.kind(ast.roots[3]) {
        NodeKind::VarDecl { init, .. } => init.unwrap(),
        other => panic!("expected declaration, got {:?}", other),
    };
    assert_eq!(caching_nodes(&ast), vec![l_init]);

    // Both occurrences inside x's initializer now point at l's node.
    let mut shared_uses = 0;
    for (_, node) in ast.iter() {
        if let NodeKind::Binary { left, right, .. } = node.kind {
            if left == l_init {
                shared_uses += 1;
            }
            if right == l_init {
                shared_uses += 1;
            }
        }
    }
    assert_eq!(shared_uses, 2);
}

#[test]
fn test_sharing_respects_reassignment() {
    // b + c occurs twice, but b is redefined in between: the two
    // occurrences read different definitions and must not be shared.
    // a - d occurs twice with identical reaching definitions: shared.
    let ast = optimize_dag(
        "var b : int = 2;
         var c : int = 4;
         var a : int = b + c;
         var d : int = 8;
         b = a - d;
         c = b + c;
         d = a - d",
    );

    let first_a_minus_d = match ast.kind(ast.roots[4]) {
        NodeKind::Assign { value, .. } => *value,
        other => panic!("expected assignment, got {:?}", other),
    };
    assert_eq!(caching_nodes(&ast), vec![first_a_minus_d]);

    let last_value = match ast.kind(ast.roots[6]) {
        NodeKind::Assign { value, .. } => *value,
        other => panic!("expected assignment, got {:?}", other),
    };
    assert_eq!(last_value, first_a_minus_d, "d = a - d reuses the shared node");
}

#[test]
fn test_multiple_reaching_definitions_are_opaque() {
    let ast = optimize_dag(
        "var i : int = 1;
         while (i < 10) {
             var t : int = i + 1;
             var u : int = i + 1;
             i = i + 2
         }",
    );
    // Inside the loop i has two reaching definitions (declaration and
    // increment via the back edge): i + 1 is opaque, nothing is shared.
    assert!(caching_nodes(&ast).is_empty());
}

#[test]
fn test_calls_are_opaque() {
    let ast = optimize_dag(
        "def f() : int {
             return 1
         }
         var a : int = f() + 1;
         var b : int = f() + 1",
    );
    assert!(caching_nodes(&ast).is_empty());
}

#[test]
fn test_literal_subexpressions_share() {
    let ast = optimize_dag("var a : int = 2 + 3; var b : int = 2 + 3");
    let a_init = match ast.kind(ast.roots[0]) {
        NodeKind::VarDecl { init, .. } => init.unwrap(),
        other => panic!("expected declaration, got {:?}", other),
    };
    let b_init = match ast.kind(ast.roots[1]) {
        NodeKind::VarDecl { init, .. } => init.unwrap(),
        other => panic!("expected declaration, got {:?}", other),
    };
    assert_eq!(a_init, b_init);
    assert_eq!(caching_nodes(&ast), vec![a_init]);
}

// Algebraic --------------------------------------------------------------

fn optimize_algebraic(source: &str) -> Ast {
    let mut ast = prepare(source);
    AlgebraicOptimizer::new().run(&mut ast).unwrap();
    ast
}

fn value_of_root(ast: &Ast, index: usize) -> NodeId {
    match ast.kind(ast.roots[index]) {
        NodeKind::VarDecl { init, .. } => init.unwrap(),
        NodeKind::Assign { value, .. } => *value,
        other => panic!("expected definition, got {:?}", other),
    }
}

#[test]
fn test_neutral_element_folding() {
    let ast = optimize_algebraic(
        "var x : int = 1 + 0;
         x = x * 1;
         x = 0 + x;
         x = x ** 1;
         x = 1 - 0",
    );

    use calyx_par::Lit;
    assert!(matches!(
        ast.kind(value_of_root(&ast, 0)),
        NodeKind::Lit { value: Lit::Int(1) }
    ));
    assert!(matches!(ast.kind(value_of_root(&ast, 1)), NodeKind::Var { .. }));
    assert!(matches!(ast.kind(value_of_root(&ast, 2)), NodeKind::Var { .. }));
    assert!(matches!(ast.kind(value_of_root(&ast, 3)), NodeKind::Var { .. }));
    assert!(matches!(
        ast.kind(value_of_root(&ast, 4)),
        NodeKind::Lit { value: Lit::Int(1) }
    ));
}

#[test]
fn test_subtraction_folds_only_on_the_right() {
    let ast = optimize_algebraic("var a : int = 5; var x : int = 0 - a");
    // 0 - a is a negation, not a; it must stay a binary expression.
    assert!(matches!(
        ast.kind(value_of_root(&ast, 1)),
        NodeKind::Binary { .. }
    ));
}

#[test]
fn test_folding_reaches_nested_positions() {
    let ast = optimize_algebraic("var a : int = 2; if (a + 0 == 2) { print a * 1 }");
    let (condition, body) = match ast.kind(ast.roots[1]) {
        NodeKind::If { condition, body } => (*condition, *body),
        other => panic!("expected if, got {:?}", other),
    };
    // a + 0 == 2 becomes a == 2.
    let NodeKind::Binary { left, .. } = ast.kind(condition) else {
        panic!("expected binary condition");
    };
    assert!(matches!(ast.kind(*left), NodeKind::Var { .. }));
    // print a * 1 becomes print a.
    let print_stmt = ast.block_statements(body)[0];
    let NodeKind::Print { expr } = ast.kind(print_stmt) else {
        panic!("expected print");
    };
    assert!(matches!(ast.kind(*expr), NodeKind::Var { .. }));
}

#[test]
fn test_float_neutrals_fold() {
    let ast = optimize_algebraic("var x : float = 2.5 + 0.0; var y : float = 2.5 / 1.0");
    use calyx_par::Lit;
    assert!(matches!(
        ast.kind(value_of_root(&ast, 0)),
        NodeKind::Lit { value: Lit::Float(v) } if *v == 2.5
    ));
    assert!(matches!(
        ast.kind(value_of_root(&ast, 1)),
        NodeKind::Lit { value: Lit::Float(v) } if *v == 2.5
    ));
}
