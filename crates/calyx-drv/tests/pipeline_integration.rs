//! End-to-end pipeline tests.
//!
//! Each scenario runs with and without the optimization pipeline and the
//! observable output must match byte for byte.

use calyx_drv::{run_source, PipelineError, RunOptions};

const OPTIMIZED: RunOptions = RunOptions {
    optimize: true,
    emit_ast: false,
};
const PLAIN: RunOptions = RunOptions {
    optimize: false,
    emit_ast: false,
};
const DUMP: RunOptions = RunOptions {
    optimize: true,
    emit_ast: true,
};

/// Output with and without optimization must be identical.
fn assert_equivalent(source: &str) -> String {
    let plain = run_source(source, PLAIN).expect("unoptimized run failed");
    let optimized = run_source(source, OPTIMIZED).expect("optimized run failed");
    assert_eq!(plain, optimized, "optimization changed observable output");
    optimized
}

#[test]
fn test_fibonacci_scenario() {
    let source = "
        var n : int = 10;
        def fib(n : int) : int {
            var a : int = 1;
            var b : int = 1;
            var i : int = 1;
            while (i < n) {
                print b;
                var tmp : int = a;
                a = b;
                b = tmp + b;
                i = i + 1
            }
            return b
        }
        print fib(n)
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "1\n1\n2\n3\n5\n8\n13\n21\n34\n55\n");
}

#[test]
fn test_closure_capture_scenario() {
    let source = "
        var a : string = 'global';
        {
            def showA() {
                print a
            }
            showA();
            var a : string = 'block';
            showA()
        }
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "global\nglobal\n");
}

#[test]
fn test_common_subexpression_with_reassignment_scenario() {
    let source = "
        var b : int = 2;
        var c : int = 4;
        var a : int = b + c;
        var d : int = 8;
        b = a - d;
        c = b + c;
        d = a - d;
        assert b == d;
        assert b == -2;
        assert c == 2
    ";
    assert_equivalent(source);
}

#[test]
fn test_loop_condition_feedback_scenario() {
    let source = "
        var i : int = 1;
        var x : int = 7;
        var y : int = x - 2;
        while (i < x - 2) {
            i = i + 2
        }
        assert i == y;
        assert i == 5
    ";
    assert_equivalent(source);
}

#[test]
fn test_unused_local_in_loop_scenario() {
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
    let output = assert_equivalent(source);
    assert_eq!(output, "1\n2\n4\n8\n16\n32\n64\n128\n256\n512\n");
    // The useless x really is gone from the optimized tree.
    let dump = run_source(source, DUMP).expect("dump failed");
    assert!(!dump.contains("var-decl x"));
    assert!(!dump.contains("assign x"));
}

#[test]
fn test_algebraic_scenario() {
    let source = "
        var x : int = 1 + 0;
        x = x * 1;
        x = 0 + x;
        x = x ** 1;
        x = 1 - 0;
        print x
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "1\n");
}

#[test]
fn test_gcd_scenario() {
    let source = "
        def gcd(a : int, b : int) : int {
            if (a < b) {
                var tmp : int = a;
                a = b;
                b = tmp
            }
            if (b == 0) {
                return a
            }
            return gcd(b, a % b)
        }
        assert gcd(14, 21) == 7
    ";
    assert_equivalent(source);
}

#[test]
fn test_overloaded_operators_scenario() {
    let source = "
        var x : string = 'a';
        print x + 'lamakota';
        var y : int = 0;
        print y + 12
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "alamakota\n12\n");
}

#[test]
fn test_conversions_scenario() {
    let source = "
        var x : int = -1;
        var y : float = tofloat(x);
        print y
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "-1.0\n");
}

#[test]
fn test_nested_function_scenario() {
    let source = "
        def fun(i : int) : int {
            var x : int = 3;
            def fun2(y : int) : int {
                print 'called inner fun with y = ' + tostring(y);
                return x * y
            }
            return fun2(i)
        }
        print fun(2)
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "called inner fun with y = 2\n6\n");
}

#[test]
fn test_effectful_calls_survive_scenario() {
    let source = "
        def useful() : int {
            print 'totally useless';
            return 1
        }
        var x : int = 1;
        useful();
        var y : int = useful();
        print x;
        y = y + 2
    ";
    let output = assert_equivalent(source);
    assert_eq!(output, "totally useless\ntotally useless\n1\n");
}

#[test]
fn test_determinism_of_optimized_ast() {
    let source = "
        var n : int = 10;
        def fib(n : int) : int {
            var a : int = 1;
            var b : int = 1;
            var i : int = 1;
            while (i < n) {
                print b;
                var tmp : int = a;
                a = b;
                b = tmp + b;
                i = i + 1
            }
            return b
        }
        print fib(n)
    ";
    let first = run_source(source, DUMP).expect("first dump failed");
    let second = run_source(source, DUMP).expect("second dump failed");
    assert_eq!(first, second, "pipeline must be deterministic");
    assert!(!first.is_empty());
}

#[test]
fn test_assert_only_programs_run_clean() {
    let programs = [
        "assert 2 ** 3 == 8",
        "assert 2 ** 3 * 4 == 32",
        "assert -2 ** 2 == 4",
        "assert 'a' + 'b' == 'ab'",
        "assert 1 < 2;\nassert 2 <= 2;\nassert 3 > 2;\nassert 3 >= 3;\nassert 1 != 2",
        "var x : int = 1;\n{ assert x + 1 == 2;\nvar y : int = 2;\n{ assert x + y == 3 } }\nassert x == 1",
    ];
    for program in programs {
        assert_equivalent(program);
    }
}

#[test]
fn test_syntax_error_is_reported_not_run() {
    let err = run_source("var x : = 3; print 'should not run'", OPTIMIZED).unwrap_err();
    match err {
        PipelineError::Syntax(diagnostics) => assert!(!diagnostics.is_empty()),
        other => panic!("expected syntax error, got {}", other),
    }
}

#[test]
fn test_resolution_error_is_fatal() {
    assert!(matches!(
        run_source("print ghost", OPTIMIZED),
        Err(PipelineError::Resolve(_))
    ));
}

#[test]
fn test_type_error_is_fatal() {
    assert!(matches!(
        run_source("var x : int = 'nope'", OPTIMIZED),
        Err(PipelineError::Type(_))
    ));
}

#[test]
fn test_runtime_error_is_fatal() {
    assert!(matches!(
        run_source("assert 1 == 2", OPTIMIZED),
        Err(PipelineError::Runtime(_))
    ));
}
