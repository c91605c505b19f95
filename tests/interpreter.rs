mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use treelox::diag::Diagnostics;
    use treelox::error::{LoxError, Result};
    use treelox::interpreter::Interpreter;

    /// `print` sink shared between the test and the interpreter.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Run the whole pipeline over `source`, capturing `print` output.
    fn run_source(source: &str) -> (String, Result<()>, Diagnostics) {
        let buf = SharedBuf::default();
        let mut interpreter = Interpreter::with_output(Box::new(buf.clone()));
        let mut diag = Diagnostics::new();

        let result = treelox::run(source.as_bytes(), &mut interpreter, &mut diag);

        let output = String::from_utf8(buf.0.borrow().clone()).expect("print output is UTF-8");
        (output, result, diag)
    }

    /// Expect a clean run and return stdout.
    fn output_of(source: &str) -> String {
        let (output, result, diag) = run_source(source);

        assert!(!diag.had_error(), "unexpected diagnostics for {:?}", source);
        result.expect("program should run without runtime errors");
        output
    }

    /// Expect a runtime error and return it.
    fn runtime_error_of(source: &str) -> LoxError {
        let (_, result, diag) = run_source(source);

        assert!(!diag.had_error(), "expected no static errors");
        result.expect_err("program should fail at runtime")
    }

    // ── printing & arithmetic ────────────────────────────────────────────

    #[test]
    fn prints_integral_numbers_without_decimal_suffix() {
        assert_eq!(output_of("print 1;"), "1\n");
    }

    #[test]
    fn prints_fractional_numbers_verbatim() {
        assert_eq!(output_of("print 3.5;"), "3.5\n");
    }

    #[test]
    fn prints_strings_without_quotes() {
        assert_eq!(output_of("print \"abc\";"), "abc\n");
    }

    #[test]
    fn prints_nil_and_booleans() {
        assert_eq!(output_of("print nil; print true; print false;"), "nil\ntrue\nfalse\n");
    }

    #[test]
    fn empty_program_prints_nothing() {
        assert_eq!(output_of(""), "");
    }

    #[test]
    fn variable_holds_computed_value() {
        assert_eq!(output_of("var name = 1.0 + 3.0; print name;"), "4\n");
    }

    #[test]
    fn redeclaring_a_global_takes_the_latest_value() {
        let src = "var name = 1.0 + 3.0;\nvar name = 2.0 + 3.0;\nprint name;";
        assert_eq!(output_of(src), "5\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn mixed_operand_plus_is_a_type_error() {
        let err = runtime_error_of("print 1 + \"one\";");
        assert!(err
            .to_string()
            .contains("Operands must be two numbers or two strings"));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let err = runtime_error_of("print 1 / 0;");
        assert!(err.to_string().contains("Division by zero"));
    }

    #[test]
    fn comparison_requires_numbers() {
        let err = runtime_error_of("print \"a\" < \"b\";");
        assert!(err.to_string().contains("Operands must be numbers"));
    }

    #[test]
    fn equality_is_defined_for_any_pair() {
        let src = "print nil == nil; print nil == 0; print 1 == \"1\"; print \"a\" == \"a\";";
        assert_eq!(output_of(src), "true\nfalse\nfalse\ntrue\n");
    }

    #[test]
    fn truthiness_treats_zero_and_empty_string_as_true() {
        let src = "if (0) print \"zero\"; if (\"\") print \"empty\"; if (nil) print \"nil\";";
        assert_eq!(output_of(src), "zero\nempty\n");
    }

    #[test]
    fn logical_operators_yield_the_deciding_operand() {
        let src = "print \"hi\" or 2; print nil or \"yes\"; print nil and 2; print 1 and 2;";
        assert_eq!(output_of(src), "hi\nyes\nnil\n2\n");
    }

    #[test]
    fn logical_operators_short_circuit_side_effects() {
        let src = r#"
            fun boom() { print "boom"; return true; }
            var x = false and boom();
            var y = true or boom();
            print x; print y;
        "#;
        assert_eq!(output_of(src), "false\ntrue\n");
    }

    // ── variables & scoping ──────────────────────────────────────────────

    #[test]
    fn reading_an_uninitialized_variable_fails() {
        let err = runtime_error_of("var x; print x;");
        assert!(err.to_string().contains("Uninitialized variable 'x'"));
    }

    #[test]
    fn uninitialized_variable_is_readable_after_assignment() {
        assert_eq!(output_of("var x; x = 7; print x;"), "7\n");
    }

    #[test]
    fn block_locals_do_not_leak() {
        let err = runtime_error_of("{ var a = 1; } print a;");
        assert!(err.to_string().contains("Undefined variable 'a'"));
    }

    #[test]
    fn inner_declaration_shadows_outer() {
        let src = r#"
            var a = "outer";
            {
                var a = "inner";
                print a;
            }
            print a;
        "#;
        assert_eq!(output_of(src), "inner\nouter\n");
    }

    #[test]
    fn assignment_in_block_mutates_the_outer_binding() {
        let src = "var a = 1; { a = 2; } print a;";
        assert_eq!(output_of(src), "2\n");
    }

    // ── functions & closures ─────────────────────────────────────────────

    #[test]
    fn function_call_binds_parameters_positionally() {
        let src = "fun add(a, b) { return a + b; } print add(1, 2);";
        assert_eq!(output_of(src), "3\n");
    }

    #[test]
    fn function_without_return_yields_nil() {
        assert_eq!(output_of("fun noop() {} print noop();"), "nil\n");
    }

    #[test]
    fn return_short_circuits_the_body() {
        let src = r#"
            fun f() {
                return "early";
                print "unreachable";
            }
            print f();
        "#;
        assert_eq!(output_of(src), "early\n");
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error() {
        let err = runtime_error_of("fun f(a) { return a; } f(1, 2);");
        assert!(err.to_string().contains("Expected 1 arguments but got 2"));
    }

    #[test]
    fn calling_a_non_callable_fails() {
        let err = runtime_error_of("var x = 3; x();");
        assert!(err.to_string().contains("Can only call functions and classes"));
    }

    #[test]
    fn closure_retains_its_defining_environment() {
        let src = r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = makeCounter();
            print counter();
            print counter();
        "#;
        assert_eq!(output_of(src), "1\n2\n");
    }

    #[test]
    fn closures_share_the_captured_binding() {
        let src = r#"
            var get;
            var set;
            {
                var shared = 1;
                fun read() { return shared; }
                fun write(v) { shared = v; }
                get = read;
                set = write;
            }
            set(42);
            print get();
        "#;
        assert_eq!(output_of(src), "42\n");
    }

    #[test]
    fn closure_sees_its_binding_not_a_later_shadow() {
        let src = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;
        assert_eq!(output_of(src), "global\nglobal\n");
    }

    #[test]
    fn recursion_works_through_the_declaring_scope() {
        let src = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);
        "#;
        assert_eq!(output_of(src), "55\n");
    }

    // ── control flow ─────────────────────────────────────────────────────

    #[test]
    fn while_loop_runs_until_condition_fails() {
        let src = "var i = 0; while (i < 3) { print i; i = i + 1; }";
        assert_eq!(output_of(src), "0\n1\n2\n");
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let src = "for (var i = 0; i < 3; i = i + 1) print i;";
        assert_eq!(output_of(src), "0\n1\n2\n");
    }

    #[test]
    fn break_terminates_only_the_enclosing_loop() {
        let src = r#"
            var total = 0;
            var i = 0;
            while (i < 3) {
                var j = 0;
                while (true) {
                    j = j + 1;
                    if (j > 1) break;
                    total = total + 1;
                }
                i = i + 1;
            }
            print total;
        "#;
        assert_eq!(output_of(src), "3\n");
    }

    #[test]
    fn break_exits_an_infinite_loop() {
        let src = r#"
            var i = 0;
            while (true) {
                i = i + 1;
                if (i > 2) break;
            }
            print i;
        "#;
        assert_eq!(output_of(src), "3\n");
    }

    #[test]
    fn runtime_error_aborts_remaining_statements() {
        let (output, result, _) = run_source("print 1; print 1 / 0; print 2;");

        assert!(result.is_err());
        assert_eq!(output, "1\n"); // the statement after the error never ran
    }

    // ── classes & instances ──────────────────────────────────────────────

    #[test]
    fn class_instantiation_runs_init_with_arguments() {
        let src = r#"
            class Greeter {
                init(name) {
                    this.name = name;
                }
                greet() {
                    return "Hello, " + this.name;
                }
            }
            var g = Greeter("World");
            print g.greet();
        "#;
        assert_eq!(output_of(src), "Hello, World\n");
    }

    #[test]
    fn initializer_always_yields_the_instance() {
        let src = r#"
            class Thing {
                init() {
                    this.ready = true;
                    return;
                }
            }
            print Thing();
        "#;
        assert_eq!(output_of(src), "Thing instance\n");
    }

    #[test]
    fn fields_are_set_and_read_per_instance() {
        let src = r#"
            class Box {}
            var a = Box();
            var b = Box();
            a.value = 1;
            b.value = 2;
            print a.value;
            print b.value;
        "#;
        assert_eq!(output_of(src), "1\n2\n");
    }

    #[test]
    fn fields_shadow_methods() {
        let src = r#"
            class C {
                label() { return "method"; }
            }
            var c = C();
            print c.label();
            c.label = "field";
            print c.label;
        "#;
        assert_eq!(output_of(src), "method\nfield\n");
    }

    #[test]
    fn undefined_property_is_a_runtime_error() {
        let err = runtime_error_of("class C {} var c = C(); c.missing();");
        assert!(err.to_string().contains("Undefined property 'missing'"));
    }

    #[test]
    fn methods_bind_this_to_their_receiver() {
        let src = r#"
            class Counter {
                init() { this.n = 0; }
                bump() { this.n = this.n + 1; return this.n; }
            }
            var c = Counter();
            c.bump();
            print c.bump();
        "#;
        assert_eq!(output_of(src), "2\n");
    }

    #[test]
    fn bound_methods_keep_their_receiver() {
        let src = r#"
            class Speaker {
                init(word) { this.word = word; }
                speak() { print this.word; }
            }
            var hi = Speaker("hi").speak;
            hi();
        "#;
        assert_eq!(output_of(src), "hi\n");
    }

    #[test]
    fn class_methods_are_callable_on_the_class() {
        let src = r#"
            class Math {
                class square(n) { return n * n; }
            }
            print Math.square(3);
        "#;
        assert_eq!(output_of(src), "9\n");
    }

    #[test]
    fn class_methods_are_reachable_through_instances() {
        let src = r#"
            class Math {
                class square(n) { return n * n; }
            }
            var m = Math();
            print m.square(4);
        "#;
        assert_eq!(output_of(src), "16\n");
    }

    #[test]
    fn constructor_arity_comes_from_init() {
        let err = runtime_error_of("class P { init(x, y) {} } P(1);");
        assert!(err.to_string().contains("Expected 2 arguments but got 1"));
    }

    #[test]
    fn setting_fields_on_non_instances_fails() {
        let err = runtime_error_of("var x = 1; x.field = 2;");
        assert!(err.to_string().contains("Only instances have fields"));
    }

    // ── native functions ─────────────────────────────────────────────────

    #[test]
    fn clock_returns_a_number() {
        // Indirect check: numbers compare with themselves and are positive.
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }
}
