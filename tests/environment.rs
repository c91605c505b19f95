mod environment_tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use treelox::environment::Environment;
    use treelox::token::{Token, TokenType};
    use treelox::value::Value;

    fn identifier(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 0)
    }

    fn shared(env: Environment) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(env))
    }

    #[test]
    fn fresh_environment_is_empty() {
        let env = Environment::new();

        assert_eq!(env.count(), 0);
        assert_eq!(env.count_all(), 0);
    }

    #[test]
    fn empty_child_of_empty_parent_counts_zero() {
        let parent = shared(Environment::new());
        let child = Environment::with_enclosing(parent);

        assert_eq!(child.count(), 0);
        assert_eq!(child.count_all(), 0);
    }

    #[test]
    fn child_sees_parent_binding() {
        let parent = shared(Environment::new());
        parent.borrow_mut().define("one", Some(Value::Number(1.0)));

        let child = Environment::with_enclosing(parent);

        assert_eq!(child.count(), 0);
        assert_eq!(child.count_all(), 1);
        assert_eq!(child.get(&identifier("one")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn child_bindings_do_not_bleed_into_parent() {
        let parent = shared(Environment::new());

        {
            let mut child = Environment::with_enclosing(parent.clone());
            child.define("two", Some(Value::Number(2.0)));
            assert_eq!(child.count(), 1);
        }

        assert_eq!(parent.borrow().count(), 0);
        assert!(parent.borrow().get(&identifier("two")).is_err());
    }

    #[test]
    fn declared_but_unassigned_read_fails() {
        let mut env = Environment::new();
        env.define("x", None);

        let err = env.get(&identifier("x")).unwrap_err();
        assert!(err.to_string().contains("Uninitialized variable 'x'"));
    }

    #[test]
    fn assignment_initializes_a_declared_variable() {
        let mut env = Environment::new();
        env.define("x", None);

        env.assign(&identifier("x"), Value::Number(5.0)).unwrap();

        assert_eq!(env.get(&identifier("x")).unwrap(), Value::Number(5.0));
    }

    #[test]
    fn assignment_never_creates_bindings() {
        let mut env = Environment::new();

        let err = env
            .assign(&identifier("ghost"), Value::Nil)
            .unwrap_err();
        assert!(err.to_string().contains("Undefined variable 'ghost'"));
    }

    #[test]
    fn assignment_walks_the_chain() {
        let parent = shared(Environment::new());
        parent.borrow_mut().define("n", Some(Value::Number(1.0)));

        let mut child = Environment::with_enclosing(parent.clone());
        child.assign(&identifier("n"), Value::Number(2.0)).unwrap();

        assert_eq!(
            parent.borrow().get(&identifier("n")).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn get_at_walks_exactly_the_given_distance() {
        let grandparent = shared(Environment::new());
        grandparent
            .borrow_mut()
            .define("v", Some(Value::Str("outer".to_string())));

        let parent = shared(Environment::with_enclosing(grandparent));
        parent
            .borrow_mut()
            .define("v", Some(Value::Str("middle".to_string())));

        let child = shared(Environment::with_enclosing(parent));

        assert_eq!(
            Environment::get_at(&child, 1, &identifier("v")).unwrap(),
            Value::Str("middle".to_string())
        );
        assert_eq!(
            Environment::get_at(&child, 2, &identifier("v")).unwrap(),
            Value::Str("outer".to_string())
        );
    }

    #[test]
    fn assign_at_overwrites_the_addressed_frame() {
        let parent = shared(Environment::new());
        parent.borrow_mut().define("v", Some(Value::Number(1.0)));

        let child = shared(Environment::with_enclosing(parent.clone()));

        Environment::assign_at(&child, 1, &identifier("v"), Value::Number(9.0)).unwrap();

        assert_eq!(
            parent.borrow().get(&identifier("v")).unwrap(),
            Value::Number(9.0)
        );
    }
}
