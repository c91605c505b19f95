mod scanner_tests {
    use treelox::diag::Diagnostics;
    use treelox::scanner::{scan, Scanner};
    use treelox::token::TokenType;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn empty_input_yields_only_eof() {
        assert_token_sequence("", &[(TokenType::EOF, "")]);
    }

    #[test]
    fn line_comment_is_ignored() {
        assert_token_sequence("// var name", &[(TokenType::EOF, "")]);
    }

    #[test]
    fn line_comment_ends_at_newline() {
        assert_token_sequence(
            "// var name\nvar name",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "name"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn punctuation_sequence() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn two_character_operators_use_maximal_munch() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "class break this while whileish",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::BREAK, "break"),
                (TokenType::THIS, "this"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "whileish"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn number_literals() {
        let scanner = Scanner::new(b"12 3.5 7.");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        // "7." is a number followed by a DOT: no leading/trailing-dot floats.
        assert_eq!(tokens.len(), 5);
        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 12.0));
        assert!(matches!(tokens[1].token_type, TokenType::NUMBER(n) if (n - 3.5).abs() < 1e-9));
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 7.0));
        assert_eq!(tokens[3].token_type, TokenType::DOT);
        assert_eq!(tokens[4].token_type, TokenType::EOF);
    }

    #[test]
    fn string_literal_spans_lines() {
        let scanner = Scanner::new(b"\"one\ntwo\" x");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "one\ntwo"));

        // The identifier after the closing quote sits on line 2.
        assert_eq!(tokens[1].token_type, TokenType::IDENTIFIER);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn block_comments_nest() {
        assert_token_sequence(
            "/* outer /* inner */ still comment */ var x",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let mut diag = Diagnostics::new();
        let tokens = scan(b"var a; /* no end", &mut diag);

        assert!(diag.had_error());
        assert!(diag
            .iter()
            .any(|e| e.to_string().contains("Unterminated block comment")));

        // The tokens before the comment survive, and EOF is still emitted.
        assert_eq!(tokens[0].token_type, TokenType::VAR);
        assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut diag = Diagnostics::new();
        let tokens = scan(b"\"oops", &mut diag);

        assert!(diag.had_error());
        assert!(diag
            .iter()
            .any(|e| e.to_string().contains("Unterminated string")));
        assert_eq!(tokens.len(), 1); // only EOF
        assert_eq!(tokens[0].token_type, TokenType::EOF);
    }

    #[test]
    fn scanning_continues_past_unexpected_characters() {
        let mut diag = Diagnostics::new();
        let tokens = scan(b",.$(#", &mut diag);

        assert_eq!(diag.len(), 2); // '$' and '#'

        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::COMMA,
                TokenType::DOT,
                TokenType::LEFT_PAREN,
                TokenType::EOF,
            ]
        );
    }

    #[test]
    fn line_numbers_track_newlines() {
        let scanner = Scanner::new(b"var a;\n\nvar b;");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[3].line, 3); // second `var`
    }
}
