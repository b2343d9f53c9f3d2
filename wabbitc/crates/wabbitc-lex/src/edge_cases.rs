//! Edge case tests for wabbitc-lex.

#[cfg(test)]
mod tests {
    use crate::{scan_tokens, LexError, TokenKind};

    #[test]
    fn test_edge_empty_source() {
        let tokens = scan_tokens("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].line, 1);
    }

    #[test]
    fn test_edge_whitespace_only() {
        let tokens = scan_tokens("  \t\r\n  \n").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_edge_maximal_munch() {
        // "<==" is "<=" followed by "=".
        let tokens = scan_tokens("<==").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::LessEq);
        assert_eq!(tokens[1].kind, TokenKind::Eq);
    }

    #[test]
    fn test_edge_unterminated_char() {
        assert_eq!(
            scan_tokens("'a").unwrap_err(),
            LexError::UnterminatedChar { line: 1 }
        );
        assert_eq!(
            scan_tokens("'").unwrap_err(),
            LexError::UnterminatedChar { line: 1 }
        );
    }

    #[test]
    fn test_edge_unterminated_block_comment() {
        assert_eq!(
            scan_tokens("/* no close").unwrap_err(),
            LexError::UnterminatedComment { line: 1 }
        );
    }

    #[test]
    fn test_edge_block_comment_star_run() {
        // A run of stars before the closing slash still terminates.
        let tokens = scan_tokens("/***/ 7").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Int);
    }

    #[test]
    fn test_edge_comment_at_eof_without_newline() {
        let tokens = scan_tokens("// trailing").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_edge_long_identifier() {
        let name = "x".repeat(4096);
        let tokens = scan_tokens(&name).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme, name);
    }

    #[test]
    fn test_edge_unicode_identifier() {
        let tokens = scan_tokens("αβγ_1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].lexeme, "αβγ_1");
    }

    #[test]
    fn test_edge_keyword_prefix_is_identifier() {
        let tokens = scan_tokens("constant breaker iffy").unwrap();
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Ident));
    }

    #[test]
    fn test_edge_char_across_newline_keeps_start_line() {
        let tokens = scan_tokens("\n\n'x'").unwrap();
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_edge_adjacent_tokens_without_spaces() {
        let tokens = scan_tokens("x=x+1;").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Int,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }
}
