//! Lexer 构建入口

use super::error::LexerError;
use super::scanner::Scanner;
use super::token_kind::TokenKind;
use crate::kit::lexer::Token;

/// 对规范源码做词法分析
pub fn tokenize(source: &str) -> Result<Vec<Token<TokenKind>>, LexerError> {
    Scanner::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::error::LexerErrorKind;

    fn lex_all(input: &str) -> Vec<(TokenKind, Option<String>)> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex_all(input).into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_lexer_tokenizes_keywords() {
        let code = "def if elif else while for return True False None";
        let expected = vec![
            TokenKind::Def,
            TokenKind::If,
            TokenKind::Elif,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::For,
            TokenKind::Return,
            TokenKind::True,
            TokenKind::False,
            TokenKind::None,
            TokenKind::Newline,
            TokenKind::Eof,
        ];
        assert_eq!(kinds(code), expected);
    }

    #[test]
    fn test_lexer_tokenizes_operators() {
        let tokens = kinds("+ - * / // % ** == != <= >= = < > += //=");
        assert_eq!(
            &tokens[..16],
            &[
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::DoubleSlash,
                TokenKind::Percent,
                TokenKind::DoubleStar,
                TokenKind::EqualEqual,
                TokenKind::NotEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Equal,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::PlusEqual,
                TokenKind::DoubleSlashEqual,
            ]
        );
    }

    #[test]
    fn test_lexer_tokenizes_numbers() {
        let tokens = lex_all("12345 3.5 1_000 2e3 .5");
        assert_eq!(tokens[0], (TokenKind::Integer, Some("12345".to_string())));
        assert_eq!(tokens[1], (TokenKind::Float, Some("3.5".to_string())));
        assert_eq!(tokens[2], (TokenKind::Integer, Some("1000".to_string())));
        assert_eq!(tokens[3], (TokenKind::Float, Some("2e3".to_string())));
        assert_eq!(tokens[4], (TokenKind::Float, Some(".5".to_string())));
    }

    #[test]
    fn test_lexer_tokenizes_strings() {
        let tokens = lex_all(r#""hello\nworld" 'x' r"a\n" f"{x}""#);
        assert_eq!(tokens[0], (TokenKind::String, Some("hello\nworld".to_string())));
        assert_eq!(tokens[1], (TokenKind::String, Some("x".to_string())));
        assert_eq!(tokens[2], (TokenKind::String, Some("a\\n".to_string())));
        assert_eq!(tokens[3], (TokenKind::FString, Some("{x}".to_string())));
    }

    #[test]
    fn test_lexer_triple_quoted_string() {
        let tokens = lex_all("\"\"\"line1\nline2\"\"\"");
        assert_eq!(tokens[0], (TokenKind::String, Some("line1\nline2".to_string())));
    }

    #[test]
    fn test_lexer_devanagari_identifier() {
        let tokens = lex_all("नाम = 'राम'");
        assert_eq!(tokens[0], (TokenKind::Identifier, Some("नाम".to_string())));
        assert_eq!(tokens[1].0, TokenKind::Equal);
        assert_eq!(tokens[2], (TokenKind::String, Some("राम".to_string())));
    }

    #[test]
    fn test_lexer_indentation() {
        let code = "if x:\n    y = 1\n    # comment\n\nz = 2\n";
        assert_eq!(
            kinds(code),
            vec![
                TokenKind::If,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Newline,
                TokenKind::Indent,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Dedent,
                TokenKind::Identifier,
                TokenKind::Equal,
                TokenKind::Integer,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_implicit_line_joining() {
        let code = "x = (1 +\n     2)\n";
        let tokens = kinds(code);
        assert_eq!(tokens.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
        assert!(!tokens.contains(&TokenKind::Indent));
    }

    #[test]
    fn test_lexer_unclosed_paren() {
        let err = tokenize("print(\"hi\"\n").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::NeverClosed('('));
        assert_eq!(err.message(), "'(' was never closed");
        assert_eq!(err.line(), 1);
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let err = tokenize("x = 1\nprint(\"hi)\n").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnterminatedString { detected_line: 2 });
    }

    #[test]
    fn test_lexer_mismatched_bracket() {
        let err = tokenize("x = [1, 2)").unwrap_err();
        assert_eq!(
            err.message(),
            "closing parenthesis ')' does not match opening parenthesis '['"
        );
        let err = tokenize("x = 1)").unwrap_err();
        assert_eq!(err.message(), "unmatched ')'");
    }

    #[test]
    fn test_lexer_bad_dedent() {
        let err = tokenize("if x:\n    y\n  z\n").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::InconsistentDedent);
    }

    #[test]
    fn test_lexer_invalid_character() {
        let err = tokenize("x = 1।").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::InvalidCharacter('।'));
    }

    #[test]
    fn test_lexer_invalid_number() {
        let err = tokenize("x = 1abc").unwrap_err();
        assert_eq!(err.message(), "invalid decimal literal");
        let err = tokenize("x = 007").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::LeadingZeros);
    }

    #[test]
    fn test_lexer_nesting_limit() {
        let source = format!("x = {}1{}", "(".repeat(250), ")".repeat(250));
        let err = tokenize(&source).unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::TooDeeplyNested);
        assert_eq!(err.message(), "too many nested parentheses");
        assert!(tokenize(&format!("x = {}1{}", "[".repeat(50), "]".repeat(50))).is_ok());
    }
}
