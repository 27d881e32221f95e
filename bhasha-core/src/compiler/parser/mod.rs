pub mod error;
pub mod expr;
mod module;
pub mod parser;
pub mod stmt;
mod utils;

// 重新导出常用类型
pub use error::{ErrorLocation, ParseResult, ParserError, ParserErrorKind};
pub use expr::{Argument, BinaryOp, CompareOp, Expr, ExprKind, FStringPart, LogicalOp, UnaryOp};
pub use module::Program;
pub use stmt::{Block, Stmt, StmtKind};

#[cfg(test)]
mod tests {
    use super::parser::Parser;
    use super::*;
    use crate::compiler::lexer::tokenize;

    fn parse(source: &str) -> ParseResult<Program> {
        let tokens = tokenize(source).expect("lexing should succeed");
        Parser::new(tokens).parse()
    }

    fn parse_err(source: &str) -> ParserError {
        parse(source).expect_err("expected a syntax error")
    }

    fn single_expr(source: &str) -> Expr {
        let program = parse(source).unwrap();
        match &program.body[0].kind {
            StmtKind::Expr(e) => e.expression.clone(),
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_print_call() {
        let program = parse("print(\"नमस्ते\")\n").unwrap();
        assert_eq!(program.body.len(), 1);
        assert_eq!(program.body[0].line, 1);
        assert!(matches!(*single_expr("print(1)"), ExprKind::FunctionCall(_)));
    }

    #[test]
    fn test_operator_precedence() {
        let expr = single_expr("1 + 2 * 3");
        assert_eq!(expr.to_string(), "(1 Add (2 Mul 3))");
        let expr = single_expr("-2 ** 2");
        assert_eq!(expr.to_string(), "(Neg (2 Pow 2))");
        let expr = single_expr("2 ** 3 ** 2");
        assert_eq!(expr.to_string(), "(2 Pow (3 Pow 2))");
        let expr = single_expr("10 - 3 - 2");
        assert_eq!(expr.to_string(), "((10 Sub 3) Sub 2)");
    }

    #[test]
    fn test_comparison_chain_and_membership() {
        let expr = single_expr("1 < x <= 3");
        assert_eq!(expr.to_string(), "(1 < x <= 3)");
        let expr = single_expr("a not in b");
        assert_eq!(expr.to_string(), "(a not in b)");
        let expr = single_expr("a is not None");
        assert_eq!(expr.to_string(), "(a is not None)");
    }

    #[test]
    fn test_if_elif_else() {
        let program = parse("if x:\n    a = 1\nelif y:\n    a = 2\nelse:\n    a = 3\n").unwrap();
        let StmtKind::If(stmt) = &program.body[0].kind else {
            panic!("expected if statement");
        };
        assert_eq!(stmt.then_body.len(), 1);
        assert_eq!(stmt.elif_conditions.len(), 1);
        assert!(stmt.else_body.is_some());
    }

    #[test]
    fn test_def_with_defaults_and_return() {
        let program = parse("def f(a, b=2):\n    return a + b\n").unwrap();
        let StmtKind::FunctionDef(def) = &program.body[0].kind else {
            panic!("expected function definition");
        };
        assert_eq!(def.name, "f");
        assert_eq!(def.params.len(), 2);
        assert!(def.params[1].default.is_some());
        assert_eq!(def.body[0].line, 2);
    }

    #[test]
    fn test_class_with_methods() {
        let source = "class A:\n    def __init__(self, x):\n        self.x = x\n    def get(self):\n        return self.x\n";
        let program = parse(source).unwrap();
        let StmtKind::ClassDef(class) = &program.body[0].kind else {
            panic!("expected class definition");
        };
        assert_eq!(class.name, "A");
        assert_eq!(class.body.len(), 2);
    }

    #[test]
    fn test_for_with_tuple_target() {
        let program = parse("for i, v in enumerate(xs):\n    print(i, v)\n").unwrap();
        let StmtKind::For(stmt) = &program.body[0].kind else {
            panic!("expected for statement");
        };
        assert!(matches!(*stmt.target, ExprKind::LiteralTuple(_)));
    }

    #[test]
    fn test_single_line_block_and_semicolons() {
        let program = parse("if x: a = 1; b = 2\n").unwrap();
        let StmtKind::If(stmt) = &program.body[0].kind else {
            panic!("expected if statement");
        };
        assert_eq!(stmt.then_body.len(), 2);
    }

    #[test]
    fn test_list_comprehension_and_dict() {
        assert!(matches!(
            *single_expr("[x * 2 for x in range(3) if x > 0]"),
            ExprKind::ListComp(_)
        ));
        let ExprKind::LiteralDict(dict) = *single_expr("{\"a\": 1, \"b\": 2,}") else {
            panic!("expected dict");
        };
        assert_eq!(dict.entries.len(), 2);
    }

    #[test]
    fn test_slices() {
        let ExprKind::IndexAccess(access) = *single_expr("xs[1:3]") else {
            panic!("expected index access");
        };
        assert!(matches!(*access.index, ExprKind::Slice(_)));
        assert_eq!(single_expr("xs[::-1]").to_string(), "xs[::(Neg 1)]");
    }

    #[test]
    fn test_fstring_parts() {
        let ExprKind::FString(fstring) = *single_expr("f\"नाम: {name!r} = {x:.2f} {{}}\"") else {
            panic!("expected f-string");
        };
        assert_eq!(fstring.parts.len(), 5);
        assert!(matches!(
            &fstring.parts[1],
            FStringPart::Interpolation { conversion: Some('r'), .. }
        ));
        assert!(matches!(
            &fstring.parts[3],
            FStringPart::Interpolation { spec: Some(s), .. } if s == ".2f"
        ));
        assert!(matches!(&fstring.parts[4], FStringPart::Literal(s) if s == " {}"));
    }

    #[test]
    fn test_adjacent_strings_concatenate() {
        let ExprKind::LiteralString(s) = *single_expr("\"ab\" 'cd'") else {
            panic!("expected string");
        };
        assert_eq!(s.value, "abcd");
    }

    #[test]
    fn test_missing_colon() {
        let err = parse_err("if x\n    pass\n");
        assert_eq!(err.message(), "expected ':'");
        assert_eq!(err.line(), Some(1));
    }

    #[test]
    fn test_assign_in_condition() {
        let err = parse_err("if x = 5:\n    pass\n");
        assert!(err.message().contains("Maybe you meant '=='"));
    }

    #[test]
    fn test_expected_indented_block() {
        let err = parse_err("def f():\nprint(1)\n");
        assert_eq!(
            err.message(),
            "expected an indented block after function definition on line 1"
        );
        assert_eq!(err.line(), Some(2));
        assert_eq!(err.exception().name(), "IndentationError");
    }

    #[test]
    fn test_unexpected_indent() {
        let err = parse_err("x = 1\n    y = 2\n");
        assert_eq!(err.message(), "unexpected indent");
        assert_eq!(err.exception().name(), "IndentationError");
    }

    #[test]
    fn test_forgot_comma() {
        let err = parse_err("print(\"a\" x)\n");
        assert_eq!(err.message(), "invalid syntax. Perhaps you forgot a comma?");
        let err = parse_err("[1 2]\n");
        assert_eq!(err.kind, ParserErrorKind::ForgotComma);
    }

    #[test]
    fn test_cannot_assign_to_literal() {
        let err = parse_err("5 = x\n");
        assert!(matches!(err.kind, ParserErrorKind::CannotAssign("literal")));
        let err = parse_err("f() = 1\n");
        assert!(matches!(err.kind, ParserErrorKind::CannotAssign("function call")));
    }

    #[test]
    fn test_control_flow_outside_context() {
        assert_eq!(parse_err("return 1\n").message(), "'return' outside function");
        assert_eq!(parse_err("break\n").message(), "'break' outside loop");
        // def 内部重新计数循环深度
        let err = parse_err("while True:\n    def f():\n        break\n");
        assert_eq!(err.kind, ParserErrorKind::BreakOutsideLoop);
    }

    #[test]
    fn test_parameter_rules() {
        let err = parse_err("def f(a=1, b):\n    pass\n");
        assert_eq!(err.kind, ParserErrorKind::NonDefaultAfterDefault);
        let err = parse_err("def f(a, a):\n    pass\n");
        assert_eq!(err.kind, ParserErrorKind::DuplicateArgument("a".to_string()));
        let err = parse_err("f(a=1, 2)\n");
        assert_eq!(err.kind, ParserErrorKind::PositionalAfterKeyword);
    }

    #[test]
    fn test_integer_too_large() {
        let err = parse_err("x = 99999999999999999999999\n");
        assert_eq!(err.exception().name(), "OverflowError");
    }

    #[test]
    fn test_fstring_errors() {
        assert!(parse_err("f\"{}\"\n").message().starts_with("f-string:"));
        assert!(parse_err("f\"a } b\"\n").message().contains("single '}'"));
    }

    #[test]
    fn test_stray_statements_on_one_line() {
        let err = parse_err("x = 5 y = 6\n");
        assert_eq!(err.kind, ParserErrorKind::InvalidSyntax);
    }

    #[test]
    fn test_deeply_nested_expressions_are_rejected() {
        let unary = format!("x = {}1\n", "-".repeat(100_000));
        let err = parse_err(&unary);
        assert_eq!(err.kind, ParserErrorKind::TooDeeplyNested);
        assert_eq!(err.exception().name(), "RecursionError");

        let negations = format!("x = {}True\n", "not ".repeat(50_000));
        assert_eq!(parse_err(&negations).kind, ParserErrorKind::TooDeeplyNested);

        let sum = format!("x = 1{}\n", " + 1".repeat(50_000));
        assert_eq!(parse_err(&sum).kind, ParserErrorKind::TooDeeplyNested);

        let calls = format!("f{}\n", "()".repeat(50_000));
        assert_eq!(parse_err(&calls).kind, ParserErrorKind::TooDeeplyNested);
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        assert!(parse(&format!("x = {}1\n", "-".repeat(50))).is_ok());
        assert!(parse(&format!("x = 1{}\n", " + 1".repeat(100))).is_ok());
    }

    #[test]
    fn test_imports() {
        let program = parse("import math\nfrom os import path, sep\n").unwrap();
        let StmtKind::Import(first) = &program.body[0].kind else {
            panic!("expected import");
        };
        assert_eq!(first.module_path, "math");
        let StmtKind::Import(second) = &program.body[1].kind else {
            panic!("expected import");
        };
        assert_eq!(second.items, vec!["path".to_string(), "sep".to_string()]);
    }
}
