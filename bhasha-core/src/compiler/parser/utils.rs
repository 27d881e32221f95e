use super::super::lexer::token_kind::TokenKind;
use super::expr::BinaryOp;

/// 算术运算符优先级（0 表示不是算术二元运算符）
pub fn get_precedence(op: TokenKind) -> i32 {
    match op {
        TokenKind::Plus | TokenKind::Minus => 200,
        TokenKind::Star | TokenKind::Slash | TokenKind::DoubleSlash | TokenKind::Percent => 300,
        _ => 0,
    }
}

/// 获取运算符结合性
///
/// Returns: `true` 表示左结合，`false` 表示右结合
pub fn get_associativity(op: TokenKind) -> bool {
    !matches!(op, TokenKind::DoubleStar)
}

pub fn binary_op(op: TokenKind) -> Option<BinaryOp> {
    let op = match op {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::DoubleSlash => BinaryOp::FloorDiv,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::DoubleStar => BinaryOp::Pow,
        _ => return None,
    };
    Some(op)
}

/// 能开始一个表达式的 token（用于"缺少逗号"提示）
pub fn starts_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Identifier
            | TokenKind::Integer
            | TokenKind::Float
            | TokenKind::String
            | TokenKind::FString
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None
            | TokenKind::LeftParen
            | TokenKind::LeftBracket
            | TokenKind::LeftBrace
    )
}
