use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use super::super::lexer::token_kind::TokenKind;
use super::super::lexer::tokenize;
use super::error::{ErrorLocation, ParseResult, ParserError, ParserErrorKind};
use super::expr::{
    Argument, Binary, Compare, CompareOp, Conditional, Expr, ExprKind, FStringExpr, FStringPart,
    FunctionCall, IndexAccess, ListComp, LiteralDict, LiteralFloat, LiteralInt, LiteralList,
    LiteralString, LiteralTuple, Logical, LogicalOp, MemberAccess, Slice, Unary, UnaryOp, VarRef,
};
use super::module::Program;
use super::stmt::{
    AssignStmt, AugAssignStmt, Block, ClassDef, ExprStmt, ForStmt, FunctionDef, IfStmt,
    ImportStmt, Param, ReturnStmt, Stmt, StmtKind, WhileStmt,
};
use super::utils::{binary_op, get_associativity, get_precedence, starts_expression};
use crate::kit::lexer::{SourcePosition, Token};

/// 表达式语法树的最大嵌套层数，与括号嵌套上限一致
const MAX_EXPRESSION_DEPTH: usize = 200;

pub struct Parser {
    tokens: Vec<Token<TokenKind>>,
    pos: usize,
    function_depth: usize,
    loop_depth: usize,
    expr_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token<TokenKind>>) -> Self {
        Self {
            tokens,
            pos: 0,
            function_depth: 0,
            loop_depth: 0,
            expr_depth: 0,
        }
    }

    /// 解析整个程序
    pub fn parse(&mut self) -> ParseResult<Program> {
        let mut body = Vec::new();
        while !self.check(TokenKind::Eof) {
            if self.match_token(TokenKind::Newline) {
                continue;
            }
            if self.check(TokenKind::Indent) {
                return Err(self.error_here(ParserErrorKind::UnexpectedIndent));
            }
            body.extend(self.parse_statement()?);
        }
        debug!(target: "bhasha::parser", statements = body.len(), "parsed program");
        Ok(Program { body })
    }

    // ===== token 工具 =====

    fn peek(&self) -> Option<&Token<TokenKind>> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    fn kind(&self) -> TokenKind {
        self.peek_kind(0)
    }

    fn peek_kind(&self, offset: usize) -> TokenKind {
        self.tokens
            .get(self.pos + offset)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn position(&self) -> SourcePosition {
        self.peek().map(|t| t.span.start).unwrap_or_default()
    }

    fn line(&self) -> usize {
        self.position().line
    }

    fn advance(&mut self) -> Token<TokenKind> {
        let token = self.peek().cloned().unwrap_or_else(|| {
            Token::new(TokenKind::Eof, Default::default())
        });
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, kind: ParserErrorKind) -> ParserError {
        if self.check(TokenKind::Eof) && self.tokens.is_empty() {
            return ParserError::at_eof(kind);
        }
        ParserError::at(kind, self.position())
    }

    /// `extra` 为当前左结合链已经叠加的层数
    fn check_depth(&self, extra: usize) -> ParseResult<()> {
        if self.expr_depth + extra > MAX_EXPRESSION_DEPTH {
            return Err(self.error_here(ParserErrorKind::TooDeeplyNested));
        }
        Ok(())
    }

    /// 在更深一层解析子表达式
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.check_depth(1)?;
        self.expr_depth += 1;
        let result = parse(self);
        self.expr_depth -= 1;
        result
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            Err(self.error_here(ParserErrorKind::InvalidSyntax))
        }
    }

    fn expect_colon(&mut self) -> ParseResult<()> {
        if self.match_token(TokenKind::Colon) {
            Ok(())
        } else {
            Err(self.error_here(ParserErrorKind::Expected(":")))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        if self.check(TokenKind::Identifier) {
            Ok(self.advance().text.unwrap_or_default())
        } else {
            Err(self.error_here(ParserErrorKind::InvalidSyntax))
        }
    }

    fn can_start_expression(&self) -> bool {
        starts_expression(self.kind())
            || matches!(self.kind(), TokenKind::Minus | TokenKind::Plus | TokenKind::Not)
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Eof | TokenKind::Semicolon | TokenKind::Dedent
        )
    }

    fn expect_line_end(&mut self) -> ParseResult<()> {
        match self.kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::Dedent => Ok(()),
            _ => Err(self.error_here(ParserErrorKind::InvalidSyntax)),
        }
    }

    // ===== 语句 =====

    fn parse_statement(&mut self) -> ParseResult<Vec<Stmt>> {
        match self.kind() {
            TokenKind::If => Ok(vec![self.parse_if()?]),
            TokenKind::While => Ok(vec![self.parse_while()?]),
            TokenKind::For => Ok(vec![self.parse_for()?]),
            TokenKind::Def => Ok(vec![self.parse_def()?]),
            TokenKind::Class => Ok(vec![self.parse_class()?]),
            TokenKind::Elif | TokenKind::Else => {
                Err(self.error_here(ParserErrorKind::InvalidSyntax))
            }
            _ => self.parse_simple_line(),
        }
    }

    /// 一行中以 `;` 分隔的简单语句
    fn parse_simple_line(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut stmts = vec![self.parse_simple()?];
        while self.match_token(TokenKind::Semicolon) {
            if matches!(self.kind(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            stmts.push(self.parse_simple()?);
        }
        self.expect_line_end()?;
        Ok(stmts)
    }

    fn parse_simple(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let kind = match self.kind() {
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(self.error_here(ParserErrorKind::BreakOutsideLoop));
                }
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(self.error_here(ParserErrorKind::ContinueOutsideLoop));
                }
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                if self.function_depth == 0 {
                    return Err(self.error_here(ParserErrorKind::ReturnOutsideFunction));
                }
                self.advance();
                let value = if self.at_line_end() {
                    None
                } else {
                    Some(self.parse_expression_list()?)
                };
                StmtKind::Return(ReturnStmt { value })
            }
            TokenKind::Import => self.parse_import()?,
            TokenKind::From => self.parse_from_import()?,
            TokenKind::Indent => return Err(self.error_here(ParserErrorKind::UnexpectedIndent)),
            _ => self.parse_expression_statement()?,
        };
        Ok(Stmt::new(kind, line))
    }

    fn parse_expression_statement(&mut self) -> ParseResult<StmtKind> {
        let start = self.position();
        let first = self.parse_expression_list()?;

        if let Some(base) = self.kind().augmented_base() {
            if !matches!(
                *first,
                ExprKind::VarRef(_) | ExprKind::MemberAccess(_) | ExprKind::IndexAccess(_)
            ) {
                let what = first.assign_target_error().unwrap_or("expression");
                return Err(ParserError::at(ParserErrorKind::CannotAssign(what), start));
            }
            self.advance();
            let value = self.parse_expression_list()?;
            let op = binary_op(base).ok_or_else(|| self.error_here(ParserErrorKind::InvalidSyntax))?;
            return Ok(StmtKind::AugAssign(AugAssignStmt {
                target: first,
                op,
                value,
            }));
        }

        if !self.check(TokenKind::Equal) {
            return Ok(StmtKind::Expr(ExprStmt { expression: first }));
        }

        let mut targets = vec![first];
        let value = loop {
            self.advance();
            let next = self.parse_expression_list()?;
            if self.check(TokenKind::Equal) {
                targets.push(next);
            } else {
                break next;
            }
        };
        for target in &targets {
            if let Some(what) = target.assign_target_error() {
                return Err(ParserError::at(ParserErrorKind::CannotAssign(what), start));
            }
        }
        Ok(StmtKind::Assign(AssignStmt { targets, value }))
    }

    fn parse_dotted_name(&mut self) -> ParseResult<String> {
        let mut path = String::new();
        while self.check(TokenKind::Dot) {
            self.advance();
            path.push('.');
        }
        if path.is_empty() || self.check(TokenKind::Identifier) {
            path.push_str(&self.expect_identifier()?);
            while self.match_token(TokenKind::Dot) {
                path.push('.');
                path.push_str(&self.expect_identifier()?);
            }
        }
        Ok(path)
    }

    fn parse_import(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let module_path = self.parse_dotted_name()?;
        if self.match_token(TokenKind::As) {
            self.expect_identifier()?;
        }
        // 其余模块同样会失败，只记录第一个
        while self.match_token(TokenKind::Comma) {
            self.parse_dotted_name()?;
            if self.match_token(TokenKind::As) {
                self.expect_identifier()?;
            }
        }
        Ok(StmtKind::Import(ImportStmt {
            module_path,
            items: Vec::new(),
        }))
    }

    fn parse_from_import(&mut self) -> ParseResult<StmtKind> {
        self.advance();
        let module_path = self.parse_dotted_name()?;
        self.expect(TokenKind::Import)?;
        let mut items = Vec::new();
        if self.match_token(TokenKind::Star) {
            items.push("*".to_string());
        } else {
            let parenthesized = self.match_token(TokenKind::LeftParen);
            loop {
                items.push(self.expect_identifier()?);
                if self.match_token(TokenKind::As) {
                    self.expect_identifier()?;
                }
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                if parenthesized && self.check(TokenKind::RightParen) {
                    break;
                }
            }
            if parenthesized {
                self.expect(TokenKind::RightParen)?;
            }
        }
        Ok(StmtKind::Import(ImportStmt { module_path, items }))
    }

    /// `:` 之后的语句块：缩进块或同一行的简单语句
    fn parse_block(&mut self, after: &'static str, header_line: usize) -> ParseResult<Block> {
        if !self.match_token(TokenKind::Newline) {
            if self.check(TokenKind::Eof) {
                return Err(self.error_here(ParserErrorKind::ExpectedIndentedBlock {
                    after,
                    line: header_line,
                }));
            }
            return self.parse_simple_line();
        }
        if !self.check(TokenKind::Indent) {
            return Err(self.error_here(ParserErrorKind::ExpectedIndentedBlock {
                after,
                line: header_line,
            }));
        }
        self.advance();
        let mut body = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.check(TokenKind::Eof) {
            if self.match_token(TokenKind::Newline) {
                continue;
            }
            if self.check(TokenKind::Indent) {
                return Err(self.error_here(ParserErrorKind::UnexpectedIndent));
            }
            body.extend(self.parse_statement()?);
        }
        self.match_token(TokenKind::Dedent);
        Ok(body)
    }

    /// if/while 的条件，`=` 误写给出专门提示
    fn parse_condition(&mut self) -> ParseResult<Expr> {
        let condition = self.parse_expression()?;
        if self.check(TokenKind::Equal) {
            return Err(self.error_here(ParserErrorKind::AssignInCondition));
        }
        self.expect_colon()?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.advance();
        let if_condition = self.parse_condition()?;
        let then_body = self.parse_block("'if' statement", line)?;

        let mut elif_conditions = Vec::new();
        let mut elif_bodies = Vec::new();
        while self.check(TokenKind::Elif) {
            let elif_line = self.line();
            self.advance();
            elif_conditions.push(self.parse_condition()?);
            elif_bodies.push(self.parse_block("'elif' statement", elif_line)?);
        }

        let else_body = self.parse_else()?;
        Ok(Stmt::new(
            StmtKind::If(IfStmt {
                if_condition,
                then_body,
                elif_conditions,
                elif_bodies,
                else_body,
            }),
            line,
        ))
    }

    fn parse_else(&mut self) -> ParseResult<Option<Block>> {
        if !self.check(TokenKind::Else) {
            return Ok(None);
        }
        let line = self.line();
        self.advance();
        self.expect_colon()?;
        Ok(Some(self.parse_block("'else' statement", line)?))
    }

    fn parse_loop_body(&mut self, after: &'static str, line: usize) -> ParseResult<Block> {
        self.loop_depth += 1;
        let body = self.parse_block(after, line);
        self.loop_depth -= 1;
        body
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.advance();
        let condition = self.parse_condition()?;
        let body = self.parse_loop_body("'while' statement", line)?;
        let else_body = self.parse_else()?;
        Ok(Stmt::new(
            StmtKind::While(WhileStmt {
                condition,
                body,
                else_body,
            }),
            line,
        ))
    }

    fn parse_for(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.advance();
        let target = self.parse_for_target()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expression_list()?;
        self.expect_colon()?;
        let body = self.parse_loop_body("'for' statement", line)?;
        let else_body = self.parse_else()?;
        Ok(Stmt::new(
            StmtKind::For(ForStmt {
                target,
                iterable,
                body,
                else_body,
            }),
            line,
        ))
    }

    /// `for` 的目标：逗号分隔的主表达式（不能吞掉 `in`）
    fn parse_for_target(&mut self) -> ParseResult<Expr> {
        let start = self.position();
        let first = self.parse_primary()?;
        let target = if self.check(TokenKind::Comma) {
            let mut elements = vec![first];
            while self.match_token(TokenKind::Comma) {
                if self.check(TokenKind::In) {
                    break;
                }
                elements.push(self.parse_primary()?);
            }
            Box::new(ExprKind::LiteralTuple(LiteralTuple { elements }))
        } else {
            first
        };
        if let Some(what) = target.assign_target_error() {
            return Err(ParserError::at(ParserErrorKind::CannotAssign(what), start));
        }
        Ok(target)
    }

    fn parse_def(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LeftParen)?;

        let mut params: Vec<Param> = Vec::new();
        let mut seen = HashSet::new();
        while !self.check(TokenKind::RightParen) {
            let param_pos = self.position();
            let param_name = self.expect_identifier()?;
            if !seen.insert(param_name.clone()) {
                return Err(ParserError::at(
                    ParserErrorKind::DuplicateArgument(param_name),
                    param_pos,
                ));
            }
            // 类型标注只解析不使用
            if self.match_token(TokenKind::Colon) {
                self.parse_expression()?;
            }
            let default = if self.match_token(TokenKind::Equal) {
                Some(self.parse_expression()?)
            } else {
                None
            };
            if default.is_none() && params.iter().any(|p| p.default.is_some()) {
                return Err(ParserError::at(
                    ParserErrorKind::NonDefaultAfterDefault,
                    param_pos,
                ));
            }
            params.push(Param {
                name: param_name,
                default,
            });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;
        if self.match_token(TokenKind::Arrow) {
            self.parse_expression()?;
        }
        self.expect_colon()?;

        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block("function definition", line);
        self.function_depth -= 1;
        self.loop_depth = saved_loop_depth;

        Ok(Stmt::new(
            StmtKind::FunctionDef(Rc::new(FunctionDef {
                name,
                params,
                body: body?,
            })),
            line,
        ))
    }

    fn parse_class(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        self.advance();
        let name = self.expect_identifier()?;
        let mut base = None;
        if self.match_token(TokenKind::LeftParen) {
            if !self.check(TokenKind::RightParen) {
                base = Some(self.parse_expression()?);
            }
            self.expect(TokenKind::RightParen)?;
        }
        self.expect_colon()?;
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.parse_block("class definition", line);
        self.loop_depth = saved_loop_depth;
        Ok(Stmt::new(
            StmtKind::ClassDef(Rc::new(ClassDef {
                name,
                base,
                body: body?,
            })),
            line,
        ))
    }

    // ===== 表达式 =====

    /// 逗号分隔的表达式列表；多于一个时构成元组
    pub fn parse_expression_list(&mut self) -> ParseResult<Expr> {
        let first = self.parse_expression()?;
        if !self.check(TokenKind::Comma) {
            return Ok(first);
        }
        let mut elements = vec![first];
        while self.match_token(TokenKind::Comma) {
            if !self.can_start_expression() {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        Ok(Box::new(ExprKind::LiteralTuple(LiteralTuple { elements })))
    }

    /// 条件表达式 `a if c else b`
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        let expr = self.parse_or()?;
        if !self.check(TokenKind::If) {
            return Ok(expr);
        }
        self.advance();
        let condition = self.parse_or()?;
        self.expect(TokenKind::Else)?;
        let else_expr = self.nested(Self::parse_expression)?;
        Ok(Box::new(ExprKind::Conditional(Conditional {
            condition,
            then_expr: expr,
            else_expr,
        })))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        let mut chain = 0;
        while self.match_token(TokenKind::Or) {
            chain += 1;
            self.check_depth(chain)?;
            let right = self.parse_and()?;
            left = Box::new(ExprKind::Logical(Logical {
                left,
                op: LogicalOp::Or,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        let mut chain = 0;
        while self.match_token(TokenKind::And) {
            chain += 1;
            self.check_depth(chain)?;
            let right = self.parse_not()?;
            left = Box::new(ExprKind::Logical(Logical {
                left,
                op: LogicalOp::And,
                right,
            }));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.match_token(TokenKind::Not) {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Box::new(ExprKind::Unary(Unary {
                op: UnaryOp::Not,
                operand,
            })));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_binary(0)?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.kind() {
                TokenKind::EqualEqual => CompareOp::Eq,
                TokenKind::NotEqual => CompareOp::NotEq,
                TokenKind::Less => CompareOp::Lt,
                TokenKind::Greater => CompareOp::Gt,
                TokenKind::LessEqual => CompareOp::LtEq,
                TokenKind::GreaterEqual => CompareOp::GtEq,
                TokenKind::In => CompareOp::In,
                TokenKind::Not if self.peek_kind(1) == TokenKind::In => {
                    self.advance();
                    CompareOp::NotIn
                }
                TokenKind::Is if self.peek_kind(1) == TokenKind::Not => {
                    self.advance();
                    CompareOp::IsNot
                }
                TokenKind::Is => CompareOp::Is,
                _ => break,
            };
            self.advance();
            ops.push(op);
            comparators.push(self.parse_binary(0)?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Box::new(ExprKind::Compare(Compare {
            left,
            ops,
            comparators,
        })))
    }

    /// 算术二元运算（Pratt）
    fn parse_binary(&mut self, min_precedence: i32) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        let mut chain = 0;
        loop {
            let op_kind = self.kind();
            let precedence = get_precedence(op_kind);
            if precedence <= 0 || precedence < min_precedence {
                break;
            }
            let Some(op) = binary_op(op_kind) else {
                break;
            };
            self.advance();
            chain += 1;
            self.check_depth(chain)?;
            let next_min = if get_associativity(op_kind) {
                precedence + 1
            } else {
                precedence
            };
            let right = self.parse_binary(next_min)?;
            left = Box::new(ExprKind::Binary(Binary { left, op, right }));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        Ok(Box::new(ExprKind::Unary(Unary { op, operand })))
    }

    /// `**` 右结合，且比左侧一元负号绑定更紧
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_primary()?;
        if !self.match_token(TokenKind::DoubleStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_unary)?;
        Ok(Box::new(ExprKind::Binary(Binary {
            left: base,
            op: super::expr::BinaryOp::Pow,
            right: exponent,
        })))
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_atom()?;
        let mut chain = 0;
        loop {
            if matches!(self.kind(), TokenKind::LeftParen | TokenKind::Dot | TokenKind::LeftBracket) {
                chain += 1;
                self.check_depth(chain)?;
            }
            match self.kind() {
                TokenKind::LeftParen => {
                    let arguments = self.parse_call_arguments()?;
                    expr = Box::new(ExprKind::FunctionCall(FunctionCall {
                        function_expr: expr,
                        arguments,
                    }));
                }
                TokenKind::Dot => {
                    self.advance();
                    let member = self.expect_identifier()?;
                    expr = Box::new(ExprKind::MemberAccess(MemberAccess {
                        object: expr,
                        member,
                    }));
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_subscript()?;
                    self.expect(TokenKind::RightBracket)?;
                    expr = Box::new(ExprKind::IndexAccess(IndexAccess {
                        object: expr,
                        index,
                    }));
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_call_arguments(&mut self) -> ParseResult<Vec<Argument>> {
        self.advance();
        let mut arguments = Vec::new();
        let mut seen_keyword = false;
        while !self.check(TokenKind::RightParen) {
            if self.check(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Equal {
                let name = self.advance().text.unwrap_or_default();
                self.advance();
                let value = self.parse_expression()?;
                arguments.push(Argument::Keyword(name, value));
                seen_keyword = true;
            } else {
                let start = self.position();
                let value = self.parse_expression()?;
                if seen_keyword {
                    return Err(ParserError::at(
                        ParserErrorKind::PositionalAfterKeyword,
                        start,
                    ));
                }
                arguments.push(Argument::Positional(value));
            }
            if !self.match_token(TokenKind::Comma) {
                if starts_expression(self.kind()) {
                    return Err(self.error_here(ParserErrorKind::ForgotComma));
                }
                break;
            }
        }
        self.expect(TokenKind::RightParen)?;
        Ok(arguments)
    }

    fn parse_subscript(&mut self) -> ParseResult<Expr> {
        let lower = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        if !self.check(TokenKind::Colon) {
            return lower.ok_or_else(|| self.error_here(ParserErrorKind::InvalidSyntax));
        }
        self.advance();
        let upper = if matches!(self.kind(), TokenKind::Colon | TokenKind::RightBracket) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let step = if self.match_token(TokenKind::Colon) && !self.check(TokenKind::RightBracket) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Box::new(ExprKind::Slice(Slice { lower, upper, step })))
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let start = self.position();
        let expr = match self.kind() {
            TokenKind::Integer => {
                let text = self.advance().text.unwrap_or_default();
                let value = text
                    .parse::<i64>()
                    .map_err(|_| ParserError::at(ParserErrorKind::IntegerTooLarge(text.clone()), start))?;
                ExprKind::LiteralInt(LiteralInt { value })
            }
            TokenKind::Float => {
                let text = self.advance().text.unwrap_or_default();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ParserError::at(ParserErrorKind::InvalidSyntax, start))?;
                ExprKind::LiteralFloat(LiteralFloat { value })
            }
            TokenKind::String | TokenKind::FString => return self.parse_strings(),
            TokenKind::True => {
                self.advance();
                ExprKind::LiteralBool(true)
            }
            TokenKind::False => {
                self.advance();
                ExprKind::LiteralBool(false)
            }
            TokenKind::None => {
                self.advance();
                ExprKind::LiteralNone
            }
            TokenKind::Identifier => {
                let name = self.advance().text.unwrap_or_default();
                ExprKind::VarRef(VarRef { name })
            }
            TokenKind::LeftParen => return self.nested(Self::parse_parenthesized),
            TokenKind::LeftBracket => return self.nested(Self::parse_list),
            TokenKind::LeftBrace => return self.nested(Self::parse_dict),
            TokenKind::Indent => return Err(self.error_here(ParserErrorKind::UnexpectedIndent)),
            _ => return Err(self.error_here(ParserErrorKind::InvalidSyntax)),
        };
        Ok(Box::new(expr))
    }

    /// 相邻字符串字面量拼接；含 f-string 时整体成为 f-string
    fn parse_strings(&mut self) -> ParseResult<Expr> {
        let mut parts: Vec<FStringPart> = Vec::new();
        let mut is_format = false;
        while matches!(self.kind(), TokenKind::String | TokenKind::FString) {
            let token = self.advance();
            let text = token.text.unwrap_or_default();
            if token.kind == TokenKind::FString {
                is_format = true;
                parts.extend(parse_fstring(&text, token.span.start)?);
            } else {
                parts.push(FStringPart::Literal(text));
            }
        }
        if !is_format {
            let value = parts
                .into_iter()
                .map(|p| match p {
                    FStringPart::Literal(s) => s,
                    FStringPart::Interpolation { .. } => String::new(),
                })
                .collect();
            return Ok(Box::new(ExprKind::LiteralString(LiteralString { value })));
        }
        Ok(Box::new(ExprKind::FString(FStringExpr { parts })))
    }

    fn parse_parenthesized(&mut self) -> ParseResult<Expr> {
        self.advance();
        if self.match_token(TokenKind::RightParen) {
            return Ok(Box::new(ExprKind::LiteralTuple(LiteralTuple {
                elements: Vec::new(),
            })));
        }
        let first = self.parse_expression()?;
        if self.match_token(TokenKind::RightParen) {
            return Ok(first);
        }
        if !self.check(TokenKind::Comma) {
            if starts_expression(self.kind()) {
                return Err(self.error_here(ParserErrorKind::ForgotComma));
            }
            return Err(self.error_here(ParserErrorKind::InvalidSyntax));
        }
        let elements = self.parse_sequence_tail(first, TokenKind::RightParen)?;
        Ok(Box::new(ExprKind::LiteralTuple(LiteralTuple { elements })))
    }

    fn parse_list(&mut self) -> ParseResult<Expr> {
        self.advance();
        if self.match_token(TokenKind::RightBracket) {
            return Ok(Box::new(ExprKind::LiteralList(LiteralList {
                elements: Vec::new(),
            })));
        }
        let first = self.parse_expression()?;
        if self.check(TokenKind::For) {
            return self.parse_list_comprehension(first);
        }
        let elements = self.parse_sequence_tail(first, TokenKind::RightBracket)?;
        Ok(Box::new(ExprKind::LiteralList(LiteralList { elements })))
    }

    /// 已读第一个元素后，读取 `, elem`* 直到 `close`
    fn parse_sequence_tail(&mut self, first: Expr, close: TokenKind) -> ParseResult<Vec<Expr>> {
        let mut elements = vec![first];
        loop {
            if self.match_token(close) {
                return Ok(elements);
            }
            if !self.match_token(TokenKind::Comma) {
                if starts_expression(self.kind()) {
                    return Err(self.error_here(ParserErrorKind::ForgotComma));
                }
                return Err(self.error_here(ParserErrorKind::InvalidSyntax));
            }
            if self.match_token(close) {
                return Ok(elements);
            }
            elements.push(self.parse_expression()?);
        }
    }

    fn parse_list_comprehension(&mut self, element: Expr) -> ParseResult<Expr> {
        self.advance();
        let target = self.parse_for_target()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_or()?;
        let mut conditions = Vec::new();
        while self.match_token(TokenKind::If) {
            conditions.push(self.parse_or()?);
        }
        self.expect(TokenKind::RightBracket)?;
        Ok(Box::new(ExprKind::ListComp(ListComp {
            element,
            target,
            iterable,
            conditions,
        })))
    }

    fn parse_dict(&mut self) -> ParseResult<Expr> {
        self.advance();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RightBrace) {
            let key = self.parse_expression()?;
            self.expect_colon()?;
            let value = self.parse_expression()?;
            entries.push((key, value));
            if !self.match_token(TokenKind::Comma) {
                if starts_expression(self.kind()) {
                    return Err(self.error_here(ParserErrorKind::ForgotComma));
                }
                break;
            }
        }
        self.expect(TokenKind::RightBrace)?;
        Ok(Box::new(ExprKind::LiteralDict(LiteralDict { entries })))
    }
}

/// 拆分 f-string 内容为字面量与插值部分
fn parse_fstring(raw: &str, pos: SourcePosition) -> ParseResult<Vec<FStringPart>> {
    let fstring_error = |msg: &'static str| ParserError::at(ParserErrorKind::FString(msg), pos);
    let chars: Vec<char> = raw.chars().collect();
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '{' && chars.get(i + 1) == Some(&'{') {
            literal.push('{');
            i += 2;
            continue;
        }
        if c == '}' {
            if chars.get(i + 1) == Some(&'}') {
                literal.push('}');
                i += 2;
                continue;
            }
            return Err(fstring_error("single '}' is not allowed"));
        }
        if c != '{' {
            literal.push(c);
            i += 1;
            continue;
        }

        i += 1;
        let expr_start = i;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut expr_end = None;
        while i < chars.len() {
            let ch = chars[i];
            if let Some(q) = quote {
                if ch == q {
                    quote = None;
                }
                i += 1;
                continue;
            }
            match ch {
                '\'' | '"' => quote = Some(ch),
                '(' | '[' | '{' => depth += 1,
                ')' | ']' => depth = depth.saturating_sub(1),
                '}' if depth > 0 => depth -= 1,
                ':' if depth > 0 => {}
                '}' | ':' => {
                    expr_end = Some(i);
                    break;
                }
                '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                    expr_end = Some(i);
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        let Some(expr_end) = expr_end else {
            return Err(fstring_error("expecting '}'"));
        };
        let expr_src: String = chars[expr_start..expr_end].iter().collect();
        if expr_src.trim().is_empty() {
            return Err(fstring_error("valid expression required before '}'"));
        }

        let mut conversion = None;
        if chars[i] == '!' {
            conversion = chars.get(i + 1).copied();
            if !matches!(conversion, Some('r') | Some('s') | Some('a')) {
                return Err(fstring_error("invalid conversion character"));
            }
            i += 2;
        }
        let mut spec = None;
        if chars.get(i) == Some(&':') {
            i += 1;
            let spec_start = i;
            while i < chars.len() && chars[i] != '}' {
                i += 1;
            }
            spec = Some(chars[spec_start..i].iter().collect());
        }
        if chars.get(i) != Some(&'}') {
            return Err(fstring_error("expecting '}'"));
        }
        i += 1;

        if !literal.is_empty() {
            parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
        }
        let expr = parse_embedded_expression(&expr_src, pos)?;
        parts.push(FStringPart::Interpolation {
            expr,
            conversion,
            spec,
        });
    }
    if !literal.is_empty() {
        parts.push(FStringPart::Literal(literal));
    }
    Ok(parts)
}

fn parse_embedded_expression(src: &str, pos: SourcePosition) -> ParseResult<Expr> {
    let relocate = |mut err: ParserError| {
        err.location = ErrorLocation::At(pos);
        err
    };
    let tokens = tokenize(src.trim())
        .map_err(|e| ParserError::at(ParserErrorKind::Embedded(e.message()), pos))?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expression_list().map_err(relocate)?;
    parser.match_token(TokenKind::Newline);
    if !parser.check(TokenKind::Eof) {
        return Err(ParserError::at(ParserErrorKind::InvalidSyntax, pos));
    }
    Ok(expr)
}
