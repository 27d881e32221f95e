//! 规范语言扫描器
//!
//! 把规范源码切分为扁平的 token 列表。缩进用栈跟踪并产生
//! `Indent` / `Dedent`；括号内的换行被忽略（隐式续行）。

use tracing::{debug, trace};

use super::error::{LexerError, LexerErrorKind};
use super::token_kind::TokenKind;
use crate::kit::lexer::{is_identifier_char, is_identifier_start, CharStream, SourcePosition, SourceSpan, Token};

/// 标点符号，长的写法在前
const SYMBOLS: &[(&str, TokenKind)] = &[
    ("**=", TokenKind::DoubleStarEqual),
    ("//=", TokenKind::DoubleSlashEqual),
    ("**", TokenKind::DoubleStar),
    ("//", TokenKind::DoubleSlash),
    ("==", TokenKind::EqualEqual),
    ("!=", TokenKind::NotEqual),
    ("<=", TokenKind::LessEqual),
    (">=", TokenKind::GreaterEqual),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::StarEqual),
    ("/=", TokenKind::SlashEqual),
    ("%=", TokenKind::PercentEqual),
    ("->", TokenKind::Arrow),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    ("<", TokenKind::Less),
    (">", TokenKind::Greater),
    ("=", TokenKind::Equal),
    ("(", TokenKind::LeftParen),
    (")", TokenKind::RightParen),
    ("[", TokenKind::LeftBracket),
    ("]", TokenKind::RightBracket),
    ("{", TokenKind::LeftBrace),
    ("}", TokenKind::RightBrace),
    (",", TokenKind::Comma),
    (":", TokenKind::Colon),
    (".", TokenKind::Dot),
    (";", TokenKind::Semicolon),
];

const TAB_WIDTH: usize = 8;

/// 括号最大嵌套层数
const MAX_NESTING: usize = 200;

/// 字符串前缀标志
#[derive(Debug, Clone, Copy, Default)]
struct StringPrefix {
    raw: bool,
    format: bool,
}

pub struct Scanner<'a> {
    stream: CharStream<'a>,
    tokens: Vec<Token<TokenKind>>,
    indents: Vec<usize>,
    brackets: Vec<(char, SourcePosition)>,
    at_line_start: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            stream: CharStream::new(source),
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    /// 扫描整个源码
    pub fn tokenize(mut self) -> Result<Vec<Token<TokenKind>>, LexerError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() && !self.scan_indentation()? {
                break;
            }
            let Some(c) = self.stream.peek(0) else {
                break;
            };
            let start = self.stream.position();
            match c {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.stream.advance();
                }
                '#' => self.skip_comment(),
                '\\' => {
                    self.stream.advance();
                    self.stream.eat('\r');
                    if !self.stream.eat('\n') {
                        return Err(LexerError::at(LexerErrorKind::BadContinuation, start));
                    }
                }
                '\n' => {
                    self.stream.advance();
                    if self.brackets.is_empty() {
                        self.push_newline(start);
                        self.at_line_start = true;
                    }
                }
                '"' | '\'' => self.scan_string(start, StringPrefix::default())?,
                '.' if self.stream.peek(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.scan_number(start)?
                }
                c if c.is_ascii_digit() => self.scan_number(start)?,
                c if is_identifier_start(c) => self.scan_word(start)?,
                _ => self.scan_symbol(start, c)?,
            }
        }
        self.finish()
    }

    fn finish(mut self) -> Result<Vec<Token<TokenKind>>, LexerError> {
        if let Some(&(open, pos)) = self.brackets.last() {
            return Err(LexerError::at(LexerErrorKind::NeverClosed(open), pos));
        }
        let end = self.stream.position();
        self.push_newline(end);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, end, end);
        }
        self.push(TokenKind::Eof, end, end);
        debug!(target: "bhasha::lexer", tokens = self.tokens.len(), "tokenized source");
        Ok(self.tokens)
    }

    /// 计算下一逻辑行的前导空白并产生缩进 token；跳过空行与纯注释行
    /// 到达输入末尾时返回 `false`
    fn scan_indentation(&mut self) -> Result<bool, LexerError> {
        loop {
            let mut width = 0;
            while let Some(c) = self.stream.peek(0) {
                match c {
                    ' ' => width += 1,
                    '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                    '\x0c' => width = 0,
                    _ => break,
                }
                self.stream.advance();
            }
            match self.stream.peek(0) {
                None => return Ok(false),
                Some('\n') | Some('\r') => {
                    self.stream.advance();
                    continue;
                }
                Some('#') => {
                    self.skip_comment();
                    continue;
                }
                Some(_) => {}
            }

            let pos = self.stream.position();
            let current = self.current_indent();
            if width > current {
                self.indents.push(width);
                self.push(TokenKind::Indent, pos, pos);
            } else {
                while width < self.current_indent() {
                    self.indents.pop();
                    self.push(TokenKind::Dedent, pos, pos);
                }
                if width != self.current_indent() {
                    return Err(LexerError::at(LexerErrorKind::InconsistentDedent, pos));
                }
            }
            self.at_line_start = false;
            return Ok(true);
        }
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.stream.peek(0) {
            if c == '\n' {
                break;
            }
            self.stream.advance();
        }
    }

    fn scan_word(&mut self, start: SourcePosition) -> Result<(), LexerError> {
        while self.stream.peek(0).is_some_and(is_identifier_char) {
            self.stream.advance();
        }
        let word = self.stream.slice_from(start);

        if matches!(self.stream.peek(0), Some('"') | Some('\'')) {
            let prefix = match word.to_ascii_lowercase().as_str() {
                "f" => Some(StringPrefix { raw: false, format: true }),
                "r" => Some(StringPrefix { raw: true, format: false }),
                "fr" | "rf" => Some(StringPrefix { raw: true, format: true }),
                "u" | "b" => Some(StringPrefix::default()),
                "rb" | "br" => Some(StringPrefix { raw: true, format: false }),
                _ => None,
            };
            if let Some(prefix) = prefix {
                return self.scan_string(start, prefix);
            }
        }

        let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Identifier);
        let text = word.to_string();
        self.push_text(kind, start, text);
        Ok(())
    }

    fn scan_number(&mut self, start: SourcePosition) -> Result<(), LexerError> {
        let mut is_float = false;
        self.eat_digits();
        if self.stream.peek(0) == Some('.') {
            is_float = true;
            self.stream.advance();
            self.eat_digits();
        }
        if matches!(self.stream.peek(0), Some('e') | Some('E')) {
            let after = self.stream.peek(1);
            let signed_digit = matches!(after, Some('+') | Some('-'))
                && self.stream.peek(2).is_some_and(|d| d.is_ascii_digit());
            if after.is_some_and(|d| d.is_ascii_digit()) || signed_digit {
                is_float = true;
                self.stream.advance();
                if signed_digit {
                    self.stream.advance();
                }
                self.eat_digits();
            }
        }
        if self.stream.peek(0).is_some_and(is_identifier_char) {
            return Err(LexerError::at(LexerErrorKind::InvalidNumber, start));
        }

        let text: String = self.stream.slice_from(start).chars().filter(|c| *c != '_').collect();
        if !is_float && text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
            return Err(LexerError::at(LexerErrorKind::LeadingZeros, start));
        }
        let kind = if is_float { TokenKind::Float } else { TokenKind::Integer };
        self.push_text(kind, start, text);
        Ok(())
    }

    fn eat_digits(&mut self) {
        while self
            .stream
            .peek(0)
            .is_some_and(|c| c.is_ascii_digit() || c == '_')
        {
            self.stream.advance();
        }
    }

    fn scan_string(&mut self, start: SourcePosition, prefix: StringPrefix) -> Result<(), LexerError> {
        let Some(quote) = self.stream.advance() else {
            return Ok(());
        };
        let triple = self.stream.peek(0) == Some(quote) && self.stream.peek(1) == Some(quote);
        if triple {
            self.stream.advance();
            self.stream.advance();
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.stream.peek(0) else {
                let kind = if triple {
                    LexerErrorKind::UnterminatedTripleString {
                        detected_line: self.stream.position().line,
                    }
                } else {
                    LexerErrorKind::UnterminatedString {
                        detected_line: start.line,
                    }
                };
                return Err(LexerError::at(kind, start));
            };

            if c == quote {
                self.stream.advance();
                if !triple {
                    break;
                }
                if self.stream.peek(0) == Some(quote) && self.stream.peek(1) == Some(quote) {
                    self.stream.advance();
                    self.stream.advance();
                    break;
                }
                value.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(LexerError::at(
                    LexerErrorKind::UnterminatedString {
                        detected_line: start.line,
                    },
                    start,
                ));
            }
            self.stream.advance();
            if c != '\\' {
                value.push(c);
                continue;
            }

            let Some(escaped) = self.stream.peek(0) else {
                continue;
            };
            self.stream.advance();
            if prefix.raw {
                value.push('\\');
                value.push(escaped);
                continue;
            }
            match escaped {
                '\n' => {}
                'n' => value.push('\n'),
                't' => value.push('\t'),
                'r' => value.push('\r'),
                '0' => value.push('\0'),
                'a' => value.push('\x07'),
                'b' => value.push('\x08'),
                'f' => value.push('\x0c'),
                'v' => value.push('\x0b'),
                '\\' | '\'' | '"' => value.push(escaped),
                'x' => self.scan_hex_escape(2, 'x', &mut value),
                'u' => self.scan_hex_escape(4, 'u', &mut value),
                'U' => self.scan_hex_escape(8, 'U', &mut value),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            }
        }

        let kind = if prefix.format {
            TokenKind::FString
        } else {
            TokenKind::String
        };
        trace!(target: "bhasha::lexer", len = value.len(), format = prefix.format, "string literal");
        self.push_text(kind, start, value);
        Ok(())
    }

    /// `\xhh`、`\uhhhh`、`\Uhhhhhhhh`；格式错误的转义原样保留
    fn scan_hex_escape(&mut self, digits: usize, letter: char, value: &mut String) {
        let hex: String = (0..digits)
            .map_while(|i| self.stream.peek(i).filter(|c| c.is_ascii_hexdigit()))
            .collect();
        let decoded = if hex.len() == digits {
            u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
        } else {
            None
        };
        match decoded {
            Some(ch) => {
                for _ in 0..digits {
                    self.stream.advance();
                }
                value.push(ch);
            }
            None => {
                value.push('\\');
                value.push(letter);
            }
        }
    }

    fn scan_symbol(&mut self, start: SourcePosition, c: char) -> Result<(), LexerError> {
        let Some(&(symbol, kind)) = SYMBOLS.iter().find(|(s, _)| self.stream.starts_with(s)) else {
            return Err(LexerError::at(LexerErrorKind::InvalidCharacter(c), start));
        };
        for _ in symbol.chars() {
            self.stream.advance();
        }
        match kind {
            TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                if self.brackets.len() >= MAX_NESTING {
                    return Err(LexerError::at(LexerErrorKind::TooDeeplyNested, start));
                }
                self.brackets.push((c, start));
            }
            TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                match self.brackets.pop() {
                    None => return Err(LexerError::at(LexerErrorKind::Unmatched(c), start)),
                    Some((open, _)) if closing_for(open) != c => {
                        return Err(LexerError::at(
                            LexerErrorKind::Mismatched {
                                closing: c,
                                opening: open,
                            },
                            start,
                        ));
                    }
                    Some(_) => {}
                }
            }
            _ => {}
        }
        let end = self.stream.position();
        self.push(kind, start, end);
        Ok(())
    }

    fn push(&mut self, kind: TokenKind, start: SourcePosition, end: SourcePosition) {
        self.tokens.push(Token::new(kind, SourceSpan::range(start, end)));
    }

    fn push_text(&mut self, kind: TokenKind, start: SourcePosition, text: String) {
        let end = self.stream.position();
        self.tokens
            .push(Token::with_text(kind, SourceSpan::range(start, end), text));
    }

    fn push_newline(&mut self, pos: SourcePosition) {
        if self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent))
        {
            self.push(TokenKind::Newline, pos, pos);
        }
    }
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}
