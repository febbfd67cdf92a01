//! Lua table-literal parser.
//!
//! Atlas tables are distributed as Lua source that only builds and returns
//! nested tables. This module parses that subset without a Lua runtime.
//!
//! # Format
//!
//! ```text
//! -- comment
//! local AtlasInfo = {
//!     ["Interface/Sheet"] = {
//!         ["PartName"] = { 64, 64, 0, 0.25, 0.5, 0, 0.25, false, false },
//!     },
//! }
//! return AtlasInfo
//! ```
//!
//! Supported statements are `local NAME = expr`, `NAME = expr` and
//! `return expr`. Expressions are table constructors, strings (quoted or
//! long-bracket), numbers, `true`, `false`, `nil` and names bound by an
//! earlier assignment. The chunk's value is the `return` expression, or the
//! last assigned table when there is no `return`.

use crate::{InfoError, InfoResult};
use std::collections::HashMap;

/// A parsed Lua value.
#[derive(Debug, Clone, PartialEq)]
pub enum LuaValue {
    /// `nil`
    Nil,
    /// `true` / `false`
    Bool(bool),
    /// Any numeric literal.
    Number(f64),
    /// String literal.
    Str(String),
    /// Table constructor.
    Table(LuaTable),
}

impl LuaValue {
    /// Returns the number if this is a numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the table if this is a table value.
    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Short name of the value's type, as Lua's `type()` would report it.
    pub fn type_name(&self) -> &'static str {
        match self {
            LuaValue::Nil => "nil",
            LuaValue::Bool(_) => "boolean",
            LuaValue::Number(_) => "number",
            LuaValue::Str(_) => "string",
            LuaValue::Table(_) => "table",
        }
    }
}

/// Table key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LuaKey {
    /// String key (`name = v` or `["name"] = v`).
    Str(String),
    /// Integral numeric key (`[3] = v`).
    Int(i64),
    /// Boolean key.
    Bool(bool),
}

/// A table constructor, split into its positional and keyed parts.
///
/// Both parts keep source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LuaTable {
    /// Positional items, 0-based.
    pub array: Vec<LuaValue>,
    /// Keyed fields in the order they appear.
    pub fields: Vec<(LuaKey, LuaValue)>,
}

impl LuaTable {
    /// Looks up a string key. The last assignment wins, as in Lua.
    pub fn get(&self, key: &str) -> Option<&LuaValue> {
        self.fields
            .iter()
            .rev()
            .find(|(k, _)| matches!(k, LuaKey::Str(s) if s == key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the table has neither positional nor keyed entries.
    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.fields.is_empty()
    }
}

/// Parses a Lua chunk and returns its value.
///
/// # Example
///
/// ```rust
/// use atlas_info::lua::{parse, LuaValue};
///
/// let value = parse("return { 1, 2, x = 'y' }").unwrap();
/// let table = value.as_table().unwrap();
/// assert_eq!(table.array, vec![LuaValue::Number(1.0), LuaValue::Number(2.0)]);
/// assert_eq!(table.get("x"), Some(&LuaValue::Str("y".into())));
/// ```
pub fn parse(source: &str) -> InfoResult<LuaValue> {
    Parser::new(source).chunk()
}

// === Lexer ===

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Assign,
    Comma,
    Semi,
    Minus,
    Name(String),
    Str(String),
    Number(f64),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::Assign => "'='".into(),
            Token::Comma => "','".into(),
            Token::Semi => "';'".into(),
            Token::Minus => "'-'".into(),
            Token::Name(n) => format!("'{}'", n),
            Token::Str(_) => "string".into(),
            Token::Number(n) => format!("number {}", n),
            Token::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        let src = source.as_bytes();
        // UTF-8 BOM
        let pos = if src.starts_with(&[0xEF, 0xBB, 0xBF]) { 3 } else { 0 };
        Self {
            src,
            pos,
            line: 1,
            column: 1,
        }
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> InfoError {
        InfoError::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.src.get(self.pos).copied()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn next_token(&mut self) -> InfoResult<Spanned> {
        self.skip_trivia()?;

        let (line, column) = (self.line, self.column);
        let spanned = |token| Spanned {
            token,
            line,
            column,
        };

        let Some(c) = self.peek() else {
            return Ok(spanned(Token::Eof));
        };

        let token = match c {
            b'{' => {
                self.bump();
                Token::LBrace
            }
            b'}' => {
                self.bump();
                Token::RBrace
            }
            b']' => {
                self.bump();
                Token::RBracket
            }
            b'=' => {
                self.bump();
                if self.peek() == Some(b'=') {
                    return Err(self.error(line, column, "comparison operators are not supported"));
                }
                Token::Assign
            }
            b',' => {
                self.bump();
                Token::Comma
            }
            b';' => {
                self.bump();
                Token::Semi
            }
            b'-' => {
                self.bump();
                Token::Minus
            }
            b'[' => match self.long_bracket_level() {
                Some(level) => Token::Str(self.long_string(level, line, column)?),
                None => {
                    self.bump();
                    Token::LBracket
                }
            },
            b'"' | b'\'' => Token::Str(self.quoted_string(line, column)?),
            b'0'..=b'9' => Token::Number(self.number(line, column)?),
            b'.' if matches!(self.peek_at(1), Some(b'0'..=b'9')) => {
                Token::Number(self.number(line, column)?)
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c == b'_' || c.is_ascii_alphanumeric()) {
                    self.bump();
                }
                let name = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                Token::Name(name)
            }
            other => {
                return Err(self.error(
                    line,
                    column,
                    format!("unexpected character '{}'", other as char),
                ));
            }
        };

        Ok(spanned(token))
    }

    /// Skips whitespace and comments.
    fn skip_trivia(&mut self) -> InfoResult<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.bump();
                }
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    match self.long_bracket_level() {
                        Some(level) => {
                            self.long_string(level, line, column)?;
                        }
                        None => {
                            while !matches!(self.peek(), None | Some(b'\n')) {
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// If the input is at `[[` or `[=*[`, returns the number of `=`.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.peek() != Some(b'[') {
            return None;
        }
        let mut level = 0;
        loop {
            match self.peek_at(1 + level) {
                Some(b'=') => level += 1,
                Some(b'[') => return Some(level),
                _ => return None,
            }
        }
    }

    fn long_string(&mut self, level: usize, line: usize, column: usize) -> InfoResult<String> {
        // Opening bracket
        for _ in 0..level + 2 {
            self.bump();
        }
        // A newline right after the opening bracket is not part of the string
        if self.peek() == Some(b'\r') {
            self.bump();
        }
        if self.peek() == Some(b'\n') {
            self.bump();
        }

        let start = self.pos;
        loop {
            match self.peek() {
                None => return Err(self.error(line, column, "unfinished long string or comment")),
                Some(b']') => {
                    let closes = (1..=level).all(|i| self.peek_at(i) == Some(b'='))
                        && self.peek_at(level + 1) == Some(b']');
                    if closes {
                        let end = self.pos;
                        for _ in 0..level + 2 {
                            self.bump();
                        }
                        return Ok(String::from_utf8_lossy(&self.src[start..end]).into_owned());
                    }
                    self.bump();
                }
                Some(_) => {
                    self.bump();
                }
            }
        }
    }

    fn quoted_string(&mut self, line: usize, column: usize) -> InfoResult<String> {
        let quote = self.bump();
        let mut buf: Vec<u8> = Vec::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(line, column, "unfinished string"));
            };
            match c {
                b'\n' => return Err(self.error(line, column, "unfinished string")),
                c if Some(c) == quote => break,
                b'\\' => self.escape(&mut buf, line, column)?,
                c => buf.push(c),
            }
        }

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn escape(&mut self, buf: &mut Vec<u8>, line: usize, column: usize) -> InfoResult<()> {
        let Some(c) = self.bump() else {
            return Err(self.error(line, column, "unfinished string"));
        };
        match c {
            b'n' => buf.push(b'\n'),
            b't' => buf.push(b'\t'),
            b'r' => buf.push(b'\r'),
            b'a' => buf.push(0x07),
            b'b' => buf.push(0x08),
            b'f' => buf.push(0x0C),
            b'v' => buf.push(0x0B),
            b'\\' | b'"' | b'\'' | b'\n' => buf.push(c),
            b'z' => {
                while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
                    self.bump();
                }
            }
            b'x' => {
                let mut value = 0u8;
                for _ in 0..2 {
                    let digit = self
                        .bump()
                        .and_then(|d| (d as char).to_digit(16))
                        .ok_or_else(|| self.error(line, column, "hexadecimal digit expected"))?;
                    value = value * 16 + digit as u8;
                }
                buf.push(value);
            }
            b'u' => {
                if self.bump() != Some(b'{') {
                    return Err(self.error(line, column, "missing '{' in \\u{xxxx}"));
                }
                let mut code = 0u32;
                loop {
                    match self.bump() {
                        Some(b'}') => break,
                        Some(d) => {
                            let digit = (d as char)
                                .to_digit(16)
                                .ok_or_else(|| self.error(line, column, "hexadecimal digit expected"))?;
                            code = code.saturating_mul(16).saturating_add(digit);
                        }
                        None => return Err(self.error(line, column, "unfinished string")),
                    }
                }
                let ch = char::from_u32(code)
                    .ok_or_else(|| self.error(line, column, "UTF-8 value too large"))?;
                let mut tmp = [0u8; 4];
                buf.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
            }
            b'0'..=b'9' => {
                let mut value = (c - b'0') as u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            self.bump();
                            value = value * 10 + (d - b'0') as u32;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(value)
                    .map_err(|_| self.error(line, column, "decimal escape too large"))?;
                buf.push(byte);
            }
            other => {
                return Err(self.error(
                    line,
                    column,
                    format!("invalid escape sequence '\\{}'", other as char),
                ));
            }
        }
        Ok(())
    }

    fn number(&mut self, line: usize, column: usize) -> InfoResult<f64> {
        let start = self.pos;

        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while matches!(self.peek(), Some(c) if c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap_or("");
            return u64::from_str_radix(digits, 16)
                .map(|v| v as f64)
                .map_err(|_| self.error(line, column, "malformed hexadecimal number"));
        }

        while matches!(self.peek(), Some(b'0'..=b'9' | b'.')) {
            self.bump();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.bump();
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.bump();
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(c) if c == b'_' || c.is_ascii_alphabetic()) {
            return Err(self.error(line, column, "malformed number"));
        }

        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap_or("");
        text.parse::<f64>()
            .map_err(|_| self.error(line, column, format!("malformed number '{}'", text)))
    }
}

// === Parser ===

struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Spanned>,
    vars: HashMap<String, LuaValue>,
    last_table: Option<String>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
            peeked: None,
            vars: HashMap::new(),
            last_table: None,
        }
    }

    fn peek(&mut self) -> InfoResult<&Spanned> {
        let token = match self.peeked.take() {
            Some(t) => t,
            None => self.lexer.next_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    fn next(&mut self) -> InfoResult<Spanned> {
        match self.peeked.take() {
            Some(t) => Ok(t),
            None => self.lexer.next_token(),
        }
    }

    fn unexpected(&self, got: &Spanned, expected: &str) -> InfoError {
        InfoError::Parse {
            line: got.line,
            column: got.column,
            message: format!("{} expected near {}", expected, got.token.describe()),
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> InfoResult<()> {
        let got = self.next()?;
        if got.token == token {
            Ok(())
        } else {
            Err(self.unexpected(&got, what))
        }
    }

    fn chunk(&mut self) -> InfoResult<LuaValue> {
        loop {
            let stmt = self.next()?;
            match stmt.token {
                Token::Eof => break,
                Token::Semi => continue,
                Token::Name(ref kw) if kw == "return" => {
                    let value = match self.peek()?.token {
                        Token::Eof | Token::Semi => LuaValue::Nil,
                        _ => self.expr()?,
                    };
                    if self.peek()?.token == Token::Semi {
                        self.next()?;
                    }
                    let end = self.next()?;
                    if end.token != Token::Eof {
                        return Err(self.unexpected(&end, "end of input"));
                    }
                    return Ok(value);
                }
                Token::Name(ref kw) if kw == "local" => {
                    let name = self.name()?;
                    let value = if self.peek()?.token == Token::Assign {
                        self.next()?;
                        self.expr()?
                    } else {
                        LuaValue::Nil
                    };
                    self.bind(name, value);
                }
                Token::Name(name) => {
                    if is_keyword(&name) {
                        return Err(InfoError::Parse {
                            line: stmt.line,
                            column: stmt.column,
                            message: format!("unsupported statement '{}'", name),
                        });
                    }
                    self.expect(Token::Assign, "'='")?;
                    let value = self.expr()?;
                    self.bind(name, value);
                }
                _ => return Err(self.unexpected(&stmt, "statement")),
            }
        }

        // No explicit return: fall back to the last table assigned
        self.last_table
            .take()
            .and_then(|name| self.vars.remove(&name))
            .ok_or_else(|| InfoError::InvalidStructure("chunk does not produce a table".into()))
    }

    fn bind(&mut self, name: String, value: LuaValue) {
        if matches!(value, LuaValue::Table(_)) {
            self.last_table = Some(name.clone());
        }
        self.vars.insert(name, value);
    }

    fn name(&mut self) -> InfoResult<String> {
        let got = self.next()?;
        match got.token {
            Token::Name(n) if !is_keyword(&n) => Ok(n),
            _ => Err(self.unexpected(&got, "<name>")),
        }
    }

    fn expr(&mut self) -> InfoResult<LuaValue> {
        let got = self.next()?;
        match got.token {
            Token::LBrace => self.table().map(LuaValue::Table),
            Token::Str(s) => Ok(LuaValue::Str(s)),
            Token::Number(n) => Ok(LuaValue::Number(n)),
            Token::Minus => match self.expr()? {
                LuaValue::Number(n) => Ok(LuaValue::Number(-n)),
                other => Err(InfoError::Parse {
                    line: got.line,
                    column: got.column,
                    message: format!("attempt to negate a {} value", other.type_name()),
                }),
            },
            Token::Name(ref n) => match n.as_str() {
                "true" => Ok(LuaValue::Bool(true)),
                "false" => Ok(LuaValue::Bool(false)),
                "nil" => Ok(LuaValue::Nil),
                name if is_keyword(name) => Err(self.unexpected(&got, "expression")),
                name => self.vars.get(name).cloned().ok_or_else(|| InfoError::Parse {
                    line: got.line,
                    column: got.column,
                    message: format!("undefined variable '{}'", name),
                }),
            },
            _ => Err(self.unexpected(&got, "expression")),
        }
    }

    /// Parses a table constructor; the opening brace is already consumed.
    fn table(&mut self) -> InfoResult<LuaTable> {
        let mut table = LuaTable::default();

        loop {
            let head = self.peek()?.clone();
            match head.token {
                Token::RBrace => {
                    self.next()?;
                    return Ok(table);
                }
                Token::LBracket => {
                    self.next()?;
                    let key = self.expr()?;
                    self.expect(Token::RBracket, "']'")?;
                    self.expect(Token::Assign, "'='")?;
                    let value = self.expr()?;
                    let key = to_key(key).map_err(|message| InfoError::Parse {
                        line: head.line,
                        column: head.column,
                        message,
                    })?;
                    table.fields.push((key, value));
                }
                Token::Name(ref name) if !is_keyword(name) => {
                    // `name = value` or a positional variable reference
                    let name = name.clone();
                    self.next()?;
                    if self.peek()?.token == Token::Assign {
                        self.next()?;
                        let value = self.expr()?;
                        table.fields.push((LuaKey::Str(name), value));
                    } else {
                        let value = self.vars.get(&name).cloned().ok_or_else(|| {
                            InfoError::Parse {
                                line: head.line,
                                column: head.column,
                                message: format!("undefined variable '{}'", name),
                            }
                        })?;
                        table.array.push(value);
                    }
                }
                _ => {
                    let value = self.expr()?;
                    table.array.push(value);
                }
            }

            let sep = self.next()?;
            match sep.token {
                Token::Comma | Token::Semi => continue,
                Token::RBrace => return Ok(table),
                _ => return Err(self.unexpected(&sep, "'}'")),
            }
        }
    }
}

fn to_key(value: LuaValue) -> Result<LuaKey, String> {
    match value {
        LuaValue::Str(s) => Ok(LuaKey::Str(s)),
        LuaValue::Bool(b) => Ok(LuaKey::Bool(b)),
        LuaValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Ok(LuaKey::Int(n as i64))
        }
        other => Err(format!("unsupported table key of type {}", other.type_name())),
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "and" | "break" | "do" | "else" | "elseif" | "end" | "false" | "for" | "function"
            | "goto" | "if" | "in" | "local" | "nil" | "not" | "or" | "repeat" | "return"
            | "then" | "true" | "until" | "while"
    )
}
