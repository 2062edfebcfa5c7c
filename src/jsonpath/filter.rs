//! The filter sub-language parsed inside `[( ... )]` and `[?( ... )]`
//! selections: literals, `@`/`$` path terms, comparisons, boolean and
//! arithmetic operators, and the `=~` regex match.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::{fmt, vec};

use lazy_static::lazy_static;
use lru::LruCache;
use regex::Regex;
use serde_json::{Number, Value};

use crate::errors::JsonPathError;
use crate::jsonpath::evaluator::Evaluator;
use crate::jsonpath::node::PathMode;

lazy_static! {
    static ref REGEX_CACHE: Mutex<LruCache<String, Regex>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(100).unwrap()));
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Or,
    And,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    RegexOp,
    Pattern { pattern: String, icase: bool },
    Plus,
    Minus,
    Star,
    Slash,
    Int(i64),
    Float(f64),
    Str(String),
    True,
    False,
    Null,
    CurrentPath(String),
    RootPath(String),
}

#[derive(Debug, Clone)]
enum Ast {
    True,
    False,
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    /// A query rooted at the current node, stored as `$`-rooted text.
    CurrentQuery(String),
    /// A query rooted at the document root.
    RootQuery(String),
    Not(Box<Ast>),
    Neg(Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Compare(Box<Ast>, CmpOp, Box<Ast>),
    Arith(Box<Ast>, ArithOp, Box<Ast>),
    RegexMatch {
        left: Box<Ast>,
        pattern: String,
        icase: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// The result of evaluating a filter term.
#[derive(Debug, Clone, PartialEq)]
enum FilterValue {
    Nothing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An array or object taken out of the document.
    Json(Value),
    /// The values selected by a path term.
    Nodes(Vec<Value>),
}

/// A parsed filter expression with its two operations: evaluate to a
/// value and test for existence.
#[derive(Debug, Clone)]
pub struct FilterExpr {
    ast: Ast,
    text: String,
}

/// The outcome of handing the path cursor to the filter parser.
pub struct ParsedFilter {
    pub expr: FilterExpr,
    /// Characters consumed from the input, including the closing paren.
    pub consumed: usize,
    pub line: usize,
    pub column: usize,
}

const PRECEDENCE_LOWEST: u8 = 1;
const PRECEDENCE_OR: u8 = 1;
const PRECEDENCE_AND: u8 = 2;
const PRECEDENCE_COMPARISON: u8 = 3;
const PRECEDENCE_ADDITIVE: u8 = 4;
const PRECEDENCE_MULTIPLICATIVE: u8 = 5;

/// Parses a filter expression starting at `(` or `?(`.
///
/// Consumes through the matching right parenthesis and reports how many
/// characters were taken so the path machine can advance its cursor.
pub fn parse_filter(input: &str, line: usize, column: usize) -> Result<ParsedFilter, JsonPathError> {
    let mut lexer = FilterLexer::new(input, line, column);
    let tokens = lexer.run()?;
    let text: String = input.chars().take(lexer.pos).collect();

    let mut parser = FilterTokenParser {
        tokens: tokens.into_iter().peekable(),
        line: lexer.line,
        column: lexer.column,
    };
    let ast = parser.parse_expression(PRECEDENCE_LOWEST)?;
    parser.expect_end()?;

    // Path terms are only syntax-checked here; they run against real
    // data at selection time.
    check_queries(&ast, lexer.line, lexer.column)?;

    Ok(ParsedFilter {
        expr: FilterExpr { ast, text },
        consumed: lexer.pos,
        line: lexer.line,
        column: lexer.column,
    })
}

fn check_queries(ast: &Ast, line: usize, column: usize) -> Result<(), JsonPathError> {
    match ast {
        Ast::CurrentQuery(query) | Ast::RootQuery(query) => {
            let null = Value::Null;
            let mut evaluator = Evaluator::new(PathMode::Discard);
            evaluator
                .evaluate(&null, query)
                .map_err(|e| JsonPathError::filter(e.msg, line, column))?;
            Ok(())
        }
        Ast::Not(inner) | Ast::Neg(inner) => check_queries(inner, line, column),
        Ast::Or(l, r) | Ast::And(l, r) | Ast::Compare(l, _, r) | Ast::Arith(l, _, r) => {
            check_queries(l, line, column)?;
            check_queries(r, line, column)
        }
        Ast::RegexMatch { left, .. } => check_queries(left, line, column),
        _ => Ok(()),
    }
}

struct FilterLexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl FilterLexer {
    fn new(input: &str, line: usize, column: usize) -> Self {
        FilterLexer {
            chars: input.chars().collect(),
            pos: 0,
            line,
            column,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, msg: String) -> JsonPathError {
        JsonPathError::filter(msg, self.line, self.column)
    }

    fn run(&mut self) -> Result<Vec<Token>, JsonPathError> {
        // optional leading '?', then the opening paren
        if self.peek() == Some('?') {
            self.bump();
        }
        if self.peek() != Some('(') {
            return Err(self.error(String::from("expected '(' to open a filter expression")));
        }
        self.bump();

        let mut tokens = Vec::new();
        let mut depth: u32 = 1;

        loop {
            let ch = match self.peek() {
                Some(ch) => ch,
                None => return Err(self.error(String::from("unbalanced parenthesis in filter"))),
            };

            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '(' => {
                    self.bump();
                    depth += 1;
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tokens);
                    }
                    tokens.push(Token::RParen);
                }
                '|' => {
                    self.bump();
                    if self.peek() == Some('|') {
                        self.bump();
                        tokens.push(Token::Or);
                    } else {
                        return Err(self.error(String::from("unexpected '|', expected '||'")));
                    }
                }
                '&' => {
                    self.bump();
                    if self.peek() == Some('&') {
                        self.bump();
                        tokens.push(Token::And);
                    } else {
                        return Err(self.error(String::from("unexpected '&', expected '&&'")));
                    }
                }
                '!' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token::Ne);
                    } else {
                        tokens.push(Token::Not);
                    }
                }
                '=' => {
                    self.bump();
                    match self.peek() {
                        Some('=') => {
                            self.bump();
                            tokens.push(Token::Eq);
                        }
                        Some('~') => {
                            self.bump();
                            tokens.push(Token::RegexOp);
                            self.lex_pattern(&mut tokens)?;
                        }
                        _ => return Err(self.error(String::from("expected '==' or '=~'"))),
                    }
                }
                '<' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token::Le);
                    } else {
                        tokens.push(Token::Lt);
                    }
                }
                '>' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token::Ge);
                    } else {
                        tokens.push(Token::Gt);
                    }
                }
                '+' => {
                    self.bump();
                    tokens.push(Token::Plus);
                }
                '-' => {
                    self.bump();
                    tokens.push(Token::Minus);
                }
                '*' => {
                    self.bump();
                    tokens.push(Token::Star);
                }
                '/' => {
                    self.bump();
                    tokens.push(Token::Slash);
                }
                '\'' | '"' => {
                    let value = self.lex_string(ch)?;
                    tokens.push(Token::Str(value));
                }
                '@' => {
                    self.bump();
                    let path = self.lex_path()?;
                    tokens.push(Token::CurrentPath(path));
                }
                '$' => {
                    self.bump();
                    let path = self.lex_path()?;
                    tokens.push(Token::RootPath(path));
                }
                _ if ch.is_ascii_digit() => {
                    let token = self.lex_number()?;
                    tokens.push(token);
                }
                _ if ch.is_ascii_alphabetic() => {
                    let word = self.lex_word();
                    match word.as_str() {
                        "true" => tokens.push(Token::True),
                        "false" => tokens.push(Token::False),
                        "null" => tokens.push(Token::Null),
                        _ => {
                            return Err(
                                self.error(format!("unexpected identifier '{}' in filter", word))
                            )
                        }
                    }
                }
                _ => {
                    return Err(self.error(format!("unexpected character '{}' in filter", ch)));
                }
            }
        }
    }

    fn lex_string(&mut self, quote: char) -> Result<String, JsonPathError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('\\') => {
                    // escape preserves the next character verbatim
                    match self.bump() {
                        Some(escaped) => value.push(escaped),
                        None => {
                            return Err(self.error(String::from("unterminated string in filter")))
                        }
                    }
                }
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
                None => return Err(self.error(String::from("unterminated string in filter"))),
            }
        }
    }

    /// A `/pattern/` literal, only valid directly after `=~`.
    fn lex_pattern(&mut self, tokens: &mut Vec<Token>) -> Result<(), JsonPathError> {
        while matches!(self.peek(), Some(' ') | Some('\t')) {
            self.bump();
        }
        if self.peek() != Some('/') {
            return Err(self.error(String::from("expected '/pattern/' after '=~'")));
        }
        self.bump();

        let mut pattern = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(escaped) => {
                        pattern.push('\\');
                        pattern.push(escaped);
                    }
                    None => return Err(self.error(String::from("unterminated regex in filter"))),
                },
                Some('/') => break,
                Some(ch) => pattern.push(ch),
                None => return Err(self.error(String::from("unterminated regex in filter"))),
            }
        }

        let icase = if self.peek() == Some('i') {
            self.bump();
            true
        } else {
            false
        };

        let full = if icase {
            format!("(?i){}", pattern)
        } else {
            pattern.clone()
        };
        if Regex::new(&full).is_err() {
            return Err(self.error(format!("invalid regex pattern '{}'", pattern)));
        }

        tokens.push(Token::Pattern { pattern, icase });
        Ok(())
    }

    /// The path text following `@` or `$`, through any bracketed
    /// segments. `-` is an operator here, never a name character.
    fn lex_path(&mut self) -> Result<String, JsonPathError> {
        let mut path = String::from("$");
        loop {
            match self.peek() {
                Some('[') => {
                    self.lex_bracketed(&mut path)?;
                }
                Some(ch) if ch == '.' || ch == '*' || ch == '_' || ch.is_alphanumeric() => {
                    self.bump();
                    path.push(ch);
                }
                _ => return Ok(path),
            }
        }
    }

    fn lex_bracketed(&mut self, path: &mut String) -> Result<(), JsonPathError> {
        self.bump();
        path.push('[');
        let mut depth: u32 = 1;
        loop {
            match self.bump() {
                Some('[') => {
                    depth += 1;
                    path.push('[');
                }
                Some(']') => {
                    depth -= 1;
                    path.push(']');
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(quote @ ('\'' | '"')) => {
                    path.push(quote);
                    loop {
                        match self.bump() {
                            Some('\\') => {
                                path.push('\\');
                                match self.bump() {
                                    Some(escaped) => path.push(escaped),
                                    None => {
                                        return Err(self
                                            .error(String::from("unterminated string in filter")))
                                    }
                                }
                            }
                            Some(ch) => {
                                path.push(ch);
                                if ch == quote {
                                    break;
                                }
                            }
                            None => {
                                return Err(
                                    self.error(String::from("unterminated string in filter"))
                                )
                            }
                        }
                    }
                }
                Some(ch) => path.push(ch),
                None => return Err(self.error(String::from("unclosed bracket in filter path"))),
            }
        }
    }

    fn lex_number(&mut self) -> Result<Token, JsonPathError> {
        let mut text = String::new();
        while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
            text.push(self.bump().unwrap());
        }
        let mut float = false;
        if self.peek() == Some('.') {
            float = true;
            text.push(self.bump().unwrap());
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                text.push(self.bump().unwrap());
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            float = true;
            text.push(self.bump().unwrap());
            if matches!(self.peek(), Some('+') | Some('-')) {
                text.push(self.bump().unwrap());
            }
            while matches!(self.peek(), Some(ch) if ch.is_ascii_digit()) {
                text.push(self.bump().unwrap());
            }
        }

        if float {
            text.parse::<f64>()
                .map(Token::Float)
                .map_err(|_| self.error(format!("invalid number '{}'", text)))
        } else {
            text.parse::<i64>()
                .map(Token::Int)
                .map_err(|_| self.error(format!("invalid number '{}'", text)))
        }
    }

    fn lex_word(&mut self) -> String {
        let mut word = String::new();
        while matches!(self.peek(), Some(ch) if ch.is_ascii_alphanumeric() || ch == '_') {
            word.push(self.bump().unwrap());
        }
        word
    }
}

struct FilterTokenParser {
    tokens: std::iter::Peekable<vec::IntoIter<Token>>,
    line: usize,
    column: usize,
}

impl FilterTokenParser {
    fn error(&self, msg: String) -> JsonPathError {
        JsonPathError::filter(msg, self.line, self.column)
    }

    fn expect_end(&mut self) -> Result<(), JsonPathError> {
        match self.tokens.next() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected trailing {:?} in filter", token))),
        }
    }

    fn parse_expression(&mut self, min_precedence: u8) -> Result<Ast, JsonPathError> {
        let mut left = self.parse_unary()?;

        loop {
            let precedence = match self.tokens.peek() {
                Some(Token::Or) => PRECEDENCE_OR,
                Some(Token::And) => PRECEDENCE_AND,
                Some(
                    Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge
                    | Token::RegexOp,
                ) => PRECEDENCE_COMPARISON,
                Some(Token::Plus | Token::Minus) => PRECEDENCE_ADDITIVE,
                Some(Token::Star | Token::Slash) => PRECEDENCE_MULTIPLICATIVE,
                _ => break,
            };
            if precedence < min_precedence {
                break;
            }

            let op = self.tokens.next().unwrap();
            left = match op {
                Token::Or => Ast::Or(
                    Box::new(left),
                    Box::new(self.parse_expression(precedence + 1)?),
                ),
                Token::And => Ast::And(
                    Box::new(left),
                    Box::new(self.parse_expression(precedence + 1)?),
                ),
                Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                    let cmp = match op {
                        Token::Eq => CmpOp::Eq,
                        Token::Ne => CmpOp::Ne,
                        Token::Lt => CmpOp::Lt,
                        Token::Le => CmpOp::Le,
                        Token::Gt => CmpOp::Gt,
                        _ => CmpOp::Ge,
                    };
                    Ast::Compare(
                        Box::new(left),
                        cmp,
                        Box::new(self.parse_expression(precedence + 1)?),
                    )
                }
                Token::RegexOp => match self.tokens.next() {
                    Some(Token::Pattern { pattern, icase }) => Ast::RegexMatch {
                        left: Box::new(left),
                        pattern,
                        icase,
                    },
                    _ => return Err(self.error(String::from("expected a pattern after '=~'"))),
                },
                Token::Plus | Token::Minus | Token::Star | Token::Slash => {
                    let arith = match op {
                        Token::Plus => ArithOp::Add,
                        Token::Minus => ArithOp::Sub,
                        Token::Star => ArithOp::Mul,
                        _ => ArithOp::Div,
                    };
                    Ast::Arith(
                        Box::new(left),
                        arith,
                        Box::new(self.parse_expression(precedence + 1)?),
                    )
                }
                _ => unreachable!(),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Ast, JsonPathError> {
        match self.tokens.next() {
            Some(Token::Not) => Ok(Ast::Not(Box::new(self.parse_unary()?))),
            Some(Token::Minus) => Ok(Ast::Neg(Box::new(self.parse_unary()?))),
            Some(Token::LParen) => {
                let inner = self.parse_expression(PRECEDENCE_LOWEST)?;
                match self.tokens.next() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(self.error(String::from("expected ')' in filter"))),
                }
            }
            Some(Token::True) => Ok(Ast::True),
            Some(Token::False) => Ok(Ast::False),
            Some(Token::Null) => Ok(Ast::Null),
            Some(Token::Int(value)) => Ok(Ast::Int(value)),
            Some(Token::Float(value)) => Ok(Ast::Float(value)),
            Some(Token::Str(value)) => Ok(Ast::Str(value)),
            Some(Token::CurrentPath(query)) => Ok(Ast::CurrentQuery(query)),
            Some(Token::RootPath(query)) => Ok(Ast::RootQuery(query)),
            Some(token) => Err(self.error(format!("unexpected {:?} in filter", token))),
            None => Err(self.error(String::from("unexpected end of filter expression"))),
        }
    }
}

impl FilterExpr {
    /// Evaluates to a value; an empty result becomes DOM null.
    pub fn eval(&self, root: &Value, current: &Value) -> Value {
        match evaluate(&self.ast, root, current) {
            FilterValue::Nothing => Value::Null,
            FilterValue::Bool(b) => Value::Bool(b),
            FilterValue::Int(i) => Value::Number(Number::from(i)),
            FilterValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            FilterValue::Str(s) => Value::String(s),
            FilterValue::Json(v) => v,
            FilterValue::Nodes(mut nodes) => {
                if nodes.len() == 1 {
                    nodes.remove(0)
                } else {
                    Value::Array(nodes)
                }
            }
        }
    }

    /// The predicate form: does the expression hold at `current`?
    pub fn exists(&self, root: &Value, current: &Value) -> bool {
        is_truthy(&evaluate(&self.ast, root, current))
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn evaluate(ast: &Ast, root: &Value, current: &Value) -> FilterValue {
    match ast {
        Ast::True => FilterValue::Bool(true),
        Ast::False => FilterValue::Bool(false),
        Ast::Null => FilterValue::Json(Value::Null),
        Ast::Int(value) => FilterValue::Int(*value),
        Ast::Float(value) => FilterValue::Float(*value),
        Ast::Str(value) => FilterValue::Str(value.clone()),
        Ast::CurrentQuery(query) => run_query(query, current),
        Ast::RootQuery(query) => run_query(query, root),
        Ast::Not(inner) => FilterValue::Bool(!is_truthy(&evaluate(inner, root, current))),
        Ast::Neg(inner) => match unpack(evaluate(inner, root, current)) {
            FilterValue::Int(i) => i
                .checked_neg()
                .map(FilterValue::Int)
                .unwrap_or(FilterValue::Nothing),
            FilterValue::Float(f) => FilterValue::Float(-f),
            _ => FilterValue::Nothing,
        },
        Ast::Or(left, right) => FilterValue::Bool(
            is_truthy(&evaluate(left, root, current)) || is_truthy(&evaluate(right, root, current)),
        ),
        Ast::And(left, right) => FilterValue::Bool(
            is_truthy(&evaluate(left, root, current)) && is_truthy(&evaluate(right, root, current)),
        ),
        Ast::Compare(left, op, right) => {
            let left = unpack(evaluate(left, root, current));
            let right = unpack(evaluate(right, root, current));
            FilterValue::Bool(compare(&left, *op, &right))
        }
        Ast::Arith(left, op, right) => {
            let left = unpack(evaluate(left, root, current));
            let right = unpack(evaluate(right, root, current));
            arith(&left, *op, &right)
        }
        Ast::RegexMatch {
            left,
            pattern,
            icase,
        } => match unpack(evaluate(left, root, current)) {
            FilterValue::Str(s) => FilterValue::Bool(regex_match(&s, pattern, *icase)),
            _ => FilterValue::Bool(false),
        },
    }
}

fn run_query(query: &str, target: &Value) -> FilterValue {
    let mut evaluator = Evaluator::new(PathMode::Discard);
    match evaluator.evaluate(target, query) {
        Ok(()) => FilterValue::Nodes(evaluator.get_values()),
        Err(_) => FilterValue::Nothing,
    }
}

fn is_truthy(value: &FilterValue) -> bool {
    match value {
        FilterValue::Nothing => false,
        FilterValue::Nodes(nodes) => !nodes.is_empty(),
        FilterValue::Bool(b) => *b,
        _ => true,
    }
}

/// Collapses a singular node list to its value so comparisons see the
/// selected scalar rather than a one-element list.
fn unpack(value: FilterValue) -> FilterValue {
    match value {
        FilterValue::Nodes(mut nodes) => match nodes.len() {
            0 => FilterValue::Nothing,
            1 => from_value(nodes.remove(0)),
            _ => FilterValue::Nodes(nodes),
        },
        other => other,
    }
}

fn from_value(value: Value) -> FilterValue {
    match value {
        Value::Bool(b) => FilterValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                FilterValue::Int(i)
            } else if let Some(u) = n.as_u64() {
                FilterValue::Float(u as f64)
            } else {
                FilterValue::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => FilterValue::Str(s),
        other => FilterValue::Json(other),
    }
}

fn compare(left: &FilterValue, op: CmpOp, right: &FilterValue) -> bool {
    match op {
        CmpOp::Eq => eq(left, right),
        CmpOp::Ne => !eq(left, right),
        CmpOp::Lt => lt(left, right),
        CmpOp::Gt => lt(right, left),
        CmpOp::Ge => lt(right, left) || eq(left, right),
        CmpOp::Le => lt(left, right) || eq(left, right),
    }
}

fn eq(left: &FilterValue, right: &FilterValue) -> bool {
    use FilterValue::*;
    match (left, right) {
        (Nothing, Nothing) => true,
        (Nodes(nodes), Nothing) | (Nothing, Nodes(nodes)) => nodes.is_empty(),
        (Nothing, _) | (_, Nothing) => false,
        (Bool(l), Bool(r)) => l == r,
        (Int(l), Int(r)) => l == r,
        (Float(l), Float(r)) => l == r,
        (Int(l), Float(r)) => *l as f64 == *r,
        (Float(l), Int(r)) => *l == *r as f64,
        (Str(l), Str(r)) => l == r,
        (Json(l), Json(r)) => l == r,
        _ => false,
    }
}

fn lt(left: &FilterValue, right: &FilterValue) -> bool {
    use FilterValue::*;
    match (left, right) {
        (Int(l), Int(r)) => l < r,
        (Float(l), Float(r)) => l < r,
        (Int(l), Float(r)) => (*l as f64) < *r,
        (Float(l), Int(r)) => *l < *r as f64,
        (Str(l), Str(r)) => l < r,
        _ => false,
    }
}

fn arith(left: &FilterValue, op: ArithOp, right: &FilterValue) -> FilterValue {
    use FilterValue::*;
    match (left, right) {
        (Int(l), Int(r)) if op != ArithOp::Div => {
            let result = match op {
                ArithOp::Add => l.checked_add(*r),
                ArithOp::Sub => l.checked_sub(*r),
                ArithOp::Mul => l.checked_mul(*r),
                ArithOp::Div => unreachable!(),
            };
            result.map(Int).unwrap_or(Nothing)
        }
        _ => {
            let l = match as_double(left) {
                Some(x) => x,
                None => return Nothing,
            };
            let r = match as_double(right) {
                Some(x) => x,
                None => return Nothing,
            };
            let result = match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => l / r,
            };
            if result.is_finite() {
                Float(result)
            } else {
                Nothing
            }
        }
    }
}

fn as_double(value: &FilterValue) -> Option<f64> {
    match value {
        FilterValue::Int(i) => Some(*i as f64),
        FilterValue::Float(f) => Some(*f),
        _ => None,
    }
}

fn regex_match(s: &str, pattern: &str, icase: bool) -> bool {
    let key = if icase {
        format!("(?i){}", pattern)
    } else {
        pattern.to_string()
    };

    let mut cache = REGEX_CACHE.lock().unwrap();
    if let Some(re) = cache.get(&key) {
        return re.is_match(s);
    }
    match Regex::new(&key) {
        Ok(re) => {
            let matched = re.is_match(s);
            cache.push(key, re);
            matched
        }
        Err(_) => false,
    }
}
