use crate::ast::*;
use crate::lexer::{Keyword, LexError, Lexer, SourceLocation, Token};
use std::fmt;

mod expressions;
mod functions;
mod hoisting;
mod statements;

pub use hoisting::{analyze_arguments_usage, collect_hoisting};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    Lexical,
    UnexpectedToken,
    UnexpectedEnd,
    /// Left-hand side of an assignment is not a reference.
    InvalidAssignmentTarget,
    /// Operand of `++`/`--` is not a reference.
    InvalidUpdateTarget,
    StrictMode,
    IllegalStatement,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParseErrorKind::Lexical => "lexical error",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEnd => "unexpected end of input",
            ParseErrorKind::InvalidAssignmentTarget => "invalid assignment target",
            ParseErrorKind::InvalidUpdateTarget => "invalid update target",
            ParseErrorKind::StrictMode => "strict mode violation",
            ParseErrorKind::IllegalStatement => "illegal statement",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> Self {
        ParseError {
            kind: ParseErrorKind::Lexical,
            message: e.message,
            line: e.location.line,
            column: e.location.column,
        }
    }
}

/// Parses `source` as global or eval code. `strict` starts the parser in
/// strict mode, as a direct `eval` from strict code does.
pub fn parse_script(source: &str, strict: bool) -> Result<Program, ParseError> {
    let mut parser = Parser::new_with_strict(source, strict)?;
    parser.parse_program()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    current_token_start: SourceLocation,
    prev_line_terminator: bool,
    pushback: Option<(Token, bool, SourceLocation)>, // (token, had_line_terminator_before, token_start)
    strict: bool,
    in_function: u32,
    in_iteration: u32,
    in_switch: u32,
    labels: Vec<(String, bool)>, // (name, is_iteration)
    no_in: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Result<Self, ParseError> {
        Self::new_with_strict(source, false)
    }

    pub fn new_with_strict(source: &'a str, strict: bool) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        lexer.strict = strict;
        let mut had_lt = false;
        let current = loop {
            let tok = lexer.next_token()?;
            if tok == Token::LineTerminator {
                had_lt = true;
                continue;
            }
            break tok;
        };
        let token_start = lexer.token_start();
        Ok(Self {
            lexer,
            current,
            current_token_start: token_start,
            prev_line_terminator: had_lt,
            pushback: None,
            strict,
            in_function: 0,
            in_iteration: 0,
            in_switch: 0,
            labels: Vec::new(),
            no_in: false,
        })
    }

    fn advance(&mut self) -> Result<Token, ParseError> {
        let old = std::mem::replace(&mut self.current, Token::Eof);
        if let Some((tok, lt, ts)) = self.pushback.take() {
            self.current = tok;
            self.prev_line_terminator = lt;
            self.current_token_start = ts;
        } else {
            self.prev_line_terminator = false;
            loop {
                let tok = self.lexer.next_token()?;
                if tok == Token::LineTerminator {
                    self.prev_line_terminator = true;
                    continue;
                }
                self.current_token_start = self.lexer.token_start();
                self.current = tok;
                break;
            }
        }
        Ok(old)
    }

    /// Restores `token` as the current token, keeping the present one as the
    /// next token to be returned.
    fn push_back(&mut self, token: Token, had_lt: bool, start: SourceLocation) {
        let old_current = std::mem::replace(&mut self.current, token);
        let old_lt = std::mem::replace(&mut self.prev_line_terminator, had_lt);
        let old_ts = std::mem::replace(&mut self.current_token_start, start);
        self.pushback = Some((old_current, old_lt, old_ts));
    }

    fn eat(&mut self, expected: &Token) -> Result<(), ParseError> {
        if &self.current == expected {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("Expected {expected:?}, got {:?}", self.current)))
        }
    }

    fn eat_semicolon(&mut self) -> Result<(), ParseError> {
        if self.current == Token::Semicolon {
            self.advance()?;
            return Ok(());
        }
        // ASI
        if self.prev_line_terminator
            || self.current == Token::RightBrace
            || self.current == Token::Eof
        {
            return Ok(());
        }
        Err(self.error("Expected semicolon"))
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        let kind = if self.current == Token::Eof {
            ParseErrorKind::UnexpectedEnd
        } else {
            ParseErrorKind::UnexpectedToken
        };
        self.error_kind(kind, msg)
    }

    fn error_kind(&self, kind: ParseErrorKind, msg: impl Into<String>) -> ParseError {
        ParseError {
            kind,
            message: msg.into(),
            line: self.current_token_start.line,
            column: self.current_token_start.column,
        }
    }

    fn set_strict(&mut self, strict: bool) {
        self.strict = strict;
        self.lexer.strict = strict;
    }

    fn parse_optional_label(&mut self) -> Result<Option<String>, ParseError> {
        if !self.prev_line_terminator
            && let Some(name) = self.current_identifier_name()
        {
            self.advance()?;
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn is_strict_reserved_word(name: &str) -> bool {
        matches!(
            name,
            "implements"
                | "interface"
                | "let"
                | "package"
                | "private"
                | "protected"
                | "public"
                | "static"
                | "yield"
        )
    }

    fn current_identifier_name(&self) -> Option<String> {
        match &self.current {
            Token::Identifier(name) if !(self.strict && Self::is_strict_reserved_word(name)) => {
                Some(name.clone())
            }
            _ => None,
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParseError> {
        if let Token::Identifier(name) = &self.current
            && self.strict
            && Self::is_strict_reserved_word(name)
        {
            return Err(self.error_kind(
                ParseErrorKind::StrictMode,
                format!("Unexpected strict mode reserved word '{name}'"),
            ));
        }
        match self.current_identifier_name() {
            Some(name) => {
                self.advance()?;
                Ok(name)
            }
            None => Err(self.error(format!("Expected {what}, got {:?}", self.current))),
        }
    }

    fn check_strict_binding_identifier(&self, name: &str) -> Result<(), ParseError> {
        if self.strict && (name == "eval" || name == "arguments") {
            return Err(self.error_kind(
                ParseErrorKind::StrictMode,
                format!("'{name}' can't be used as a binding identifier in strict mode"),
            ));
        }
        Ok(())
    }

    fn is_directive_prologue(stmt: &Statement) -> Option<&str> {
        match stmt {
            Statement::Expression(Expression::Literal(Literal::String(s))) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Parses a statement list up to `end`, applying any `"use strict"`
    /// directive in its prologue. Returns whether the directive was present.
    fn parse_source_elements(&mut self, end: &Token) -> Result<(Vec<Statement>, bool), ParseError> {
        let mut body = Vec::new();
        let mut in_directive_prologue = true;
        let mut has_use_strict = false;

        while &self.current != end {
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input"));
            }
            let stmt = self.parse_source_element()?;

            if in_directive_prologue {
                if let Some(directive) = Self::is_directive_prologue(&stmt) {
                    if directive == "use strict" {
                        self.set_strict(true);
                        has_use_strict = true;
                    }
                } else {
                    in_directive_prologue = false;
                }
            }

            body.push(stmt);
        }
        Ok((body, has_use_strict))
    }

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let (body, _) = self.parse_source_elements(&Token::Eof)?;
        let hoisting = collect_hoisting(&body);
        Ok(Program {
            body,
            strict: self.strict,
            hoisting,
        })
    }
}
