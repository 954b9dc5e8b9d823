use std::fmt;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    // Identifiers and keywords
    Identifier(String),
    Keyword(Keyword),

    // Literals
    NumericLiteral(f64),
    LegacyOctalLiteral(f64),
    StringLiteral(String),
    BooleanLiteral(bool),
    NullLiteral,

    // Punctuators (§7.7)
    LeftBrace,                // {
    RightBrace,               // }
    LeftParen,                // (
    RightParen,               // )
    LeftBracket,              // [
    RightBracket,             // ]
    Dot,                      // .
    Semicolon,                // ;
    Comma,                    // ,
    LessThan,                 // <
    GreaterThan,              // >
    LessThanEqual,            // <=
    GreaterThanEqual,         // >=
    Equal,                    // ==
    NotEqual,                 // !=
    StrictEqual,              // ===
    StrictNotEqual,           // !==
    Plus,                     // +
    Minus,                    // -
    Star,                     // *
    Percent,                  // %
    Increment,                // ++
    Decrement,                // --
    LeftShift,                // <<
    RightShift,               // >>
    UnsignedRightShift,       // >>>
    Ampersand,                // &
    Pipe,                     // |
    Caret,                    // ^
    Bang,                     // !
    Tilde,                    // ~
    LogicalAnd,               // &&
    LogicalOr,                // ||
    Question,                 // ?
    Colon,                    // :
    Assign,                   // =
    PlusAssign,               // +=
    MinusAssign,              // -=
    StarAssign,               // *=
    PercentAssign,            // %=
    LeftShiftAssign,          // <<=
    RightShiftAssign,         // >>=
    UnsignedRightShiftAssign, // >>>=
    AmpersandAssign,          // &=
    PipeAssign,               // |=
    CaretAssign,              // ^=
    Slash,                    // /
    SlashAssign,              // /=

    // Special
    LineTerminator,
    Eof,
}

/// Keywords and future reserved words of ES5.1 (§7.6.1). The strict-mode-only
/// reserved words are left as identifiers and checked by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Return,
    Super,
    Switch,
    This,
    Throw,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
}

impl Keyword {
    pub fn from_str(s: &str) -> Option<Keyword> {
        let kw = match s {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "enum" => Keyword::Enum,
            "export" => Keyword::Export,
            "extends" => Keyword::Extends,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "return" => Keyword::Return,
            "super" => Keyword::Super,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::New => "new",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{}:{}: {message}", location.line, location.column)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
}

pub struct Lexer<'a> {
    chars: Chars<'a>,
    current: Option<char>,
    offset: usize,
    line: u32,
    column: u32,
    token_start: SourceLocation,
    pub strict: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.chars();
        let current = chars.next();
        Self {
            chars,
            current,
            offset: 0,
            line: 1,
            column: 0,
            token_start: SourceLocation {
                line: 1,
                column: 0,
                offset: 0,
            },
            strict: false,
        }
    }

    /// Location of the first character of the most recently produced token.
    pub fn token_start(&self) -> SourceLocation {
        self.token_start
    }

    fn peek(&self) -> Option<char> {
        self.current
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current;
        if let Some(c) = ch {
            self.offset += c.len_utf8();
            self.column += 1;
            self.current = self.chars.next();
        }
        ch
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.clone().next()
    }

    fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            location: self.location(),
        }
    }

    fn is_line_terminator(ch: char) -> bool {
        matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
    }

    fn is_whitespace(ch: char) -> bool {
        matches!(
            ch,
            '\t' | '\u{000B}' | '\u{000C}' | ' ' | '\u{00A0}' | '\u{FEFF}'
        ) || ch.is_whitespace() && !Self::is_line_terminator(ch)
    }

    fn is_identifier_start(ch: char) -> bool {
        ch == '_' || ch == '$' || ch.is_ascii_alphabetic() || unicode_id_start(ch)
    }

    fn is_identifier_continue(ch: char) -> bool {
        ch == '_'
            || ch == '$'
            || ch.is_ascii_alphanumeric()
            || ch == '\u{200C}'
            || ch == '\u{200D}'
            || unicode_id_continue(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_whitespace(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if Self::is_line_terminator(ch) {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<bool, LexError> {
        let mut has_line_terminator = false;
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(has_line_terminator);
                }
                Some(ch) if Self::is_line_terminator(ch) => {
                    has_line_terminator = true;
                    self.handle_newline(ch);
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated block comment")),
            }
        }
    }

    fn handle_newline(&mut self, ch: char) {
        if ch == '\r' && self.peek() == Some('\n') {
            self.advance();
        }
        self.line += 1;
        self.column = 0;
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("Unterminated string literal")),
                Some(ch) if ch == quote => return Ok(s),
                Some(ch) if Self::is_line_terminator(ch) => {
                    return Err(self.error("Unterminated string literal"));
                }
                Some('\\') => self.read_escape_sequence(&mut s)?,
                Some(ch) => s.push(ch),
            }
        }
    }

    // §7.8.4 EscapeSequence, LineContinuation and the legacy octal escapes of B.1.2
    fn read_escape_sequence(&mut self, out: &mut String) -> Result<(), LexError> {
        match self.advance() {
            None => return Err(self.error("Unterminated escape sequence")),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('v') => out.push('\u{000B}'),
            Some(ch @ '0'..='7') => {
                if ch == '0' && !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    out.push('\0');
                    return Ok(());
                }
                if self.strict {
                    return Err(self.error("Octal escape sequences are not allowed in strict mode"));
                }
                let mut val = ch as u32 - '0' as u32;
                if let Some(d) = self.peek().and_then(|c| c.to_digit(8)) {
                    self.advance();
                    val = val * 8 + d;
                    if ch <= '3'
                        && let Some(d) = self.peek().and_then(|c| c.to_digit(8))
                    {
                        self.advance();
                        val = val * 8 + d;
                    }
                }
                out.extend(char::from_u32(val));
            }
            Some('x') => {
                let val = self.read_hex_digits(2)?;
                out.extend(char::from_u32(val));
            }
            Some('u') => {
                let val = self.read_hex_digits(4)?;
                out.push(char::from_u32(val).unwrap_or('\u{FFFD}'));
            }
            Some(ch) if Self::is_line_terminator(ch) => self.handle_newline(ch),
            Some(ch) => out.push(ch),
        }
        Ok(())
    }

    fn read_hex_digits(&mut self, count: usize) -> Result<u32, LexError> {
        let mut val = 0;
        for _ in 0..count {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid hexadecimal escape sequence"))?;
            val = val * 16 + digit;
        }
        Ok(val)
    }

    fn read_numeric_literal(&mut self, first: char) -> Result<Token, LexError> {
        let mut s = String::new();
        s.push(first);

        if first == '0' {
            match self.peek() {
                Some('x' | 'X') => return self.read_hex_literal(),
                Some(c) if c.is_ascii_digit() => return self.read_legacy_octal_or_decimal(s),
                _ => {}
            }
        }

        if first != '.' {
            self.read_decimal_digits(&mut s);
            if self.peek() == Some('.') {
                s.push('.');
                self.advance();
            }
        }
        self.read_decimal_digits(&mut s);
        self.read_exponent(&mut s);

        if self.peek().is_some_and(Self::is_identifier_start) {
            return Err(self.error("Identifier starts immediately after numeric literal"));
        }

        let val: f64 = s
            .parse()
            .map_err(|_| self.error("Invalid numeric literal"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_decimal_digits(&mut self, s: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_exponent(&mut self, s: &mut String) {
        if let Some(e @ ('e' | 'E')) = self.peek() {
            s.push(e);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                s.push(sign);
                self.advance();
            }
            self.read_decimal_digits(s);
        }
    }

    fn read_hex_literal(&mut self) -> Result<Token, LexError> {
        self.advance(); // x/X
        let mut val = 0.0f64;
        let mut digits = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(16)) {
            val = val * 16.0 + f64::from(d);
            digits += 1;
            self.advance();
        }
        if digits == 0 {
            return Err(self.error("Invalid hex literal"));
        }
        Ok(Token::NumericLiteral(val))
    }

    fn read_legacy_octal_or_decimal(&mut self, mut s: String) -> Result<Token, LexError> {
        let mut is_octal = true;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                if ch >= '8' {
                    is_octal = false;
                }
                s.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if self.strict {
            return Err(self.error("Octal literals are not allowed in strict mode"));
        }
        if is_octal {
            let val = s[1..]
                .chars()
                .filter_map(|c| c.to_digit(8))
                .fold(0.0, |acc, d| acc * 8.0 + f64::from(d));
            return Ok(Token::LegacyOctalLiteral(val));
        }
        if self.peek() == Some('.') {
            s.push('.');
            self.advance();
            self.read_decimal_digits(&mut s);
        }
        self.read_exponent(&mut s);
        let val: f64 = s.parse().map_err(|_| self.error("Invalid numeric literal"))?;
        Ok(Token::NumericLiteral(val))
    }

    fn read_identifier(&mut self, first: String) -> Result<Token, LexError> {
        let mut name = first;
        while let Some(ch) = self.peek() {
            if Self::is_identifier_continue(ch) {
                name.push(ch);
                self.advance();
            } else if ch == '\\' {
                self.advance();
                name.push(self.read_identifier_escape()?);
            } else {
                break;
            }
        }

        Ok(match name.as_str() {
            "true" => Token::BooleanLiteral(true),
            "false" => Token::BooleanLiteral(false),
            "null" => Token::NullLiteral,
            _ => match Keyword::from_str(&name) {
                Some(kw) => Token::Keyword(kw),
                None => Token::Identifier(name),
            },
        })
    }

    fn read_identifier_escape(&mut self) -> Result<char, LexError> {
        if self.advance() != Some('u') {
            return Err(self.error("Invalid Unicode escape in identifier"));
        }
        let val = self.read_hex_digits(4)?;
        char::from_u32(val).ok_or_else(|| self.error("Invalid Unicode escape in identifier"))
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            self.skip_whitespace();
            self.token_start = self.location();

            let ch = match self.peek() {
                None => return Ok(Token::Eof),
                Some(ch) => ch,
            };

            if Self::is_line_terminator(ch) {
                self.advance();
                self.handle_newline(ch);
                return Ok(Token::LineTerminator);
            }

            if ch == '/' {
                if self.peek_next() == Some('/') {
                    self.advance();
                    self.advance();
                    self.skip_line_comment();
                    continue;
                }
                if self.peek_next() == Some('*') {
                    self.advance();
                    self.advance();
                    if self.skip_block_comment()? {
                        return Ok(Token::LineTerminator);
                    }
                    continue;
                }
            }

            self.advance();

            if ch == '\'' || ch == '"' {
                return self.read_string(ch).map(Token::StringLiteral);
            }

            if ch.is_ascii_digit() {
                return self.read_numeric_literal(ch);
            }
            if ch == '.' && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return self.read_numeric_literal(ch);
            }

            if Self::is_identifier_start(ch) {
                return self.read_identifier(ch.to_string());
            }
            if ch == '\\' {
                let first = self.read_identifier_escape()?;
                return self.read_identifier(first.to_string());
            }

            return self.read_punctuator(ch);
        }
    }

    /// Consumes `=` when it follows a punctuator, choosing the compound form.
    fn with_assign(&mut self, plain: Token, compound: Token) -> Token {
        if self.peek() == Some('=') {
            self.advance();
            compound
        } else {
            plain
        }
    }

    fn read_punctuator(&mut self, ch: char) -> Result<Token, LexError> {
        let token = match ch {
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            '[' => Token::LeftBracket,
            ']' => Token::RightBracket,
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '~' => Token::Tilde,
            ':' => Token::Colon,
            '?' => Token::Question,
            '.' => Token::Dot,

            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    self.with_assign(Token::LeftShift, Token::LeftShiftAssign)
                } else {
                    self.with_assign(Token::LessThan, Token::LessThanEqual)
                }
            }

            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    if self.peek() == Some('>') {
                        self.advance();
                        self.with_assign(Token::UnsignedRightShift, Token::UnsignedRightShiftAssign)
                    } else {
                        self.with_assign(Token::RightShift, Token::RightShiftAssign)
                    }
                } else {
                    self.with_assign(Token::GreaterThan, Token::GreaterThanEqual)
                }
            }

            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.with_assign(Token::Equal, Token::StrictEqual)
                } else {
                    Token::Assign
                }
            }

            '!' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.with_assign(Token::NotEqual, Token::StrictNotEqual)
                } else {
                    Token::Bang
                }
            }

            '+' => {
                if self.peek() == Some('+') {
                    self.advance();
                    Token::Increment
                } else {
                    self.with_assign(Token::Plus, Token::PlusAssign)
                }
            }

            '-' => {
                if self.peek() == Some('-') {
                    self.advance();
                    Token::Decrement
                } else {
                    self.with_assign(Token::Minus, Token::MinusAssign)
                }
            }

            '&' => {
                if self.peek() == Some('&') {
                    self.advance();
                    Token::LogicalAnd
                } else {
                    self.with_assign(Token::Ampersand, Token::AmpersandAssign)
                }
            }

            '|' => {
                if self.peek() == Some('|') {
                    self.advance();
                    Token::LogicalOr
                } else {
                    self.with_assign(Token::Pipe, Token::PipeAssign)
                }
            }

            '*' => self.with_assign(Token::Star, Token::StarAssign),
            '/' => self.with_assign(Token::Slash, Token::SlashAssign),
            '%' => self.with_assign(Token::Percent, Token::PercentAssign),
            '^' => self.with_assign(Token::Caret, Token::CaretAssign),

            _ => return Err(self.error(format!("Unexpected character: {ch}"))),
        };
        Ok(token)
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn unicode_id_start(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_start(ch)
}

fn unicode_id_continue(ch: char) -> bool {
    !ch.is_ascii() && unicode_ident::is_xid_continue(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(src);
        lexer.tokenize_all().unwrap()
    }

    fn lex_no_lt(src: &str) -> Vec<Token> {
        lex(src)
            .into_iter()
            .filter(|t| !matches!(t, Token::LineTerminator))
            .collect()
    }

    #[test]
    fn empty_source() {
        assert_eq!(lex(""), vec![Token::Eof]);
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            lex_no_lt("var x = 42;"),
            vec![
                Token::Keyword(Keyword::Var),
                Token::Identifier("x".into()),
                Token::Assign,
                Token::NumericLiteral(42.0),
                Token::Semicolon,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strict_reserved_words_are_identifiers() {
        assert_eq!(
            lex_no_lt("let yield"),
            vec![
                Token::Identifier("let".into()),
                Token::Identifier("yield".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            lex_no_lt(r#""hello""#),
            vec![Token::StringLiteral("hello".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r"'he\nllo'"),
            vec![Token::StringLiteral("he\nllo".into()), Token::Eof]
        );
        assert_eq!(
            lex_no_lt(r#""A\x42""#),
            vec![Token::StringLiteral("AB".into()), Token::Eof]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(lex_no_lt("0xff"), vec![Token::NumericLiteral(255.0), Token::Eof]);
        assert_eq!(lex_no_lt("1e3"), vec![Token::NumericLiteral(1000.0), Token::Eof]);
        assert_eq!(lex_no_lt(".5"), vec![Token::NumericLiteral(0.5), Token::Eof]);
        assert_eq!(lex_no_lt("010"), vec![Token::LegacyOctalLiteral(8.0), Token::Eof]);
        assert_eq!(lex_no_lt("019"), vec![Token::NumericLiteral(19.0), Token::Eof]);
    }

    #[test]
    fn octal_rejected_in_strict_mode() {
        let mut lexer = Lexer::new("010");
        lexer.strict = true;
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn boolean_null() {
        assert_eq!(
            lex_no_lt("true false null"),
            vec![
                Token::BooleanLiteral(true),
                Token::BooleanLiteral(false),
                Token::NullLiteral,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn punctuators() {
        assert_eq!(lex_no_lt("==="), vec![Token::StrictEqual, Token::Eof]);
        assert_eq!(lex_no_lt("!=="), vec![Token::StrictNotEqual, Token::Eof]);
        assert_eq!(
            lex_no_lt(">>>="),
            vec![Token::UnsignedRightShiftAssign, Token::Eof]
        );
        assert_eq!(
            lex_no_lt("a&&b"),
            vec![
                Token::Identifier("a".into()),
                Token::LogicalAnd,
                Token::Identifier("b".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            lex_no_lt("// comment\n42"),
            vec![Token::NumericLiteral(42.0), Token::Eof]
        );
        assert_eq!(
            lex("/* a\nb */ 42"),
            vec![Token::LineTerminator, Token::NumericLiteral(42.0), Token::Eof]
        );
    }

    #[test]
    fn token_start_tracks_lines() {
        let mut lexer = Lexer::new("a\n  b");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("b".into()));
        assert_eq!(lexer.token_start().line, 2);
        assert_eq!(lexer.token_start().column, 2);
    }
}
