use crate::error::{CodeError, Span};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    Comma,
    Colon,
    Minus,
    Plus,
    Slash,
    Star,
    Percent,
    Ampersand,
    Dollar,

    // One or two character tokens
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    LessGreater,

    // Literals
    Identifier,
    Integer,
    Float,
    Char,
    String,
    Bool,
    Escape,

    // Keywords
    Begin,
    End,
    Code,
    TypeName,
    Display,
    Scan,
    If,
    Else,
    While,
    Switch,
    Case,
    Default,
    And,
    Or,
    Not,

    // Special
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }
}

pub struct Lexer {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("BEGIN", TokenType::Begin);
        keywords.insert("END", TokenType::End);
        keywords.insert("CODE", TokenType::Code);
        keywords.insert("DISPLAY", TokenType::Display);
        keywords.insert("SCAN", TokenType::Scan);
        keywords.insert("IF", TokenType::If);
        keywords.insert("ELSE", TokenType::Else);
        keywords.insert("WHILE", TokenType::While);
        keywords.insert("SWITCH", TokenType::Switch);
        keywords.insert("CASE", TokenType::Case);
        keywords.insert("DEFAULT", TokenType::Default);
        keywords.insert("AND", TokenType::And);
        keywords.insert("OR", TokenType::Or);
        keywords.insert("NOT", TokenType::Not);
        keywords.insert("TRUE", TokenType::Bool);
        keywords.insert("FALSE", TokenType::Bool);
        for type_name in ["INT", "FLOAT", "CHAR", "BOOL", "STRING"] {
            keywords.insert(type_name, TokenType::TypeName);
        }

        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            keywords,
        }
    }

    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, CodeError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::single(self.current),
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), CodeError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '/' => self.add_token(TokenType::Slash),
            '%' => self.add_token(TokenType::Percent),
            '&' => self.add_token(TokenType::Ampersand),
            '$' => self.add_token(TokenType::Dollar),
            '=' => {
                let token_type = if self.match_char('=') {
                    TokenType::EqualEqual
                } else {
                    TokenType::Equal
                };
                self.add_token(token_type);
            }
            '<' => {
                let token_type = if self.match_char('=') {
                    TokenType::LessEqual
                } else if self.match_char('>') {
                    TokenType::LessGreater
                } else {
                    TokenType::Less
                };
                self.add_token(token_type);
            }
            '>' => {
                let token_type = if self.match_char('=') {
                    TokenType::GreaterEqual
                } else {
                    TokenType::Greater
                };
                self.add_token(token_type);
            }
            '#' => {
                // Comment goes until end of line
                while self.peek() != '\n' && !self.is_at_end() {
                    self.advance();
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.add_token(TokenType::Newline),
            '"' => self.string()?,
            '\'' => self.character()?,
            '[' => self.escape()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() || c == '_' => self.identifier(),
            _ => {
                return Err(CodeError::lex_error(
                    Span::single(self.start),
                    format!("Unexpected character: '{}'", c),
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if !self.is_at_end() {
            self.current += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.current += 1;
            true
        }
    }

    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.source.get(self.current + offset).copied().unwrap_or('\0')
    }

    fn string(&mut self) -> Result<(), CodeError> {
        while self.peek() != '"' && self.peek() != '\n' && !self.is_at_end() {
            self.advance();
        }

        if self.peek() != '"' {
            return Err(CodeError::lex_error(
                Span::new(self.start, self.current),
                "Unterminated string".to_string(),
            )
            .with_help("String literals must be closed with '\"' on the same line."));
        }

        // Consume the closing "
        self.advance();

        let lexeme = self.lexeme();
        if lexeme == "\"TRUE\"" || lexeme == "\"FALSE\"" {
            let unquoted = lexeme.trim_matches('"').to_string();
            self.add_token_with_content(TokenType::Bool, unquoted);
        } else {
            self.add_token_with_content(TokenType::String, lexeme);
        }
        Ok(())
    }

    fn character(&mut self) -> Result<(), CodeError> {
        let c = self.advance();
        if c == '\n' || c == '\0' || !self.match_char('\'') {
            return Err(CodeError::lex_error(
                Span::new(self.start, self.current),
                "Invalid character literal".to_string(),
            )
            .with_help("Character literals hold exactly one character, e.g. 'a'."));
        }

        self.add_token(TokenType::Char);
        Ok(())
    }

    fn escape(&mut self) -> Result<(), CodeError> {
        // `[\]` alone is a backslash; `[\n]`, `[\]]` and friends are
        // backslash escapes.
        let backslash = self.peek() == '\\'
            && (self.peek_next() != ']' || self.peek_at(2) == ']');

        if backslash {
            self.advance();
            let c = self.advance();
            if !matches!(c, 'n' | 't' | 'r' | '\\' | '[' | ']') {
                return Err(CodeError::lex_error(
                    Span::new(self.start, self.current),
                    format!("Unknown escape sequence '\\{}'", c.escape_default()),
                )
                .with_help("Known escapes are [\\n], [\\t], [\\r], [\\\\], [\\[] and [\\]]."));
            }
        } else {
            let c = self.advance();
            if c == '\n' || c == '\0' {
                return Err(self.invalid_escape());
            }
        }

        if !self.match_char(']') {
            return Err(self.invalid_escape());
        }
        self.add_token(TokenType::Escape);
        Ok(())
    }

    fn invalid_escape(&self) -> CodeError {
        CodeError::lex_error(
            Span::new(self.start, self.current),
            "Invalid escape literal".to_string(),
        )
        .with_help("Escape literals wrap one character in brackets, e.g. [#] or [\\n].")
    }

    fn number(&mut self) -> Result<(), CodeError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;

        // Look for fractional part
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let number = self.lexeme();

        if is_float {
            if number.parse::<f64>().is_err() {
                return Err(CodeError::lex_error(
                    Span::new(self.start, self.current),
                    format!("Invalid float: {}", number),
                ));
            }
            self.add_token_with_content(TokenType::Float, number);
        } else {
            if number.parse::<i64>().is_err() {
                return Err(CodeError::lex_error(
                    Span::new(self.start, self.current),
                    format!("Invalid integer: {}", number),
                ));
            }
            self.add_token_with_content(TokenType::Integer, number);
        }

        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let token_type = self
            .keywords
            .get(text.as_str())
            .cloned()
            .unwrap_or(TokenType::Identifier);

        self.add_token_with_content(token_type, text);
    }

    fn lexeme(&self) -> String {
        self.source[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = self.lexeme();
        self.add_token_with_content(token_type, text);
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current),
        ));
    }
}
