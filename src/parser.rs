use crate::ast::{
    BinaryOp, ConditionalBlock, Declarator, Expr, LiteralKind, Name, Program, Stmt, SwitchCase,
    UnaryOp,
};
use crate::error::{CodeError, ErrorKind, Span};
use crate::lexer::{Token, TokenType};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, CodeError> {
        let start = self.peek().span.start;
        self.skip_newlines();

        let has_begin = if self.check(&TokenType::Begin) && self.check_next(&TokenType::Code) {
            self.advance();
            self.advance();
            self.end_of_statement()?;
            true
        } else {
            false
        };

        let statements = self.statements()?;

        if !self.is_at_end() && !self.check(&TokenType::End) {
            let token = self.peek().clone();
            return Err(CodeError::parse_error_with_help(
                token.span,
                format!("Unexpected '{}' outside of SWITCH", token.lexeme),
                "CASE and DEFAULT may only appear between 'BEGIN SWITCH' and 'END SWITCH'.".to_string(),
            ));
        }

        let mut has_end = false;
        if self.match_types(&[TokenType::End]) {
            self.consume_with_help(
                TokenType::Code,
                "Expected 'CODE' after 'END'",
                "The program must close with 'END CODE'.".to_string(),
            )?;
            self.skip_newlines();
            // Anything after END CODE means the marker is not the end of the program.
            has_end = self.is_at_end();
            while !self.is_at_end() {
                self.advance();
            }
        }

        Ok(Program {
            has_begin,
            has_end,
            statements,
            span: Span::new(start, self.peek().span.end),
        })
    }

    /// Statements up to a block closer (`END`, `CASE`, `DEFAULT`) or end of input.
    fn statements(&mut self) -> Result<Vec<Stmt>, CodeError> {
        let mut statements = Vec::new();
        self.skip_newlines();

        while !self.is_at_end() && !self.at_block_closer() {
            statements.push(self.statement()?);
            self.end_of_statement()?;
            self.skip_newlines();
        }

        Ok(statements)
    }

    fn statement(&mut self) -> Result<Stmt, CodeError> {
        if self.match_types(&[TokenType::TypeName]) {
            self.declaration()
        } else if self.check(&TokenType::Identifier) && self.check_next(&TokenType::Identifier) {
            // Unknown type keyword; rejected when the declaration executes.
            self.advance();
            self.declaration()
        } else if self.check(&TokenType::Identifier) {
            self.assignment()
        } else if self.match_types(&[TokenType::Display]) {
            self.display_statement()
        } else if self.match_types(&[TokenType::Scan]) {
            self.scan_statement()
        } else if self.match_types(&[TokenType::If]) {
            self.if_statement()
        } else if self.match_types(&[TokenType::While]) {
            self.while_statement()
        } else if self.match_types(&[TokenType::Switch]) {
            self.switch_statement()
        } else if self.check(&TokenType::Begin) && self.check_next(&TokenType::Code) {
            Err(CodeError::parse_error_with_help(
                self.peek().span.to(&self.tokens[self.current + 1].span),
                "Unexpected 'BEGIN CODE'".to_string(),
                "A program has exactly one 'BEGIN CODE', on its first line.".to_string(),
            ))
        } else {
            let token = self.peek().clone();
            Err(CodeError::parse_error_with_help(
                token.span.clone(),
                format!("Expected statement, found '{}'", describe(&token)),
                "Statements start with a type keyword, a variable name, DISPLAY, SCAN, IF, WHILE or SWITCH.".to_string(),
            ))
        }
    }

    fn declaration(&mut self) -> Result<Stmt, CodeError> {
        let type_token = self.previous().clone();
        let mut declarators = Vec::new();

        loop {
            let name = self.name("Expected variable name in declaration")?;
            let initializer = if self.match_types(&[TokenType::Equal]) {
                Some(self.expression()?)
            } else {
                None
            };
            declarators.push(Declarator { name, initializer });

            if !self.match_types(&[TokenType::Comma]) {
                break;
            }
        }

        Ok(Stmt::Declaration {
            data_type: type_token.lexeme,
            type_span: type_token.span.clone(),
            declarators,
            span: type_token.span.to(&self.previous().span),
        })
    }

    fn assignment(&mut self) -> Result<Stmt, CodeError> {
        let start = self.peek().span.clone();
        let mut targets = vec![self.name("Expected variable name")?];
        self.consume_with_help(
            TokenType::Equal,
            "Expected '=' after variable name",
            "Assignments look like 'x = 5' or 'x = y = 5'.".to_string(),
        )?;

        while self.check(&TokenType::Identifier) && self.check_next(&TokenType::Equal) {
            targets.push(self.name("Expected variable name")?);
            self.advance();
        }

        let value = self.expression()?;
        Ok(Stmt::Assignment {
            targets,
            value,
            span: start.to(&self.previous().span),
        })
    }

    fn display_statement(&mut self) -> Result<Stmt, CodeError> {
        let start = self.previous().span.clone();
        self.consume_with_help(
            TokenType::Colon,
            "Expected ':' after 'DISPLAY'",
            "Display statements look like 'DISPLAY: expression'.".to_string(),
        )?;
        let expr = self.expression()?;
        Ok(Stmt::Display {
            expr,
            span: start.to(&self.previous().span),
        })
    }

    fn scan_statement(&mut self) -> Result<Stmt, CodeError> {
        let start = self.previous().span.clone();
        self.consume_with_help(
            TokenType::Colon,
            "Expected ':' after 'SCAN'",
            "Scan statements look like 'SCAN: x, y'.".to_string(),
        )?;

        let mut targets = vec![self.name("Expected variable name after 'SCAN:'")?];
        while self.match_types(&[TokenType::Comma]) {
            targets.push(self.name("Expected variable name after ','")?);
        }

        Ok(Stmt::Scan {
            targets,
            span: start.to(&self.previous().span),
        })
    }

    fn if_statement(&mut self) -> Result<Stmt, CodeError> {
        let start = self.previous().span.clone();
        let mut branches = vec![self.conditional_block()?];
        let mut else_branch = None;

        while self.peek_past_newlines().token_type == TokenType::Else {
            self.skip_newlines();
            self.advance();
            if self.match_types(&[TokenType::If]) {
                branches.push(self.conditional_block()?);
            } else {
                self.skip_newlines();
                else_branch = Some(self.block(TokenType::If, "IF")?);
                break;
            }
        }

        Ok(Stmt::If {
            branches,
            else_branch,
            span: start.to(&self.previous().span),
        })
    }

    fn conditional_block(&mut self) -> Result<ConditionalBlock, CodeError> {
        let condition = self.condition("IF")?;
        self.skip_newlines();
        let body = self.block(TokenType::If, "IF")?;
        Ok(ConditionalBlock { condition, body })
    }

    fn while_statement(&mut self) -> Result<Stmt, CodeError> {
        let start = self.previous().span.clone();
        let condition = self.condition("WHILE")?;
        self.skip_newlines();
        let body = self.block(TokenType::While, "WHILE")?;

        Ok(Stmt::While {
            condition,
            body,
            span: start.to(&self.previous().span),
        })
    }

    fn switch_statement(&mut self) -> Result<Stmt, CodeError> {
        let start = self.previous().span.clone();
        let scrutinee = self.condition("SWITCH")?;
        self.skip_newlines();
        self.block_opener(TokenType::Switch, "SWITCH")?;
        self.skip_newlines();

        let mut cases = Vec::new();
        while self.match_types(&[TokenType::Case]) {
            let value = self.expression()?;
            self.consume_with_help(
                TokenType::Colon,
                "Expected ':' after case value",
                "Cases look like 'CASE 1:' followed by statements.".to_string(),
            )?;
            let body = self.statements()?;
            cases.push(SwitchCase { value, body });
        }

        let default = if self.match_types(&[TokenType::Default]) {
            self.consume_with_help(
                TokenType::Colon,
                "Expected ':' after 'DEFAULT'",
                "The default case looks like 'DEFAULT:' followed by statements.".to_string(),
            )?;
            Some(self.statements()?)
        } else {
            None
        };

        self.block_closer(TokenType::Switch, "SWITCH")?;

        Ok(Stmt::Switch {
            scrutinee,
            cases,
            default,
            span: start.to(&self.previous().span),
        })
    }

    fn condition(&mut self, keyword: &str) -> Result<Expr, CodeError> {
        if !self.check(&TokenType::LeftParen) {
            return Err(CodeError::parse_error_with_help(
                self.peek().span.clone(),
                format!("Expected '(' after '{}'", keyword),
                format!("{} requires parentheses around its expression: {} (x > 0)", keyword, keyword),
            ));
        }
        self.expression()
    }

    /// `BEGIN <kind>` statements `END <kind>`
    fn block(&mut self, kind: TokenType, keyword: &str) -> Result<Vec<Stmt>, CodeError> {
        self.block_opener(kind.clone(), keyword)?;
        let statements = self.statements()?;
        self.block_closer(kind, keyword)?;
        Ok(statements)
    }

    fn block_opener(&mut self, kind: TokenType, keyword: &str) -> Result<(), CodeError> {
        let help = format!("Blocks are written 'BEGIN {}' ... 'END {}'.", keyword, keyword);
        self.consume_with_help(
            TokenType::Begin,
            &format!("Expected 'BEGIN {}'", keyword),
            help.clone(),
        )?;
        self.consume_with_help(kind, &format!("Expected '{}' after 'BEGIN'", keyword), help)?;
        Ok(())
    }

    fn block_closer(&mut self, kind: TokenType, keyword: &str) -> Result<(), CodeError> {
        let help = format!("Every 'BEGIN {}' needs a matching 'END {}'.", keyword, keyword);
        self.consume_with_help(
            TokenType::End,
            &format!("Expected 'END {}'", keyword),
            help.clone(),
        )?;
        self.consume_with_help(kind, &format!("Expected '{}' after 'END'", keyword), help)?;
        Ok(())
    }

    fn expression(&mut self) -> Result<Expr, CodeError> {
        self.concatenation()
    }

    fn concatenation(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(&[TokenType::Ampersand], Self::or)
    }

    fn or(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(&[TokenType::Or], Self::and)
    }

    fn and(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(&[TokenType::And], Self::not)
    }

    fn not(&mut self) -> Result<Expr, CodeError> {
        if self.match_types(&[TokenType::Not]) {
            let start = self.previous().span.clone();
            let operand = self.not()?;
            let span = start.to(operand.span());
            return Ok(Expr::Not {
                operand: Box::new(operand),
                span,
            });
        }

        self.equality()
    }

    fn equality(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(&[TokenType::EqualEqual, TokenType::LessGreater], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(
            &[
                TokenType::Greater,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(&[TokenType::Plus, TokenType::Minus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr, CodeError> {
        self.binary_level(
            &[TokenType::Star, TokenType::Slash, TokenType::Percent],
            Self::unary,
        )
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr, CodeError>,
    ) -> Result<Expr, CodeError> {
        let mut expr = operand(self)?;

        while self.match_types(operators) {
            let operator_token = self.previous().clone();
            let operator = binary_operator(&operator_token.token_type);

            let right = operand(self).map_err(|error| {
                if error.kind == ErrorKind::Parse {
                    CodeError::parse_error_with_help(
                        operator_token.span.clone(),
                        format!("Expected expression after '{}'", operator_token.lexeme),
                        format!(
                            "The '{}' operator requires expressions on both sides.",
                            operator.symbol()
                        ),
                    )
                } else {
                    error
                }
            })?;
            let span = expr.span().to(right.span());

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
                span,
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, CodeError> {
        if self.match_types(&[TokenType::Plus, TokenType::Minus]) {
            let operator = match self.previous().token_type {
                TokenType::Plus => UnaryOp::Plus,
                _ => UnaryOp::Negate,
            };

            let start = self.previous().span.clone();
            let operand = self.unary()?;
            let span = start.to(operand.span());

            return Ok(Expr::Unary {
                operator,
                operand: Box::new(operand),
                span,
            });
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, CodeError> {
        if self.is_at_end() {
            return Err(CodeError::parse_error_with_help(
                self.peek().span.clone(),
                "Unexpected end of input".to_string(),
                "Expected an expression here. Check for unmatched parentheses or incomplete statements.".to_string(),
            ));
        }

        let token = self.advance().clone();

        let literal_kind = match token.token_type {
            TokenType::Integer => Some(LiteralKind::Int),
            TokenType::Float => Some(LiteralKind::Float),
            TokenType::Char => Some(LiteralKind::Char),
            TokenType::Bool => Some(LiteralKind::Bool),
            TokenType::String => Some(LiteralKind::String),
            _ => None,
        };
        if let Some(kind) = literal_kind {
            return Ok(Expr::Literal {
                kind,
                lexeme: token.lexeme,
                span: token.span,
            });
        }

        match token.token_type {
            TokenType::Escape => Ok(Expr::Escape {
                lexeme: token.lexeme,
                span: token.span,
            }),
            TokenType::Dollar => Ok(Expr::Newline { span: token.span }),
            TokenType::Identifier => Ok(Expr::Variable {
                name: token.lexeme,
                span: token.span,
            }),
            TokenType::LeftParen => {
                let start_span = token.span;

                if self.check(&TokenType::RightParen) {
                    return Err(CodeError::parse_error_with_help(
                        start_span.to(&self.peek().span),
                        "Empty parentheses are not allowed".to_string(),
                        "Parentheses must contain an expression, e.g. (x + 1)".to_string(),
                    ));
                }

                let expr = self.expression()?;
                let end_token = self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.".to_string(),
                )?;
                let span = start_span.to(&end_token.span);
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span,
                })
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => {
                        "Found ')' without matching '('. Check for unbalanced parentheses."
                    }
                    TokenType::Newline | TokenType::Eof => {
                        "Reached the end of the line while expecting an expression."
                    }
                    _ => "Expected a literal value, variable, or parenthesized expression here.",
                };

                Err(CodeError::parse_error_with_help(
                    token.span.clone(),
                    format!("Expected expression, found '{}'", describe(&token)),
                    help_msg.to_string(),
                ))
            }
        }
    }

    fn name(&mut self, message: &str) -> Result<Name, CodeError> {
        let token = self.consume(TokenType::Identifier, message)?;
        Ok(Name {
            name: token.lexeme.clone(),
            span: token.span.clone(),
        })
    }

    /// A statement ends at a newline, a block closer, or the end of input.
    fn end_of_statement(&mut self) -> Result<(), CodeError> {
        if self.match_types(&[TokenType::Newline]) || self.is_at_end() || self.at_block_closer() {
            Ok(())
        } else {
            let token = self.peek().clone();
            Err(CodeError::parse_error_with_help(
                token.span.clone(),
                format!("Unexpected '{}' after statement", describe(&token)),
                "Each statement goes on its own line.".to_string(),
            ))
        }
    }

    fn at_block_closer(&self) -> bool {
        self.check(&TokenType::End) || self.check(&TokenType::Case) || self.check(&TokenType::Default)
    }

    fn skip_newlines(&mut self) {
        while self.match_types(&[TokenType::Newline]) {}
    }

    fn peek_past_newlines(&self) -> &Token {
        let mut pos = self.current;
        while self.tokens[pos].token_type == TokenType::Newline {
            pos += 1;
        }
        &self.tokens[pos]
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        if self.is_at_end() {
            false
        } else {
            &self.peek().token_type == token_type
        }
    }

    fn check_next(&self, token_type: &TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|token| &token.token_type == token_type)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn error_span(&self) -> Span {
        if self.is_at_end() && self.current > 0 {
            // At EOF, point just past the last real token.
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            self.peek().span.clone()
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, CodeError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(CodeError::parse_error(self.error_span(), message.to_string()))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: String,
    ) -> Result<&Token, CodeError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(CodeError::parse_error_with_help(
                self.error_span(),
                message.to_string(),
                help,
            ))
        }
    }
}

fn binary_operator(token_type: &TokenType) -> BinaryOp {
    match token_type {
        TokenType::Star => BinaryOp::Multiply,
        TokenType::Slash => BinaryOp::Divide,
        TokenType::Percent => BinaryOp::Modulo,
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Subtract,
        TokenType::Greater => BinaryOp::Greater,
        TokenType::Less => BinaryOp::Less,
        TokenType::GreaterEqual => BinaryOp::GreaterEqual,
        TokenType::LessEqual => BinaryOp::LessEqual,
        TokenType::EqualEqual => BinaryOp::Equal,
        TokenType::LessGreater => BinaryOp::NotEqual,
        TokenType::And => BinaryOp::And,
        TokenType::Or => BinaryOp::Or,
        TokenType::Ampersand => BinaryOp::Concat,
        _ => unreachable!("binary_level only matches operator tokens"),
    }
}

fn describe(token: &Token) -> &str {
    match token.token_type {
        TokenType::Newline => "end of line",
        TokenType::Eof => "end of input",
        _ => &token.lexeme,
    }
}
