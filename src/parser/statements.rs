use super::*;

impl<'a> Parser<'a> {
    /// SourceElement: a function declaration or a statement.
    pub(super) fn parse_source_element(&mut self) -> Result<Statement, ParseError> {
        match &self.current {
            Token::Keyword(Keyword::Function) => self.parse_function_declaration(),
            _ => self.parse_statement(),
        }
    }

    pub(super) fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match &self.current {
            Token::LeftBrace => self.parse_block_statement(),
            Token::Semicolon => {
                self.advance()?;
                Ok(Statement::Empty)
            }
            Token::Keyword(Keyword::Var) => self.parse_variable_statement(),
            Token::Keyword(Keyword::If) => self.parse_if_statement(),
            Token::Keyword(Keyword::While) => self.parse_while_statement(),
            Token::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            Token::Keyword(Keyword::For) => self.parse_for_statement(),
            Token::Keyword(Keyword::Return) => self.parse_return_statement(),
            Token::Keyword(Keyword::Break) => self.parse_break_statement(),
            Token::Keyword(Keyword::Continue) => self.parse_continue_statement(),
            Token::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            Token::Keyword(Keyword::Try) => self.parse_try_statement(),
            Token::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            Token::Keyword(Keyword::With) => self.parse_with_statement(),
            Token::Keyword(Keyword::Debugger) => {
                self.advance()?;
                self.eat_semicolon()?;
                Ok(Statement::Debugger)
            }
            // Function declarations outside a source element list are a
            // sloppy-mode extension; they hoist like top-level ones.
            Token::Keyword(Keyword::Function) => {
                if self.strict {
                    return Err(self.error_kind(
                        ParseErrorKind::StrictMode,
                        "In strict mode code, functions can only be declared at top level or inside a function body",
                    ));
                }
                self.parse_function_declaration()
            }
            _ => self.parse_expression_statement_or_labeled(),
        }
    }

    fn parse_expression_statement_or_labeled(&mut self) -> Result<Statement, ParseError> {
        if let Some(name) = self.current_identifier_name() {
            let orig_token = self.current.clone();
            let ident_lt = self.prev_line_terminator;
            let ident_start = self.current_token_start;
            self.advance()?;
            if self.current == Token::Colon {
                self.advance()?;
                if self.labels.iter().any(|(l, _)| *l == name) {
                    return Err(self.error_kind(
                        ParseErrorKind::IllegalStatement,
                        format!("Label '{name}' has already been declared"),
                    ));
                }
                let is_iteration = matches!(
                    self.current,
                    Token::Keyword(Keyword::For)
                        | Token::Keyword(Keyword::While)
                        | Token::Keyword(Keyword::Do)
                );
                self.labels.push((name.clone(), is_iteration));
                let stmt = self.parse_statement();
                self.labels.pop();
                return Ok(Statement::Labeled(name, Box::new(stmt?)));
            }
            // Not a label, restore the identifier
            self.push_back(orig_token, ident_lt, ident_start);
        }
        self.parse_expression_statement()
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Expression(expr))
    }

    fn parse_block_statement(&mut self) -> Result<Statement, ParseError> {
        self.parse_block_body().map(Statement::Block)
    }

    fn parse_block_body(&mut self) -> Result<Vec<Statement>, ParseError> {
        self.eat(&Token::LeftBrace)?;
        let mut stmts = Vec::new();
        while self.current != Token::RightBrace {
            if self.current == Token::Eof {
                return Err(self.error("Unexpected end of input"));
            }
            stmts.push(self.parse_statement()?);
        }
        self.eat(&Token::RightBrace)?;
        Ok(stmts)
    }

    fn parse_variable_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // var
        let decls = self.parse_variable_declaration_list()?;
        self.eat_semicolon()?;
        Ok(Statement::Variable(decls))
    }

    fn parse_variable_declaration_list(&mut self) -> Result<Vec<VariableDeclarator>, ParseError> {
        let mut decls = vec![self.parse_variable_declarator()?];
        while self.current == Token::Comma {
            self.advance()?;
            decls.push(self.parse_variable_declarator()?);
        }
        Ok(decls)
    }

    fn parse_variable_declarator(&mut self) -> Result<VariableDeclarator, ParseError> {
        let name = self.expect_identifier("variable name")?;
        self.check_strict_binding_identifier(&name)?;
        let init = if self.current == Token::Assign {
            self.advance()?;
            Some(self.parse_assignment_expression()?)
        } else {
            None
        };
        Ok(VariableDeclarator { name, init })
    }

    fn parse_if_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // if
        self.eat(&Token::LeftParen)?;
        let test = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.current == Token::Keyword(Keyword::Else) {
            self.advance()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If(IfStatement {
            test,
            consequent,
            alternate,
        }))
    }

    fn parse_iteration_body(&mut self) -> Result<Box<Statement>, ParseError> {
        self.in_iteration += 1;
        let body = self.parse_statement();
        self.in_iteration -= 1;
        Ok(Box::new(body?))
    }

    fn parse_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // while
        self.eat(&Token::LeftParen)?;
        let test = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let body = self.parse_iteration_body()?;
        Ok(Statement::While(WhileStatement { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // do
        let body = self.parse_iteration_body()?;
        self.eat(&Token::Keyword(Keyword::While))?;
        self.eat(&Token::LeftParen)?;
        let test = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        // §7.9.1: a semicolon after do-while is always insertable
        if self.current == Token::Semicolon {
            self.advance()?;
        }
        Ok(Statement::DoWhile(DoWhileStatement { body, test }))
    }

    fn parse_for_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // for
        self.eat(&Token::LeftParen)?;

        // for (init; test; update)
        // for (decl in expr)
        let init = match &self.current {
            Token::Semicolon => None,
            Token::Keyword(Keyword::Var) => {
                self.advance()?;
                self.no_in = true;
                let decls = self.parse_variable_declaration_list();
                self.no_in = false;
                let mut decls = decls?;
                if self.current == Token::Keyword(Keyword::In) {
                    if decls.len() != 1 {
                        return Err(self.error("Invalid left-hand side in for-in loop"));
                    }
                    self.advance()?;
                    let right = self.parse_expression()?;
                    self.eat(&Token::RightParen)?;
                    let body = self.parse_iteration_body()?;
                    return Ok(Statement::ForIn(ForInStatement {
                        left: ForInTarget::Variable(decls.remove(0)),
                        right,
                        body,
                    }));
                }
                Some(ForInit::Variable(decls))
            }
            _ => {
                self.no_in = true;
                let expr = self.parse_expression();
                self.no_in = false;
                let expr = expr?;
                if self.current == Token::Keyword(Keyword::In) {
                    if !matches!(expr, Expression::Identifier(_) | Expression::Member(..)) {
                        return Err(self.error("Invalid left-hand side in for-in loop"));
                    }
                    self.check_strict_assignment_target(&expr)?;
                    self.advance()?;
                    let right = self.parse_expression()?;
                    self.eat(&Token::RightParen)?;
                    let body = self.parse_iteration_body()?;
                    return Ok(Statement::ForIn(ForInStatement {
                        left: ForInTarget::Expression(expr),
                        right,
                        body,
                    }));
                }
                Some(ForInit::Expression(expr))
            }
        };

        self.eat(&Token::Semicolon)?;
        let test = if self.current != Token::Semicolon {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.eat(&Token::Semicolon)?;
        let update = if self.current != Token::RightParen {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.eat(&Token::RightParen)?;
        let body = self.parse_iteration_body()?;
        Ok(Statement::For(ForStatement {
            init,
            test,
            update,
            body,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement, ParseError> {
        if self.in_function == 0 {
            return Err(self.error_kind(ParseErrorKind::IllegalStatement, "Illegal return statement"));
        }
        self.advance()?; // return
        let value = if self.current == Token::Semicolon
            || self.current == Token::RightBrace
            || self.current == Token::Eof
            || self.prev_line_terminator
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.eat_semicolon()?;
        Ok(Statement::Return(value))
    }

    fn parse_break_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let label = self.parse_optional_label()?;
        if let Some(ref l) = label {
            if !self.labels.iter().any(|(name, _)| name == l) {
                return Err(self.error_kind(
                    ParseErrorKind::IllegalStatement,
                    format!("Undefined label '{l}'"),
                ));
            }
        } else if self.in_iteration == 0 && self.in_switch == 0 {
            return Err(self.error_kind(ParseErrorKind::IllegalStatement, "Illegal break statement"));
        }
        self.eat_semicolon()?;
        Ok(Statement::Break(label))
    }

    fn parse_continue_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?;
        let label = self.parse_optional_label()?;
        if let Some(ref l) = label {
            match self.labels.iter().find(|(name, _)| name == l) {
                None => {
                    return Err(self.error_kind(
                        ParseErrorKind::IllegalStatement,
                        format!("Undefined label '{l}'"),
                    ));
                }
                Some((_, false)) => {
                    return Err(self.error_kind(
                        ParseErrorKind::IllegalStatement,
                        format!("Label '{l}' is not an iteration statement"),
                    ));
                }
                _ => {}
            }
        } else if self.in_iteration == 0 {
            return Err(self.error_kind(
                ParseErrorKind::IllegalStatement,
                "Illegal continue statement",
            ));
        }
        self.eat_semicolon()?;
        Ok(Statement::Continue(label))
    }

    fn parse_throw_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // throw
        if self.prev_line_terminator {
            return Err(self.error("Illegal newline after throw"));
        }
        let expr = self.parse_expression()?;
        self.eat_semicolon()?;
        Ok(Statement::Throw(expr))
    }

    fn parse_try_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // try
        let block = self.parse_block_body()?;
        let handler = if self.current == Token::Keyword(Keyword::Catch) {
            self.advance()?;
            self.eat(&Token::LeftParen)?;
            let param = self.expect_identifier("catch parameter")?;
            self.check_strict_binding_identifier(&param)?;
            self.eat(&Token::RightParen)?;
            let body = self.parse_block_body()?;
            Some(CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.current == Token::Keyword(Keyword::Finally) {
            self.advance()?;
            Some(self.parse_block_body()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("Missing catch or finally after try"));
        }
        Ok(Statement::Try(TryStatement {
            block,
            handler,
            finalizer,
        }))
    }

    fn parse_switch_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance()?; // switch
        self.eat(&Token::LeftParen)?;
        let discriminant = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        self.eat(&Token::LeftBrace)?;
        self.in_switch += 1;
        let cases = self.parse_switch_cases();
        self.in_switch -= 1;
        let cases = cases?;
        self.eat(&Token::RightBrace)?;
        Ok(Statement::Switch(SwitchStatement {
            discriminant,
            cases,
        }))
    }

    fn parse_switch_cases(&mut self) -> Result<Vec<SwitchCase>, ParseError> {
        let mut cases = Vec::new();
        let mut has_default = false;
        while self.current != Token::RightBrace {
            let test = match &self.current {
                Token::Keyword(Keyword::Case) => {
                    self.advance()?;
                    Some(self.parse_expression()?)
                }
                Token::Keyword(Keyword::Default) => {
                    if has_default {
                        return Err(self.error("More than one default clause in switch statement"));
                    }
                    has_default = true;
                    self.advance()?;
                    None
                }
                _ => return Err(self.error(format!("Unexpected token {:?}", self.current))),
            };
            self.eat(&Token::Colon)?;
            let mut consequent = Vec::new();
            while !matches!(
                self.current,
                Token::Keyword(Keyword::Case)
                    | Token::Keyword(Keyword::Default)
                    | Token::RightBrace
                    | Token::Eof
            ) {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        Ok(cases)
    }

    fn parse_with_statement(&mut self) -> Result<Statement, ParseError> {
        if self.strict {
            return Err(self.error_kind(
                ParseErrorKind::StrictMode,
                "Strict mode code may not include a with statement",
            ));
        }
        self.advance()?; // with
        self.eat(&Token::LeftParen)?;
        let object = self.parse_expression()?;
        self.eat(&Token::RightParen)?;
        let body = self.parse_statement()?;
        Ok(Statement::With(object, Box::new(body)))
    }
}
