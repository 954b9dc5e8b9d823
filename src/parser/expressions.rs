use super::*;

impl<'a> Parser<'a> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_assignment_expression()?;
        if self.current == Token::Comma {
            let mut exprs = vec![expr];
            while self.current == Token::Comma {
                self.advance()?;
                exprs.push(self.parse_assignment_expression()?);
            }
            Ok(Expression::Sequence(exprs))
        } else {
            Ok(expr)
        }
    }

    fn is_simple_assignment_target(expr: &Expression) -> bool {
        matches!(expr, Expression::Identifier(_) | Expression::Member(_, _))
    }

    /// §11.13.1 / §11.3.1: `eval` and `arguments` cannot be assigned in strict code.
    pub(super) fn check_strict_assignment_target(&self, expr: &Expression) -> Result<(), ParseError> {
        if self.strict
            && let Expression::Identifier(name) = expr
            && (name == "eval" || name == "arguments")
        {
            return Err(self.error_kind(
                ParseErrorKind::StrictMode,
                "Assignment to 'eval' or 'arguments' in strict mode",
            ));
        }
        Ok(())
    }

    fn validate_assignment_target(&self, expr: &Expression) -> Result<(), ParseError> {
        if Self::is_simple_assignment_target(expr) {
            return self.check_strict_assignment_target(expr);
        }
        Err(self.error_kind(
            ParseErrorKind::InvalidAssignmentTarget,
            "Invalid left-hand side in assignment",
        ))
    }

    fn validate_update_target(&self, expr: &Expression) -> Result<(), ParseError> {
        if Self::is_simple_assignment_target(expr) {
            return self.check_strict_assignment_target(expr);
        }
        Err(self.error_kind(
            ParseErrorKind::InvalidUpdateTarget,
            "Invalid left-hand side expression in update operation",
        ))
    }

    pub(super) fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_conditional_expression()?;

        let op = match &self.current {
            Token::Assign => Some(AssignOp::Assign),
            Token::PlusAssign => Some(AssignOp::AddAssign),
            Token::MinusAssign => Some(AssignOp::SubAssign),
            Token::StarAssign => Some(AssignOp::MulAssign),
            Token::SlashAssign => Some(AssignOp::DivAssign),
            Token::PercentAssign => Some(AssignOp::ModAssign),
            Token::LeftShiftAssign => Some(AssignOp::LShiftAssign),
            Token::RightShiftAssign => Some(AssignOp::RShiftAssign),
            Token::UnsignedRightShiftAssign => Some(AssignOp::URShiftAssign),
            Token::AmpersandAssign => Some(AssignOp::BitAndAssign),
            Token::PipeAssign => Some(AssignOp::BitOrAssign),
            Token::CaretAssign => Some(AssignOp::BitXorAssign),
            _ => None,
        };

        if let Some(op) = op {
            self.validate_assignment_target(&left)?;
            self.advance()?;
            let right = self.parse_assignment_expression()?;
            Ok(Expression::Assign(op, Box::new(left), Box::new(right)))
        } else {
            Ok(left)
        }
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_logical_or()?;
        if self.current == Token::Question {
            self.advance()?;
            // consequent is AssignmentExpression[+In]
            let saved_no_in = std::mem::replace(&mut self.no_in, false);
            let consequent = self.parse_assignment_expression();
            self.no_in = saved_no_in;
            let consequent = consequent?;
            self.eat(&Token::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            Ok(Expression::Conditional(
                Box::new(expr),
                Box::new(consequent),
                Box::new(alternate),
            ))
        } else {
            Ok(expr)
        }
    }

    fn parse_logical_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_logical_and()?;
        while self.current == Token::LogicalOr {
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalOp::Or, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_bitwise_or()?;
        while self.current == Token::LogicalAnd {
            self.advance()?;
            let right = self.parse_bitwise_or()?;
            left = Expression::Logical(LogicalOp::And, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_bitwise_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_bitwise_xor()?;
        while self.current == Token::Pipe {
            self.advance()?;
            let right = self.parse_bitwise_xor()?;
            left = Expression::Binary(BinaryOp::BitOr, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_bitwise_and()?;
        while self.current == Token::Caret {
            self.advance()?;
            let right = self.parse_bitwise_and()?;
            left = Expression::Binary(BinaryOp::BitXor, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_equality()?;
        while self.current == Token::Ampersand {
            self.advance()?;
            let right = self.parse_equality()?;
            left = Expression::Binary(BinaryOp::BitAnd, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match &self.current {
                Token::Equal => BinaryOp::Eq,
                Token::NotEqual => BinaryOp::NotEq,
                Token::StrictEqual => BinaryOp::StrictEq,
                Token::StrictNotEqual => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match &self.current {
                Token::LessThan => BinaryOp::Lt,
                Token::GreaterThan => BinaryOp::Gt,
                Token::LessThanEqual => BinaryOp::LtEq,
                Token::GreaterThanEqual => BinaryOp::GtEq,
                Token::Keyword(Keyword::Instanceof) => BinaryOp::Instanceof,
                Token::Keyword(Keyword::In) if !self.no_in => BinaryOp::In,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_shift()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match &self.current {
                Token::LeftShift => BinaryOp::LShift,
                Token::RightShift => BinaryOp::RShift,
                Token::UnsignedRightShift => BinaryOp::URShift,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match &self.current {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match &self.current {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Keyword(Keyword::Delete) => {
                self.advance()?;
                let expr = self.parse_unary()?;
                if self.strict && matches!(&expr, Expression::Identifier(_)) {
                    return Err(self.error_kind(
                        ParseErrorKind::StrictMode,
                        "Delete of an unqualified identifier in strict mode",
                    ));
                }
                Ok(Expression::Delete(Box::new(expr)))
            }
            Token::Keyword(Keyword::Void) => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Void(Box::new(expr)))
            }
            Token::Keyword(Keyword::Typeof) => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Typeof(Box::new(expr)))
            }
            Token::Plus => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Plus, Box::new(expr)))
            }
            Token::Minus => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Minus, Box::new(expr)))
            }
            Token::Tilde => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::BitNot, Box::new(expr)))
            }
            Token::Bang => {
                self.advance()?;
                let expr = self.parse_unary()?;
                Ok(Expression::Unary(UnaryOp::Not, Box::new(expr)))
            }
            Token::Increment | Token::Decrement => {
                let op = if self.current == Token::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                self.advance()?;
                let expr = self.parse_unary()?;
                self.validate_update_target(&expr)?;
                Ok(Expression::Update(op, true, Box::new(expr)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let expr = self.parse_left_hand_side_expression()?;
        if !self.prev_line_terminator {
            let op = match self.current {
                Token::Increment => Some(UpdateOp::Increment),
                Token::Decrement => Some(UpdateOp::Decrement),
                _ => None,
            };
            if let Some(op) = op {
                self.validate_update_target(&expr)?;
                self.advance()?;
                return Ok(Expression::Update(op, false, Box::new(expr)));
            }
        }
        Ok(expr)
    }

    /// IdentifierName: reserved words are allowed after `.` and as object keys.
    fn parse_identifier_name(&mut self) -> Result<String, ParseError> {
        let name = match &self.current {
            Token::Identifier(n) => n.clone(),
            Token::Keyword(kw) => kw.to_string(),
            Token::BooleanLiteral(b) => b.to_string(),
            Token::NullLiteral => "null".to_string(),
            _ => return Err(self.error("Expected identifier name")),
        };
        self.advance()?;
        Ok(name)
    }

    /// Applies one `.name` or `[expr]` suffix, returning `object` unchanged
    /// when neither follows.
    fn parse_member_suffix(&mut self, object: Expression) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Dot => {
                self.advance()?;
                let name = self.parse_identifier_name()?;
                Ok(Expression::Member(Box::new(object), MemberProperty::Dot(name)))
            }
            Token::LeftBracket => {
                self.advance()?;
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let prop = self.parse_expression();
                self.no_in = saved_no_in;
                let prop = prop?;
                self.eat(&Token::RightBracket)?;
                Ok(Expression::Member(
                    Box::new(object),
                    MemberProperty::Computed(Box::new(prop)),
                ))
            }
            _ => Ok(object),
        }
    }

    pub(super) fn parse_left_hand_side_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expr = if self.current == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };

        loop {
            match self.current {
                Token::LeftParen => {
                    let args = self.parse_arguments()?;
                    expr = Expression::Call(Box::new(expr), args);
                }
                Token::Dot | Token::LeftBracket => expr = self.parse_member_suffix(expr)?,
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new_expression(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // new
        let mut callee = if self.current == Token::Keyword(Keyword::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary_expression()?
        };
        while matches!(self.current, Token::Dot | Token::LeftBracket) {
            callee = self.parse_member_suffix(callee)?;
        }
        let args = if self.current == Token::LeftParen {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New(Box::new(callee), args))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let args = self.parse_argument_list();
        self.no_in = saved_no_in;
        let args = args?;
        self.eat(&Token::RightParen)?;
        Ok(args)
    }

    fn parse_argument_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut args = Vec::new();
        while self.current != Token::RightParen {
            args.push(self.parse_assignment_expression()?);
            if self.current != Token::RightParen {
                self.eat(&Token::Comma)?;
            }
        }
        Ok(args)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, ParseError> {
        match &self.current {
            Token::Keyword(Keyword::This) => {
                self.advance()?;
                Ok(Expression::This)
            }
            Token::Keyword(Keyword::Function) => self.parse_function_expression(),
            Token::NumericLiteral(n) => {
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::LegacyOctalLiteral(n) => {
                if self.strict {
                    return Err(self.error_kind(
                        ParseErrorKind::StrictMode,
                        "Octal literals are not allowed in strict mode",
                    ));
                }
                let n = *n;
                self.advance()?;
                Ok(Expression::Literal(Literal::Number(n)))
            }
            Token::StringLiteral(s) => {
                let s = s.clone();
                self.advance()?;
                Ok(Expression::Literal(Literal::String(s)))
            }
            Token::BooleanLiteral(b) => {
                let b = *b;
                self.advance()?;
                Ok(Expression::Literal(Literal::Boolean(b)))
            }
            Token::NullLiteral => {
                self.advance()?;
                Ok(Expression::Literal(Literal::Null))
            }
            Token::LeftParen => {
                self.advance()?;
                let saved_no_in = std::mem::replace(&mut self.no_in, false);
                let expr = self.parse_expression();
                self.no_in = saved_no_in;
                let expr = expr?;
                self.eat(&Token::RightParen)?;
                Ok(expr)
            }
            Token::LeftBracket => self.parse_array_literal(),
            Token::LeftBrace => self.parse_object_literal(),
            Token::Slash | Token::SlashAssign => {
                Err(self.error("Regular expression literals are not supported"))
            }
            Token::Identifier(_) => {
                let name = self.expect_identifier("identifier")?;
                Ok(Expression::Identifier(name))
            }
            tok => Err(self.error(format!("Unexpected token {tok:?}"))),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // [
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let elements = self.parse_array_elements();
        self.no_in = saved_no_in;
        let elements = elements?;
        self.eat(&Token::RightBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_array_elements(&mut self) -> Result<Vec<Option<Expression>>, ParseError> {
        let mut elements = Vec::new();
        while self.current != Token::RightBracket {
            if self.current == Token::Comma {
                self.advance()?;
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment_expression()?));
            if self.current != Token::RightBracket {
                self.eat(&Token::Comma)?;
            }
        }
        Ok(elements)
    }

    fn parse_object_literal(&mut self) -> Result<Expression, ParseError> {
        self.advance()?; // {
        let saved_no_in = std::mem::replace(&mut self.no_in, false);
        let props = self.parse_property_list();
        self.no_in = saved_no_in;
        let props = props?;
        self.eat(&Token::RightBrace)?;
        Ok(Expression::Object(props))
    }

    fn parse_property_list(&mut self) -> Result<Vec<Property>, ParseError> {
        let mut props: Vec<Property> = Vec::new();
        while self.current != Token::RightBrace {
            let key = match &self.current {
                Token::StringLiteral(s) => {
                    let s = s.clone();
                    self.advance()?;
                    PropertyKey::String(s)
                }
                Token::NumericLiteral(n) | Token::LegacyOctalLiteral(n) => {
                    let n = *n;
                    self.advance()?;
                    PropertyKey::Number(n)
                }
                _ => PropertyKey::Identifier(self.parse_identifier_name()?),
            };
            self.eat(&Token::Colon)?;
            let value = self.parse_assignment_expression()?;
            // §11.1.5: duplicate data properties are an early error in strict code
            if self.strict {
                let name = key.to_property_name();
                if props.iter().any(|p| p.key.to_property_name() == name) {
                    return Err(self.error_kind(
                        ParseErrorKind::StrictMode,
                        format!("Duplicate data property '{name}' in object literal"),
                    ));
                }
            }
            props.push(Property { key, value });
            if self.current != Token::RightBrace {
                self.eat(&Token::Comma)?;
            }
        }
        Ok(props)
    }
}
