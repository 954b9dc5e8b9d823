use super::*;
use rustc_hash::FxHashSet;
use std::rc::Rc;

impl<'a> Parser<'a> {
    pub(super) fn parse_function_declaration(&mut self) -> Result<Statement, ParseError> {
        self.eat(&Token::Keyword(Keyword::Function))?;
        let name = self.expect_identifier("function name")?;
        let node = self.parse_function_rest(Some(name))?;
        Ok(Statement::FunctionDeclaration(Rc::new(node)))
    }

    pub(super) fn parse_function_expression(&mut self) -> Result<Expression, ParseError> {
        self.eat(&Token::Keyword(Keyword::Function))?;
        let name = if self.current == Token::LeftParen {
            None
        } else {
            Some(self.expect_identifier("function name")?)
        };
        let node = self.parse_function_rest(name)?;
        Ok(Expression::Function(Rc::new(node)))
    }

    fn parse_formal_parameters(&mut self) -> Result<Vec<String>, ParseError> {
        self.eat(&Token::LeftParen)?;
        let mut params = Vec::new();
        while self.current != Token::RightParen {
            params.push(self.expect_identifier("parameter name")?);
            if self.current != Token::RightParen {
                self.eat(&Token::Comma)?;
            }
        }
        self.eat(&Token::RightParen)?;
        Ok(params)
    }

    /// Parameters and body after the (optional) name. Strictness of the body
    /// applies retroactively to the name and the parameters (§13.1).
    fn parse_function_rest(&mut self, name: Option<String>) -> Result<FunctionNode, ParseError> {
        let params = self.parse_formal_parameters()?;
        let (body, body_strict) = self.parse_function_body()?;
        let strict = self.strict || body_strict;
        if strict {
            self.check_strict_function(name.as_deref(), &params)?;
        }
        let hoisting = collect_hoisting(&body);
        let arguments_usage = analyze_arguments_usage(&body);
        Ok(FunctionNode {
            name,
            params,
            body,
            strict,
            hoisting,
            arguments_usage,
        })
    }

    fn check_strict_function(&self, name: Option<&str>, params: &[String]) -> Result<(), ParseError> {
        let mut seen = FxHashSet::default();
        for ident in name.into_iter().chain(params.iter().map(String::as_str)) {
            if ident == "eval" || ident == "arguments" || Self::is_strict_reserved_word(ident) {
                return Err(self.error_kind(
                    ParseErrorKind::StrictMode,
                    format!("'{ident}' can't be used as a binding identifier in strict mode"),
                ));
            }
        }
        for param in params {
            if !seen.insert(param.as_str()) {
                return Err(self.error_kind(
                    ParseErrorKind::StrictMode,
                    "Duplicate parameter name not allowed in this context",
                ));
            }
        }
        Ok(())
    }

    fn parse_function_body(&mut self) -> Result<(Vec<Statement>, bool), ParseError> {
        self.eat(&Token::LeftBrace)?;
        let prev_strict = self.strict;
        let prev_iteration = std::mem::replace(&mut self.in_iteration, 0);
        let prev_switch = std::mem::replace(&mut self.in_switch, 0);
        let prev_labels = std::mem::take(&mut self.labels);
        let prev_no_in = std::mem::replace(&mut self.no_in, false);
        self.in_function += 1;

        let result = self.parse_source_elements(&Token::RightBrace);

        self.in_function -= 1;
        self.in_iteration = prev_iteration;
        self.in_switch = prev_switch;
        self.labels = prev_labels;
        self.no_in = prev_no_in;
        let (stmts, has_use_strict) = result?;
        // The closing brace must be lexed under the enclosing strictness.
        self.set_strict(prev_strict);
        self.eat(&Token::RightBrace)?;
        Ok((stmts, has_use_strict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(src: &str) -> Rc<FunctionNode> {
        let prog = Parser::new(src).unwrap().parse_program().unwrap();
        match &prog.body[0] {
            Statement::FunctionDeclaration(f) => f.clone(),
            Statement::Expression(Expression::Function(f)) => f.clone(),
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn declaration_shape() {
        let f = function("function add(a, b) { var t = a + b; return t; }");
        assert_eq!(f.name.as_deref(), Some("add"));
        assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.hoisting.variable_declarations, vec!["t".to_string()]);
        assert!(!f.strict);
    }

    #[test]
    fn anonymous_expression() {
        let f = function("(function () {})");
        assert!(f.name.is_none());
    }

    #[test]
    fn body_directive_makes_function_strict() {
        let f = function("function f() { 'use strict'; }");
        assert!(f.strict);
        let prog = Parser::new("function f() { 'use strict'; } var x = 010;")
            .unwrap()
            .parse_program()
            .unwrap();
        assert!(!prog.strict);
    }

    #[test]
    fn strict_inherited_from_enclosing_code() {
        let prog = Parser::new("'use strict'; function f() {}")
            .unwrap()
            .parse_program()
            .unwrap();
        assert!(prog.hoisting.function_declarations[0].strict);
    }

    #[test]
    fn sloppy_duplicate_params_allowed() {
        let f = function("function f(a, a) { return a; }");
        assert_eq!(f.params.len(), 2);
    }

    #[test]
    fn strict_function_name_checked() {
        let err = Parser::new("function eval() { 'use strict'; }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::StrictMode);
    }

    #[test]
    fn labels_do_not_cross_function_boundaries() {
        let err = Parser::new("outer: while (1) { (function () { break outer; }); }")
            .unwrap()
            .parse_program()
            .unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IllegalStatement);
    }
}
