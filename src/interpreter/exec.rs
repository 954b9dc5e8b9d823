use super::*;

/// Unwraps an expression result, turning a thrown value into a Throw
/// completion returned from the enclosing function.
macro_rules! ok_or_throw {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(thrown) => return Completion::Throw(thrown),
        }
    };
}

/// Whether an abrupt `Break`/`Continue` targets the statement owning
/// `labels` (an unlabelled one always does).
fn targets(target: &Option<String>, labels: &[String]) -> bool {
    target.as_ref().is_none_or(|t| labels.contains(t))
}

// §12.6 steps shared by every iteration statement
enum LoopStep {
    Next,
    Exit(Completion),
}

fn loop_step(body: Completion, labels: &[String], value: &mut Option<JsValue>) -> LoopStep {
    if let Some(v) = body.value() {
        *value = Some(v.clone());
    }
    match body {
        Completion::Normal(_) => LoopStep::Next,
        Completion::Continue(ref target, _) if targets(target, labels) => LoopStep::Next,
        Completion::Break(ref target, _) if targets(target, labels) => {
            LoopStep::Exit(Completion::Normal(value.clone()))
        }
        other => LoopStep::Exit(other.update_empty(value.clone())),
    }
}

impl Interpreter {
    // §12.1 StatementList: the value of the last statement that produced one
    pub(crate) fn exec_statements(&mut self, stmts: &[Statement]) -> Completion {
        let mut last = None;
        for stmt in stmts {
            match self.exec_statement(stmt) {
                Completion::Normal(v) => {
                    if v.is_some() {
                        last = v;
                    }
                }
                abrupt => return abrupt.update_empty(last),
            }
        }
        Completion::Normal(last)
    }

    pub(crate) fn exec_statement(&mut self, stmt: &Statement) -> Completion {
        self.exec_labelled(stmt, &[])
    }

    fn exec_labelled(&mut self, stmt: &Statement, labels: &[String]) -> Completion {
        match stmt {
            Statement::Empty | Statement::Debugger | Statement::FunctionDeclaration(_) => {
                Completion::empty()
            }
            Statement::Expression(expr) => ok_or_throw!(self.eval_expr(expr)).into(),
            Statement::Block(stmts) => self.exec_statements(stmts),
            Statement::Variable(decls) => self.exec_variable_declarations(decls),
            Statement::If(if_stmt) => {
                let test = ok_or_throw!(self.eval_expr(&if_stmt.test));
                if to_boolean(&test) {
                    self.exec_statement(&if_stmt.consequent)
                } else if let Some(alt) = &if_stmt.alternate {
                    self.exec_statement(alt)
                } else {
                    Completion::empty()
                }
            }
            Statement::While(w) => self.exec_while(w, labels),
            Statement::DoWhile(dw) => self.exec_do_while(dw, labels),
            Statement::For(f) => self.exec_for(f, labels),
            Statement::ForIn(fi) => self.exec_for_in(fi, labels),
            Statement::Return(expr) => {
                let val = match expr {
                    Some(e) => ok_or_throw!(self.eval_expr(e)),
                    None => JsValue::Undefined,
                };
                Completion::Return(val)
            }
            Statement::Break(label) => Completion::Break(label.clone(), None),
            Statement::Continue(label) => Completion::Continue(label.clone(), None),
            Statement::Throw(expr) => {
                let val = ok_or_throw!(self.eval_expr(expr));
                self.record_throw_site();
                Completion::Throw(val)
            }
            Statement::Try(t) => self.exec_try(t),
            Statement::Switch(s) => self.exec_switch(s, labels),
            Statement::Labeled(label, body) => {
                let mut label_set = labels.to_vec();
                label_set.push(label.clone());
                match self.exec_labelled(body, &label_set) {
                    Completion::Break(Some(target), v) if &target == label => {
                        Completion::Normal(v)
                    }
                    other => other,
                }
            }
            Statement::With(object, body) => self.exec_with(object, body),
        }
    }

    // §12.2 Variable Statement: declarations without an initialiser were
    // handled by declaration binding instantiation.
    fn exec_variable_declarations(&mut self, decls: &[VariableDeclarator]) -> Completion {
        for d in decls {
            if let Some(init) = &d.init {
                ok_or_throw!(self.assign_identifier(&d.name, init));
            }
        }
        Completion::empty()
    }

    fn assign_identifier(&mut self, name: &str, init: &Expression) -> JsResult<()> {
        let r = self.resolve_binding(name);
        let value = self.eval_expr(init)?;
        self.put_value(&r, value)
    }

    fn exec_while(&mut self, w: &WhileStatement, labels: &[String]) -> Completion {
        let mut value = None;
        loop {
            let test = ok_or_throw!(self.eval_expr(&w.test));
            if !to_boolean(&test) {
                return Completion::Normal(value);
            }
            let body = self.exec_statement(&w.body);
            if let LoopStep::Exit(c) = loop_step(body, labels, &mut value) {
                return c;
            }
        }
    }

    fn exec_do_while(&mut self, dw: &DoWhileStatement, labels: &[String]) -> Completion {
        let mut value = None;
        loop {
            let body = self.exec_statement(&dw.body);
            if let LoopStep::Exit(c) = loop_step(body, labels, &mut value) {
                return c;
            }
            let test = ok_or_throw!(self.eval_expr(&dw.test));
            if !to_boolean(&test) {
                return Completion::Normal(value);
            }
        }
    }

    fn exec_for(&mut self, f: &ForStatement, labels: &[String]) -> Completion {
        match &f.init {
            Some(ForInit::Variable(decls)) => {
                let c = self.exec_variable_declarations(decls);
                if c.is_abrupt() {
                    return c;
                }
            }
            Some(ForInit::Expression(expr)) => {
                ok_or_throw!(self.eval_expr(expr));
            }
            None => {}
        }
        let mut value = None;
        loop {
            if let Some(test) = &f.test {
                let t = ok_or_throw!(self.eval_expr(test));
                if !to_boolean(&t) {
                    return Completion::Normal(value);
                }
            }
            let body = self.exec_statement(&f.body);
            if let LoopStep::Exit(c) = loop_step(body, labels, &mut value) {
                return c;
            }
            if let Some(update) = &f.update {
                ok_or_throw!(self.eval_expr(update));
            }
        }
    }

    // §12.6.4 The for-in Statement. Keys are snapshotted up front; a key
    // deleted before its turn is skipped.
    fn exec_for_in(&mut self, fi: &ForInStatement, labels: &[String]) -> Completion {
        if let ForInTarget::Variable(VariableDeclarator {
            name,
            init: Some(init),
        }) = &fi.left
        {
            ok_or_throw!(self.assign_identifier(name, init));
        }
        let subject = ok_or_throw!(self.eval_expr(&fi.right));
        let (object, keys) = match &subject {
            JsValue::Object(o) => match self.get_object(o.id) {
                Some(obj) => {
                    let keys = obj.borrow().enumerable_keys_with_proto();
                    (Some(obj), keys)
                }
                None => (None, Vec::new()),
            },
            JsValue::String(s) => (None, (0..s.len()).map(|i| i.to_string()).collect()),
            _ => (None, Vec::new()),
        };

        let mut value = None;
        for key in keys {
            if let Some(obj) = &object
                && !obj.borrow().has_property(&key)
            {
                continue;
            }
            let target = match &fi.left {
                ForInTarget::Variable(d) => self.resolve_binding(&d.name),
                ForInTarget::Expression(e) => ok_or_throw!(self.eval_reference(e)),
            };
            ok_or_throw!(self.put_value(&target, JsValue::string(&key)));
            let body = self.exec_statement(&fi.body);
            if let LoopStep::Exit(c) = loop_step(body, labels, &mut value) {
                return c;
            }
        }
        Completion::Normal(value)
    }

    // §12.14 The try Statement
    fn exec_try(&mut self, t: &TryStatement) -> Completion {
        let result = match (self.exec_statements(&t.block), &t.handler) {
            (Completion::Throw(thrown), Some(handler)) => self.exec_catch(handler, thrown),
            (other, _) => other,
        };
        if let Some(finalizer) = &t.finalizer {
            let fin = self.exec_statements(finalizer);
            if fin.is_abrupt() {
                return fin;
            }
        }
        result
    }

    fn exec_catch(&mut self, handler: &CatchClause, thrown: JsValue) -> Completion {
        self.clear_throw_site();
        let catch_env = LexicalEnvironment::new_declarative(Some(self.lexical_environment()));
        let bound = catch_env
            .record
            .borrow_mut()
            .create_mutable_binding(&handler.param, thrown, false);
        match bound {
            Ok(()) => self.with_lexical_environment(catch_env, |interp| {
                interp.exec_statements(&handler.body)
            }),
            Err(e) => Completion::Throw(self.binding_error_value(e)),
        }
    }

    // §12.11 The switch Statement
    fn exec_switch(&mut self, s: &SwitchStatement, labels: &[String]) -> Completion {
        let disc = ok_or_throw!(self.eval_expr(&s.discriminant));
        let mut start = None;
        for (i, case) in s.cases.iter().enumerate() {
            let Some(test) = &case.test else {
                continue;
            };
            let v = ok_or_throw!(self.eval_expr(test));
            if strict_equality(&disc, &v) {
                start = Some(i);
                break;
            }
        }
        let Some(start) = start.or_else(|| s.cases.iter().position(|c| c.test.is_none())) else {
            return Completion::empty();
        };

        let mut value = None;
        for case in &s.cases[start..] {
            let r = self.exec_statements(&case.consequent);
            if let Some(v) = r.value() {
                value = Some(v.clone());
            }
            match r {
                Completion::Normal(_) => {}
                Completion::Break(ref target, _) if targets(target, labels) => {
                    return Completion::Normal(value);
                }
                other => return other.update_empty(value),
            }
        }
        Completion::Normal(value)
    }

    // §12.10 The with Statement
    fn exec_with(&mut self, object: &Expression, body: &Statement) -> Completion {
        let val = ok_or_throw!(self.eval_expr(object));
        let JsValue::Object(o) = val else {
            let err = self.create_error(ErrorKind::TypeError, "with requires an object");
            return Completion::Throw(err);
        };
        let Some(data) = self.get_object(o.id) else {
            return Completion::empty();
        };
        let env = LexicalEnvironment::new_object(o, data, true, Some(self.lexical_environment()));
        self.with_lexical_environment(env, |interp| interp.exec_statement(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> JsValue {
        Interpreter::new().run_source(src).unwrap()
    }

    #[test]
    fn statement_list_value_is_last_non_empty() {
        assert_eq!(run("1; var x = 2;"), JsValue::Number(1.0));
        assert_eq!(run("3; if (false) 4;"), JsValue::Number(3.0));
        assert_eq!(run(""), JsValue::Undefined);
    }

    #[test]
    fn loops_carry_completion_values() {
        assert_eq!(run("var i = 0; while (i < 3) { i++; }"), JsValue::Number(2.0));
        assert_eq!(run("for (var i = 0; i < 10; i++) { if (i == 4) break; i; }"), JsValue::Number(3.0));
        assert_eq!(run("var n = 0; do { n += 2; } while (n < 5); n"), JsValue::Number(6.0));
    }

    #[test]
    fn labelled_continue_and_break() {
        let src = "var hits = 0;
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j == 1) continue outer;
                    if (i == 2) break outer;
                    hits++;
                }
            }
            hits";
        assert_eq!(run(src), JsValue::Number(2.0));
        assert_eq!(run("block: { 1; break block; 2; }"), JsValue::Number(1.0));
    }

    #[test]
    fn for_in_enumerates_and_skips_deleted_keys() {
        let src = "var o = {a: 1, b: 2, c: 3}, seen = '';
            for (var k in o) { seen += k; delete o.c; }
            seen";
        assert_eq!(run(src), JsValue::string("ab"));
        assert_eq!(run("var n = 0; for (var k in null) n++; n"), JsValue::Number(0.0));
        assert_eq!(run("var s = ''; for (var k in 'xy') s += k; s"), JsValue::string("01"));
    }

    #[test]
    fn try_catch_finally() {
        assert_eq!(run("try { throw 1; } catch (e) { e + 1; }"), JsValue::Number(2.0));
        assert_eq!(run("try { 5; } finally { 6; }"), JsValue::Number(5.0));
        assert_eq!(
            run("function f() { try { return 1; } finally { return 2; } } f()"),
            JsValue::Number(2.0)
        );
        assert_eq!(run("try { throw 1; } catch (e) { e = 7; e; }"), JsValue::Number(7.0));
        assert_eq!(run("try { throw 1; } catch (e) {} typeof e"), JsValue::string("undefined"));
    }

    #[test]
    fn switch_fall_through_and_default() {
        let src = "function f(x) { var r = ''; switch (x) { case 1: r += 'a'; case 2: r += 'b'; break; default: r += 'd'; case 3: r += 'c'; } return r; }
            f(1) + ',' + f(2) + ',' + f(3) + ',' + f(9)";
        assert_eq!(run(src), JsValue::string("ab,b,c,dc"));
    }

    #[test]
    fn with_resolves_against_object() {
        assert_eq!(run("var o = {x: 1}; var x = 5; with (o) { x = 2; } o.x + x"), JsValue::Number(7.0));
        let mut interp = Interpreter::new();
        match interp.run_source("with (1) {}") {
            Err(EngineError::Exception(e)) => {
                assert_eq!(interp.format_value(&e.value), "TypeError: with requires an object");
            }
            other => panic!("expected TypeError, got {other:?}"),
        }
    }

    #[test]
    fn with_supplies_this_to_calls() {
        assert_eq!(
            run("var o = { f: function () { return this === o; } }; with (o) { f(); }"),
            JsValue::Boolean(true)
        );
    }
}
