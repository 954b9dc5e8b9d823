//! Static facts about a program or function body that declaration binding
//! instantiation needs before execution: hoisted declarations and how the
//! body uses its `arguments` object.

use crate::ast::*;
use rustc_hash::FxHashSet;

/// Collects the function declarations and `var` names of `body` in source
/// order. Nested function bodies are skipped; they carry their own scope.
pub fn collect_hoisting(body: &[Statement]) -> HoistingScope {
    let mut collector = HoistingCollector::default();
    for stmt in body {
        collector.visit_statement(stmt);
    }
    collector.scope
}

#[derive(Default)]
struct HoistingCollector {
    scope: HoistingScope,
    seen: FxHashSet<String>,
}

impl HoistingCollector {
    fn declare_var(&mut self, name: &str) {
        if self.seen.insert(name.to_string()) {
            self.scope.variable_declarations.push(name.to_string());
        }
    }

    fn visit_statements(&mut self, stmts: &[Statement]) {
        for stmt in stmts {
            self.visit_statement(stmt);
        }
    }

    fn visit_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Variable(decls) => {
                for d in decls {
                    self.declare_var(&d.name);
                }
            }
            Statement::FunctionDeclaration(f) => {
                self.scope.function_declarations.push(f.clone());
            }
            Statement::Block(stmts) => self.visit_statements(stmts),
            Statement::If(i) => {
                self.visit_statement(&i.consequent);
                if let Some(alt) = &i.alternate {
                    self.visit_statement(alt);
                }
            }
            Statement::While(w) => self.visit_statement(&w.body),
            Statement::DoWhile(d) => self.visit_statement(&d.body),
            Statement::For(f) => {
                if let Some(ForInit::Variable(decls)) = &f.init {
                    for d in decls {
                        self.declare_var(&d.name);
                    }
                }
                self.visit_statement(&f.body);
            }
            Statement::ForIn(f) => {
                if let ForInTarget::Variable(d) = &f.left {
                    self.declare_var(&d.name);
                }
                self.visit_statement(&f.body);
            }
            Statement::Try(t) => {
                self.visit_statements(&t.block);
                if let Some(h) = &t.handler {
                    self.visit_statements(&h.body);
                }
                if let Some(fin) = &t.finalizer {
                    self.visit_statements(fin);
                }
            }
            Statement::Switch(s) => {
                for case in &s.cases {
                    self.visit_statements(&case.consequent);
                }
            }
            Statement::Labeled(_, s) | Statement::With(_, s) => self.visit_statement(s),
            Statement::Empty
            | Statement::Expression(_)
            | Statement::Return(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Throw(_)
            | Statement::Debugger => {}
        }
    }
}

/// Classifies how a function body uses `arguments`. Only member reads,
/// member writes and `typeof` count as [`ArgumentsUsage::Local`]; a bare
/// reference, a method call on it, or any direct `eval` escapes.
pub fn analyze_arguments_usage(body: &[Statement]) -> ArgumentsUsage {
    let mut usage = ArgumentsUsage::None;
    for stmt in body {
        stmt_usage(stmt, &mut usage);
        if usage == ArgumentsUsage::Escaping {
            break;
        }
    }
    usage
}

fn note(usage: &mut ArgumentsUsage, found: ArgumentsUsage) {
    *usage = (*usage).max(found);
}

fn is_arguments(expr: &Expression) -> bool {
    expr.is_identifier("arguments")
}

fn stmts_usage(stmts: &[Statement], usage: &mut ArgumentsUsage) {
    for stmt in stmts {
        stmt_usage(stmt, usage);
    }
}

fn declarators_usage(decls: &[VariableDeclarator], usage: &mut ArgumentsUsage) {
    for d in decls {
        if let Some(init) = &d.init {
            expr_usage(init, usage);
        }
    }
}

fn stmt_usage(stmt: &Statement, usage: &mut ArgumentsUsage) {
    match stmt {
        Statement::Expression(e) | Statement::Throw(e) => expr_usage(e, usage),
        Statement::Return(e) => {
            if let Some(e) = e {
                expr_usage(e, usage);
            }
        }
        Statement::Block(stmts) => stmts_usage(stmts, usage),
        Statement::Variable(decls) => declarators_usage(decls, usage),
        Statement::If(i) => {
            expr_usage(&i.test, usage);
            stmt_usage(&i.consequent, usage);
            if let Some(alt) = &i.alternate {
                stmt_usage(alt, usage);
            }
        }
        Statement::While(w) => {
            expr_usage(&w.test, usage);
            stmt_usage(&w.body, usage);
        }
        Statement::DoWhile(d) => {
            stmt_usage(&d.body, usage);
            expr_usage(&d.test, usage);
        }
        Statement::For(f) => {
            match &f.init {
                Some(ForInit::Variable(decls)) => declarators_usage(decls, usage),
                Some(ForInit::Expression(e)) => expr_usage(e, usage),
                None => {}
            }
            if let Some(t) = &f.test {
                expr_usage(t, usage);
            }
            if let Some(u) = &f.update {
                expr_usage(u, usage);
            }
            stmt_usage(&f.body, usage);
        }
        Statement::ForIn(f) => {
            match &f.left {
                ForInTarget::Variable(d) => declarators_usage(std::slice::from_ref(d), usage),
                ForInTarget::Expression(e) => expr_usage(e, usage),
            }
            expr_usage(&f.right, usage);
            stmt_usage(&f.body, usage);
        }
        Statement::Try(t) => {
            stmts_usage(&t.block, usage);
            if let Some(h) = &t.handler {
                stmts_usage(&h.body, usage);
            }
            if let Some(fin) = &t.finalizer {
                stmts_usage(fin, usage);
            }
        }
        Statement::Switch(s) => {
            expr_usage(&s.discriminant, usage);
            for case in &s.cases {
                if let Some(test) = &case.test {
                    expr_usage(test, usage);
                }
                stmts_usage(&case.consequent, usage);
            }
        }
        Statement::Labeled(_, s) => stmt_usage(s, usage),
        Statement::With(e, s) => {
            expr_usage(e, usage);
            stmt_usage(s, usage);
        }
        // Function declarations bind their own arguments object
        Statement::FunctionDeclaration(_)
        | Statement::Empty
        | Statement::Break(_)
        | Statement::Continue(_)
        | Statement::Debugger => {}
    }
}

fn member_usage(object: &Expression, property: &MemberProperty, usage: &mut ArgumentsUsage) {
    if is_arguments(object) {
        note(usage, ArgumentsUsage::Local);
    } else {
        expr_usage(object, usage);
    }
    if let MemberProperty::Computed(p) = property {
        expr_usage(p, usage);
    }
}

fn expr_usage(expr: &Expression, usage: &mut ArgumentsUsage) {
    match expr {
        Expression::Identifier(name) => {
            if name == "arguments" {
                note(usage, ArgumentsUsage::Escaping);
            }
        }
        Expression::Member(object, property) => member_usage(object, property, usage),
        Expression::Call(callee, args) => {
            match callee.as_ref() {
                // A direct eval can reach every binding of the function
                Expression::Identifier(name) if name == "eval" => {
                    note(usage, ArgumentsUsage::Escaping);
                }
                // `arguments[i]()` passes the object as `this`
                Expression::Member(object, _) if is_arguments(object) => {
                    note(usage, ArgumentsUsage::Escaping);
                }
                other => expr_usage(other, usage),
            }
            for arg in args {
                expr_usage(arg, usage);
            }
        }
        Expression::Typeof(e) => {
            if is_arguments(e) {
                note(usage, ArgumentsUsage::Local);
            } else {
                expr_usage(e, usage);
            }
        }
        Expression::New(callee, args) => {
            expr_usage(callee, usage);
            for arg in args {
                expr_usage(arg, usage);
            }
        }
        Expression::Array(elems) => {
            for e in elems.iter().flatten() {
                expr_usage(e, usage);
            }
        }
        Expression::Object(props) => {
            for p in props {
                expr_usage(&p.value, usage);
            }
        }
        Expression::Unary(_, e)
        | Expression::Update(_, _, e)
        | Expression::Void(e)
        | Expression::Delete(e) => expr_usage(e, usage),
        Expression::Binary(_, l, r) | Expression::Logical(_, l, r) | Expression::Assign(_, l, r) => {
            expr_usage(l, usage);
            expr_usage(r, usage);
        }
        Expression::Conditional(t, c, a) => {
            expr_usage(t, usage);
            expr_usage(c, usage);
            expr_usage(a, usage);
        }
        Expression::Sequence(exprs) => {
            for e in exprs {
                expr_usage(e, usage);
            }
        }
        // Nested functions have their own arguments object
        Expression::Function(_) | Expression::Literal(_) | Expression::This => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn body(src: &str) -> Vec<Statement> {
        Parser::new(src).unwrap().parse_program().unwrap().body
    }

    fn usage_in_function(src: &str) -> ArgumentsUsage {
        let prog = Parser::new(src).unwrap().parse_program().unwrap();
        prog.hoisting.function_declarations[0].arguments_usage
    }

    #[test]
    fn hoists_vars_in_order_without_duplicates() {
        let scope = collect_hoisting(&body(
            "var a; if (x) { var b = 1; } for (var c in o) {} var a; try {} catch (e) { var d; }",
        ));
        assert_eq!(scope.variable_declarations, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn skips_nested_function_bodies() {
        let scope = collect_hoisting(&body("function f() { var inner; } var outer;"));
        assert_eq!(scope.variable_declarations, vec!["outer"]);
        assert_eq!(scope.function_declarations.len(), 1);
    }

    #[test]
    fn block_level_functions_hoist_in_sloppy_code() {
        let scope = collect_hoisting(&body("if (1) { function g() {} } function h() {}"));
        let names: Vec<_> = scope
            .function_declarations
            .iter()
            .map(|f| f.name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["g", "h"]);
    }

    #[test]
    fn no_mention_is_none() {
        assert_eq!(usage_in_function("function f(a) { return a; }"), ArgumentsUsage::None);
    }

    #[test]
    fn member_access_and_typeof_are_local() {
        assert_eq!(
            usage_in_function("function f() { return arguments.length + arguments[0]; }"),
            ArgumentsUsage::Local
        );
        assert_eq!(
            usage_in_function("function f() { arguments[0] = 1; return typeof arguments; }"),
            ArgumentsUsage::Local
        );
    }

    #[test]
    fn bare_reference_escapes() {
        assert_eq!(usage_in_function("function f() { return arguments; }"), ArgumentsUsage::Escaping);
        assert_eq!(
            usage_in_function("function f() { g(arguments); }"),
            ArgumentsUsage::Escaping
        );
        assert_eq!(
            usage_in_function("function f() { var a = arguments.length; a = arguments; }"),
            ArgumentsUsage::Escaping
        );
    }

    #[test]
    fn method_call_on_arguments_escapes() {
        assert_eq!(
            usage_in_function("function f() { arguments[0](); }"),
            ArgumentsUsage::Escaping
        );
    }

    #[test]
    fn direct_eval_escapes() {
        assert_eq!(usage_in_function("function f() { eval('1'); }"), ArgumentsUsage::Escaping);
    }

    #[test]
    fn nested_function_usage_is_its_own() {
        assert_eq!(
            usage_in_function("function f() { return function () { return arguments; }; }"),
            ArgumentsUsage::None
        );
    }
}
