//! Tree-walking evaluator for compiled template programs.

use serde_json::Value as Json;
use std::borrow::Cow;
use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, Literal, LogicalOp, Stmt, SwitchCase, UnaryOp};
use super::value::{join, Value};
use super::{Emission, TemplateOptions};
use crate::error::{Error, Result};
use crate::utils::arrays::Truthy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
}

type Scope<'a> = Vec<(&'a str, Value<'a>)>;

pub(crate) struct Interpreter<'a> {
    context: &'a Json,
    emissions: &'a [Emission],
    options: &'a TemplateOptions,
    scopes: Vec<Scope<'a>>,
    output: String,
    pushed: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        context: &'a Json,
        emissions: &'a [Emission],
        options: &'a TemplateOptions,
    ) -> Self {
        Self {
            context,
            emissions,
            options,
            scopes: vec![Vec::new()],
            output: String::new(),
            pushed: 0,
        }
    }

    pub(crate) fn run(mut self, program: &'a [Stmt]) -> Result<String> {
        for stmt in program {
            // `break` is rejected by the parser outside loops and switches.
            self.exec(stmt)?;
        }
        Ok(self.output)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn exec(&mut self, stmt: &'a Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Emit(idx) => {
                self.emit(*idx);
                Ok(Flow::Normal)
            }
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Declare { name, init } => {
                let value = match init {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Undefined,
                };
                self.declare(name, value);
                Ok(Flow::Normal)
            }
            Stmt::If {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.exec(consequent)
                } else if let Some(alternate) = alternate {
                    self.exec(alternate)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::ForOf {
                binding,
                iterable,
                body,
            } => {
                let items = self.iterate_values(iterable)?;
                self.run_loop(binding, items, body)
            }
            Stmt::ForIn {
                binding,
                object,
                body,
            } => {
                let subject = self.eval(object)?;
                self.run_loop(binding, enumerate_keys(&subject), body)
            }
            Stmt::Switch {
                discriminant,
                cases,
            } => self.exec_switch(discriminant, cases),
            Stmt::Break => Ok(Flow::Break),
            Stmt::Block(body) => {
                self.scopes.push(Vec::new());
                let flow = self.exec_all(body);
                self.scopes.pop();
                flow
            }
            Stmt::Empty => Ok(Flow::Normal),
        }
    }

    fn exec_all(&mut self, body: &'a [Stmt]) -> Result<Flow> {
        for stmt in body {
            if self.exec(stmt)? == Flow::Break {
                return Ok(Flow::Break);
            }
        }
        Ok(Flow::Normal)
    }

    fn run_loop(
        &mut self,
        binding: &'a str,
        items: Vec<Value<'a>>,
        body: &'a Stmt,
    ) -> Result<Flow> {
        for item in items {
            self.scopes.push(vec![(binding, item)]);
            let flow = self.exec(body);
            self.scopes.pop();
            if flow? == Flow::Break {
                break;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_switch(&mut self, discriminant: &'a Expr, cases: &'a [SwitchCase]) -> Result<Flow> {
        let subject = self.eval(discriminant)?;

        let mut start = None;
        for (idx, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test)?.strict_equals(&subject) {
                    start = Some(idx);
                    break;
                }
            }
        }
        let start = start.or_else(|| cases.iter().position(|case| case.test.is_none()));

        let Some(start) = start else {
            return Ok(Flow::Normal);
        };

        self.scopes.push(Vec::new());
        let mut result = Ok(Flow::Normal);
        for case in &cases[start..] {
            match self.exec_all(&case.body) {
                Ok(Flow::Normal) => continue,
                Ok(Flow::Break) => break,
                Err(err) => {
                    result = Err(err);
                    break;
                }
            }
        }
        self.scopes.pop();
        result
    }

    fn iterate_values(&mut self, iterable: &'a Expr) -> Result<Vec<Value<'a>>> {
        match self.eval(iterable)? {
            Value::Array(items) => Ok(items.iter().map(Value::from_json).collect()),
            Value::Str(text) => Ok(text
                .chars()
                .map(|c| Value::Str(Cow::Owned(c.to_string())))
                .collect()),
            other => Err(Error::template_runtime(format!(
                "{} is not iterable",
                other.to_display()
            ))),
        }
    }

    /// Literal text is pushed verbatim; a bare expression contributes nothing on failure.
    fn emit(&mut self, idx: usize) {
        match self.emissions.get(idx) {
            Some(Emission::Literal(text)) => self.push_text(text),
            Some(Emission::Guarded(Ok(expr))) => {
                let mark = (self.output.len(), self.pushed);
                match self.eval(expr) {
                    Ok(value) => {
                        let text = value.to_output();
                        self.push_text(&text);
                    }
                    Err(_) => {
                        self.output.truncate(mark.0);
                        self.pushed = mark.1;
                    }
                }
            }
            Some(Emission::Guarded(Err(_))) | None => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        self.output.push_str(text);
        self.pushed += 1;
    }

    fn declare(&mut self, name: &'a str, value: Value<'a>) {
        if let Some(scope) = self.scopes.last_mut() {
            match scope.iter_mut().find(|(bound, _)| *bound == name) {
                Some(slot) => slot.1 = value,
                None => scope.push((name, value)),
            }
        }
    }

    fn local(&self, name: &str) -> Option<&Value<'a>> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| value)
    }

    fn lookup(&self, name: &str) -> Option<Value<'a>> {
        if let Some(value) = self.local(name) {
            return Some(value.clone());
        }
        if let Some(value) = self.context.as_object().and_then(|map| map.get(name)) {
            return Some(Value::from_json(value));
        }
        if name == self.options.data_name {
            return Some(Value::from_json(self.context));
        }
        None
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn eval(&mut self, expr: &'a Expr) -> Result<Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Number(n) => Value::Number(*n),
                Literal::Str(s) => Value::Str(Cow::Borrowed(s)),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Null => Value::Null,
                Literal::Undefined => Value::Undefined,
            }),
            Expr::Ident(name) => self
                .lookup(name)
                .ok_or_else(|| Error::template_runtime(format!("{} is not defined", name))),
            Expr::Member { .. } | Expr::Index { .. } | Expr::Call { .. } => {
                Ok(self.eval_chain(expr)?.unwrap_or(Value::Undefined))
            }
            Expr::Unary { op, operand } => self.eval_unary(*op, operand),
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(binary(*op, &left, &right))
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                let take_left = match op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::Nullish => !left.is_nullish(),
                };
                if take_left {
                    Ok(left)
                } else {
                    self.eval(right)
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(test)?.is_truthy() {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn eval_unary(&mut self, op: UnaryOp, operand: &'a Expr) -> Result<Value<'a>> {
        if op == UnaryOp::TypeOf {
            if let Expr::Ident(name) = operand {
                let kind = self.lookup(name).map_or("undefined", |value| value.type_of());
                return Ok(Value::Str(Cow::Borrowed(kind)));
            }
        }
        let value = self.eval(operand)?;
        Ok(match op {
            UnaryOp::Not => Value::Bool(!value.is_truthy()),
            UnaryOp::Negate => Value::Number(-value.to_number()),
            UnaryOp::Plus => Value::Number(value.to_number()),
            UnaryOp::TypeOf => Value::Str(Cow::Borrowed(value.type_of())),
        })
    }

    /// Evaluate a member, index or call chain. `None` means an optional link
    /// short-circuited the rest of the chain.
    fn eval_chain(&mut self, expr: &'a Expr) -> Result<Option<Value<'a>>> {
        match expr {
            Expr::Member {
                object,
                property,
                optional,
            } => {
                let Some(target) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                property_of(&target, property).map(Some)
            }
            Expr::Index {
                object,
                index,
                optional,
            } => {
                let Some(target) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let key = self.eval(index)?;
                index_of(&target, &key).map(Some)
            }
            Expr::Call {
                object,
                method,
                args,
                optional,
            } => {
                if method == "push" && self.is_accumulator(object) {
                    let mut values = Vec::with_capacity(args.len());
                    for arg in args {
                        values.push(self.eval(arg)?);
                    }
                    for value in &values {
                        let text = value.to_output();
                        self.push_text(&text);
                    }
                    return Ok(Some(Value::Number(self.pushed as f64)));
                }

                let Some(target) = self.eval_chain(object)? else {
                    return Ok(None);
                };
                if *optional && target.is_nullish() {
                    return Ok(None);
                }
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                call_method(&target, method, &values).map(Some)
            }
            other => self.eval(other).map(Some),
        }
    }

    fn is_accumulator(&self, object: &Expr) -> bool {
        matches!(
            object,
            Expr::Ident(name) if *name == self.options.out_name && self.local(name).is_none()
        )
    }
}

fn binary<'a>(op: BinaryOp, left: &Value<'a>, right: &Value<'a>) -> Value<'a> {
    match op {
        BinaryOp::Add => {
            let left = left.to_primitive();
            let right = right.to_primitive();
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                Value::Str(Cow::Owned(left.to_display() + &right.to_display()))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt => Value::Bool(left.compare(right) == Some(Ordering::Less)),
        BinaryOp::Gt => Value::Bool(left.compare(right) == Some(Ordering::Greater)),
        BinaryOp::Le => Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Ge => Value::Bool(matches!(
            left.compare(right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::LooseEq => Value::Bool(left.loose_equals(right)),
        BinaryOp::LooseNe => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNe => Value::Bool(!left.strict_equals(right)),
    }
}

fn unreadable(target: &Value<'_>, property: &str) -> Error {
    Error::template_runtime(format!(
        "Cannot read properties of {} (reading '{}')",
        target.to_display(),
        property
    ))
}

fn property_of<'a>(target: &Value<'a>, property: &str) -> Result<Value<'a>> {
    match target {
        Value::Undefined | Value::Null => Err(unreadable(target, property)),
        Value::Object(map) => Ok(map.get(property).map_or(Value::Undefined, Value::from_json)),
        Value::Array(items) => Ok(match property {
            "length" => Value::Number(items.len() as f64),
            _ => array_item(items, property),
        }),
        Value::Str(text) => Ok(match property {
            "length" => Value::Number(text.encode_utf16().count() as f64),
            _ => string_char(text, property),
        }),
        Value::Bool(_) | Value::Number(_) => Ok(Value::Undefined),
    }
}

fn index_of<'a>(target: &Value<'a>, key: &Value<'a>) -> Result<Value<'a>> {
    let key = match key {
        Value::Number(n) => super::value::format_number(*n),
        other => other.to_display(),
    };
    property_of(target, &key)
}

/// Only the canonical spelling selects an element: `"1"` does, `"01"` and `"+1"` don't.
fn canonical_index(key: &str) -> Option<usize> {
    let digits_only = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
    if !digits_only || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse().ok()
}

fn array_item<'a>(items: &'a [Json], key: &str) -> Value<'a> {
    canonical_index(key)
        .and_then(|idx| items.get(idx))
        .map_or(Value::Undefined, Value::from_json)
}

/// Strings index by UTF-16 code unit, the same unit `length` counts.
fn string_char<'a>(text: &str, key: &str) -> Value<'a> {
    canonical_index(key)
        .and_then(|idx| text.encode_utf16().nth(idx))
        .map_or(Value::Undefined, |unit| {
            Value::Str(Cow::Owned(String::from_utf16_lossy(&[unit])))
        })
}

fn enumerate_keys<'a>(subject: &Value<'a>) -> Vec<Value<'a>> {
    match subject {
        Value::Object(map) => map
            .keys()
            .map(|key| Value::Str(Cow::Borrowed(key.as_str())))
            .collect(),
        Value::Array(items) => (0..items.len())
            .map(|idx| Value::Str(Cow::Owned(idx.to_string())))
            .collect(),
        Value::Str(text) => (0..text.encode_utf16().count())
            .map(|idx| Value::Str(Cow::Owned(idx.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}

fn call_method<'a>(target: &Value<'a>, method: &str, args: &[Value<'a>]) -> Result<Value<'a>> {
    if target.is_nullish() {
        return Err(unreadable(target, method));
    }
    let first = args.first().cloned().unwrap_or(Value::Undefined);

    match (target, method) {
        (Value::Array(items), "join") => {
            let separator = if first.is_nullish() {
                ",".to_string()
            } else {
                first.to_display()
            };
            Ok(Value::Str(Cow::Owned(join(items, &separator))))
        }
        (Value::Array(items), "includes") => Ok(Value::Bool(
            items
                .iter()
                .any(|item| Value::from_json(item).strict_equals(&first)),
        )),
        (Value::Str(text), "toUpperCase") => Ok(Value::Str(Cow::Owned(text.to_uppercase()))),
        (Value::Str(text), "toLowerCase") => Ok(Value::Str(Cow::Owned(text.to_lowercase()))),
        (Value::Str(text), "trim") => Ok(Value::Str(Cow::Owned(text.trim().to_string()))),
        (Value::Str(text), "includes") => {
            Ok(Value::Bool(text.contains(first.to_display().as_str())))
        }
        (_, "toString") => Ok(Value::Str(Cow::Owned(target.to_display()))),
        _ => Err(Error::template_runtime(format!(
            "{} is not a function",
            method
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::compile;
    use super::*;
    use serde_json::json;

    fn render(source: &str, data: Json) -> Result<String> {
        compile(source, &TemplateOptions::default()).render(&data)
    }

    #[test]
    fn string_concatenation_and_arithmetic() {
        assert_eq!(render("{{ 'a' + 1 }}|{{ 1 + 2 * 3 }}", json!({})).unwrap(), "a1|7");
    }

    #[test]
    fn logical_operators_return_operands() {
        let data = json!({"name": "", "fallback": "anon", "missing": null});
        assert_eq!(render("{{ name || fallback }}", data.clone()).unwrap(), "anon");
        assert_eq!(render("{{ missing ?? 'none' }}", data.clone()).unwrap(), "none");
        assert_eq!(render("{{ name ?? 'none' }}", data).unwrap(), "");
    }

    #[test]
    fn for_of_iterates_array_elements() {
        let data = json!({"items": ["a", "b", "c"]});
        assert_eq!(
            render("{{ for (const item of items) { }}[{{item}}]{{ } }}", data).unwrap(),
            "[a][b][c]"
        );
    }

    #[test]
    fn for_in_iterates_object_keys_in_order() {
        let data = json!({"obj": {"z": 1, "a": 2}});
        assert_eq!(
            render("{{ for (k in obj) { out.push(k, '=', obj[k], ';') } }}", data).unwrap(),
            "z=1;a=2;"
        );
    }

    #[test]
    fn break_stops_the_innermost_loop() {
        let data = json!({"n": [1, 2, 3, 4]});
        let source = "{{ for (x of n) { if (x > 2) { break } out.push(x) } }}";
        assert_eq!(render(source, data).unwrap(), "12");
    }

    #[test]
    fn switch_falls_through_until_break() {
        let source = concat!(
            "{{ switch (k) { case 'a': out.push('A') ",
            "case 'b': out.push('B'); break; default: out.push('D') } }}"
        );
        assert_eq!(render(source, json!({"k": "a"})).unwrap(), "AB");
        assert_eq!(render(source, json!({"k": "b"})).unwrap(), "B");
        assert_eq!(render(source, json!({"k": "z"})).unwrap(), "D");
    }

    #[test]
    fn only_canonical_index_strings_select_elements() {
        let data = json!({"xs": ["a", "b"], "s": "ab"});
        assert_eq!(render("{{ xs['1'] }}|{{ xs[1] }}", data.clone()).unwrap(), "b|b");
        assert_eq!(
            render("[{{ xs['+1'] }}{{ xs['01'] }}{{ xs[' 1'] }}{{ s['01'] }}]", data).unwrap(),
            "[]"
        );
    }

    #[test]
    fn string_keys_and_length_count_the_same_units() {
        let data = json!({"s": "\u{1F600}x"});
        let source = "{{ for (i in s) { out.push(i, ',') } }}{{ s.length }}|{{ s[2] }}";
        assert_eq!(render(source, data).unwrap(), "0,1,2,3|x");
    }

    #[test]
    fn declarations_are_block_scoped() {
        let source = "{{ let x = 'outer' }}{{ if (true) { let x = 'inner'; out.push(x) } }}{{x}}";
        assert_eq!(render(source, json!({})).unwrap(), "innerouter");
    }

    #[test]
    fn optional_chaining_short_circuits() {
        let data = json!({"user": null});
        assert_eq!(render("[{{ user?.name.first }}]", data.clone()).unwrap(), "[]");
        let err = render("{{ if (user.name) { } }}", data).unwrap_err();
        assert_eq!(err.code.as_str(), "template.runtime");
        assert!(err.message.contains("reading 'name'"));
    }

    #[test]
    fn array_and_string_methods() {
        let data = json!({"tags": ["x", "y"], "name": " Ann "});
        assert_eq!(
            render("{{ tags.join('-') }} {{ name.trim().toUpperCase() }} {{ tags.length }}", data)
                .unwrap(),
            "x-y ANN 2"
        );
    }

    #[test]
    fn unknown_method_in_control_code_is_runtime_error() {
        let err = render("{{ if (x.explode()) { } }}", json!({"x": "s"})).unwrap_err();
        assert!(err.message.contains("explode is not a function"));
    }

    #[test]
    fn unresolved_identifier_in_control_code_is_runtime_error() {
        let err = render("{{ if (ghost) { } }}", json!({})).unwrap_err();
        assert_eq!(err.message, "ghost is not defined");
    }

    #[test]
    fn iterating_a_number_is_runtime_error() {
        let err = render("{{ for (x of n) { } }}", json!({"n": 3})).unwrap_err();
        assert!(err.message.contains("is not iterable"));
    }

    #[test]
    fn failed_bare_expression_leaves_no_partial_output() {
        assert_eq!(
            render("a{{ out.push('x') + missing.deep }}b", json!({})).unwrap(),
            "ab"
        );
    }

    #[test]
    fn push_returns_accumulated_length() {
        assert_eq!(render("x{{ out.push('y') }}", json!({})).unwrap(), "xy2");
    }
}
