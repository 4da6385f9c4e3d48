//! Minimal string templating.
//!
//! A template is literal text interleaved with `{{ ... }}` fragments. A fragment
//! whose code starts with a control keyword (`if`, `for`, `else`, `switch`,
//! `case`, `default`, `break`, `let`, `var`, `const`) or a bare brace is a
//! statement; the statements of all fragments form one program, so a block
//! opened in one fragment may close in a later one. Any other fragment is a bare
//! expression whose value is appended to the output, and which contributes
//! nothing if it fails.
//!
//! ```
//! use serde_json::json;
//! use typedash::template::template;
//!
//! let tmpl = template("Hello {{ if (typeof boy !== 'undefined') { out.push(boy.firstName) } }}");
//! assert_eq!(tmpl.render(&json!({"boy": {"firstName": "George"}})).unwrap(), "Hello George");
//! assert_eq!(tmpl.render(&json!({})).unwrap(), "Hello ");
//! ```

mod interp;
mod lexer;
mod parser;
mod value;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::Result;
use interp::Interpreter;
use lexer::{is_ident_continue, tokenize, Token, TokenKind};
use parser::{Expr, Parser, Stmt};

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "else", "switch", "case", "default", "break", "let", "var", "const",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateOptions {
    /// Identifier bound to the whole data context.
    pub data_name: String,
    /// Identifier of the output accumulator (`out.push(...)`).
    pub out_name: String,
    pub open: String,
    pub close: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            data_name: "$__".to_string(),
            out_name: "out".to_string(),
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

/// One emission of a compiled template, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Node {
    Literal(String),
    Expression(String),
    Statement(String),
}

#[derive(Debug, Clone)]
pub(crate) enum Emission {
    Literal(String),
    /// A bare expression; a parse error here only silences the fragment.
    Guarded(Result<Expr>),
}

/// A compiled template. Compile once, render many times.
#[derive(Debug, Clone)]
pub struct Template {
    options: TemplateOptions,
    nodes: Vec<Node>,
    emissions: Vec<Emission>,
    program: Result<Vec<Stmt>>,
}

impl Template {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Report the structural error of the control code, if any, without rendering.
    pub fn check(&self) -> Result<()> {
        self.program.as_ref().map(|_| ()).map_err(Clone::clone)
    }

    pub fn render(&self, data: &Json) -> Result<String> {
        let program = self.program.as_ref().map_err(Clone::clone)?;
        Interpreter::new(data, &self.emissions, &self.options).run(program)
    }
}

/// Compile `source` with default options.
pub fn template(source: &str) -> Template {
    compile(source, &TemplateOptions::default())
}

pub fn compile(source: &str, options: &TemplateOptions) -> Template {
    let scanned = scan(source, &options.open, &options.close);

    let mut tokens: Vec<Token> = Vec::new();
    let mut emissions = Vec::new();
    let mut lex_error = None;

    for (node, offset) in &scanned {
        match node {
            Node::Literal(text) => {
                tokens.push(emit_token(emissions.len(), *offset));
                emissions.push(Emission::Literal(text.clone()));
            }
            Node::Expression(code) => {
                let parsed = tokenize(code, *offset)
                    .and_then(|tokens| Parser::new(tokens, source).parse_standalone_expression());
                tokens.push(emit_token(emissions.len(), *offset));
                emissions.push(Emission::Guarded(parsed));
            }
            Node::Statement(code) => match tokenize(code, *offset) {
                Ok(fragment) => tokens.extend(fragment),
                Err(err) => {
                    lex_error.get_or_insert(err);
                }
            },
        }
    }

    let program = match lex_error {
        Some(err) => Err(err),
        None => Parser::new(tokens, source).parse_program(),
    };

    Template {
        options: options.clone(),
        nodes: scanned.into_iter().map(|(node, _)| node).collect(),
        emissions,
        program,
    }
}

fn emit_token(idx: usize, offset: usize) -> Token {
    Token {
        kind: TokenKind::Emit(idx),
        offset,
    }
}

/// Split `source` into nodes, each paired with the byte offset of its text.
fn scan(source: &str, open: &str, close: &str) -> Vec<(Node, usize)> {
    let mut nodes = Vec::new();
    let mut cursor = 0;

    if !open.is_empty() && !close.is_empty() {
        while let Some(found) = source[cursor..].find(open) {
            let start = cursor + found;
            let code_start = start + open.len();
            // Fragments hold at least one character.
            let Some(first) = source[code_start..].chars().next() else {
                break;
            };
            let search_from = code_start + first.len_utf8();
            let Some(close_at) = source[search_from..].find(close) else {
                break;
            };
            let code_end = search_from + close_at;

            if start > cursor {
                nodes.push((Node::Literal(source[cursor..start].to_string()), cursor));
            }
            let code = &source[code_start..code_end];
            nodes.push((classify(code), code_start));
            cursor = code_end + close.len();
        }
    }

    if cursor < source.len() {
        nodes.push((Node::Literal(source[cursor..].to_string()), cursor));
    }
    nodes
}

fn classify(code: &str) -> Node {
    let trimmed = code.trim_start();
    let is_control = if trimmed.starts_with('{') || trimmed.starts_with('}') {
        true
    } else {
        let word_len = trimmed
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(trimmed.len());
        CONTROL_KEYWORDS.contains(&&trimmed[..word_len])
    };

    if is_control {
        Node::Statement(code.to_string())
    } else {
        Node::Expression(code.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn george() -> Json {
        json!({"boy": {"firstName": "George", "lastName": "Michael"}})
    }

    #[test]
    fn template_object() {
        let tmpl = template("Hello {{boy}}");
        assert_eq!(tmpl.render(&json!({"boy": "George"})).unwrap(), "Hello George");
    }

    #[test]
    fn template_object_deep() {
        let tmpl = template("Hello {{boy.firstName}} {{boy.lastName}}");
        assert_eq!(tmpl.render(&george()).unwrap(), "Hello George Michael");
    }

    #[test]
    fn template_with_conditions() {
        let tmpl = template("Hello {{typeof boy!=='undefined' ? boy.firstName:'Unknown'}}");
        assert_eq!(tmpl.render(&george()).unwrap(), "Hello George");
        assert_eq!(tmpl.render(&json!({})).unwrap(), "Hello Unknown");
    }

    #[test]
    fn template_with_expressions() {
        let tmpl =
            template("Hello {{ if (typeof boy!=='undefined') { out.push(boy.firstName) } }}");
        assert_eq!(tmpl.render(&george()).unwrap(), "Hello George");
        assert_eq!(tmpl.render(&json!({})).unwrap(), "Hello ");
    }

    #[test]
    fn template_with_options() {
        let options = TemplateOptions {
            out_name: "foo".to_string(),
            data_name: "bar".to_string(),
            ..TemplateOptions::default()
        };
        let tmpl = compile(
            "Hello {{ if (typeof boy!=='undefined') { foo.push(boy.firstName) } }}",
            &options,
        );
        assert_eq!(tmpl.render(&george()).unwrap(), "Hello George");
        assert_eq!(tmpl.render(&json!({})).unwrap(), "Hello ");
    }

    #[test]
    fn data_name_refers_to_whole_context() {
        let tmpl = template("{{ $__.boy.firstName }}");
        assert_eq!(tmpl.render(&george()).unwrap(), "George");
    }

    #[test]
    fn source_without_fragments_renders_verbatim() {
        assert_eq!(template("").render(&json!({})).unwrap(), "");
        assert_eq!(
            template("plain \"quoted\"\nnext line").render(&json!({})).unwrap(),
            "plain \"quoted\"\nnext line"
        );
        assert_eq!(template("a {{ b").render(&json!({})).unwrap(), "a {{ b");
        assert_eq!(template("{{}}").render(&json!({})).unwrap(), "{{}}");
    }

    #[test]
    fn missing_and_null_values_render_empty() {
        let tmpl = template("[{{a}}]");
        assert_eq!(tmpl.render(&json!({})).unwrap(), "[]");
        assert_eq!(tmpl.render(&json!({"a": null})).unwrap(), "[]");
        assert_eq!(tmpl.render(&json!({"a": 1.5})).unwrap(), "[1.5]");
        assert_eq!(tmpl.render(&json!({"a": [1, 2]})).unwrap(), "[1,2]");
    }

    #[test]
    fn rendering_is_repeatable() {
        let tmpl = template("{{ for (x of xs) { out.push(x) } }}!");
        let data = json!({"xs": ["a", "b"]});
        assert_eq!(tmpl.render(&data).unwrap(), tmpl.render(&data).unwrap());
    }

    #[test]
    fn braces_span_fragments() {
        let tmpl = template("{{ if (x) { }}yes{{ } else { }}no{{ } }}");
        assert_eq!(tmpl.render(&json!({"x": true})).unwrap(), "yes");
        assert_eq!(tmpl.render(&json!({"x": 0})).unwrap(), "no");
    }

    #[test]
    fn exclamation_example() {
        let tmpl = template("Hello {{ if (x) { out.push('!') } }}");
        assert_eq!(tmpl.render(&json!({"x": true})).unwrap(), "Hello !");
        assert_eq!(tmpl.render(&json!({"x": false})).unwrap(), "Hello ");
    }

    #[test]
    fn nodes_classify_fragments() {
        let tmpl = template("a{{ x }}{{ if (x) { }}b{{ } }}");
        assert_eq!(
            tmpl.nodes(),
            &[
                Node::Literal("a".to_string()),
                Node::Expression(" x ".to_string()),
                Node::Statement(" if (x) { ".to_string()),
                Node::Literal("b".to_string()),
                Node::Statement(" } ".to_string()),
            ]
        );
    }

    #[test]
    fn keyword_prefix_is_not_control() {
        let tmpl = template("{{ iffy }}");
        assert_eq!(tmpl.nodes(), &[Node::Expression(" iffy ".to_string())]);
        assert_eq!(tmpl.render(&json!({"iffy": "ok"})).unwrap(), "ok");
    }

    #[test]
    fn bad_bare_expression_is_silent() {
        let tmpl = template("a{{ ) }}b{{ missing.deep }}c");
        assert!(tmpl.check().is_ok());
        assert_eq!(tmpl.render(&json!({})).unwrap(), "abc");
    }

    #[test]
    fn unbalanced_control_code_fails_at_render() {
        let tmpl = template("{{ if (x) { }}open");
        let err = tmpl.check().unwrap_err();
        assert_eq!(err.code.as_str(), "template.syntax");
        assert_eq!(tmpl.render(&json!({"x": true})).unwrap_err(), err);
    }

    #[test]
    fn runaway_nesting_never_overflows() {
        let deep = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));

        let bare = template(&format!("a{{{{ {} }}}}b", deep));
        assert_eq!(bare.render(&json!({"x": 1})).unwrap(), "ab");

        let control = template(&format!("{{{{ if ({}) {{ }}}}yes{{{{ }} }}}}", deep));
        let err = control.render(&json!({"x": 1})).unwrap_err();
        assert_eq!(err.code.as_str(), "template.syntax");
        assert!(err.details["problem"]
            .as_str()
            .unwrap()
            .starts_with("nesting too deep"));
    }

    #[test]
    fn syntax_error_offset_points_into_source() {
        let source = "abc{{ } }}";
        let err = template(source).check().unwrap_err();
        assert_eq!(err.details["offset"], 6);
    }

    #[test]
    fn custom_delimiters() {
        let options = TemplateOptions {
            open: "${".to_string(),
            close: "}".to_string(),
            ..TemplateOptions::default()
        };
        let tmpl = compile("Hi ${name}!", &options);
        assert_eq!(tmpl.render(&json!({"name": "Ann"})).unwrap(), "Hi Ann!");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: TemplateOptions = serde_json::from_value(json!({"outName": "buf"})).unwrap();
        assert_eq!(options.out_name, "buf");
        assert_eq!(options.data_name, "$__");
        assert_eq!(options.open, "{{");
    }
}
