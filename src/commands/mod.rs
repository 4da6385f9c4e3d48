use serde_json::Value;
use std::io::Read;
use std::path::Path;

pub type CmdResult<T> = typedash::Result<(T, i32)>;

// ============================================================================
// Argument Input (CLI layer)
// ============================================================================

/// Read an argument from an inline string, a file (`@path`), or stdin (`-`).
pub(crate) fn read_spec_to_string(spec: &str, field: &str) -> typedash::Result<String> {
    use std::io::IsTerminal;

    if spec.trim() == "-" {
        let mut buf = String::new();
        let mut stdin = std::io::stdin();
        if stdin.is_terminal() {
            return Err(typedash::Error::validation_invalid_argument(
                field,
                "Cannot read from stdin when stdin is a TTY",
                None,
                None,
            ));
        }
        stdin.read_to_string(&mut buf).map_err(|e| {
            typedash::Error::internal_io(e.to_string(), Some("read stdin".to_string()))
        })?;
        return Ok(buf);
    }

    if let Some(path) = spec.strip_prefix('@') {
        if path.trim().is_empty() {
            return Err(typedash::Error::validation_invalid_argument(
                field,
                format!("Invalid {} spec '@' (missing file path)", field),
                None,
                None,
            ));
        }
        return typedash::io::read_file(Path::new(path), &format!("read {}", path));
    }

    Ok(spec.to_string())
}

/// Read and parse a JSON argument (inline, `@file` or `-`).
pub(crate) fn parse_json_spec(spec: &str, field: &str) -> typedash::Result<Value> {
    let raw = read_spec_to_string(spec, field)?;
    serde_json::from_str(&raw).map_err(|e| {
        typedash::Error::validation_invalid_json(
            e,
            Some(format!("parse {}", field)),
            Some(raw.chars().take(200).collect::<String>()),
        )
    })
}

/// Like [`parse_json_spec`], but the value must be a JSON object.
pub(crate) fn parse_json_object(
    spec: &str,
    field: &str,
) -> typedash::Result<typedash::objects::Object> {
    match parse_json_spec(spec, field)? {
        Value::Object(map) => Ok(map),
        other => Err(typedash::Error::validation_invalid_argument(
            field,
            format!("Expected a JSON object, got {}", json_type_name(&other)),
            None,
            None,
        )),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub mod case;
pub mod config;
pub mod object;
pub mod pattern;
pub mod render;

macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (typedash::Result<Value>, i32) {
    match command {
        crate::Commands::Render(args) => dispatch!(args, render),
        crate::Commands::Case(args) => dispatch!(args, case),
        crate::Commands::Match(args) => dispatch!(args, pattern),
        crate::Commands::Merge(args) => {
            crate::output::map_cmd_result_to_json(object::run_merge(args))
        }
        crate::Commands::Patch(args) => {
            crate::output::map_cmd_result_to_json(object::run_patch(args))
        }
        crate::Commands::Config(args) => dispatch!(args, config),
    }
}
