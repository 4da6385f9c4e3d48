use clap::Args;
use serde::Serialize;
use serde_json::Value;

use typedash::defaults;
use typedash::template::{self, Node, TemplateOptions};

use super::{parse_json_spec, read_spec_to_string, CmdResult};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Template source (inline, @file, or - for stdin)
    pub template: String,

    /// Data context as JSON (inline, @file, or - for stdin)
    #[arg(long, value_name = "JSON")]
    pub data: Option<String>,

    /// Identifier bound to the whole data context
    #[arg(long, value_name = "NAME")]
    pub data_name: Option<String>,

    /// Identifier of the output accumulator
    #[arg(long, value_name = "NAME")]
    pub out_name: Option<String>,

    /// Opening fragment delimiter
    #[arg(long, value_name = "DELIM")]
    pub open: Option<String>,

    /// Closing fragment delimiter
    #[arg(long, value_name = "DELIM")]
    pub close: Option<String>,

    /// Compile only: report structural errors and list the parsed nodes
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Serialize)]
pub struct RenderOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nodes: Option<Vec<Node>>,
}

pub fn run(args: RenderArgs) -> CmdResult<RenderOutput> {
    if args.template.trim() == "-" && args.data.as_deref().map(str::trim) == Some("-") {
        return Err(typedash::Error::validation_invalid_argument(
            "data",
            "Template and data cannot both be read from stdin",
            None,
            None,
        ));
    }

    let options = resolve_options(&args, defaults::load_defaults().template);
    let source = read_spec_to_string(&args.template, "template")?;
    let compiled = template::compile(&source, &options);

    if args.check {
        compiled.check()?;
        return Ok((
            RenderOutput {
                command: "render.check".to_string(),
                output: None,
                nodes: Some(compiled.nodes().to_vec()),
            },
            0,
        ));
    }

    let data = match &args.data {
        Some(spec) => parse_json_spec(spec, "data")?,
        None => Value::Object(serde_json::Map::new()),
    };

    let output = compiled.render(&data)?;
    typedash::log_status!("render", "Rendered {} bytes", output.len());

    Ok((
        RenderOutput {
            command: "render".to_string(),
            output: Some(output),
            nodes: None,
        },
        0,
    ))
}

/// Flags override configured defaults field by field.
fn resolve_options(args: &RenderArgs, base: TemplateOptions) -> TemplateOptions {
    TemplateOptions {
        data_name: args.data_name.clone().unwrap_or(base.data_name),
        out_name: args.out_name.clone().unwrap_or(base.out_name),
        open: args.open.clone().unwrap_or(base.open),
        close: args.close.clone().unwrap_or(base.close),
    }
}
