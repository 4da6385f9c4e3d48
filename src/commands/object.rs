use clap::Args;
use serde::Serialize;
use serde_json::Value;

use typedash::objects;

use super::{parse_json_object, parse_json_spec, CmdResult};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Target JSON (inline, @file, or - for stdin)
    pub target: String,

    /// Source JSON merged over the target
    pub source: String,
}

#[derive(Args, Debug)]
pub struct PatchArgs {
    /// Previous JSON object
    pub old: String,

    /// New JSON object; only entries that differ from OLD are kept
    pub patch: String,
}

#[derive(Debug, Serialize)]
pub struct ObjectOutput {
    command: String,
    result: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    changed: Option<Vec<String>>,
}

pub fn run_merge(args: MergeArgs) -> CmdResult<ObjectOutput> {
    ensure_single_stdin(&[&args.target, &args.source])?;
    let target = parse_json_spec(&args.target, "target")?;
    let source = parse_json_spec(&args.source, "source")?;

    Ok((
        ObjectOutput {
            command: "merge".to_string(),
            result: objects::merge(&target, &source),
            changed: None,
        },
        0,
    ))
}

pub fn run_patch(args: PatchArgs) -> CmdResult<ObjectOutput> {
    ensure_single_stdin(&[&args.old, &args.patch])?;
    let old = parse_json_object(&args.old, "old")?;
    let patch = parse_json_object(&args.patch, "patch")?;

    let diff = objects::patch(&old, &patch);
    let changed = objects::keys(&diff).into_iter().map(str::to_string).collect();

    Ok((
        ObjectOutput {
            command: "patch".to_string(),
            result: Value::Object(diff),
            changed: Some(changed),
        },
        0,
    ))
}

fn ensure_single_stdin(specs: &[&str]) -> typedash::Result<()> {
    if specs.iter().filter(|spec| spec.trim() == "-").count() > 1 {
        return Err(typedash::Error::validation_invalid_argument(
            "stdin",
            "Only one argument can be read from stdin",
            None,
            None,
        ));
    }
    Ok(())
}
