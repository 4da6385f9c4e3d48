use clap::Args;
use serde::Serialize;

use typedash::defaults;
use typedash::pattern::wildcard_to_regex;

use super::CmdResult;

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Wildcard pattern (`*` any run, `+` one or more) or `/regex/flags`
    pub pattern: String,

    /// Strings to test against the pattern
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Regex flags for wildcard patterns (defaults from typedash.json)
    #[arg(long, value_name = "FLAGS")]
    pub flags: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchItem {
    input: String,
    matched: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchOutput {
    command: String,
    pattern: String,
    regex: String,
    results: Vec<MatchItem>,
    matched: usize,
}

/// Exits 1 when no input matched, like grep.
pub fn run(args: MatchArgs) -> CmdResult<MatchOutput> {
    let flags = args.flags.or_else(|| defaults::load_defaults().wildcard.flags);
    let regex = wildcard_to_regex(&args.pattern, flags.as_deref())?;

    let results: Vec<MatchItem> = args
        .inputs
        .into_iter()
        .map(|input| MatchItem {
            matched: regex.is_match(&input),
            input,
        })
        .collect();
    let matched = results.iter().filter(|item| item.matched).count();
    let exit_code = if matched > 0 { 0 } else { 1 };

    Ok((
        MatchOutput {
            command: "match".to_string(),
            pattern: args.pattern,
            regex: regex.as_str().to_string(),
            results,
            matched,
        },
        exit_code,
    ))
}
