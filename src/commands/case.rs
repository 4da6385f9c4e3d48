use clap::{Args, ValueEnum};
use serde::Serialize;

use typedash::strings;

use super::CmdResult;

#[derive(Args, Debug)]
pub struct CaseArgs {
    /// Conversion to apply
    #[arg(value_enum)]
    pub style: CaseStyle,

    /// Input text
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStyle {
    /// Split into words
    Words,
    Camel,
    Snake,
    Kebab,
    Capitalize,
    Lower,
    Trim,
}

#[derive(Debug, Serialize)]
pub struct CaseOutput {
    command: String,
    style: CaseStyle,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    words: Option<Vec<String>>,
}

pub fn run(args: CaseArgs) -> CmdResult<CaseOutput> {
    let text = args.text.as_str();
    let (output, words) = match args.style {
        CaseStyle::Words => (
            None,
            Some(strings::words(text).into_iter().map(str::to_string).collect()),
        ),
        CaseStyle::Camel => (Some(strings::camel_case(text)), None),
        CaseStyle::Snake => (Some(strings::snake_case(text)), None),
        CaseStyle::Kebab => (Some(strings::kebab_case(text)), None),
        CaseStyle::Capitalize => (Some(strings::capitalize(text)), None),
        CaseStyle::Lower => (Some(strings::lower_case(text)), None),
        CaseStyle::Trim => (Some(strings::trim(text).to_string()), None),
    };

    Ok((
        CaseOutput {
            command: "case".to_string(),
            style: args.style,
            input: args.text,
            output,
            words,
        },
        0,
    ))
}
