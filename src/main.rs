use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{case, config, object, pattern, render};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "typedash")]
#[command(version = VERSION)]
#[command(about = "Templates, case conversion, wildcard matching and JSON merging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template against a JSON data context
    Render(render::RenderArgs),
    /// Split or convert the case of text
    Case(case::CaseArgs),
    /// Test strings against a wildcard pattern or /regex/flags
    Match(pattern::MatchArgs),
    /// Deep-merge two JSON values
    Merge(object::MergeArgs),
    /// Keep the entries of a JSON object that differ from an older one
    Patch(object::PatchArgs),
    /// Show typedash configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    if output::print_json_result(json_result).is_err() {
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
