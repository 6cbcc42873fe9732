#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use cli::{
    CheckParams, DumpParams, EditParams, GenerateParams, QueryParams, TreeParams, build_cli,
};
use commands::CliError;

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    logging::init(matches.get_count("verbose"));

    let result = match matches.subcommand() {
        Some(("generate", m)) => commands::generate::run(GenerateParams::from_matches(m).into()),
        Some(("tree", m)) => commands::tree::run(TreeParams::from_matches(m).into()),
        Some(("check", m)) => commands::check::run(CheckParams::from_matches(m).into()),
        Some(("query", m)) => commands::query::run(QueryParams::from_matches(m).into()),
        Some(("edit", m)) => commands::edit::run(EditParams::from_matches(m).into()),
        Some(("dump", m)) => commands::dump::run(DumpParams::from_matches(m).into()),
        Some(("langs", _)) => commands::langs::run(),
        _ => unreachable!("clap should have caught this"),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Reported(rendered)) => {
            eprint!("{rendered}");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
