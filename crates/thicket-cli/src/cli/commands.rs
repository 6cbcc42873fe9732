//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Source, language and table selection shared by every parsing command.
fn with_source_args(cmd: Command) -> Command {
    cmd.arg(source_path_arg())
        .arg(source_text_arg())
        .arg(lang_arg())
        .arg(table_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("thicket")
        .about("Incremental, error-tolerant GLR parsing")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(verbose_arg())
        .subcommand(generate_command())
        .subcommand(tree_command())
        .subcommand(check_command())
        .subcommand(query_command())
        .subcommand(edit_command())
        .subcommand(dump_command())
        .subcommand(langs_command())
}

/// Compile a grammar to a table file.
pub fn generate_command() -> Command {
    Command::new("generate")
        .about("Compile a grammar to a table file")
        .override_usage(
            "\
  thicket generate <GRAMMAR> -o <FILE>
  thicket generate -l <LANG> -o <FILE>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket generate grammar.json -o lang.tbl    # compile grammar.json
  thicket generate -l ttcn3 -o ttcn3.tbl       # table of a bundled language
  thicket generate grammar.json -o x --strict  # fail on undeclared conflicts"#,
        )
        .arg(grammar_path_arg().required_unless_present("lang"))
        .arg(lang_arg().conflicts_with("grammar_path"))
        .arg(output_file_arg().required(true))
        .arg(max_alternatives_arg())
        .arg(strict_arg())
}

/// Parse a source file and print its tree.
pub fn tree_command() -> Command {
    let cmd = Command::new("tree")
        .about("Parse source and print its syntax tree")
        .override_usage(
            "\
  thicket tree <SOURCE> [-l <LANG> | -t <TABLE>]
  thicket tree -s <TEXT> -l <LANG>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket tree suite.ttcn3                      # language from extension
  thicket tree suite.ttcn3 --raw --spans        # keywords, punctuation, positions
  thicket tree -s 'module M {}' -l ttcn3        # inline source
  thicket tree input.txt -t lang.tbl            # table from `thicket generate`"#,
        );
    with_source_args(cmd)
        .arg(raw_arg())
        .arg(spans_arg())
        .arg(max_versions_arg())
        .arg(color_arg())
}

/// Parse a source file and report its syntax errors.
pub fn check_command() -> Command {
    let cmd = Command::new("check")
        .about("Report syntax errors in source")
        .override_usage(
            "\
  thicket check <SOURCE> [-l <LANG> | -t <TABLE>]
  thicket check -s <TEXT> -l <LANG>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket check suite.ttcn3                # exit status 1 on syntax errors
  thicket check - -l ttcn3 < suite.ttcn3   # read stdin"#,
        );
    with_source_args(cmd).arg(color_arg())
}

/// Run a query against a source file.
pub fn query_command() -> Command {
    let cmd = Command::new("query")
        .about("Print query matches and captures")
        .override_usage(
            "\
  thicket query -q <PATTERN> <SOURCE> [-l <LANG> | -t <TABLE>]
  thicket query --query-file <FILE> <SOURCE>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket query -q '(func name: (name) @fn)' suite.ttcn3
  thicket query --query-file tests.scm suite.ttcn3 --json"#,
        );
    with_source_args(cmd)
        .arg(query_text_arg().required_unless_present("query_file"))
        .arg(query_file_arg())
        .arg(json_arg())
        .arg(color_arg())
}

/// Edit a source file in memory and reparse it incrementally.
pub fn edit_command() -> Command {
    let cmd = Command::new("edit")
        .about("Apply an edit, reparse incrementally and print changed ranges")
        .override_usage(
            "\
  thicket edit <SOURCE> --at <START:OLD_END> [--insert <TEXT>]
  thicket edit -s <TEXT> -l <LANG> --at <START> --insert <TEXT>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket edit suite.ttcn3 --at 120:122 --insert 200   # replace two bytes
  thicket edit suite.ttcn3 --at 40 --insert 'x '       # insert
  thicket edit suite.ttcn3 --at 40:52 --tree           # delete, show new tree"#,
        );
    with_source_args(cmd)
        .arg(at_arg())
        .arg(insert_arg())
        .arg(show_tree_arg())
        .arg(json_arg())
        .arg(color_arg())
}

/// Show a grammar table.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Show a grammar table in readable form")
        .override_usage(
            "\
  thicket dump -l <LANG>
  thicket dump -t <TABLE>",
        )
        .after_help(
            r#"EXAMPLES:
  thicket dump -l ttcn3            # bundled language
  thicket dump -t lang.tbl         # generated table"#,
        )
        .arg(lang_arg())
        .arg(table_arg())
        .arg(color_arg())
}

/// List bundled languages.
pub fn langs_command() -> Command {
    Command::new("langs").about("List bundled languages")
}
