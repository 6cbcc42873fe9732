//! Human-readable table dump for debugging grammars.

use std::fmt::Write as _;

use thicket_core::Colors;

use crate::table::{LanguageTable, ParseAction, SymbolKind, TokenKind};

/// Digits needed to print indices below `count`.
fn width_for_count(count: usize) -> usize {
    if count <= 1 {
        1
    } else {
        ((count - 1) as f64).log10().floor() as usize + 1
    }
}

/// Generate a human-readable dump of a table.
pub fn dump(table: &LanguageTable, colors: Colors) -> String {
    let mut out = String::new();
    dump_symbols(&mut out, table, colors);
    dump_fields(&mut out, table, colors);
    dump_tokens(&mut out, table, colors);
    dump_productions(&mut out, table, colors);
    dump_states(&mut out, table, colors);
    out
}

fn symbol_kind(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::End => "end",
        SymbolKind::Error => "error",
        SymbolKind::Terminal => "term",
        SymbolKind::External => "extern",
        SymbolKind::NonTerminal => "rule",
        SymbolKind::Auxiliary => "aux",
    }
}

fn dump_symbols(out: &mut String, table: &LanguageTable, c: Colors) {
    let w = width_for_count(table.symbols.len());
    writeln!(out, "{}[symbols]{}", c.blue, c.reset).unwrap();
    for (id, info) in table.symbols.iter().enumerate() {
        let mut flags = Vec::new();
        if info.named {
            flags.push("named");
        }
        if !info.visible {
            flags.push("hidden");
        }
        if info.supertype {
            flags.push("supertype");
        }
        if info.extra {
            flags.push("extra");
        }
        let mut line = format!(
            "{}{id:0w$}{} {:<6} {}{:?}{}",
            c.dim,
            c.reset,
            symbol_kind(info.kind),
            c.green,
            info.name,
            c.reset
        );
        if !flags.is_empty() {
            write!(line, " {}{}{}", c.dim, flags.join(" "), c.reset).unwrap();
        }
        writeln!(out, "{line}").unwrap();
    }
    out.push('\n');
}

fn dump_fields(out: &mut String, table: &LanguageTable, c: Colors) {
    if table.field_names.is_empty() {
        return;
    }
    writeln!(out, "{}[fields]{}", c.blue, c.reset).unwrap();
    for (i, name) in table.field_names.iter().enumerate() {
        writeln!(out, "{}{}{} {name}", c.dim, i + 1, c.reset).unwrap();
    }
    out.push('\n');
}

fn dump_tokens(out: &mut String, table: &LanguageTable, c: Colors) {
    writeln!(out, "{}[tokens]{}", c.blue, c.reset).unwrap();
    let w = width_for_count(table.tokens.len());
    for (i, token) in table.tokens.iter().enumerate() {
        let source = match token.kind {
            TokenKind::String => format!("{:?}", token.source),
            TokenKind::Pattern => format!("/{}/", token.source),
        };
        let mut line = format!(
            "{}{i:0w$}{} {} {}{source}{}",
            c.dim,
            c.reset,
            table.symbol_name(token.symbol),
            c.green,
            c.reset
        );
        if token.precedence != 0 {
            write!(line, " prec={}", token.precedence).unwrap();
        }
        if token.immediate {
            line.push_str(" immediate");
        }
        writeln!(out, "{line}").unwrap();
    }
    if let Some(keywords) = &table.keywords {
        let words: Vec<&str> = keywords.keywords.iter().map(|(k, _)| k.as_str()).collect();
        writeln!(
            out,
            "{}keywords via {}:{} {}",
            c.dim,
            table.symbol_name(keywords.word),
            c.reset,
            words.join(" ")
        )
        .unwrap();
    }
    out.push('\n');
}

fn dump_productions(out: &mut String, table: &LanguageTable, c: Colors) {
    writeln!(out, "{}[productions]{}", c.blue, c.reset).unwrap();
    let w = width_for_count(table.productions.len());
    for (i, production) in table.productions.iter().enumerate() {
        let mut line = format!(
            "{}{i:0w$}{} {} ->",
            c.dim,
            c.reset,
            table.symbol_name(production.lhs)
        );
        write!(line, " {} children", production.child_count()).unwrap();
        for (index, step) in production.steps.iter().enumerate() {
            if let Some(field) = step.field {
                write!(line, " {index}:{}", table.field_name(field)).unwrap();
            }
            if let Some(alias) = step.alias {
                write!(line, " {index}=>{}", table.alias(alias).name).unwrap();
            }
        }
        if production.precedence != 0 {
            write!(line, " prec={}", production.precedence).unwrap();
        }
        if production.dynamic_precedence != 0 {
            write!(line, " dyn={}", production.dynamic_precedence).unwrap();
        }
        writeln!(out, "{line}").unwrap();
    }
    out.push('\n');
}

fn dump_states(out: &mut String, table: &LanguageTable, c: Colors) {
    writeln!(out, "{}[states]{}", c.blue, c.reset).unwrap();
    for (i, state) in table.states.iter().enumerate() {
        let start = if i as u32 == table.start_state {
            " start"
        } else {
            ""
        };
        writeln!(out, "{}state {i}{start} lex={}{}", c.dim, state.lex_mode, c.reset).unwrap();
        for &(symbol, list) in &state.actions {
            let actions: Vec<String> = table.action_lists[list as usize]
                .iter()
                .map(|action| match action {
                    ParseAction::Shift { state } => format!("shift {state}"),
                    ParseAction::ShiftExtra => "shift-extra".to_owned(),
                    ParseAction::Reduce { production } => format!("reduce {production}"),
                    ParseAction::Accept => "accept".to_owned(),
                })
                .collect();
            writeln!(
                out,
                "  {}{}{} {}",
                c.green,
                table.symbol_name(symbol),
                c.reset,
                actions.join(" | ")
            )
            .unwrap();
        }
        for &(symbol, target) in &state.gotos {
            writeln!(out, "  {} goto {target}", table.symbol_name(symbol)).unwrap();
        }
    }
}
