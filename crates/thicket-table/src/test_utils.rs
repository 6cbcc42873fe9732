use crate::table::*;

fn symbol(name: &str, kind: SymbolKind, named: bool) -> SymbolInfo {
    SymbolInfo {
        name: name.to_owned(),
        kind,
        named,
        visible: true,
        supertype: false,
        extra: false,
    }
}

/// Table for `source: seq("a", optional(field("tail", "b")))`, built by hand.
pub fn sample_table() -> LanguageTable {
    LanguageTable {
        name: "sample".to_owned(),
        symbols: vec![
            SymbolInfo {
                visible: false,
                ..symbol("end", SymbolKind::End, false)
            },
            symbol("ERROR", SymbolKind::Error, true),
            symbol("a", SymbolKind::Terminal, false),
            symbol("b", SymbolKind::Terminal, false),
            symbol("source", SymbolKind::NonTerminal, true),
        ],
        field_names: vec!["tail".to_owned()],
        aliases: vec![],
        productions: vec![
            Production {
                lhs: 4,
                precedence: 0,
                dynamic_precedence: 0,
                steps: vec![ProductionStep::default()],
            },
            Production {
                lhs: 4,
                precedence: 0,
                dynamic_precedence: 0,
                steps: vec![
                    ProductionStep::default(),
                    ProductionStep {
                        field: FieldId::new(1),
                        alias: None,
                    },
                ],
            },
        ],
        action_lists: vec![
            vec![ParseAction::Shift { state: 1 }],
            vec![ParseAction::Reduce { production: 0 }],
            vec![ParseAction::Shift { state: 3 }],
            vec![ParseAction::Reduce { production: 1 }],
            vec![ParseAction::Accept],
        ],
        states: vec![
            ParseState {
                actions: vec![(2, 0)],
                gotos: vec![(4, 2)],
                lex_mode: 0,
            },
            ParseState {
                actions: vec![(0, 1), (3, 2)],
                gotos: vec![],
                lex_mode: 1,
            },
            ParseState {
                actions: vec![(0, 4)],
                gotos: vec![],
                lex_mode: 2,
            },
            ParseState {
                actions: vec![(0, 3)],
                gotos: vec![],
                lex_mode: 2,
            },
        ],
        lex_modes: vec![
            LexMode {
                terminals: vec![2],
                externals: vec![],
            },
            LexMode {
                terminals: vec![0, 3],
                externals: vec![],
            },
            LexMode {
                terminals: vec![0],
                externals: vec![],
            },
        ],
        start_state: 0,
        start_symbol: 4,
        tokens: vec![
            TokenInfo {
                symbol: 2,
                kind: TokenKind::String,
                source: "a".to_owned(),
                precedence: 0,
                immediate: false,
            },
            TokenInfo {
                symbol: 3,
                kind: TokenKind::String,
                source: "b".to_owned(),
                precedence: 0,
                immediate: false,
            },
        ],
        lexer_dfa: vec![],
        separator_dfa: None,
        keywords: None,
        externals: vec![],
        supertypes: vec![],
    }
}
