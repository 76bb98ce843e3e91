use crate::expr::{Expr, MatchArm, Pattern, RecordField};
use crate::id::IdAllocator;
use crate::provider::StaticSignatures;
use crate::token::{to_text, TokenKind};
use crate::tokenizer::{layout, reflow, tokenize, tokenize_info, STRING_SEGMENT};

fn ids() -> IdAllocator {
    IdAllocator::new()
}

#[test]
fn let_renders_rhs_then_body_on_the_next_row() {
    let mut ids = ids();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: "x".to_string(),
        rhs: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "1".to_string(),
        }),
        body: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "x".to_string(),
        }),
    };
    let sigs = StaticSignatures::builtin();
    let text = to_text(&reflow(tokenize(&tree, &sigs)));
    assert_eq!(text, "let x = 1\nx");
}

#[test]
fn if_nests_branches_two_columns_in() {
    let mut ids = ids();
    let tree = Expr::If {
        id: ids.mint(),
        cond: Box::new(Expr::BoolLiteral {
            id: ids.mint(),
            value: true,
        }),
        then_branch: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "1".to_string(),
        }),
        else_branch: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "2".to_string(),
        }),
    };
    let sigs = StaticSignatures::builtin();
    let text = to_text(&reflow(tokenize(&tree, &sigs)));
    assert_eq!(text, "if true\nthen\n  1\nelse\n  2");
}

#[test]
fn empty_float_fraction_omits_the_token_but_keeps_the_point() {
    let mut ids = ids();
    let tree = Expr::FloatLiteral {
        id: ids.mint(),
        whole: "12".to_string(),
        fraction: String::new(),
    };
    let sigs = StaticSignatures::builtin();
    let tokens = tokenize(&tree, &sigs);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::FloatWhole, TokenKind::FloatPoint]);
    assert_eq!(to_text(&tokens), "12.");
}

#[test]
fn no_token_ever_has_empty_text() {
    let mut ids = ids();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: String::new(),
        rhs: Box::new(Expr::FloatLiteral {
            id: ids.mint(),
            whole: String::new(),
            fraction: "5".to_string(),
        }),
        body: Box::new(Expr::Partial {
            id: ids.mint(),
            text: String::new(),
            wrapped: Box::new(Expr::Blank { id: ids.mint() }),
        }),
    };
    let sigs = StaticSignatures::builtin();
    for token in reflow(tokenize(&tree, &sigs)) {
        assert!(!token.text.is_empty(), "zero-length token: {token:?}");
    }
}

#[test]
fn long_strings_split_into_start_middle_end_segments() {
    let mut ids = ids();
    let text: String = "abcdefghij".repeat(9); // 90 chars
    let tree = Expr::StringLiteral {
        id: ids.mint(),
        text: text.clone(),
    };
    let sigs = StaticSignatures::builtin();
    let tokens = tokenize(&tree, &sigs);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::StringMLStart,
            TokenKind::Newline,
            TokenKind::StringMLMiddle,
            TokenKind::Newline,
            TokenKind::StringMLEnd,
        ]
    );
    assert_eq!(tokens[0].segment_offset, Some(0));
    assert_eq!(tokens[2].segment_offset, Some(STRING_SEGMENT));
    assert_eq!(tokens[4].segment_offset, Some(2 * STRING_SEGMENT));
    let flattened = to_text(&tokens).replace('\n', "");
    assert_eq!(flattened, format!("\"{text}\""));
}

#[test]
fn blank_arguments_of_known_functions_render_typed_placeholders() {
    let mut ids = ids();
    let tree = Expr::FnCall {
        id: ids.mint(),
        name: "Int::add".to_string(),
        args: vec![
            Expr::IntLiteral {
                id: ids.mint(),
                digits: "1".to_string(),
            },
            Expr::Blank { id: ids.mint() },
        ],
        on_rail: false,
    };
    let sigs = StaticSignatures::builtin();
    let tokens = tokenize(&tree, &sigs);
    let placeholder = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Placeholder)
        .expect("placeholder token");
    assert_eq!(placeholder.text, "b: Int");
}

#[test]
fn pipe_targets_render_nothing() {
    let mut ids = ids();
    let tree = Expr::Pipeline {
        id: ids.mint(),
        segments: vec![
            Expr::FnCall {
                id: ids.mint(),
                name: "List::head".to_string(),
                args: vec![],
                on_rail: false,
            },
            Expr::FnCall {
                id: ids.mint(),
                name: "Int::add".to_string(),
                args: vec![
                    Expr::PipeTarget { id: ids.mint() },
                    Expr::IntLiteral {
                        id: ids.mint(),
                        digits: "1".to_string(),
                    },
                ],
                on_rail: false,
            },
        ],
    };
    let sigs = StaticSignatures::builtin();
    let text = to_text(&reflow(tokenize(&tree, &sigs)));
    assert_eq!(text, "List::head\n  |> Int::add 1");
}

#[test]
fn reflow_is_idempotent() {
    let mut ids = ids();
    let match_id = ids.mint();
    let tree = Expr::Match {
        id: match_id,
        subject: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "x".to_string(),
        }),
        arms: vec![
            MatchArm {
                pattern: Pattern::Integer {
                    match_id,
                    id: ids.mint(),
                    digits: "0".to_string(),
                },
                body: Expr::StringLiteral {
                    id: ids.mint(),
                    text: "zero".to_string(),
                },
            },
            MatchArm {
                pattern: Pattern::Blank {
                    match_id,
                    id: ids.mint(),
                },
                body: Expr::Blank { id: ids.mint() },
            },
        ],
    };
    let sigs = StaticSignatures::builtin();
    let once = reflow(tokenize(&tree, &sigs));
    let twice = reflow(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn positions_are_monotonic_and_gapless() {
    let mut ids = ids();
    let tree = Expr::Record {
        id: ids.mint(),
        fields: vec![
            RecordField {
                id: ids.mint(),
                name: "count".to_string(),
                value: Expr::IntLiteral {
                    id: ids.mint(),
                    digits: "3".to_string(),
                },
            },
            RecordField {
                id: ids.mint(),
                name: "label".to_string(),
                value: Expr::StringLiteral {
                    id: ids.mint(),
                    text: "hi".to_string(),
                },
            },
        ],
    };
    let sigs = StaticSignatures::builtin();
    let infos = tokenize_info(&tree, &sigs);
    for pair in infos.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "overlapping tokens: {pair:?}"
        );
        assert_eq!(pair[0].end, pair[1].start, "gap between tokens: {pair:?}");
    }
}

#[test]
fn layout_assigns_rows_after_newlines() {
    let mut ids = ids();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: "x".to_string(),
        rhs: Box::new(Expr::Blank { id: ids.mint() }),
        body: Box::new(Expr::Blank { id: ids.mint() }),
    };
    let sigs = StaticSignatures::builtin();
    let infos = layout(&reflow(tokenize(&tree, &sigs)));
    let body_blank = infos.last().expect("tokens");
    assert_eq!(body_blank.row, 1);
    assert_eq!(body_blank.col, 0);
}

#[test]
fn versioned_function_names_split_into_name_and_version() {
    let mut ids = ids();
    let tree = Expr::FnCall {
        id: ids.mint(),
        name: "Int::add_v2".to_string(),
        args: vec![],
        on_rail: false,
    };
    let sigs = StaticSignatures::builtin();
    let tokens = tokenize(&tree, &sigs);
    assert_eq!(tokens[0].kind, TokenKind::FnName);
    assert_eq!(tokens[0].text, "Int::add");
    assert_eq!(tokens[1].kind, TokenKind::FnVersion);
    assert_eq!(tokens[1].text, "_v2");
    assert_eq!(to_text(&tokens), "Int::add_v2");
}
