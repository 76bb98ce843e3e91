use treeline::{
    reflow, to_text, tokenize, tokenize_info, CursorState, Editor, Expr, IdAllocator, InputEvent,
    StaticSignatures, StaticSuggestions,
};

fn render(expr: &Expr, sigs: &StaticSignatures) -> String {
    to_text(&reflow(tokenize(expr, sigs)))
}

fn drive(
    ed: &mut Editor,
    mut expr: Expr,
    mut cursor: CursorState,
    events: &[InputEvent],
) -> (Expr, CursorState) {
    for event in events {
        let result = ed.dispatch(&expr, &cursor, event.clone());
        assert!(
            result.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            result.diagnostics
        );
        expr = result.expr;
        cursor = result.cursor;
    }
    (expr, cursor)
}

#[test]
fn typing_a_whole_let_binding_from_a_blank() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: treeline::NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let mut events: Vec<InputEvent> = "let".chars().map(InputEvent::Insert).collect();
    events.push(InputEvent::Enter);
    let (expr, cursor) = drive(&mut ed, tree, CursorState::at(0), &events);

    let Expr::Let { rhs, body, .. } = &expr else {
        panic!("expected let, got {expr:?}");
    };
    assert!(rhs.is_blank());
    assert!(body.is_blank());
    assert_eq!(render(&expr, &sigs), "let ___ = ___\n___");
    assert_eq!(cursor.caret, 4, "caret lands on the name slot");
}

#[test]
fn typing_a_number_then_an_operator_then_a_number() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: treeline::NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let events: Vec<InputEvent> = vec![
        InputEvent::Insert('4'),
        InputEvent::Insert('2'),
        InputEvent::Insert('+'),
        InputEvent::Enter,
    ];
    let (expr, _) = drive(&mut ed, tree, CursorState::at(0), &events);
    let Expr::BinOp { op, lhs, rhs, .. } = &expr else {
        panic!("expected binop, got {expr:?}");
    };
    assert_eq!(op, "+");
    assert!(matches!(lhs.as_ref(), Expr::IntLiteral { digits, .. } if digits == "42"));
    assert!(rhs.is_blank());

    // The blank right operand shows its typed placeholder.
    assert_eq!(render(&expr, &sigs), "42 + b: Int");
}

#[test]
fn string_contents_accept_arbitrary_characters() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: treeline::NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let events: Vec<InputEvent> = "\"a b.c[".chars().map(InputEvent::Insert).collect();
    let (expr, cursor) = drive(&mut ed, tree, CursorState::at(0), &events);
    assert!(
        matches!(&expr, Expr::StringLiteral { text, .. } if text == "a b.c["),
        "got {expr:?}"
    );
    assert_eq!(cursor.caret, 7, "inside the closing quote");
}

#[test]
fn closing_quote_steps_out_of_the_string() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::StringLiteral {
        id: ids.mint(),
        text: "ab".to_string(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // "ab" renders "\"ab\"" — caret 3 sits right before the closing quote.
    let result = ed.dispatch(&tree, &CursorState::at(3), InputEvent::Insert('"'));
    assert_eq!(result.expr, tree, "no escaped quote is spliced");
    assert_eq!(result.cursor.caret, 4);
}

#[test]
fn backspacing_an_empty_string_leaves_a_blank() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::StringLiteral {
        id: ids.mint(),
        text: String::new(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(1), InputEvent::Backspace);
    assert!(result.expr.is_blank(), "got {:?}", result.expr);
}

#[test]
fn lambda_typed_into_a_block_argument_prefills_declared_names() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let blank = Expr::Blank { id: ids.mint() };
    let tree = Expr::FnCall {
        id: ids.mint(),
        name: "List::map".to_string(),
        args: vec![
            Expr::Variable {
                id: ids.mint(),
                name: "xs".to_string(),
            },
            blank,
        ],
        on_rail: false,
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // "List::map xs f: Block" — the second argument's placeholder starts
    // at offset 13.
    let result = ed.dispatch(&tree, &CursorState::at(13), InputEvent::Insert('\\'));
    let Expr::FnCall { args, .. } = &result.expr else {
        panic!("expected call, got {:?}", result.expr);
    };
    let Expr::Lambda { params, .. } = &args[1] else {
        panic!("expected lambda argument, got {:?}", args[1]);
    };
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "item");
}

#[test]
fn renaming_a_let_binding_renames_unshadowed_uses() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
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
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // "let x = 1\nx" — append to the binding name at offset 5.
    let result = ed.dispatch(&tree, &CursorState::at(5), InputEvent::Insert('s'));
    assert_eq!(render(&result.expr, &sigs), "let xs = 1\nxs");
}

#[test]
fn a_reference_edit_does_not_rename_the_binding() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
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
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // Editing the body reference opens a partial over it instead.
    let result = ed.dispatch(&tree, &CursorState::at(11), InputEvent::Insert('y'));
    let Expr::Let { body, .. } = &result.expr else {
        panic!("expected let, got {:?}", result.expr);
    };
    assert!(
        matches!(body.as_ref(), Expr::Partial { text, .. } if text == "xy"),
        "got {body:?}"
    );
}

#[test]
fn home_and_end_stay_on_the_caret_row() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: "x".to_string(),
        rhs: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "12".to_string(),
        }),
        body: Box::new(Expr::Blank { id: ids.mint() }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let home = ed.dispatch(&tree, &CursorState::at(8), InputEvent::Home);
    assert_eq!(home.cursor.caret, 0);
    let end = ed.dispatch(&tree, &CursorState::at(8), InputEvent::End);
    assert_eq!(end.cursor.caret, 10);
}

#[test]
fn every_dispatch_returns_a_tree_that_tokenizes_cleanly() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: treeline::NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let script: Vec<InputEvent> = vec![
        InputEvent::Insert('l'),
        InputEvent::Insert('e'),
        InputEvent::Insert('t'),
        InputEvent::Enter,
        InputEvent::Insert('y'),
        InputEvent::Tab,
        InputEvent::Insert('['),
        InputEvent::Insert('1'),
        InputEvent::Insert(','),
        InputEvent::Insert('2'),
        InputEvent::Right,
        InputEvent::Backspace,
        InputEvent::Down,
        InputEvent::Up,
        InputEvent::Insert('x'),
    ];

    let mut expr = tree;
    let mut cursor = CursorState::at(0);
    for event in script {
        let result = ed.dispatch(&expr, &cursor, event);
        // Whatever the edit did, the stream must stay a faithful rendering:
        // non-empty texts, monotonic offsets, caret within bounds.
        let infos = tokenize_info(&result.expr, &sigs);
        for info in &infos {
            assert!(!info.token.text.is_empty(), "empty token in {infos:?}");
        }
        for pair in infos.windows(2) {
            assert!(pair[0].end <= pair[1].start, "overlap in {pair:?}");
        }
        let len = infos.last().map(|i| i.end).unwrap_or(0);
        assert!(result.cursor.caret <= len, "caret escaped the stream");
        expr = result.expr;
        cursor = result.cursor;
    }
}
