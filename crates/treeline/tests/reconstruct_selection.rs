use treeline::{
    reconstruct, Expr, IdAllocator, MatchArm, Pattern, StaticSignatures,
};

fn ids() -> IdAllocator {
    IdAllocator::new()
}

fn int(ids: &mut IdAllocator, digits: &str) -> Expr {
    Expr::IntLiteral {
        id: ids.mint(),
        digits: digits.to_string(),
    }
}

#[test]
fn selecting_one_argument_yields_that_argument_not_the_call() {
    let mut ids = ids();
    let tree = Expr::FnCall {
        id: ids.mint(),
        name: "f".to_string(),
        args: vec![
            int(&mut ids, "1"),
            int(&mut ids, "2"),
            int(&mut ids, "3"),
        ],
        on_rail: false,
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // "f 1 2 3" — the middle argument's token is offset 4.
    let rebuilt = reconstruct(&tree, (4, 5), &sigs, &mut fresh).expect("subtree");
    assert!(
        matches!(&rebuilt, Expr::IntLiteral { digits, .. } if digits == "2"),
        "got {rebuilt:?}"
    );
    assert!(rebuilt.id().0 >= 1000, "reconstructed ids are fresh");
}

#[test]
fn a_half_selected_identifier_becomes_an_editable_partial() {
    let mut ids = ids();
    let tree = Expr::Variable {
        id: ids.mint(),
        name: "counter".to_string(),
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    let rebuilt = reconstruct(&tree, (0, 4), &sigs, &mut fresh).expect("subtree");
    let Expr::Partial { text, wrapped, .. } = &rebuilt else {
        panic!("expected partial, got {rebuilt:?}");
    };
    assert_eq!(text, "coun");
    assert!(matches!(wrapped.as_ref(), Expr::Variable { name, .. } if name == "coun"));
}

#[test]
fn a_fully_selected_string_round_trips_with_quotes_reappended() {
    let mut ids = ids();
    let tree = Expr::StringLiteral {
        id: ids.mint(),
        text: "hello".to_string(),
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    let rebuilt = reconstruct(&tree, (0, 7), &sigs, &mut fresh).expect("subtree");
    assert!(
        matches!(&rebuilt, Expr::StringLiteral { text, .. } if text == "hello"),
        "got {rebuilt:?}"
    );
}

#[test]
fn a_partially_selected_string_is_trimmed_to_the_overlap() {
    let mut ids = ids();
    let tree = Expr::StringLiteral {
        id: ids.mint(),
        text: "hello".to_string(),
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // Offsets 1..4 cover "hel" (the opening quote is offset 0).
    let rebuilt = reconstruct(&tree, (1, 4), &sigs, &mut fresh).expect("subtree");
    assert!(
        matches!(&rebuilt, Expr::StringLiteral { text, .. } if text == "hel"),
        "got {rebuilt:?}"
    );
}

#[test]
fn children_outside_the_selection_become_blanks() {
    let mut ids = ids();
    let tree = Expr::BinOp {
        id: ids.mint(),
        op: "+".to_string(),
        lhs: Box::new(int(&mut ids, "1")),
        rhs: Box::new(int(&mut ids, "2")),
        on_rail: false,
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // "1 + 2" — select "1 +" only.
    let rebuilt = reconstruct(&tree, (0, 3), &sigs, &mut fresh).expect("subtree");
    let Expr::BinOp { op, lhs, rhs, .. } = &rebuilt else {
        panic!("expected binop, got {rebuilt:?}");
    };
    assert_eq!(op, "+");
    assert!(matches!(lhs.as_ref(), Expr::IntLiteral { digits, .. } if digits == "1"));
    assert!(rhs.is_blank(), "the unselected operand is a blank");
}

#[test]
fn list_members_without_surviving_tokens_are_dropped() {
    let mut ids = ids();
    let tree = Expr::List {
        id: ids.mint(),
        items: vec![
            int(&mut ids, "1"),
            int(&mut ids, "2"),
            int(&mut ids, "3"),
        ],
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // "[1,2,3]" — select "1,2" plus the bracket: offsets 0..4.
    let rebuilt = reconstruct(&tree, (0, 4), &sigs, &mut fresh).expect("subtree");
    let Expr::List { items, .. } = &rebuilt else {
        panic!("expected list, got {rebuilt:?}");
    };
    assert_eq!(items.len(), 2);
}

#[test]
fn a_single_surviving_pipeline_segment_gets_a_trailing_blank() {
    let mut ids = ids();
    let head = Expr::FnCall {
        id: ids.mint(),
        name: "List::head".to_string(),
        args: vec![],
        on_rail: false,
    };
    let tree = Expr::Pipeline {
        id: ids.mint(),
        segments: vec![
            head,
            Expr::FnCall {
                id: ids.mint(),
                name: "Int::add".to_string(),
                args: vec![Expr::PipeTarget { id: ids.mint() }, int(&mut ids, "1")],
                on_rail: false,
            },
        ],
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // Select only the pipe row: "  |> Int::add 1" starts at offset 11.
    let rebuilt = reconstruct(&tree, (13, 26), &sigs, &mut fresh).expect("subtree");
    let Expr::Pipeline { segments, .. } = &rebuilt else {
        panic!("expected pipeline, got {rebuilt:?}");
    };
    assert_eq!(segments.len(), 2, "degenerate pipelines are renormalized");
    assert!(segments[1].is_blank());
}

#[test]
fn a_match_never_reconstructs_without_arms() {
    let mut ids = ids();
    let match_id = ids.mint();
    let tree = Expr::Match {
        id: match_id,
        subject: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "x".to_string(),
        }),
        arms: vec![MatchArm {
            pattern: Pattern::Integer {
                match_id,
                id: ids.mint(),
                digits: "0".to_string(),
            },
            body: int(&mut ids, "1"),
        }],
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    // Select the keyword and subject only: "match x".
    let rebuilt = reconstruct(&tree, (0, 7), &sigs, &mut fresh).expect("subtree");
    let Expr::Match { arms, .. } = &rebuilt else {
        panic!("expected match, got {rebuilt:?}");
    };
    assert!(!arms.is_empty());
}

#[test]
fn an_empty_or_whitespace_only_range_reconstructs_nothing() {
    let mut ids = ids();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: "x".to_string(),
        rhs: Box::new(int(&mut ids, "1")),
        body: Box::new(int(&mut ids, "2")),
    };
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    assert!(reconstruct(&tree, (5, 5), &sigs, &mut fresh).is_none());
    // Offset 9..10 covers only the newline after the rhs.
    assert!(reconstruct(&tree, (9, 10), &sigs, &mut fresh).is_none());
}

#[test]
fn reconstruct_never_mutates_its_input() {
    let mut ids = ids();
    let tree = Expr::FnCall {
        id: ids.mint(),
        name: "f".to_string(),
        args: vec![int(&mut ids, "1"), int(&mut ids, "2")],
        on_rail: false,
    };
    let before = tree.clone();
    let sigs = StaticSignatures::builtin();
    let mut fresh = IdAllocator::starting_at(1000);

    let _ = reconstruct(&tree, (0, 5), &sigs, &mut fresh);
    assert_eq!(tree, before);
}
