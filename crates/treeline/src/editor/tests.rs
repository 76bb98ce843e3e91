use crate::cursor::CursorState;
use crate::editor::Editor;
use crate::event::InputEvent;
use crate::expr::{Expr, Pattern};
use crate::id::{IdAllocator, NodeId};
use crate::provider::{StaticSignatures, StaticSuggestions};
use crate::token::to_text;
use crate::tokenizer::{reflow, tokenize};

fn render(expr: &Expr, sigs: &StaticSignatures) -> String {
    to_text(&reflow(tokenize(expr, sigs)))
}

fn type_chars(
    ed: &mut Editor,
    expr: &Expr,
    cursor: &CursorState,
    text: &str,
) -> (Expr, CursorState) {
    let mut expr = expr.clone();
    let mut cursor = cursor.clone();
    for c in text.chars() {
        let result = ed.dispatch(&expr, &cursor, InputEvent::Insert(c));
        expr = result.expr;
        cursor = result.cursor;
    }
    (expr, cursor)
}

#[test]
fn inserting_a_digit_splices_into_the_integer() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::IntLiteral {
        id: NodeId(1),
        digits: "12".to_string(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(1), InputEvent::Insert('5'));
    assert_eq!(
        result.expr,
        Expr::IntLiteral {
            id: NodeId(1),
            digits: "152".to_string(),
        },
        "the node keeps its id across the edit"
    );
    assert_eq!(result.cursor.caret, 2);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn arrows_skip_atomic_tokens_in_one_step() {
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

    // "let x = 12\n___" — Right from 0 clears the keyword in one step.
    let step = ed.dispatch(&tree, &CursorState::at(0), InputEvent::Right);
    assert_eq!(step.cursor.caret, 3);

    // Left from the body blank crosses newline and blank edges in one step.
    let back = ed.dispatch(&tree, &CursorState::at(11), InputEvent::Left);
    assert_eq!(back.cursor.caret, 10);
}

#[test]
fn vertical_movement_remembers_the_column() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: "x".to_string(),
        rhs: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "12345".to_string(),
        }),
        body: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "ab".to_string(),
        }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // Row 0 is "let x = 12345" (13 wide); row 1 is "ab".
    let start = CursorState::at(12);
    let down = ed.dispatch(&tree, &start, InputEvent::Down);
    assert_eq!(down.cursor.column_memory, Some(12));
    assert_eq!(down.cursor.caret, 16, "clamped to the short row's end");

    let up = ed.dispatch(&tree, &down.cursor, InputEvent::Up);
    assert_eq!(up.cursor.caret, 12, "the remembered column is restored");
}

#[test]
fn typing_a_letter_on_a_blank_starts_a_partial_with_autocomplete() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(0), InputEvent::Insert('l'));
    let Expr::Partial { text, wrapped, .. } = &result.expr else {
        panic!("expected partial, got {:?}", result.expr);
    };
    assert_eq!(text, "l");
    assert!(wrapped.is_blank());
    assert_eq!(result.cursor.ac_index, Some(0));
    assert_eq!(result.cursor.caret, 1);
}

#[test]
fn typing_a_digit_on_a_blank_starts_an_integer_directly() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(0), InputEvent::Insert('7'));
    assert!(
        matches!(&result.expr, Expr::IntLiteral { digits, .. } if digits == "7"),
        "got {:?}",
        result.expr
    );
    assert_eq!(result.cursor.ac_index, None);
}

#[test]
fn enter_commits_the_highlighted_suggestion() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let (typed, cursor) = type_chars(&mut ed, &tree, &CursorState::at(0), "Int::add");
    assert!(matches!(&typed, Expr::Partial { text, .. } if text == "Int::add"));

    let committed = ed.dispatch(&typed, &cursor, InputEvent::Enter);
    let Expr::FnCall { name, args, .. } = &committed.expr else {
        panic!("expected call, got {:?}", committed.expr);
    };
    assert_eq!(name, "Int::add");
    assert_eq!(args.len(), 2);
    assert_eq!(render(&committed.expr, &sigs), "Int::add a: Int b: Int");
    assert_eq!(
        committed.cursor.caret,
        "Int::add ".chars().count(),
        "caret lands on the first placeholder"
    );
}

#[test]
fn infix_after_identifier_commits_then_wraps() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::Blank { id: NodeId(1) };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let (typed, cursor) = type_chars(&mut ed, &tree, &CursorState::at(0), "x");
    // '+' cannot continue an identifier partial: the partial commits to a
    // variable and the '+' re-applies to the committed result, once.
    let result = ed.dispatch(&typed, &cursor, InputEvent::Insert('+'));
    let Expr::RightPartial { text, wrapped, .. } = &result.expr else {
        panic!("expected right partial, got {:?}", result.expr);
    };
    assert_eq!(text, "+");
    assert!(matches!(wrapped.as_ref(), Expr::Variable { name, .. } if name == "x"));
    assert_eq!(render(&result.expr, &sigs), "x +");
}

#[test]
fn committing_a_right_partial_builds_the_operator() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::RightPartial {
        id: ids.mint(),
        text: "+".to_string(),
        wrapped: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "x".to_string(),
        }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(3), InputEvent::Enter);
    let Expr::BinOp { op, lhs, rhs, .. } = &result.expr else {
        panic!("expected binop, got {:?}", result.expr);
    };
    assert_eq!(op, "+");
    assert!(matches!(lhs.as_ref(), Expr::Variable { name, .. } if name == "x"));
    assert!(rhs.is_blank());
}

#[test]
fn pipe_trigger_after_an_expression_builds_a_pipeline() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::IntLiteral {
        id: ids.mint(),
        digits: "5".to_string(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let step = ed.dispatch(&tree, &CursorState::at(1), InputEvent::Insert('|'));
    let step = ed.dispatch(&step.expr, &step.cursor, InputEvent::Insert('>'));
    let committed = ed.dispatch(&step.expr, &step.cursor, InputEvent::Enter);
    let Expr::Pipeline { segments, .. } = &committed.expr else {
        panic!("expected pipeline, got {:?}", committed.expr);
    };
    assert_eq!(segments.len(), 2);
    assert!(matches!(&segments[0], Expr::IntLiteral { digits, .. } if digits == "5"));
    assert!(segments[1].is_blank());
}

#[test]
fn keyword_deletion_never_destroys_a_non_blank_descendant() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::Let {
        id: ids.mint(),
        lhs_id: ids.mint(),
        lhs: String::new(),
        rhs: Box::new(Expr::IntLiteral {
            id: ids.mint(),
            digits: "5".to_string(),
        }),
        body: Box::new(Expr::Blank { id: ids.mint() }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(3), InputEvent::Backspace);
    assert_eq!(result.expr, tree, "non-blank rhs survives");
    assert_eq!(result.cursor.caret, 0, "the keystroke only repositions");
}

#[test]
fn keyword_deletion_collapses_an_all_blank_construct() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let tree = Expr::If {
        id: ids.mint(),
        cond: Box::new(Expr::Blank { id: ids.mint() }),
        then_branch: Box::new(Expr::Blank { id: ids.mint() }),
        else_branch: Box::new(Expr::Blank { id: ids.mint() }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(2), InputEvent::Backspace);
    assert!(result.expr.is_blank(), "got {:?}", result.expr);
}

#[test]
fn deleting_the_pipe_collapses_a_two_segment_pipeline_to_its_head() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let head = Expr::FnCall {
        id: ids.mint(),
        name: "List::head".to_string(),
        args: vec![],
        on_rail: false,
    };
    let tree = Expr::Pipeline {
        id: ids.mint(),
        segments: vec![
            head.clone(),
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
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // "List::head\n  |> Int::add 1" — the pipe token spans offsets 13..15.
    let result = ed.dispatch(&tree, &CursorState::at(14), InputEvent::Backspace);
    assert_eq!(result.expr, head, "the head survives un-piped, ids intact");
    assert_eq!(render(&result.expr, &sigs), "List::head");
}

#[test]
fn partial_commit_realigns_matching_arguments() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let filled = Expr::IntLiteral {
        id: ids.mint(),
        digits: "3".to_string(),
    };
    let filled_id = filled.id();
    let tree = Expr::Partial {
        id: ids.mint(),
        text: "Int::add".to_string(),
        wrapped: Box::new(Expr::FnCall {
            id: ids.mint(),
            name: "Int::subtract".to_string(),
            args: vec![filled, Expr::Blank { id: ids.mint() }],
            on_rail: false,
        }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(8), InputEvent::Enter);
    let Expr::FnCall { name, args, .. } = &result.expr else {
        panic!("expected call, got {:?}", result.expr);
    };
    assert_eq!(name, "Int::add");
    assert_eq!(
        args[0],
        Expr::IntLiteral {
            id: filled_id,
            digits: "3".to_string(),
        },
        "the filled argument is preserved, not discarded"
    );
    assert!(args[1].is_blank());
}

#[test]
fn unmatched_non_blank_arguments_are_rescued_into_lets() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    // String::contains(haystack: Str, needle: Str) — neither parameter
    // matches Int::add's (a: Int, b: Int), so the filled haystack must
    // survive in a synthetic let above the new call.
    let tree = Expr::Partial {
        id: ids.mint(),
        text: "Int::add".to_string(),
        wrapped: Box::new(Expr::FnCall {
            id: ids.mint(),
            name: "String::contains".to_string(),
            args: vec![
                Expr::StringLiteral {
                    id: ids.mint(),
                    text: "hay".to_string(),
                },
                Expr::Blank { id: ids.mint() },
            ],
            on_rail: false,
        }),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(8), InputEvent::Enter);
    let Expr::Let { lhs, rhs, body, .. } = &result.expr else {
        panic!("expected synthetic let, got {:?}", result.expr);
    };
    assert_eq!(lhs, "haystack");
    assert!(matches!(rhs.as_ref(), Expr::StringLiteral { text, .. } if text == "hay"));
    assert!(matches!(body.as_ref(), Expr::FnCall { name, .. } if name == "Int::add"));
}

#[test]
fn backspacing_a_partial_to_empty_restores_what_it_wrapped() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let original = Expr::Variable {
        id: ids.mint(),
        name: "foo".to_string(),
    };
    let tree = Expr::Partial {
        id: ids.mint(),
        text: "b".to_string(),
        wrapped: Box::new(original.clone()),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(1), InputEvent::Backspace);
    assert_eq!(result.expr, original, "the edit aborts back to the original");
}

#[test]
fn deleting_the_float_point_merges_the_halves() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::FloatLiteral {
        id: NodeId(1),
        whole: "12".to_string(),
        fraction: "5".to_string(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(3), InputEvent::Backspace);
    assert!(
        matches!(&result.expr, Expr::IntLiteral { digits, .. } if digits == "125"),
        "got {:?}",
        result.expr
    );
}

#[test]
fn typing_a_dot_in_an_integer_splits_it_into_a_float() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let tree = Expr::IntLiteral {
        id: NodeId(1),
        digits: "125".to_string(),
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    let result = ed.dispatch(&tree, &CursorState::at(2), InputEvent::Insert('.'));
    assert_eq!(
        render(&result.expr, &sigs),
        "12.5",
        "got {:?}",
        result.expr
    );
    assert_eq!(result.cursor.caret, 3);
}

#[test]
fn tab_cycles_to_the_next_blank() {
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

    let result = ed.dispatch(&tree, &CursorState::at(0), InputEvent::Tab);
    assert_eq!(result.cursor.caret, 11, "the body blank");
    // Tab again wraps around the stream back to the same blank.
    let again = ed.dispatch(&tree, &result.cursor, InputEvent::Tab);
    assert_eq!(again.cursor.caret, 11);
}

#[test]
fn enter_opens_a_new_row_in_a_match() {
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut ids = IdAllocator::new();
    let match_id = ids.mint();
    let tree = Expr::Match {
        id: match_id,
        subject: Box::new(Expr::Variable {
            id: ids.mint(),
            name: "x".to_string(),
        }),
        arms: vec![crate::expr::MatchArm {
            pattern: Pattern::Integer {
                match_id,
                id: ids.mint(),
                digits: "0".to_string(),
            },
            body: Expr::IntLiteral {
                id: ids.mint(),
                digits: "1".to_string(),
            },
        }],
    };
    let mut ed = Editor::for_tree(&provider, &sigs, &tree);

    // "match x\n  0 -> 1" — Enter at the arm's end adds a blank arm below.
    let result = ed.dispatch(&tree, &CursorState::at(16), InputEvent::Enter);
    let Expr::Match { arms, .. } = &result.expr else {
        panic!("expected match, got {:?}", result.expr);
    };
    assert_eq!(arms.len(), 2);
    assert!(arms[1].pattern.is_blank());
    assert!(arms[1].body.is_blank());
}

#[test]
fn dead_end_keystrokes_change_nothing_and_stay_silent() {
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

    // A letter typed on the assignment operator applies to nothing.
    let result = ed.dispatch(&tree, &CursorState::at(6), InputEvent::Insert('q'));
    assert_eq!(result.expr, tree);
    assert!(result.diagnostics.is_empty());
}
