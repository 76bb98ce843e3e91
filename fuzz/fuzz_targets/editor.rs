#![no_main]

use libfuzzer_sys::fuzz_target;
use treeline::{
    check_invariants, tokenize_info, CursorState, Editor, Expr, InputEvent, NodeId,
    StaticSignatures, StaticSuggestions,
};

fn event_for(byte: u8) -> InputEvent {
    match byte % 16 {
        0 => InputEvent::Backspace,
        1 => InputEvent::Delete,
        2 => InputEvent::Left,
        3 => InputEvent::Right,
        4 => InputEvent::Up,
        5 => InputEvent::Down,
        6 => InputEvent::Home,
        7 => InputEvent::End,
        8 => InputEvent::Tab,
        9 => InputEvent::ShiftTab,
        10 => InputEvent::Enter,
        _ => {
            let printable = b" abc19+.\"[{\\,]}|";
            InputEvent::Insert(printable[(byte >> 4) as usize % printable.len()] as char)
        }
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 512 {
        return;
    }
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut expr = Expr::Blank { id: NodeId(1) };
    let mut cursor = CursorState::new();
    let mut ed = Editor::for_tree(&provider, &sigs, &expr);

    for byte in data {
        let result = ed.dispatch(&expr, &cursor, event_for(*byte));
        expr = result.expr;
        cursor = result.cursor;

        // Whatever the keystroke did, the snapshot stays well-formed and
        // the stream stays a faithful rendering.
        assert!(check_invariants(&expr).is_empty());
        let infos = tokenize_info(&expr, &sigs);
        for info in &infos {
            assert!(!info.token.text.is_empty());
        }
        for pair in infos.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
        let len = infos.last().map(|i| i.end).unwrap_or(0);
        assert!(cursor.caret <= len);
    }
});
