#![no_main]

use libfuzzer_sys::fuzz_target;
use treeline::{
    reflow, tokenize, CursorState, Editor, Expr, InputEvent, NodeId, StaticSignatures,
    StaticSuggestions,
};

// Drive the editor with typed characters only, checking after every edit
// that the reflow pass is idempotent on the resulting stream.
fuzz_target!(|data: &[u8]| {
    if data.len() > 256 {
        return;
    }
    let provider = StaticSuggestions::builtin();
    let sigs = StaticSignatures::builtin();
    let mut expr = Expr::Blank { id: NodeId(1) };
    let mut cursor = CursorState::new();
    let mut ed = Editor::for_tree(&provider, &sigs, &expr);

    for byte in data {
        let event = if byte.is_ascii_graphic() || *byte == b' ' {
            InputEvent::Insert(*byte as char)
        } else {
            InputEvent::Enter
        };
        let result = ed.dispatch(&expr, &cursor, event);
        expr = result.expr;
        cursor = result.cursor;

        let once = reflow(tokenize(&expr, &sigs));
        let twice = reflow(once.clone());
        assert_eq!(once, twice);
    }
});
