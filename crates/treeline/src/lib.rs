//! treeline — a structural expression-editor core.
//!
//! The crate maintains the bidirectional mapping between a typed expression
//! tree and the linear token stream an ordinary text caret edits: every
//! visible character maps back to exactly one tree node, and every
//! keystroke produces a new valid (possibly incomplete) tree. Rendering,
//! input capture, suggestion ranking, evaluation and persistence live in
//! the embedding layer; this crate only ever sees `(tree, cursor, event)`
//! and returns `(tree, cursor)`.

pub mod clipboard;
pub mod cursor;
pub mod diagnostics;
pub mod editor;
mod error;
pub mod event;
pub mod expr;
pub mod id;
pub mod index;
pub mod provider;
pub mod reconstruct;
pub mod token;
pub mod tokenizer;

pub use clipboard::{copy_range, ClipboardPayload};
pub use cursor::CursorState;
pub use diagnostics::{render_diagnostics, Diagnostic};
pub use editor::{EditResult, Editor};
pub use error::TreelineError;
pub use event::InputEvent;
pub use expr::{check_invariants, Expr, LambdaParam, MatchArm, Pattern, RecordField};
pub use id::{IdAllocator, NodeId};
pub use index::{neighbours, token_at, GridPos, Neighbour};
pub use provider::{
    ParamType, Parameter, QueryContext, Signature, SignatureLookup, StaticSignatures,
    StaticSuggestions, Suggestion, SuggestionKind, SuggestionProvider,
};
pub use reconstruct::reconstruct;
pub use token::{to_debug_text, to_text, Token, TokenInfo, TokenKind};
pub use tokenizer::{layout, reflow, tokenize, tokenize_info};
