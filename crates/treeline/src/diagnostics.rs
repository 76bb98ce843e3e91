use serde::Serialize;

/// An internal, non-fatal condition observed during an edit. Diagnostics are
/// carried on the edit result; they are never raised to the caller and never
/// abort the editing session.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    /// The engine observed a tree shape its own invariants should rule out.
    /// The edit that noticed it returns the input unchanged.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new("E2001", message)
    }

    /// A non-first pipeline segment without a pipe target sentinel.
    pub fn degenerate_segment(message: impl Into<String>) -> Self {
        Self::new("E2103", message)
    }
}

pub fn render_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "error[{}] {}",
            diagnostic.code, diagnostic.message
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_joins_diagnostics_with_newlines() {
        let diags = vec![
            Diagnostic::invariant("edit target is not a record"),
            Diagnostic::new("E2103", "segment 2 has no pipe target"),
        ];
        let rendered = render_diagnostics(&diags);
        assert_eq!(
            rendered,
            "error[E2001] edit target is not a record\nerror[E2103] segment 2 has no pipe target"
        );
    }
}
