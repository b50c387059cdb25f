//! Runtime errors and input-failure formatting.

use floyd_core::source;

/// A fatal condition during a parse. Ordinary PEG failure is not an
/// error - it travels through the machine's `failed` flag - but a host
/// error aborts the whole parse.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// An extern raised, a predicate misbehaved, or a built-in saw bad
    /// input.
    #[error("{0}")]
    Host(String),

    /// The work counter ran out.
    #[error("parse exceeded its execution limit")]
    ExecFuelExhausted,

    /// Rule application nested too deeply.
    #[error("parse exceeded its recursion limit")]
    RecursionLimitExceeded,
}

impl RuntimeError {
    pub(crate) fn host(message: impl Into<String>) -> Self {
        RuntimeError::Host(message.into())
    }
}

/// `"<path>:<line> Unexpected <thing> at column <col>"`.
pub(crate) fn format_failure(text: &[char], path: &str, errpos: usize) -> String {
    let (line, col) = source::line_col(text, errpos);
    let thing = match text.get(errpos) {
        Some(ch) => format!("{:?}", ch.to_string()),
        None => "end of input".to_string(),
    };
    format!("{path}:{line} Unexpected {thing} at column {col}")
}

/// Host errors carry the position the parse had reached.
pub(crate) fn format_host_error(text: &[char], path: &str, pos: usize, err: &RuntimeError) -> String {
    let (line, _) = source::line_col(text, pos);
    format!("{path}:{line} {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn failure_names_the_offending_character() {
        let text = chars("ad");
        assert_eq!(
            format_failure(&text, "input.txt", 1),
            "input.txt:1 Unexpected \"d\" at column 2"
        );
    }

    #[test]
    fn failure_at_end_of_input() {
        let text = chars("ab");
        assert_eq!(
            format_failure(&text, "<string>", 2),
            "<string>:1 Unexpected end of input at column 3"
        );
    }

    #[test]
    fn failure_reports_the_right_line() {
        let text = chars("a\nbc");
        assert_eq!(
            format_failure(&text, "f", 3),
            "f:2 Unexpected \"c\" at column 2"
        );
    }
}
