//! Line/column computation over code-point indexed text.
//!
//! The interpreter views input as a sequence of code points; positions
//! in error messages and in `colno()` are derived on demand rather
//! than tracked during the parse.

/// 1-based `(line, column)` of an offset into `text`.
///
/// `pos` may equal `text.len()`: the end of input sits one column past
/// the last character of the final line.
pub fn line_col(text: &[char], pos: usize) -> (usize, usize) {
    let pos = pos.min(text.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, &ch) in text[..pos].iter().enumerate() {
        if ch == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, pos - line_start + 1)
}

/// 1-based column of an offset; see [`line_col`].
pub fn colno(text: &[char], pos: usize) -> usize {
    line_col(text, pos).1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn single_line() {
        let t = chars("abc");
        assert_eq!(line_col(&t, 0), (1, 1));
        assert_eq!(line_col(&t, 2), (1, 3));
        // End of input: one past the last character.
        assert_eq!(line_col(&t, 3), (1, 4));
    }

    #[test]
    fn multi_line() {
        let t = chars("ab\ncd\ne");
        assert_eq!(line_col(&t, 3), (2, 1));
        assert_eq!(line_col(&t, 4), (2, 2));
        assert_eq!(line_col(&t, 6), (3, 1));
        assert_eq!(line_col(&t, 7), (3, 2));
    }

    #[test]
    fn trailing_newline_starts_a_fresh_line() {
        let t = chars("ab\n");
        assert_eq!(line_col(&t, 3), (2, 1));
    }

    #[test]
    fn counts_code_points_not_bytes() {
        let t = chars("é✓x");
        assert_eq!(line_col(&t, 2), (1, 3));
    }
}
