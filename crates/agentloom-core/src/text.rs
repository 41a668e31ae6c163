//! Small text helpers shared by the event reducer and tool invoker.

/// Truncate a string to at most `max_bytes`, ensuring the cut falls on a
/// UTF-8 character boundary. Returns the original string if already short
/// enough.
#[must_use]
pub fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        #[allow(clippy::arithmetic_side_effects)]
        {
            end -= 1;
        }
    }
    &s[..end]
}

/// Return the first `n` lines of `s`, joined by `\n`.
///
/// Used by the tool invoker (spec §4.6) to build the
/// `"Error in tool <name>: <message>\n<top3StackLines>"` normalization.
#[must_use]
pub fn first_n_lines(s: &str, n: usize) -> String {
    s.lines().take(n).collect::<Vec<_>>().join("\n")
}
