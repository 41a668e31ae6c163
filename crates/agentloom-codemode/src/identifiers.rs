//! JS-identifier-safe name mapping for the generated function table (spec
//! §4.7 step 1, §9 "Codemode").

use std::collections::HashMap;

/// JavaScript reserved words that cannot be used as a bare identifier.
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphabetic()
}

fn is_identifier_continue(c: char) -> bool {
    c == '$' || c == '_' || c.is_alphanumeric()
}

/// Map a tool name to a valid, JS-identifier-safe export name.
///
/// Illegal characters become `_`, a leading digit is prefixed with `_`, and
/// reserved words get a trailing `_`. Unicode letters (valid in JS
/// identifiers) are preserved as-is.
#[must_use]
pub fn tool_name_to_export(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        let ok = if i == 0 {
            is_identifier_start(c)
        } else {
            is_identifier_continue(c)
        };
        out.push(if ok { c } else { '_' });
    }

    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }

    if RESERVED_WORDS.contains(&out.as_str()) {
        out.push('_');
    }

    out
}

/// Resolve export-name collisions deterministically: sort candidate names
/// alphabetically, and for any export name shared by more than one, suffix
/// the second and later occurrences with `__2`, `__3`, …
///
/// Returns `(original_name, export_name)` pairs in the same relative order
/// collisions were resolved (alphabetical by original name).
#[must_use]
pub fn resolve_export_collisions(names: &[&str]) -> Vec<(String, String)> {
    let mut sorted: Vec<&str> = names.to_vec();
    sorted.sort_unstable();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(sorted.len());
    for name in sorted {
        let base = tool_name_to_export(name);
        let count = counts.entry(base.clone()).or_insert(0);
        *count += 1;
        let export = if *count == 1 {
            base
        } else {
            format!("{base}__{count}")
        };
        out.push((name.to_string(), export));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passthrough() {
        assert_eq!(tool_name_to_export("readFile"), "readFile");
        assert_eq!(tool_name_to_export("a1b2"), "a1b2");
    }

    #[test]
    fn illegal_chars_replaced_with_underscore() {
        assert_eq!(tool_name_to_export("read-file"), "read_file");
        assert_eq!(tool_name_to_export("ns::tool"), "ns__tool");
        assert_eq!(tool_name_to_export("tool@v2"), "tool_v2");
    }

    #[test]
    fn unicode_letters_preserved() {
        assert_eq!(tool_name_to_export("überTool"), "überTool");
        assert_eq!(tool_name_to_export("名前"), "名前");
    }

    #[test]
    fn digit_prefix_gets_underscore() {
        assert_eq!(tool_name_to_export("123tool"), "_123tool");
        assert_eq!(tool_name_to_export("0"), "_0");
    }

    #[test]
    fn reserved_words_get_trailing_underscore() {
        assert_eq!(tool_name_to_export("class"), "class_");
        assert_eq!(tool_name_to_export("return"), "return_");
    }

    #[test]
    fn non_reserved_not_suffixed() {
        assert_eq!(tool_name_to_export("async"), "async");
        assert_eq!(tool_name_to_export("constructor"), "constructor");
    }

    #[test]
    fn combined_rules_digit_after_replacement() {
        assert_eq!(tool_name_to_export("1-tool"), "_1_tool");
    }

    #[test]
    fn no_collisions() {
        let result = resolve_export_collisions(&["alpha", "beta"]);
        assert_eq!(result[0], ("alpha".into(), "alpha".into()));
        assert_eq!(result[1], ("beta".into(), "beta".into()));
    }

    #[test]
    fn two_way_collision_alphabetical() {
        let result = resolve_export_collisions(&["read.file", "read-file"]);
        assert_eq!(result[0], ("read-file".into(), "read_file".into()));
        assert_eq!(result[1], ("read.file".into(), "read_file__2".into()));
    }

    #[test]
    fn collision_ordering_is_deterministic() {
        let fwd = resolve_export_collisions(&["z-x", "a-x"]);
        let rev = resolve_export_collisions(&["a-x", "z-x"]);
        assert_eq!(fwd, rev);
    }
}
