//! Recursive TOML value merging.

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
///
/// This is the same merge discipline `agentloom-events`' core reducer uses
/// for `SET_METADATA` patches: a missing key in the overlay leaves the base
/// value untouched, rather than being treated as an explicit "clear this
/// field" instruction.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_replaced() {
        let mut base: toml::Value = toml::from_str("level = \"info\"").unwrap();
        let overlay: toml::Value = toml::from_str("level = \"debug\"").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["level"].as_str(), Some("debug"));
    }

    #[test]
    fn tables_merge_per_field_leaving_absent_keys_untouched() {
        let mut base: toml::Value =
            toml::from_str("[model]\nprovider = \"claude\"\nmax_tokens = 4096").unwrap();
        let overlay: toml::Value = toml::from_str("[model]\nmax_tokens = 8192").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(base["model"]["provider"].as_str(), Some("claude"));
        assert_eq!(base["model"]["max_tokens"].as_integer(), Some(8192));
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let mut base: toml::Value = toml::from_str("directives = [\"a=info\"]").unwrap();
        let overlay: toml::Value = toml::from_str("directives = [\"b=debug\"]").unwrap();
        deep_merge(&mut base, &overlay);
        assert_eq!(
            base["directives"].as_array().unwrap(),
            &[toml::Value::String("b=debug".to_owned())]
        );
    }
}
