//! JSONata matcher evaluation (spec §6 "Matcher language"): context rules
//! and tool policies are enabled by evaluating a JSONata expression against
//! host-supplied match data.
//!
//! **Grounding gap, disclosed rather than glossed over**: no `.rs` file
//! anywhere in the retrieval pack exercises the `jsonata` crate's API — it
//! is a spec-mandated addition (§6 names JSONata explicitly), not carried
//! from a pack example. The call shape below (stringify input, evaluate,
//! parse the result back) is written from general knowledge of JSONata
//! implementations' typical string-in/string-out binding rather than from
//! an observed Rust example.

use jsonata::JsonAta;
use serde_json::Value;

/// Evaluate `expr` against `data`. An absent expression means "always
/// enabled" (spec §6: "Absent matcher means the rule is always enabled").
/// A malformed expression or evaluation error is treated as a non-match
/// rather than propagated, matching the reducer's general warn-and-continue
/// posture for host-supplied data it cannot fully validate up front.
#[must_use]
pub fn matches(expr: Option<&str>, data: &Value) -> bool {
    let Some(expr) = expr else {
        return true;
    };
    match evaluate(expr, data) {
        Ok(value) => is_truthy(&value),
        Err(err) => {
            tracing::warn!(expr, error = %err, "matcher evaluation failed, treating rule as disabled");
            false
        }
    }
}

fn evaluate(expr: &str, data: &Value) -> Result<Value, String> {
    let jsonata = JsonAta::new(expr).map_err(|e| e.to_string())?;
    let input = data.to_string();
    let result = jsonata.evaluate(Some(&input)).map_err(|e| e.to_string())?;
    serde_json::from_str(&result.to_string()).map_err(|e| e.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_matcher_always_matches() {
        assert!(matches(None, &Value::Null));
    }
}
