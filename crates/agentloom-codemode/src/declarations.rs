//! Generates the "TypeScript-like type surface" embedded in the codemode
//! prompt fragment (spec §4.7 step 1).

use std::collections::HashMap;

use agentloom_tools::ToolSpec;
use serde_json::Value;

use crate::identifiers::resolve_export_collisions;

/// Prior tool call outputs, keyed by tool name, embedded as samples
/// alongside each tool's generated signature.
pub type ToolCallSamples = HashMap<String, Value>;

/// Generate a TypeScript-like declaration block for `tools`, with exported
/// names disambiguated via [`resolve_export_collisions`].
///
/// `samples` supplies a previously observed output for a tool, rendered as a
/// trailing `// sample: ...` comment — the engine has no schema for return
/// values, so recorded samples are the only signal a generated program has
/// for what a call actually returns.
#[must_use]
pub fn generate_declarations(tools: &[ToolSpec], samples: &ToolCallSamples) -> String {
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    let exports = resolve_export_collisions(&names);
    let export_for: HashMap<&str, &str> = exports
        .iter()
        .map(|(orig, exported)| (orig.as_str(), exported.as_str()))
        .collect();

    let mut out = String::new();
    for tool in tools {
        let export_name = export_for.get(tool.name.as_str()).copied().unwrap_or(&tool.name);
        out.push_str(&format!("/**\n * {}\n", tool.description));
        if export_name != tool.name {
            out.push_str(&format!(" * (original tool name: \"{}\")\n", tool.name));
        }
        if let Some(sample) = samples.get(&tool.name) {
            out.push_str(&format!(" * sample: {sample}\n"));
        }
        out.push_str(" */\n");
        let params = schema_to_params(&tool.input_schema);
        out.push_str(&format!(
            "declare function {export_name}({params}): Promise<unknown>;\n\n"
        ));
    }
    out
}

fn schema_to_params(schema: &Value) -> String {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return String::new();
    };
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = Vec::new();
    for (key, value_schema) in properties {
        let optional = if required.contains(&key.as_str()) { "" } else { "?" };
        let ty = schema_to_ts_type(value_schema);
        fields.push(format!("{key}{optional}: {ty}"));
    }
    if fields.is_empty() {
        String::new()
    } else {
        format!("args: {{ {} }}", fields.join("; "))
    }
}

fn schema_to_ts_type(schema: &Value) -> String {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        let literals: Vec<String> = values
            .iter()
            .map(|v| match v {
                Value::String(s) => format!("\"{s}\""),
                other => other.to_string(),
            })
            .collect();
        return literals.join(" | ");
    }

    match schema.get("type").and_then(Value::as_str) {
        Some("string") => "string".to_string(),
        Some("number" | "integer") => "number".to_string(),
        Some("boolean") => "boolean".to_string(),
        Some("array") => {
            let item_ty = schema
                .get("items")
                .map(schema_to_ts_type)
                .unwrap_or_else(|| "unknown".to_string());
            format!("{item_ty}[]")
        }
        Some("object") => {
            let inner = schema_to_params(schema);
            if inner.is_empty() {
                "Record<string, unknown>".to_string()
            } else {
                inner.trim_start_matches("args: ").to_string()
            }
        }
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(name: &str, description: &str, input_schema: Value) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            is_function: true,
        }
    }

    #[test]
    fn tool_with_no_schema_takes_no_params() {
        let tools = vec![spec("ping", "pings", json!({"type": "object"}))];
        let decls = generate_declarations(&tools, &ToolCallSamples::new());
        assert!(decls.contains("declare function ping(): Promise<unknown>;"));
    }

    #[test]
    fn typed_input_renders_required_and_optional_fields() {
        let tools = vec![spec(
            "readFile",
            "reads a file",
            json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "encoding": {"type": "string"}
                },
                "required": ["path"]
            }),
        )];
        let decls = generate_declarations(&tools, &ToolCallSamples::new());
        assert!(decls.contains("path: string"));
        assert!(decls.contains("encoding?: string"));
    }

    #[test]
    fn enum_becomes_union_of_literals() {
        let tools = vec![spec(
            "setMode",
            "sets mode",
            json!({
                "type": "object",
                "properties": {"mode": {"enum": ["dark", "light"]}},
                "required": ["mode"]
            }),
        )];
        let decls = generate_declarations(&tools, &ToolCallSamples::new());
        assert!(decls.contains("\"dark\" | \"light\""));
    }

    #[test]
    fn colliding_names_get_disambiguated_exports() {
        let tools = vec![
            spec("read.file", "a", json!({"type": "object"})),
            spec("read-file", "b", json!({"type": "object"})),
        ];
        let decls = generate_declarations(&tools, &ToolCallSamples::new());
        assert!(decls.contains("declare function read_file("));
        assert!(decls.contains("declare function read_file__2("));
    }

    #[test]
    fn sample_output_is_embedded_as_a_comment() {
        let tools = vec![spec("getStatus", "status", json!({"type": "object"}))];
        let mut samples = ToolCallSamples::new();
        samples.insert("getStatus".to_string(), json!({"ok": true}));
        let decls = generate_declarations(&tools, &samples);
        assert!(decls.contains("sample:"));
        assert!(decls.contains("\"ok\":true") || decls.contains("ok\":true"));
    }
}
