//! The scoped codemode evaluator (spec §9 "Codemode": `setupCodemode`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use rquickjs::{AsyncContext, AsyncRuntime, CatchResultExt, Ctx, Function, Value as JsValue};
use serde_json::Value;

use crate::error::{CodemodeError, CodemodeResult};

/// What one host function call resolved to: the value handed back to the
/// script, plus the calling tool's `trigger_llm_request` override (spec
/// §4.7 step 3e needs this per call, not just the script's final result).
#[derive(Debug, Clone)]
pub struct HostCallResult {
    /// The value returned to the sandboxed script.
    pub to_js: Value,
    /// This call's `trigger_llm_request` override, if the underlying tool
    /// set one.
    pub trigger_llm_request: Option<bool>,
}

/// A host function callable from inside the sandbox, keyed by its exported
/// name (spec §4.7 step 3a's "function table").
pub type HostFn =
    Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = HostCallResult> + Send>> + Send + Sync>;

/// The function table passed into one sandbox evaluation: exported name →
/// thunk performing a full tool invocation (including approval wrapping).
pub type FunctionTable = HashMap<String, HostFn>;

/// What a codemode evaluation produced.
#[derive(Debug, Clone)]
pub struct EvalOutcome {
    /// The value `codemode()` resolved to.
    pub result: Value,
    /// Every inner call the generated program made, in call order.
    pub tool_calls: Vec<Value>,
    /// Worker-spawned code the evaluator surfaced, if the sandbox supports
    /// dynamic worker dispatch (optional; `None` for the default sandbox).
    pub dynamic_worker_code: Option<String>,
}

/// A scoped codemode evaluator: acquire once, `eval` any number of times,
/// release on every exit path (including a panic unwinding through `eval`).
#[async_trait]
pub trait CodemodeSandbox: Send + Sync {
    /// Evaluate `code` (the body of an async `codemode()` function) against
    /// `functions`, reporting `status_text` to the host as a
    /// `BACKGROUND_TASK_PROGRESS` hint.
    async fn eval(
        &self,
        code: &str,
        status_text: &str,
        functions: FunctionTable,
    ) -> CodemodeResult<EvalOutcome>;
}

/// An `rquickjs`-backed sandbox. One instance per codemode invocation;
/// `release` happens implicitly when the instance is dropped, which is why
/// acquisition (`QuickJsSandbox::new`) and evaluation are split from
/// teardown — callers hold the guard only as long as the call needs it.
pub struct QuickJsSandbox {
    runtime: AsyncRuntime,
    context: AsyncContext,
}

impl QuickJsSandbox {
    /// Acquire a fresh sandbox.
    pub async fn acquire() -> CodemodeResult<Self> {
        let runtime = AsyncRuntime::new().map_err(|e| CodemodeError::SandboxInit(e.to_string()))?;
        let context = AsyncContext::full(&runtime)
            .await
            .map_err(|e| CodemodeError::SandboxInit(e.to_string()))?;
        Ok(Self { runtime, context })
    }
}

#[async_trait]
impl CodemodeSandbox for QuickJsSandbox {
    async fn eval(
        &self,
        code: &str,
        _status_text: &str,
        functions: FunctionTable,
    ) -> CodemodeResult<EvalOutcome> {
        let tool_calls: Arc<std::sync::Mutex<Vec<Value>>> = Arc::new(std::sync::Mutex::new(Vec::new()));

        let result = self
            .context
            .with(|ctx| -> Result<Value, rquickjs::Error> {
                install_function_table(&ctx, &functions, tool_calls.clone())?;

                let wrapped = format!(
                    "(async () => {{\n{code}\nreturn await codemode();\n}})()"
                );
                let promise: rquickjs::Promise = ctx.eval(wrapped)?;
                let js_result: JsValue = promise.finish().catch(&ctx).map_err(|e| {
                    rquickjs::Error::new_from_js_message("eval", "promise", e.to_string())
                })?;
                Ok(js_to_json(&js_result))
            })
            .map_err(|e| CodemodeError::EvalFailed(e.to_string()))?;

        self.runtime.idle().await;

        let tool_calls = tool_calls.lock().expect("tool call log poisoned").clone();
        Ok(EvalOutcome {
            result,
            tool_calls,
            dynamic_worker_code: None,
        })
    }
}

fn install_function_table(
    ctx: &Ctx<'_>,
    functions: &FunctionTable,
    tool_calls: Arc<std::sync::Mutex<Vec<Value>>>,
) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();
    for (name, thunk) in functions {
        let thunk = thunk.clone();
        let tool_calls = tool_calls.clone();
        let name_for_log = name.clone();
        let wrapped = Function::new(ctx.clone(), move |args: Value| {
            let thunk = thunk.clone();
            let tool_calls = tool_calls.clone();
            let name_for_log = name_for_log.clone();
            async move {
                let result = thunk(args.clone()).await;
                tool_calls.lock().expect("tool call log poisoned").push(serde_json::json!({
                    "name": name_for_log,
                    "args": args,
                    "output": result.to_js,
                    "trigger_llm_request": result.trigger_llm_request,
                }));
                result.to_js
            }
        })?;
        globals.set(name.as_str(), wrapped)?;
    }
    Ok(())
}

/// Convert a JS value returned from `codemode()` into its JSON equivalent.
/// Functions, symbols, and other non-data values convert to `null`.
fn js_to_json(value: &JsValue) -> Value {
    if value.is_null() || value.is_undefined() {
        return Value::Null;
    }
    if let Some(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Some(i) = value.as_int() {
        return Value::from(i);
    }
    if let Some(f) = value.as_float() {
        return serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number);
    }
    if let Some(s) = value.as_string() {
        return s.to_string().map_or(Value::Null, Value::String);
    }
    if let Some(array) = value.as_array() {
        return Value::Array(array.iter::<JsValue>().filter_map(Result::ok).map(|v| js_to_json(&v)).collect());
    }
    if let Some(object) = value.as_object() {
        let mut map = serde_json::Map::new();
        for entry in object.props::<String, JsValue>().filter_map(Result::ok) {
            let (key, val) = entry;
            map.insert(key, js_to_json(&val));
        }
        return Value::Object(map);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn eval_converts_an_object_return_value_to_json() {
        let sandbox = QuickJsSandbox::acquire().await.unwrap();
        let outcome = sandbox
            .eval(
                "return { n: 42, ok: true, items: [1, 'two', null] };",
                "",
                FunctionTable::new(),
            )
            .await
            .unwrap();
        assert_eq!(
            outcome.result,
            serde_json::json!({"n": 42, "ok": true, "items": [1, "two", null]})
        );
    }

    #[tokio::test]
    async fn eval_converts_a_primitive_return_value_to_json() {
        let sandbox = QuickJsSandbox::acquire().await.unwrap();
        let outcome = sandbox
            .eval("return 'hello';", "", FunctionTable::new())
            .await
            .unwrap();
        assert_eq!(outcome.result, serde_json::json!("hello"));
    }

    #[test]
    fn function_table_entries_are_addressable_by_name() {
        let mut table: FunctionTable = HashMap::new();
        table.insert(
            "echo".to_string(),
            Arc::new(|v: Value| {
                Box::pin(async move {
                    HostCallResult {
                        to_js: v,
                        trigger_llm_request: None,
                    }
                })
            }),
        );
        assert!(table.contains_key("echo"));
    }
}
