//! Per-operation request context for correlating log lines across an
//! engine's call stack (event append, LLM stream, tool invocation).

use tracing::Span;
use uuid::Uuid;

/// Correlation context for a single logical operation.
#[derive(Debug, Clone)]
pub struct RequestContext {
    component: String,
    operation: Option<String>,
    request_id: Uuid,
}

impl RequestContext {
    /// Start a context for `component` (e.g. `"engine"`, `"tool_invoker"`),
    /// assigning it a fresh correlation id.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            operation: None,
            request_id: Uuid::new_v4(),
        }
    }

    /// Name the operation being performed (e.g. `"add_events"`).
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// The correlation id assigned at construction.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Build the `tracing` span carrying this context's fields.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or("-"),
            request_id = %self.request_id,
        )
    }

    /// Enter this context's span for the lifetime of the returned guard.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// Guard holding an entered [`RequestContext`] span; the span is exited when
/// this value is dropped.
pub struct RequestGuard {
    _entered: tracing::span::EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_operation_is_chainable() {
        let ctx = RequestContext::new("engine").with_operation("add_events");
        assert_eq!(ctx.component, "engine");
        assert_eq!(ctx.operation.as_deref(), Some("add_events"));
    }

    #[test]
    fn each_context_gets_a_distinct_request_id() {
        let a = RequestContext::new("engine");
        let b = RequestContext::new("engine");
        assert_ne!(a.request_id(), b.request_id());
    }
}
