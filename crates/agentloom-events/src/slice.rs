//! The `Slice` trait: a pluggable reducer contributing to conversation state.
//!
//! Lives alongside [`crate::Event`] rather than in `agentloom-runtime` so
//! that crates contributing a slice (e.g. `agentloom-approval`) do not need
//! to depend on the orchestration crate that assembles the pipeline —
//! mirroring the teacher's dependency direction, where `astrid-runtime`
//! depends on `astrid-approval` and not the reverse.

use serde_json::Value;

use crate::event::Event;

/// A shallow JSON-merge patch a slice (or the core reducer) contributes for
/// one folded event. Applied as `serde_json::Value` object merge: keys in
/// the patch overwrite keys in the accumulated state at the same path.
pub type StatePatch = Value;

/// A pluggable reducer that augments the core conversation state.
///
/// Slices are folded in declaration order after the core reducer runs.
/// Each slice's `reduce` sees the state as shaped after the core reducer and
/// every earlier slice, via `deps`, but contributes its own patch
/// independently — slices never mutate state outside the sub-tree keyed by
/// their own `name()`.
pub trait Slice: Send + Sync {
    /// This slice's name. Also the top-level state key its patches nest
    /// under, and the identifier other slices reference in `dependencies`.
    fn name(&self) -> &'static str;

    /// The patch this slice contributes before any event has been folded.
    fn initial_patch(&self) -> StatePatch {
        Value::Object(serde_json::Map::new())
    }

    /// Names of other slices whose post-fold state this slice's `reduce`
    /// needs to read. The pipeline validates these resolve to registered
    /// slices with no cycles before folding begins.
    fn dependencies(&self) -> &[&'static str] {
        &[]
    }

    /// Fold one event into this slice's view of the state.
    ///
    /// `state` is the full merged state as of immediately before this
    /// event (core reducer's patch for this event already applied);
    /// `deps` holds the up-to-date sub-states of every slice named in
    /// `dependencies()`. Returns a patch to merge into this slice's own
    /// sub-tree, or an error identifying this slice and the offending event.
    fn reduce(
        &self,
        state: &Value,
        deps: &Value,
        event: &Event,
    ) -> Result<StatePatch, String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopSlice;

    impl Slice for NoopSlice {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn reduce(&self, _state: &Value, _deps: &Value, _event: &Event) -> Result<StatePatch, String> {
            Ok(Value::Object(serde_json::Map::new()))
        }
    }

    #[test]
    fn default_initial_patch_is_empty_object() {
        let slice = NoopSlice;
        assert_eq!(slice.initial_patch(), Value::Object(serde_json::Map::new()));
        assert!(slice.dependencies().is_empty());
    }
}
