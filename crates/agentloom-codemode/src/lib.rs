//! Codemode: substituting many tools with one meta-tool that accepts
//! LLM-generated code (component C7, spec §4.7, §9).
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod declarations;
mod error;
mod identifiers;
pub mod prelude;
mod runtime_tool;
mod sandbox;
mod substitution;

pub use declarations::{generate_declarations, ToolCallSamples};
pub use error::{CodemodeError, CodemodeResult};
pub use identifiers::{resolve_export_collisions, tool_name_to_export};
pub use runtime_tool::{CodemodeMetaTool, CodemodeWrapper};
pub use sandbox::{CodemodeSandbox, EvalOutcome, FunctionTable, HostCallResult, HostFn, QuickJsSandbox};
pub use substitution::{build_prompt_fragment, codemode_tool_spec, CodemodeSubstitution, CODEMODE_TOOL_NAME};
