//! Common imports for consumers of `agentloom-codemode`.

pub use crate::{
    build_prompt_fragment, codemode_tool_spec, CodemodeError, CodemodeMetaTool, CodemodeResult,
    CodemodeSandbox, CodemodeSubstitution, CodemodeWrapper, EvalOutcome, QuickJsSandbox,
    CODEMODE_TOOL_NAME,
};
