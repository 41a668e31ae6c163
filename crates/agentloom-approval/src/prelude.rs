//! Common imports for consumers of `agentloom-approval`.

pub use crate::{
    approval_outcome_message, is_injected_replay, missing_key_diagnostic, pending_call_message,
    with_approval_gate, ApprovalEntry, ApprovalHost, ApprovalSlice, ApprovalStatus, ApprovalWrapper,
};
