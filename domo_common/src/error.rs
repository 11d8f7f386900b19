//! Program error records and message sanitization.
//!
//! A [`ProgramError`] describes one fault in a program's trigger condition or
//! action body: compile diagnostics come in lists from the ScriptHost, runtime
//! faults are recorded one at a time by the engine. The error list is
//! serialized to JSON when stored on the program record or published on the
//! bus.

use serde::{Deserialize, Serialize};

/// Which code block of a program an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeBlock {
    /// Trigger condition.
    #[serde(rename = "TC")]
    Tc,
    /// Action body ("code run" block).
    #[serde(rename = "CR")]
    Cr,
}

impl CodeBlock {
    /// The published prefix for runtime error messages ("TC" / "CR").
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tc => "TC",
            Self::Cr => "CR",
        }
    }
}

/// One diagnostic or runtime fault attributed to a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramError {
    /// Source line (0 when unknown).
    #[serde(default)]
    pub line: u32,
    /// Source column (0 when unknown).
    #[serde(default)]
    pub column: u32,
    /// Human-readable message.
    pub message: String,
    /// Host-specific error number (0 when unknown).
    #[serde(default)]
    pub number: u32,
    /// Code block the error belongs to.
    pub code_block: CodeBlock,
}

impl ProgramError {
    /// Build a runtime error record for the given block.
    pub fn runtime(code_block: CodeBlock, message: impl Into<String>) -> Self {
        Self {
            line: 0,
            column: 0,
            message: message.into(),
            number: 0,
            code_block,
        }
    }
}

/// Serialize an error list to its JSON wire form.
///
/// Serialization of these plain records cannot fail; an empty list
/// serializes to `"[]"`.
pub fn serialize_errors(errors: &[ProgramError]) -> String {
    serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string())
}

/// Replace newlines and carriage returns with spaces.
///
/// Published `RuntimeError` values are single-line; multi-line script
/// diagnostics are flattened before they reach the bus.
pub fn sanitize_message(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}
