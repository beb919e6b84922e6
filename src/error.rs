// ============================================================
// Compile errors — plain String-style diagnostics, no framework
// ============================================================
//
// Plain `Result<T, String>`-style diagnostics rather than a diagnostics
// crate: there are exactly two fatal conditions worth distinguishing
// (a source/destination I/O failure, and a mismatched bracket) and
// nothing else needs structured error data.

use std::fmt;

#[derive(Debug)]
pub enum CompileError {
    SourceOpen(String),
    DestOpen(String),
    UnmatchedOpen,
    UnmatchedClose,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::SourceOpen(msg) => write!(f, "{}", msg),
            CompileError::DestOpen(msg) => write!(f, "{}", msg),
            CompileError::UnmatchedOpen => {
                write!(f, "']' corresponding to '[' is not found.")
            }
            CompileError::UnmatchedClose => {
                write!(f, "'[' corresponding to ']' is not found.")
            }
        }
    }
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;
