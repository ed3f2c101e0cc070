use std::path::PathBuf;
use thiserror::Error;

/// Every way a run of the pipeline can fail.
/// All of them are fatal to the current invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("compiler exited with {}", describe_exit(.code))]
    CompilationFailed { code: Option<i32> },

    #[error("solver executable not found: {0:?} (pass --compile to build it)")]
    SolverNotFound(PathBuf),

    #[error("solver exited with {}", describe_exit(.code))]
    ExecutionFailed { code: Option<i32> },

    #[error("solver did not finish within {seconds} seconds and was killed")]
    ExecutionTimedOut { seconds: f64 },

    #[error("solver run was cancelled")]
    ExecutionCancelled,

    #[error("malformed solver output at line {line}: {reason}")]
    MalformedOutput { line: usize, reason: String },

    #[error("could not render plot: {0}")]
    RenderFailed(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    pub fn malformed<S: Into<String>>(line: usize, reason: S) -> Self {
        Error::MalformedOutput {
            line,
            reason: reason.into(),
        }
    }
}
