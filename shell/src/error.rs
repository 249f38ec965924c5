use std::{ffi,io};
use std::path::PathBuf;

use nix::unistd::Pid;
use thiserror::Error;

/// Status used when a command could not be started at all.
pub const CANNOT_EXECUTE: i32 = 126;
/// Status used when the program is not on the search path.
pub const NOT_FOUND: i32 = 127;
/// Status used when a redirection target cannot be opened.
pub const REDIRECT_FAILURE: i32 = 1;

/// Errors produced while turning a line into a pipeline. The `Display`
/// output of each variant is the message shown to the user.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
	#[error("unclosed quote")]
	UnclosedQuote,
	#[error("trailing backslash")]
	TrailingEscape,
	#[error("empty command in pipeline")]
	EmptyCommand,
	#[error("missing redirection target")]
	MissingRedirectTarget,
	#[error("multiple input redirections")]
	DuplicateInput,
	#[error("multiple output redirections")]
	DuplicateOutput,
	#[error("input redirection only allowed on the first command")]
	InputNotFirst,
	#[error("output redirection only allowed on the last command")]
	OutputNotLast,
	#[error("unsupported operator '{0}'")]
	Unsupported(char),
	#[error("input is not valid UTF-8")]
	InvalidUtf8,
}

#[derive(Debug, Error)]
pub enum ExecError {
	#[error("{0}")]
	Nix(#[from] nix::Error),
	#[error("{0}")]
	Io(#[from] io::Error),
	#[error("argument contains a NUL byte")]
	Nul(#[from] ffi::NulError),
	#[error("cannot start {name}: {source}")]
	Spawn { name: String, source: nix::Error },
	#[error("{}: {}", .path.display(), .source)]
	Redirect { path: PathBuf, source: io::Error },
	#[error("failed to reap process {pid}: {source}")]
	Reap { pid: Pid, source: nix::Error },
	#[error("last command of the pipeline was not started")]
	TailNotStarted,
	#[error("status of the last command is unavailable")]
	TailUnreaped,
}

impl ExecError {
	/// The exit status a stage reports when it fails with this error.
	pub fn status(&self) -> i32 {
		match *self {
			ExecError::Redirect { .. } => REDIRECT_FAILURE,
			_ => CANNOT_EXECUTE,
		}
	}
}
