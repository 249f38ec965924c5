use log::{debug,warn};

use crate::builtin::{Handler,Registry,StdioGuard};
use crate::error::{ExecError,ParseError};
use crate::eval;
use crate::parser;
use crate::types::Pipeline;

/// Returned when a line cannot be parsed.
pub const PARSE_FAILURE: i32 = -1;

enum Route {
	Builtin(Handler),
	External,
}

/// Entry point for running lines: owns the builtin table and decides, per
/// line, whether it runs in-process or as a pipeline of child processes.
#[derive(Debug, Clone)]
pub struct Dispatcher {
	builtins: Registry,
}

impl Dispatcher {
	pub fn new(builtins: Registry) -> Dispatcher {
		Dispatcher { builtins: builtins }
	}

	fn route(&self, pipeline: &Pipeline) -> Route {
		if pipeline.len() == 1 {
			if let Some(handler) = self.builtins.match_builtin(pipeline.head().name()) {
				return Route::Builtin(handler);
			}
		}
		Route::External
	}

	fn run_builtin(&self, handler: Handler, pipeline: &Pipeline, last_rv: i32, should_exit: &mut bool) -> i32 {
		let stage = pipeline.head();
		if !stage.has_redirects() {
			return handler(&stage.argv, last_rv, should_exit);
		}
		match StdioGuard::redirect(stage) {
			Ok(_guard) => handler(&stage.argv, last_rv, should_exit),
			Err(e) => {
				eprintln!("ish: {}", e);
				e.status()
			},
		}
	}

	fn run_external(&self, pipeline: &Pipeline) -> i32 {
		match eval::eval(pipeline) {
			Ok(s) => s,
			Err(e @ ExecError::TailNotStarted) | Err(e @ ExecError::TailUnreaped) => {
				warn!("{}", e);
				e.status()
			},
			Err(e) => {
				eprintln!("ish: {}", e);
				e.status()
			},
		}
	}

	/// Runs one line of input. `last_rv` is the previous status; a builtin may
	/// set `should_exit` to ask the caller to stop.
	pub fn dispatch(&self, line: &str, last_rv: i32, should_exit: &mut bool) -> i32 {
		self.run(parser::parse(line), last_rv, should_exit)
	}

	/// Like `dispatch`, for a line read as raw bytes. A line that is not
	/// UTF-8 is a parse error and runs nothing.
	pub fn dispatch_bytes(&self, line: &[u8], last_rv: i32, should_exit: &mut bool) -> i32 {
		self.run(parser::parse_bytes(line), last_rv, should_exit)
	}

	fn run(&self, parsed: Result<Option<Pipeline>, ParseError>, last_rv: i32, should_exit: &mut bool) -> i32 {
		let pipeline = match parsed {
			Ok(Some(pipeline)) => pipeline,
			Ok(None) => return last_rv,
			Err(e) => {
				eprintln!("ish: parse error: {}", e);
				return PARSE_FAILURE;
			},
		};
		debug!("dispatching {:?}", pipeline);

		match self.route(&pipeline) {
			Route::Builtin(handler) => self.run_builtin(handler, &pipeline, last_rv, should_exit),
			Route::External => self.run_external(&pipeline),
		}
	}
}

impl Default for Dispatcher {
	fn default() -> Dispatcher {
		Dispatcher::new(Registry::standard())
	}
}
