use std::convert::Infallible;
use std::ffi::CString;
use std::fs::{File,OpenOptions};
use std::os::fd::{AsRawFd,OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::{debug,error,trace};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::signal::{self,SigHandler,Signal};
use nix::unistd::{self,ForkResult};

use crate::error::{ExecError,CANNOT_EXECUTE,NOT_FOUND,REDIRECT_FAILURE};
use crate::job::Job;
use crate::types::{Output,Pipeline,Stage};

/// Mode for files created by output redirection.
const CREATE_MODE: u32 = 0o644;

pub fn open_input(path: &Path) -> Result<File, ExecError> {
	OpenOptions::new().read(true).open(path)
		.map_err(|e| ExecError::Redirect { path: path.to_owned(), source: e })
}

/// Opens the file named by a truncate/append disposition. Other
/// dispositions have no file and yield `None`.
pub fn open_output(output: &Output) -> Result<Option<File>, ExecError> {
	let mut oopt = OpenOptions::new();
	let path = match *output {
		Output::Truncate(ref p) => { oopt.write(true).create(true).truncate(true); p },
		Output::Append(ref p) => { oopt.append(true).create(true); p },
		Output::Inherit | Output::Pipe => return Ok(None),
	};
	oopt.mode(CREATE_MODE).open(path).map(Some)
		.map_err(|e| ExecError::Redirect { path: path.to_owned(), source: e })
}

/// Descriptors one stage's child installs as stdin/stdout. The parent opens
/// them before forking and drops its copies right after, so the child only
/// rewires descriptors. A redirection that could not be opened is kept as a
/// ready-made message for the child to print.
struct StageIo {
	stdin: Option<OwnedFd>,
	stdout: Option<OwnedFd>,
	failure: Option<Vec<u8>>,
}

impl StageIo {
	fn new(stage: &Stage, upstream: Option<OwnedFd>, pipe_write: Option<OwnedFd>) -> StageIo {
		let mut io = StageIo { stdin: upstream, stdout: pipe_write, failure: None };
		let opened = (|| -> Result<(), ExecError> {
			if io.stdin.is_none() {
				if let Some(ref path) = stage.input {
					io.stdin = Some(OwnedFd::from(open_input(path)?));
				}
			}
			if io.stdout.is_none() {
				io.stdout = open_output(&stage.output)?.map(OwnedFd::from);
			}
			Ok(())
		})();
		if let Err(e) = opened {
			debug!("stage {}: {}", stage.name(), e);
			io.failure = Some(format!("ish: {}\n", e).into_bytes());
		}
		io
	}
}

fn write_stderr(parts: &[&[u8]]) {
	for part in parts {
		// SAFETY: writes from a valid slice; the result is deliberately ignored.
		let _ = unsafe { libc::write(libc::STDERR_FILENO, part.as_ptr() as *const libc::c_void, part.len()) };
	}
}

fn do_exec_stage(argv: &[CString], io: &StageIo) -> nix::Result<Infallible> {
	if let Some(ref fd) = io.stdin {
		unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO)?;
	}
	if let Some(ref fd) = io.stdout {
		unistd::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO)?;
	}
	// SAFETY: restores the default disposition; no handler is installed.
	unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) }?;
	unistd::execvp(argv[0].as_c_str(), argv)
}

/// Runs in the forked child: wires up the stage and replaces the process
/// image. Never returns, and never allocates.
fn exec_stage(argv: &[CString], io: &StageIo) -> ! {
	let name = argv[0].as_bytes();
	let s = match io.failure {
		Some(ref msg) => {
			write_stderr(&[msg]);
			REDIRECT_FAILURE
		},
		None => match do_exec_stage(argv, io) {
			Ok(never) => match never {},
			Err(Errno::ENOENT) => {
				write_stderr(&[b"ish: ", name, b": command not found\n"]);
				NOT_FOUND
			},
			Err(e) => {
				write_stderr(&[b"ish: ", name, b": ", e.desc().as_bytes(), b"\n"]);
				CANNOT_EXECUTE
			},
		},
	};
	unsafe { libc::_exit(s) }
}

fn prepare_argv(stage: &Stage) -> Result<Vec<CString>, ExecError> {
	let argv: Result<Vec<CString>, _> = stage.argv.iter().map(|a| CString::new(a.as_bytes())).collect();
	Ok(argv?)
}

fn report(e: &ExecError) {
	error!("{}", e);
	eprintln!("ish: {}", e);
}

/// Starts one process per stage, left to right, connected by pipes. Every
/// stage that could be forked is recorded in `job`; a stage that cannot be
/// started is reported and skipped. Descriptors held by the parent are closed
/// as soon as the stage using them has been forked.
pub fn spawn_pipeline(pipeline: &Pipeline, job: &mut Job) -> Result<(), ExecError> {
	let last = pipeline.len() - 1;
	let mut upstream: Option<OwnedFd> = None;
	for (i, stage) in pipeline.stages().iter().enumerate() {
		let (downstream, pipe_write) = if i < last {
			let (pipe_read, pipe_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
			trace!("pipe {} -> {}: read fd {}, write fd {}", i, i + 1, pipe_read.as_raw_fd(), pipe_write.as_raw_fd());
			(Some(pipe_read), Some(pipe_write))
		} else {
			(None, None)
		};

		match prepare_argv(stage) {
			Ok(argv) => {
				let io = StageIo::new(stage, upstream.take(), pipe_write);
				match job.push_fork(i) {
					Ok(ForkResult::Parent { child }) => {
						debug!("stage {} ({}) started as pid {}", i, stage.name(), child);
					},
					Ok(ForkResult::Child) => exec_stage(&argv, &io),
					Err(e) => report(&ExecError::Spawn { name: stage.name().to_string(), source: e }),
				}
				drop(io);
			},
			Err(e) => {
				report(&e);
				drop(pipe_write);
			},
		}

		drop(upstream);
		upstream = downstream;
	}
	Ok(())
}

/// Runs an external pipeline to completion and returns the last stage's
/// status.
pub fn eval(pipeline: &Pipeline) -> Result<i32, ExecError> {
	let mut job = Job::new(pipeline.len());
	if let Err(e) = spawn_pipeline(pipeline, &mut job) {
		report(&e);
	}
	if job.is_empty() {
		return Err(ExecError::TailNotStarted);
	}
	job.wait()
}
