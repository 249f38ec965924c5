use std::env;
use std::fs::File;
use std::io::{self,Write};
use std::os::fd::{AsRawFd,FromRawFd,OwnedFd,RawFd};
use std::path::PathBuf;

use log::debug;
use nix::fcntl::{fcntl,FcntlArg};
use nix::unistd;

use crate::error::ExecError;
use crate::eval;
use crate::types::Stage;

/// A builtin receives the full argv, the previous status and the exit-intent
/// flag, and returns its own status.
pub type Handler = fn(&[String], i32, &mut bool) -> i32;

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
	pub name: &'static str,
	pub handler: Handler,
}

pub fn builtin_exit(argv: &[String], last_rv: i32, should_exit: &mut bool) -> i32 {
	match argv.len() {
		0 | 1 => {
			*should_exit = true;
			last_rv
		},
		2 => {
			*should_exit = true;
			match argv[1].parse::<i32>() {
				Ok(n) => n,
				Err(_) => {
					eprintln!("ish: exit: {}: numeric argument required", argv[1]);
					2
				},
			}
		},
		_ => {
			eprintln!("ish: exit: too many arguments");
			1
		},
	}
}

pub fn builtin_cd(argv: &[String], _: i32, _: &mut bool) -> i32 {
	let target = match argv.len() {
		0 | 1 => match env::var_os("HOME") {
			Some(home) => PathBuf::from(home),
			None => {
				eprintln!("ish: cd: HOME not set");
				return 1;
			},
		},
		2 => PathBuf::from(&argv[1]),
		_ => {
			eprintln!("ish: cd: too many arguments");
			return 1;
		},
	};
	match unistd::chdir(target.as_path()) {
		Ok(()) => {
			debug!("working directory is now {}", target.display());
			0
		},
		Err(e) => {
			eprintln!("ish: cd: {}: {}", target.display(), e.desc());
			1
		},
	}
}

pub fn builtin_pwd(_: &[String], _: i32, _: &mut bool) -> i32 {
	match unistd::getcwd() {
		Ok(cwd) => {
			let mut stdout = io::stdout();
			let _ = writeln!(stdout, "{}", cwd.display());
			let _ = stdout.flush();
			0
		},
		Err(e) => {
			eprintln!("ish: pwd: {}", e.desc());
			1
		},
	}
}

/// Ordered builtin table. Built once at startup and only read afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
	table: Vec<Builtin>,
}

impl Registry {
	pub fn new(table: Vec<Builtin>) -> Registry {
		Registry { table: table }
	}

	pub fn standard() -> Registry {
		Registry::new(vec![
			Builtin { name: "exit", handler: builtin_exit },
			Builtin { name: "cd", handler: builtin_cd },
			Builtin { name: "pwd", handler: builtin_pwd },
		])
	}

	/// Exact name match; the first entry wins.
	pub fn match_builtin(&self, name: &str) -> Option<Handler> {
		self.table.iter().find(|b| b.name == name).map(|b| b.handler)
	}
}

/// Points the shell's own stdin/stdout at a stage's redirection targets and
/// puts the originals back when dropped.
pub struct StdioGuard {
	saved: Vec<(RawFd, OwnedFd)>,
}

impl StdioGuard {
	pub fn redirect(stage: &Stage) -> Result<StdioGuard, ExecError> {
		let mut guard = StdioGuard { saved: vec![] };
		if let Some(ref path) = stage.input {
			let file = eval::open_input(path)?;
			guard.replace(libc::STDIN_FILENO, &file)?;
		}
		if let Some(file) = eval::open_output(&stage.output)? {
			let _ = io::stdout().flush();
			guard.replace(libc::STDOUT_FILENO, &file)?;
		}
		Ok(guard)
	}

	fn replace(&mut self, target: RawFd, file: &File) -> Result<(), ExecError> {
		let saved = fcntl(target, FcntlArg::F_DUPFD_CLOEXEC(0))?;
		// SAFETY: fcntl just returned a fresh descriptor nobody else owns.
		self.saved.push((target, unsafe { OwnedFd::from_raw_fd(saved) }));
		unistd::dup2(file.as_raw_fd(), target)?;
		Ok(())
	}
}

impl Drop for StdioGuard {
	fn drop(&mut self) {
		let _ = io::stdout().flush();
		for (target, saved) in self.saved.drain(..).rev() {
			let _ = unistd::dup2(saved.as_raw_fd(), target);
		}
	}
}
