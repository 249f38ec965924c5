use log::{error,trace};
use nix::errno::Errno;
use nix::sys::wait::{waitpid,WaitStatus};
use nix::unistd::{self,ForkResult,Pid};

use crate::error::ExecError;

pub trait WaitStatusExt {
	/// Shell-style status: the exit code, or 128 + signal number.
	fn code(self) -> Option<i32>;
}

impl WaitStatusExt for WaitStatus {
	fn code(self) -> Option<i32> {
		match self {
			WaitStatus::Exited(_, code) => Some(code),
			WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub stage: usize,
	pub pid: Pid,
	pub status: Option<WaitStatus>,
}

/// The processes started for one pipeline, in stage order.
#[derive(Debug)]
pub struct Job {
	stages: usize,
	processes: Vec<Process>,
}

fn reap(pid: Pid) -> nix::Result<WaitStatus> {
	loop {
		match waitpid(pid, None) {
			Ok(status @ WaitStatus::Exited(..)) | Ok(status @ WaitStatus::Signaled(..)) => return Ok(status),
			Ok(_) | Err(Errno::EINTR) => continue,
			Err(e) => return Err(e),
		}
	}
}

impl Job {
	pub fn new(stages: usize) -> Job {
		Job { stages: stages, processes: Vec::with_capacity(stages) }
	}

	/// Forks the process for `stage`. The parent records the child; the
	/// child gets `ForkResult::Child` back and must never return.
	pub fn push_fork(&mut self, stage: usize) -> nix::Result<ForkResult> {
		// SAFETY: the child only rewires descriptors and then execs or _exits.
		let r = unsafe { unistd::fork() }?;
		if let ForkResult::Parent { child } = r {
			self.processes.push(Process { stage: stage, pid: child, status: None });
		}
		Ok(r)
	}

	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
	}

	pub fn processes(&self) -> &[Process] {
		&self.processes
	}

	/// Reaps every process in spawn order. A process that cannot be reaped is
	/// reported and skipped; the rest are still waited for. The result is the
	/// status of the last stage alone.
	pub fn wait(&mut self) -> Result<i32, ExecError> {
		for pr in self.processes.iter_mut() {
			match reap(pr.pid) {
				Ok(status) => {
					trace!("stage {} (pid {}) finished: {:?}", pr.stage, pr.pid, status);
					pr.status = Some(status);
				},
				Err(e) => {
					let e = ExecError::Reap { pid: pr.pid, source: e };
					error!("{}", e);
					eprintln!("ish: {}", e);
				},
			}
		}
		self.status()
	}

	pub fn status(&self) -> Result<i32, ExecError> {
		let tail = self.stages.checked_sub(1);
		match self.processes.last() {
			Some(pr) if Some(pr.stage) == tail => pr.status.and_then(|s| s.code()).ok_or(ExecError::TailUnreaped),
			_ => Err(ExecError::TailNotStarted),
		}
	}
}
