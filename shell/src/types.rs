use std::path::{Path,PathBuf};

use crate::error::ParseError;

/// Where a stage sends its standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
	Inherit,
	Pipe,
	Truncate(PathBuf),
	Append(PathBuf),
}

impl Output {
	pub fn file(&self) -> Option<&Path> {
		match *self {
			Output::Truncate(ref p) | Output::Append(ref p) => Some(p),
			Output::Inherit | Output::Pipe => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
	pub argv: Vec<String>,
	pub input: Option<PathBuf>,
	pub output: Output,
}

impl Stage {
	pub fn new(argv: Vec<String>) -> Stage {
		Stage { argv: argv, input: None, output: Output::Inherit }
	}

	pub fn name(&self) -> &str {
		&self.argv[0]
	}

	pub fn has_redirects(&self) -> bool {
		self.input.is_some() || self.output.file().is_some()
	}
}

/// An ordered chain of stages. Every stage but the last pipes into the next
/// one; only the head may read from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
	stages: Vec<Stage>,
}

impl Pipeline {
	pub fn new(stages: Vec<Stage>) -> Result<Pipeline, ParseError> {
		if stages.is_empty() {
			return Err(ParseError::EmptyCommand);
		}
		let last = stages.len() - 1;
		for (i, stage) in stages.iter().enumerate() {
			if stage.argv.is_empty() {
				return Err(ParseError::EmptyCommand);
			}
			if i > 0 && stage.input.is_some() {
				return Err(ParseError::InputNotFirst);
			}
			match (i == last, &stage.output) {
				(true, &Output::Pipe) => return Err(ParseError::EmptyCommand),
				(false, &Output::Pipe) => {},
				(false, _) => return Err(ParseError::OutputNotLast),
				(true, _) => {},
			}
		}
		Ok(Pipeline { stages: stages })
	}

	pub fn stages(&self) -> &[Stage] {
		&self.stages
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn head(&self) -> &Stage {
		&self.stages[0]
	}

	pub fn tail(&self) -> &Stage {
		&self.stages[self.stages.len() - 1]
	}
}
