use std::path::PathBuf;
use std::str;

use crate::error::ParseError;
use crate::types::*;

type ParseResult<T> = Result<T, ParseError>;

struct Parser<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Parser<'a> {
	fn peek(&self) -> Option<char> {
		self.line[self.i ..].chars().next()
	}

	fn bump(&mut self) -> Option<char> {
		let c = self.peek()?;
		self.i += c.len_utf8();
		Some(c)
	}

	fn proceed_while<F>(&mut self, f: F) where F: Fn(char) -> bool {
		while let Some(c) = self.peek() {
			if !f(c) { break; }
			self.i += c.len_utf8();
		}
	}

	fn is_whitespace(c: char) -> bool {
		match c {
			' ' | '\t' | '\n' | '\r' => true,
			_ => false,
		}
	}

	fn is_letter(c: char) -> bool {
		match c {
			'>' | '<' | '&' | '|' | ';' => false,
			_ => !Parser::is_whitespace(c),
		}
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Parser::is_whitespace);
	}

	fn read_single_quoted(&mut self, word: &mut String) -> ParseResult<()> {
		let orig = self.i;
		match self.line[orig ..].find('\'') {
			Some(n) => {
				word.push_str(&self.line[orig .. orig + n]);
				self.i = orig + n + 1;
				Ok(())
			},
			None => Err(ParseError::UnclosedQuote),
		}
	}

	fn read_double_quoted(&mut self, word: &mut String) -> ParseResult<()> {
		loop {
			match self.bump() {
				Some('"') => return Ok(()),
				Some('\\') => match self.peek() {
					Some(c @ '"') | Some(c @ '\\') => {
						self.i += 1;
						word.push(c);
					},
					_ => word.push('\\'),
				},
				Some(c) => word.push(c),
				None => return Err(ParseError::UnclosedQuote),
			}
		}
	}

	/// Reads one word, joining quoted and unquoted pieces. Returns `None` when
	/// the cursor is not on a word at all.
	fn read_word(&mut self) -> ParseResult<Option<String>> {
		let orig = self.i;
		let mut word = String::new();
		while let Some(c) = self.peek() {
			if !Parser::is_letter(c) { break; }
			self.i += c.len_utf8();
			match c {
				'\'' => self.read_single_quoted(&mut word)?,
				'"' => self.read_double_quoted(&mut word)?,
				'\\' => match self.bump() {
					Some('\n') | Some('\r') | None => return Err(ParseError::TrailingEscape),
					Some(e) => word.push(e),
				},
				_ => word.push(c),
			}
		}
		if orig == self.i {
			Ok(None)
		} else {
			Ok(Some(word))
		}
	}

	fn read_target(&mut self) -> ParseResult<PathBuf> {
		self.skip_whitespaces();
		match self.read_word()? {
			Some(target) => Ok(PathBuf::from(target)),
			None => Err(ParseError::MissingRedirectTarget),
		}
	}

	fn parse_stage(&mut self) -> ParseResult<Stage> {
		let mut argv: Vec<String> = vec![];
		let mut input: Option<PathBuf> = None;
		let mut output = Output::Inherit;

		loop {
			self.skip_whitespaces();
			match self.peek() {
				Some('<') => {
					self.i += 1;
					if input.is_some() {
						return Err(ParseError::DuplicateInput);
					}
					input = Some(self.read_target()?);
				},
				Some('>') => {
					self.i += 1;
					let append = self.peek() == Some('>');
					if append {
						self.i += 1;
					}
					if output != Output::Inherit {
						return Err(ParseError::DuplicateOutput);
					}
					let target = self.read_target()?;
					output = if append { Output::Append(target) } else { Output::Truncate(target) };
				},
				Some('|') | None => { break; },
				Some(c @ '&') | Some(c @ ';') => { return Err(ParseError::Unsupported(c)); },
				Some(_) => match self.read_word()? {
					Some(word) => argv.push(word),
					None => { break; },
				},
			}
		}

		if argv.is_empty() {
			return Err(ParseError::EmptyCommand);
		}
		Ok(Stage { argv: argv, input: input, output: output })
	}

	fn parse_pipeline(&mut self) -> ParseResult<Pipeline> {
		let mut stages: Vec<Stage> = vec![];

		loop {
			let mut stage = self.parse_stage()?;
			match self.peek() {
				Some('|') => {
					self.i += 1;
					if stage.output != Output::Inherit {
						return Err(ParseError::OutputNotLast);
					}
					stage.output = Output::Pipe;
					stages.push(stage);
				},
				_ => {
					stages.push(stage);
					break;
				},
			}
		}
		Pipeline::new(stages)
	}
}

/// Parses one raw input line. Bytes that are not UTF-8 are rejected rather
/// than replaced, so a command never runs with altered arguments.
pub fn parse_bytes(line: &[u8]) -> ParseResult<Option<Pipeline>> {
	match str::from_utf8(line) {
		Ok(line) => parse(line),
		Err(_) => Err(ParseError::InvalidUtf8),
	}
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> ParseResult<Option<Pipeline>> {
	let mut parser = Parser { line: line, i: 0 };
	parser.skip_whitespaces();
	if parser.peek().is_none() {
		return Ok(None);
	}
	parser.parse_pipeline().map(Some)
}
