use std::env;

use clap::Parser;
use log::LevelFilter;
use thiserror::Error;

const DEFAULT_PROMPT: &str = "ish> ";
const LOG_KEY: &str = "ISH_LOG";
const PROMPT_KEY: &str = "ISH_PROMPT";

/// A small pipeline shell.
#[derive(Parser, Debug, Default)]
#[command(name = "ish", version)]
pub struct Args {
	/// Run a single line and exit with its status
	#[arg(short = 'c', value_name = "LINE")]
	pub command: Option<String>,

	/// Diagnostic log level (off, error, warn, info, debug, trace); overrides ISH_LOG
	#[arg(long, value_name = "LEVEL")]
	pub log_level: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("invalid log level '{0}'")]
	LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	pub command: Option<String>,
	pub prompt: String,
	pub log_level: LevelFilter,
}

fn parse_level(s: &str) -> Result<LevelFilter, ConfigError> {
	s.trim().parse::<LevelFilter>().map_err(|_| ConfigError::LogLevel(s.to_string()))
}

impl Config {
	pub fn from_env(args: Args) -> Result<Config, ConfigError> {
		Config::resolve(args, |key| env::var(key).ok())
	}

	/// Command-line flags win over the environment, which wins over defaults.
	pub fn resolve<F>(args: Args, lookup: F) -> Result<Config, ConfigError> where F: Fn(&str) -> Option<String> {
		let log_level = match args.log_level.or_else(|| lookup(LOG_KEY)) {
			Some(ref s) if !s.is_empty() => parse_level(s)?,
			_ => LevelFilter::Off,
		};
		let prompt = lookup(PROMPT_KEY).unwrap_or_else(|| DEFAULT_PROMPT.to_string());
		Ok(Config { command: args.command, prompt: prompt, log_level: log_level })
	}
}
