use log::{LevelFilter,Log,Metadata,Record};
use nix::unistd;

/// Writes log records to stderr, tagged with the pid so that records from
/// forked stages can be told apart.
struct StderrLogger;

impl Log for StderrLogger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if self.enabled(record.metadata()) {
			eprintln!("ish[{}] {} {}: {}", unistd::getpid(), record.level(), record.target(), record.args());
		}
	}

	fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Installs the stderr logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
	let _ = log::set_logger(&LOGGER);
	log::set_max_level(level);
}
