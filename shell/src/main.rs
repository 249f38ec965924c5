use std::io;
use std::process;
use io::{BufRead,IsTerminal,Write};

use clap::Parser;
use log::info;

use ish::config::{Args,Config};
use ish::{logger,Dispatcher,Registry};

fn repl(dispatcher: &Dispatcher, config: &Config) -> i32 {
	let interactive = io::stdin().is_terminal();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	let mut status = 0;
	let mut should_exit = false;
	while !should_exit {
		if interactive {
			let _ = stdout.write(config.prompt.as_bytes());
			let _ = stdout.flush();
		}
		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => { break; },
			Ok(_) => {},
			Err(e) => {
				eprintln!("ish: {}", e);
				break;
			},
		}
		status = dispatcher.dispatch_bytes(&line, status, &mut should_exit);
	}
	if interactive && !should_exit {
		let _ = stdout.write(b"\n");
	}
	status
}

fn main() {
	let config = match Config::from_env(Args::parse()) {
		Ok(config) => config,
		Err(e) => {
			eprintln!("ish: {}", e);
			process::exit(2);
		},
	};
	logger::init(config.log_level);
	info!("starting with {:?}", config);

	let dispatcher = Dispatcher::new(Registry::standard());
	let status = match config.command {
		Some(ref line) => {
			let mut should_exit = false;
			dispatcher.dispatch(line, 0, &mut should_exit)
		},
		None => repl(&dispatcher, &config),
	};
	process::exit(status & 0xff)
}
