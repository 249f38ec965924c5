use std::io::Write;
use std::process::{Command,Output,Stdio};
use std::str;

fn ish<S: AsRef<[u8]>>(args: &[&str], script: S) -> Output {
	let mut child = Command::new(env!("CARGO_BIN_EXE_ish"))
		.args(args)
		.env_remove("ISH_LOG")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(script.as_ref()).unwrap();
	child.wait_with_output().unwrap()
}

fn stdout(out: &Output) -> &str {
	str::from_utf8(&out.stdout).unwrap()
}

fn stderr(out: &Output) -> &str {
	str::from_utf8(&out.stderr).unwrap()
}

#[test]
fn no_prompt_without_terminal() {
	let out = ish(&[], "echo hello\n");
	assert_eq!(stdout(&out), "hello\n");
	assert_eq!(out.status.code(), Some(0));
}

#[test]
fn last_status_becomes_exit_code() {
	let out = ish(&[], "true\nsh -c 'exit 7'\n\n");
	assert_eq!(out.status.code(), Some(7));
}

#[test]
fn exit_stops_reading() {
	let out = ish(&[], "echo before\nexit 3\necho after\n");
	assert_eq!(stdout(&out), "before\n");
	assert_eq!(out.status.code(), Some(3));
}

#[test]
fn exit_without_argument_keeps_status() {
	let out = ish(&[], "false\nexit\n");
	assert_eq!(out.status.code(), Some(1));
}

#[test]
fn cd_changes_directory_for_later_commands() {
	let dir = tempfile::tempdir().unwrap();
	let dir = dir.path().canonicalize().unwrap();
	let script = format!("cd {}\npwd\nenv pwd\n", dir.display());
	let out = ish(&[], &script);
	let expected = format!("{0}\n{0}\n", dir.display());
	assert_eq!(stdout(&out), expected);
}

#[test]
fn builtin_output_redirect_is_restored() {
	let dir = tempfile::tempdir().unwrap();
	let file = dir.path().join("cwd");
	let script = format!("cd {}\npwd > {}\necho back\n", dir.path().display(), file.display());
	let out = ish(&[], &script);
	assert_eq!(stdout(&out), "back\n");
	let written = std::fs::read_to_string(&file).unwrap();
	assert!(!written.trim().is_empty());
}

#[test]
fn parse_error_is_reported() {
	let out = ish(&[], "echo 'oops\n");
	assert!(stderr(&out).contains("ish: parse error: unclosed quote"));
	assert_eq!(out.status.code(), Some(255));
}

#[test]
fn invalid_utf8_line_runs_nothing() {
	let out = ish(&[], &b"echo \xff\xfe\n"[..]);
	assert_eq!(stdout(&out), "");
	assert!(stderr(&out).contains("ish: parse error: input is not valid UTF-8"));
	assert_eq!(out.status.code(), Some(255));
	let out = ish(&[], &b"echo \xff\necho fine\n"[..]);
	assert_eq!(stdout(&out), "fine\n");
	assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_command_is_reported() {
	let out = ish(&[], "ish-no-such-program\n");
	assert!(stderr(&out).contains("ish-no-such-program: command not found"));
	assert_eq!(out.status.code(), Some(127));
}

#[test]
fn single_command_flag() {
	let out = ish(&["-c", "echo one two | wc -w"], "");
	assert_eq!(stdout(&out).trim(), "2");
	assert_eq!(out.status.code(), Some(0));
}

#[test]
fn prompt_from_environment_is_unused_off_terminal() {
	let mut child = Command::new(env!("CARGO_BIN_EXE_ish"))
		.env("ISH_PROMPT", "custom$ ")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.spawn()
		.unwrap();
	child.stdin.take().unwrap().write_all(b"echo x\n").unwrap();
	let out = child.wait_with_output().unwrap();
	assert_eq!(str::from_utf8(&out.stdout).unwrap(), "x\n");
}

#[test]
fn debug_logging_goes_to_stderr() {
	let out = ish(&["--log-level", "debug", "-c", "true | true"], "");
	assert_eq!(out.status.code(), Some(0));
	assert!(stderr(&out).contains("started as pid"));
	assert!(stdout(&out).is_empty());
}

#[test]
fn bad_log_level_is_rejected() {
	let out = ish(&["--log-level", "loud", "-c", "true"], "");
	assert_eq!(out.status.code(), Some(2));
	assert!(stderr(&out).contains("invalid log level"));
}
