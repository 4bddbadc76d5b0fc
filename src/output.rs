//! User-facing console output.
//! Results go to stdout uncolored (scripts consume them); status lines get a
//! colored prefix when the stream is a TTY.

use owo_colors::OwoColorize;

fn stdout_is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_is_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

pub fn print_warn(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if stderr_is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if stdout_is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

/// Print a plain result line (no prefix), e.g. a resolved path.
pub fn print_user(msg: &str) {
    println!("{msg}");
}
