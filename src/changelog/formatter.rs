use std::io::Write;
use std::process::{Command, Stdio};

/// Best-effort markdown formatting through an external `prettier`.
///
/// Any failure - the program missing, a non-zero exit, bad output - falls
/// back to the unformatted input. Formatting is cosmetic and must never turn
/// into an error.
pub fn format_markdown(input: &str) -> String {
    match run_formatter(prettier_program(), input) {
        Some(formatted) => formatted,
        None => input.to_string(),
    }
}

fn run_formatter(program: &str, input: &str) -> Option<String> {
    let mut child = Command::new(program)
        .args(["--parser", "markdown"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    child.stdin.take()?.write_all(input.as_bytes()).ok()?;
    let output = child.wait_with_output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

fn prettier_program() -> &'static str {
    if cfg!(windows) {
        "prettier.cmd"
    } else {
        "prettier"
    }
}
