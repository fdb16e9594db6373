//! Operator console I/O: prompts and the non-blocking cancel check.

use std::io::{self, BufRead, Write};

/// Print a prompt and read one trimmed line from stdin.
pub fn prompt_line(msg: &str) -> io::Result<String> {
    print!("{msg}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt for a numeric ID. `None` means the input was not a number.
pub fn prompt_id(msg: &str) -> io::Result<Option<u32>> {
    Ok(parse_id(&prompt_line(msg)?))
}

pub fn parse_id(input: &str) -> Option<u32> {
    input.trim().parse().ok()
}

/// Check once, without blocking, whether the operator asked to stop the
/// capture loop (`q` + Enter). Other pending input is consumed and ignored;
/// EOF counts as a cancel so a closed stdin cannot spin the loop forever.
pub fn cancel_requested() -> bool {
    if !stdin_ready() {
        return false;
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => true,
        Ok(_) => is_cancel_line(&line),
        Err(_) => false,
    }
}

pub fn is_cancel_line(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("q")
}

/// Poll stdin with a zero timeout.
fn stdin_ready() -> bool {
    let mut fds = libc::pollfd {
        fd: libc::STDIN_FILENO,
        events: libc::POLLIN,
        revents: 0,
    };
    let ready = unsafe { libc::poll(&mut fds, 1, 0) };
    ready > 0 && (fds.revents & libc::POLLIN) != 0
}
