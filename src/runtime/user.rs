//! User interaction operations (confirmation prompts, alerts, navigation).

use anyhow::Result;
use log::info;

use super::RealRuntime;

use std::io::{self, BufRead, Write};

/// Core, testable implementation that reads from any BufRead and writes to any Write.
pub(crate) fn confirm_with_io<R: BufRead, W: Write>(
    prompt: &str,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;

    let response = line.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

pub(crate) fn alert_with_io<W: Write>(message: &str, output: &mut W) -> io::Result<()> {
    writeln!(output, "!! {}", message)?;
    output.flush()
}

pub(crate) fn navigate_with_io<W: Write>(location: &str, output: &mut W) -> io::Result<()> {
    match location {
        "/login" => writeln!(output, "Run `bookshelf login` to sign in again.")?,
        other => writeln!(output, "Continue at {}", other)?,
    }
    output.flush()
}

impl RealRuntime {
    pub(crate) fn confirm_impl(&self, prompt: &str) -> Result<bool> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut stdin_lock = stdin.lock();
        confirm_with_io(prompt, &mut stdin_lock, &mut stdout)
    }

    pub(crate) fn alert_impl(&self, message: &str) {
        // stderr is gone; nothing left to tell the user with
        let _ = alert_with_io(message, &mut io::stderr());
    }

    pub(crate) fn navigate_impl(&self, location: &str) {
        info!("Navigating to {}", location);
        let _ = navigate_with_io(location, &mut io::stderr());
    }
}

#[cfg(test)]
mod tests {
    use super::{alert_with_io, confirm_with_io, navigate_with_io};
    use anyhow::Result;
    use std::io::Cursor;

    #[test]
    fn confirms_yes_and_short_y() -> Result<()> {
        let cases = vec!["y\n", "Y\n", "yes\n", " YES \n", "  y  \n"];
        for case in cases {
            let mut input = Cursor::new(case.as_bytes());
            let mut output = Vec::new();
            let ok = confirm_with_io("Delete account?", &mut input, &mut output)?;
            assert!(ok, "expected '{}' to be accepted as yes", case);
            let out = String::from_utf8(output)?;
            assert!(out.contains("Delete account? [y/N]"));
        }
        Ok(())
    }

    #[test]
    fn rejects_no_and_empty() -> Result<()> {
        let cases = vec!["n\n", "no\n", "\n", "  \n", "other\n"];
        for case in cases {
            let mut input = Cursor::new(case.as_bytes());
            let mut output = Vec::new();
            let ok = confirm_with_io("Delete account?", &mut input, &mut output)?;
            assert!(!ok, "expected '{}' to be rejected as no", case);
        }
        Ok(())
    }

    #[test]
    fn alert_writes_message_on_its_own_line() -> Result<()> {
        let mut output = Vec::new();
        alert_with_io("Your session has expired.", &mut output)?;
        assert_eq!(String::from_utf8(output)?, "!! Your session has expired.\n");
        Ok(())
    }

    #[test]
    fn navigate_to_login_points_at_login_command() -> Result<()> {
        let mut output = Vec::new();
        navigate_with_io("/login", &mut output)?;
        assert!(String::from_utf8(output)?.contains("bookshelf login"));

        let mut output = Vec::new();
        navigate_with_io("/mypage", &mut output)?;
        assert_eq!(String::from_utf8(output)?, "Continue at /mypage\n");
        Ok(())
    }
}
