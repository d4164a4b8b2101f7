// src/prompt.rs
// =============================================================================
// Tiny interactive prompts on stdin/stdout.
//
// Used for the GitHub token when none was configured (read without echo), the
// "process all N repositories?" confirmation, and "how many repositories?"
// for analyze.
// All of them are skipped by flags (--token, --yes, --limit).
// =============================================================================

use std::io::{self, BufRead, Write};

// Prints a question and reads one line from stdin (without the newline)
pub fn ask(question: &str) -> io::Result<String> {
    print!("{question}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// Reads a secret from the terminal without echoing it
pub fn ask_secret(question: &str) -> io::Result<String> {
    clean_secret(rpassword::prompt_password(question))
}

// Asks a y/n question; anything but "y"/"yes" is a no
pub fn confirm(question: &str) -> io::Result<bool> {
    Ok(is_yes(&ask(&format!("{question} (y/n): "))?))
}

// Asks how many repositories to process
//
// Returns: None for "all" (empty answer or "all"), otherwise a count clamped
// to `available`. Unparsable answers also mean "all".
pub fn ask_count(available: usize) -> io::Result<Option<usize>> {
    let answer = ask(&format!(
        "How many repositories to analyze? (1-{available}, Enter for all): "
    ))?;
    Ok(parse_count(&answer, available))
}

// Pasted tokens often carry a trailing newline or spaces
fn clean_secret(read: io::Result<String>) -> io::Result<String> {
    read.map(|secret| secret.trim().to_string())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn parse_count(answer: &str, available: usize) -> Option<usize> {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("all") {
        return None;
    }
    match answer.parse::<usize>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(n.min(available)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("n"));
        assert!(!is_yes(""));
    }

    #[test]
    fn test_clean_secret() {
        assert_eq!(clean_secret(Ok("  ghp_abc \r\n".into())).unwrap(), "ghp_abc");
        let err = io::Error::new(io::ErrorKind::UnexpectedEof, "no tty");
        assert_eq!(clean_secret(Err(err)).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("", 10), None);
        assert_eq!(parse_count("all", 10), None);
        assert_eq!(parse_count("3", 10), Some(3));
        assert_eq!(parse_count("42", 10), Some(10));
        assert_eq!(parse_count("0", 10), None);
        assert_eq!(parse_count("three", 10), None);
    }
}
