//! Interactive confirmation

use std::io::{self, BufRead, Write};

/// Ask a yes/no question; anything but `y` or `yes` is a no
///
/// End of input counts as a no.
pub fn confirm(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> io::Result<bool> {
    write!(out, "{question} [y/N]: ")?;
    out.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }

    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(input: &str) -> (bool, String) {
        let mut out = Vec::new();
        let yes = confirm(&mut input.as_bytes(), &mut out, "Continue?").unwrap();
        (yes, String::from_utf8(out).unwrap())
    }

    #[test]
    fn accepts_yes_variants() {
        for input in ["y\n", "Y\n", "yes\n", "  YES  \n"] {
            assert!(ask(input).0, "{input:?}");
        }
    }

    #[test]
    fn everything_else_declines() {
        for input in ["\n", "n\n", "no\n", "yep\n", ""] {
            assert!(!ask(input).0, "{input:?}");
        }
    }

    #[test]
    fn prints_question() {
        assert_eq!(ask("y\n").1, "Continue? [y/N]: ");
    }
}
