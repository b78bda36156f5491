use std::io::{BufRead, Write};

/// Ask a y/n question until the answer is `y` or `n` (trimmed, any case).
///
/// End of input, or a read error, is treated as `n`.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> bool {
    loop {
        let _ = write!(output, "{question} (y/n): ");
        let _ = output.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => {
                let _ = writeln!(output);
                tracing::debug!("no answer on input, treating as no");
                return false;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "failed to read confirmation answer");
                return false;
            }
        }

        match line.trim().to_lowercase().as_str() {
            "y" => return true,
            "n" => return false,
            _ => {
                let _ = writeln!(output, "[Error] Please enter 'y' or 'n'.");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ask(answers: &str) -> (bool, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let answer = confirm(&mut input, &mut output, "Proceed?");
        (answer, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_yes_and_no() {
        assert!(ask("y\n").0);
        assert!(!ask("n\n").0);
    }

    #[test]
    fn test_answer_trimmed_and_case_insensitive() {
        assert!(ask("  Y  \n").0);
        assert!(!ask("\tN\n").0);
    }

    #[test]
    fn test_invalid_answer_reprompts() {
        let (answer, output) = ask("yes\nmaybe\ny\n");
        assert!(answer);
        assert_eq!(output.matches("Proceed? (y/n): ").count(), 3);
        assert_eq!(output.matches("[Error] Please enter 'y' or 'n'.").count(), 2);
    }

    #[test]
    fn test_end_of_input_is_no() {
        let (answer, output) = ask("what\n");
        assert!(!answer);
        assert_eq!(output.matches("Proceed? (y/n): ").count(), 2);
    }
}
