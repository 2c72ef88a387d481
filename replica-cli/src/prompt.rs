//! Line-oriented questions on stdin/stdout.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Print `question` without a newline and read one trimmed answer line.
pub fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}").context("failed to write prompt")?;
    output.flush().context("failed to flush prompt")?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read answer")?;
    if read == 0 {
        bail!("input closed before answering '{}'", question.trim_end());
    }
    Ok(line.trim().to_string())
}

/// Ask for a path; an empty answer is an error.
pub fn ask_path<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<PathBuf> {
    let answer = ask(input, output, question)?;
    if answer.is_empty() {
        bail!("no path given for '{}'", question.trim_end());
    }
    Ok(PathBuf::from(answer))
}

/// `y` (any case) is yes; every other answer is no.
pub fn ask_yes_no<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    Ok(ask(input, output, question)?.eq_ignore_ascii_case("y"))
}

pub fn ask_seconds<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<u64> {
    let answer = ask(input, output, question)?;
    answer
        .parse()
        .with_context(|| format!("'{answer}' is not a whole number of seconds"))
}
