//! Interactive selection over a numbered option list.
//!
//! Both prompts block on input and return [`Selection::Cancelled`] for `q` or
//! end of input, so cancellation is never reported as an error.

use std::io::{self, BufRead, Write};

/// Outcome of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Selection<T> {
    Chosen(T),
    Cancelled,
}

/// Asks for exactly one option. Returns its index.
pub(crate) fn select_one<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    options: &[String],
) -> io::Result<Selection<usize>> {
    print_options(output, options)?;
    loop {
        write!(output, "Choose [1-{}, q to cancel]: ", options.len())?;
        output.flush()?;
        let Some(line) = read_answer(input)? else {
            return Ok(Selection::Cancelled);
        };
        if is_cancel(&line) {
            return Ok(Selection::Cancelled);
        }
        match line.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(Selection::Chosen(n - 1)),
            _ => writeln!(output, "Invalid choice: {line}")?,
        }
    }
}

/// Asks for one or more options. Indices come back in the order given.
pub(crate) fn select_many<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    options: &[String],
) -> io::Result<Selection<Vec<usize>>> {
    print_options(output, options)?;
    loop {
        write!(
            output,
            "Choose items (e.g. 1,3-4; a for all; q to cancel): "
        )?;
        output.flush()?;
        let Some(line) = read_answer(input)? else {
            return Ok(Selection::Cancelled);
        };
        if is_cancel(&line) {
            return Ok(Selection::Cancelled);
        }
        match parse_indices(&line, options.len()) {
            Ok(indices) => return Ok(Selection::Chosen(indices)),
            Err(reason) => writeln!(output, "{reason}")?,
        }
    }
}

fn print_options<W: Write>(output: &mut W, options: &[String]) -> io::Result<()> {
    let width = options.len().to_string().len();
    for (i, option) in options.iter().enumerate() {
        writeln!(output, "  {:>width$}) {option}", i + 1)?;
    }
    Ok(())
}

/// Reads one trimmed line; `None` at end of input.
fn read_answer<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_cancel(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit")
}

/// Parses `1,3-5` style lists (1-based) into unique 0-based indices.
///
/// `a`/`all` selects every option in list order.
fn parse_indices(answer: &str, len: usize) -> Result<Vec<usize>, String> {
    if answer.eq_ignore_ascii_case("a") || answer.eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }

    let mut chosen = Vec::new();
    for token in answer.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
        let (first, last) = match token.split_once('-') {
            Some((a, b)) => (parse_position(a, len)?, parse_position(b, len)?),
            None => {
                let n = parse_position(token, len)?;
                (n, n)
            }
        };
        if first > last {
            return Err(format!("Invalid range: {token}"));
        }
        for index in first..=last {
            if !chosen.contains(&index) {
                chosen.push(index);
            }
        }
    }

    if chosen.is_empty() {
        return Err("Select at least one item.".to_string());
    }
    Ok(chosen)
}

fn parse_position(raw: &str, len: usize) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(n - 1),
        _ => Err(format!("Invalid choice: {raw}")),
    }
}
