//! Single-line G-code parsing
//!
//! Turns one line of text into an [`Instruction`]. Words are
//! `<letter><number>` pairs, case-insensitive, with optional whitespace
//! between the letter and the number. `;` starts a comment that runs to the
//! end of the line, `( ... )` is an inline comment.

use gcodetrim_core::{GcodeError, Instruction, OpLetter, Operation, Param, ParamSet};

/// Parse a line of G-code
///
/// `line_number` is 1-based and is recorded on the instruction and on any
/// error. The raw text is kept as the instruction's `source`.
pub fn parse_line(text: &str, line_number: usize) -> Result<Instruction, GcodeError> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(Instruction::blank()
            .with_line_number(line_number)
            .with_source(text));
    }

    // Program delimiter
    if trimmed == "%" {
        return Ok(Instruction::comment("%")
            .with_line_number(line_number)
            .with_source(text));
    }

    let (code, comment) = split_comments(trimmed, line_number)?;
    let words = tokenize(&code, line_number)?;

    let mut codes: Vec<Operation> = Vec::new();
    let mut params = ParamSet::new();

    for (letter, value_text) in words {
        if let Some(op_letter) = OpLetter::from_letter(letter) {
            codes.push(parse_code(op_letter, &value_text, line_number)?);
            continue;
        }

        let param = Param::from_letter(letter).ok_or(GcodeError::UnknownWord {
            line_number,
            letter,
        })?;
        let value = parse_value(letter, &value_text, line_number)?;
        if params.contains(param) {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: format!("duplicate word '{}'", param.letter()),
            });
        }
        params.set(param, value);
    }

    // The motion word is the primary operation; otherwise the first code.
    let primary_index = codes
        .iter()
        .position(Operation::is_motion)
        .or(if codes.is_empty() { None } else { Some(0) });
    let operation = primary_index.map(|index| codes.remove(index));

    Ok(Instruction {
        operation,
        extra_codes: codes,
        params,
        comment,
        line_number: Some(line_number),
        source: Some(text.to_string()),
    })
}

/// Separate code text from comments
///
/// Returns the code with comments removed and the comments joined by a space.
fn split_comments(text: &str, line_number: usize) -> Result<(String, Option<String>), GcodeError> {
    let mut code = String::with_capacity(text.len());
    let mut comments: Vec<String> = Vec::new();
    let mut rest = text;

    loop {
        let next = rest.find([';', '(']);
        match next {
            None => {
                code.push_str(rest);
                break;
            }
            Some(pos) if rest[pos..].starts_with(';') => {
                code.push_str(&rest[..pos]);
                comments.push(rest[pos..].trim_end().to_string());
                break;
            }
            Some(pos) => {
                code.push_str(&rest[..pos]);
                code.push(' ');
                let close = rest[pos..]
                    .find(')')
                    .ok_or(GcodeError::UnterminatedComment { line_number })?;
                comments.push(rest[pos..pos + close + 1].to_string());
                rest = &rest[pos + close + 1..];
            }
        }
    }

    let comment = if comments.is_empty() {
        None
    } else {
        Some(comments.join(" "))
    };
    Ok((code, comment))
}

/// Split code text into (letter, number text) words
fn tokenize(code: &str, line_number: usize) -> Result<Vec<(char, String)>, GcodeError> {
    let mut words = Vec::new();
    let mut chars = code.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        if !c.is_ascii_alphabetic() {
            return Err(GcodeError::InvalidSyntax {
                line_number,
                reason: format!("unexpected character '{}'", c),
            });
        }

        while chars.peek().is_some_and(|next| next.is_whitespace()) {
            chars.next();
        }

        let mut number = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_digit() || matches!(next, '.' | '-' | '+') {
                number.push(next);
                chars.next();
            } else {
                break;
            }
        }

        words.push((c.to_ascii_uppercase(), number));
    }

    Ok(words)
}

fn parse_value(letter: char, text: &str, line_number: usize) -> Result<f64, GcodeError> {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| GcodeError::InvalidNumber {
            line_number,
            letter: letter.to_ascii_uppercase(),
            text: text.to_string(),
        })
}

fn parse_code(letter: OpLetter, text: &str, line_number: usize) -> Result<Operation, GcodeError> {
    let invalid = || GcodeError::InvalidCode {
        line_number,
        letter: letter.letter(),
        text: text.to_string(),
    };

    let (major, minor) = match text.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (text, None),
    };
    if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let code = major.parse::<u16>().map_err(|_| invalid())?;
    let subcode = match minor {
        Some(minor) if !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()) => {
            Some(minor.parse::<u16>().map_err(|_| invalid())?)
        }
        Some(_) => return Err(invalid()),
        None => None,
    };

    Ok(Operation {
        letter,
        code,
        subcode,
    })
}
