//! Interactive review of a proposed record before it is saved.

use std::io::{BufRead, Write};

use anyhow::Result;
use pricesnap_core::RecordDraft;
use pricesnap_understanding::parse_price;

use crate::terminal_output::format_price;

/// Let the user correct the proposed name and price, then confirm.
///
/// An empty answer keeps the proposed value. Returns `None` when the user
/// declines or input ends, in which case nothing should be stored.
pub fn review_draft<R: BufRead, W: Write>(
    mut draft: RecordDraft,
    input: &mut R,
    output: &mut W,
) -> Result<Option<RecordDraft>> {
    let Some(name) = ask(input, output, &format!("Product name [{}]: ", draft.name))? else {
        return Ok(None);
    };
    if !name.is_empty() {
        draft.name = name;
    }

    loop {
        let Some(price) = ask(input, output, &format!("Price [{}]: ", format_price(draft.price)))? else {
            return Ok(None);
        };
        if price.is_empty() {
            break;
        }
        match parse_price(&price) {
            Ok(value) if value >= 0.0 => {
                draft.price = value;
                break;
            }
            Ok(_) => writeln!(output, "Price cannot be negative.")?,
            Err(e) => writeln!(output, "{e}")?,
        }
    }

    let Some(answer) = ask(
        input,
        output,
        &format!("Save \"{}\" at {}? [Y/n]: ", draft.name, format_price(draft.price)),
    )?
    else {
        return Ok(None);
    };
    match answer.to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Ok(Some(draft)),
        _ => Ok(None),
    }
}

/// Print `prompt` and read one trimmed line; `None` on end of input.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
