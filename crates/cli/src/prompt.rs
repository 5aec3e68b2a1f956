//! Line-based prompts for the interactive form

use anyhow::{bail, Result};
use pollutant_lib::models::{InputBounds, RawInput};
use std::io::{BufRead, Write};

/// Ask for an integer in `min..=max`, re-prompting until one is given.
/// An empty line takes `default`.
pub fn prompt_number<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    label: &str,
    min: i64,
    max: i64,
    default: i64,
) -> Result<i64> {
    loop {
        write!(writer, "{} [{}]: ", label, default)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            bail!("Input closed before {} was entered", label);
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(default);
        }

        match trimmed.parse::<i64>() {
            Ok(value) if (min..=max).contains(&value) => return Ok(value),
            Ok(_) => writeln!(writer, "Please enter a value between {} and {}", min, max)?,
            Err(_) => writeln!(writer, "Please enter a valid number")?,
        }
    }
}

/// Collect year, month and station id within the form bounds
pub fn prompt_input<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    bounds: &InputBounds,
) -> Result<RawInput> {
    let defaults = bounds.default_input();

    let year = prompt_number(
        reader,
        writer,
        "Enter year",
        bounds.year_min as i64,
        bounds.year_max as i64,
        defaults.year as i64,
    )?;
    let month = prompt_number(
        reader,
        writer,
        "Enter month",
        bounds.month_min as i64,
        bounds.month_max as i64,
        defaults.month as i64,
    )?;
    let station_id = prompt_number(
        reader,
        writer,
        "Enter station id",
        bounds.station_min,
        bounds.station_max,
        defaults.station_id,
    )?;

    Ok(RawInput::new(year as i32, month as u32, station_id))
}
