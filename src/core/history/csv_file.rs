//! CSV export and import of the history.
//!
//! One row per entry, newest first:
//! ```text
//! Fecha,Hora,Tipo,Operación,Entrada A,Entrada B,Resultado,Duración (ms)
//! 05/03/2024,14:07:09,vector,sum,"{""x"":3.0,""y"":4.0,""z"":2.0}",...
//! ```
//! Operands and results are JSON, quoted by the CSV writer. Dates and times are UTC.
use crate::core::history::HistoryEntry;
use crate::core::prelude::*;
use crate::util::vm_float;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

pub const CSV_HEADER: [&str; 8] = [
    "Fecha",
    "Hora",
    "Tipo",
    "Operación",
    "Entrada A",
    "Entrada B",
    "Resultado",
    "Duración (ms)",
];

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[day]/[month]/[year]");
const TIME_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

pub fn date_and_time(timestamp: OffsetDateTime) -> Result<(String, String)> {
    let utc = timestamp.to_offset(time::UtcOffset::UTC);
    Ok((utc.format(DATE_FORMAT)?, utc.format(TIME_FORMAT)?))
}

fn parse_timestamp(date: &str, time: &str) -> Result<OffsetDateTime> {
    let date = Date::parse(date.trim(), DATE_FORMAT)
        .with_context(|| format!("invalid date `{date}`"))?;
    let time = Time::parse(time.trim(), TIME_FORMAT)
        .with_context(|| format!("invalid time `{time}`"))?;
    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}

pub fn export(entries: &[HistoryEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        let (date, time) = date_and_time(entry.timestamp)?;
        let input_b = match &entry.input_b {
            Some(value) => serde_json::to_string(value)?,
            None => String::new(),
        };
        let duration = if entry.duration > 0.0 {
            vm_float::format_plain(entry.duration)
        } else {
            String::new()
        };
        writer.write_record([
            date,
            time,
            entry.kind.to_string(),
            entry.operation.clone(),
            serde_json::to_string(&entry.input_a)?,
            input_b,
            serde_json::to_string(&entry.result)?,
            duration,
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| anyhow!("{e}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Parses every row after the header. Fails on the first malformed row, naming its line; no
/// partial result is ever returned. Imported entries get `id` 0; the store assigns real ones.
pub fn import(contents: &str) -> Result<Vec<HistoryEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(contents.as_bytes());
    let mut rv = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed CSV")?;
        let line = record.position().map_or(0, csv::Position::line);
        let entry = parse_record(&record).with_context(|| format!("line {line}"))?;
        rv.push(entry);
    }
    Ok(rv)
}

fn parse_record(record: &csv::StringRecord) -> Result<HistoryEntry> {
    if record.len() != CSV_HEADER.len() {
        bail!("expected {} fields, found {}", CSV_HEADER.len(), record.len());
    }
    let field = |i: usize| record.get(i).unwrap_or_default().trim();
    let operation = field(3);
    if operation.is_empty() {
        bail!("missing operation");
    }
    let input_b = match field(5) {
        "" => None,
        json => Some(serde_json::from_str(json).context("invalid Entrada B")?),
    };
    let duration = match field(7) {
        "" => 0.0,
        s => s
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)
            .with_context(|| format!("invalid duration `{s}`"))?,
    };
    Ok(HistoryEntry {
        id: 0,
        timestamp: parse_timestamp(field(0), field(1))?,
        kind: field(2).parse()?,
        operation: operation.to_string(),
        input_a: serde_json::from_str(field(4)).context("invalid Entrada A")?,
        input_b,
        result: serde_json::from_str(field(6)).context("invalid Resultado")?,
        duration,
    })
}
