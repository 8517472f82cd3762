use std::collections::BTreeMap;

use crate::run::EquityPoint;

/// Default row budget for the point-form reader. The header-form reader is
/// unbounded unless the caller passes a budget.
pub const DEFAULT_POINT_ROW_BUDGET: usize = 400;

/// Splits one comma-delimited line into field values.
///
/// A field wrapped in double quotes may contain delimiters; two consecutive
/// double quotes inside a quoted field are one literal quote. Quoting state
/// starts false and toggles on an unescaped quote character. Unquoted bytes
/// are reproduced exactly — no trimming, no coercion.
pub fn split_delimited_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(ch),
        }
    }

    fields.push(field);
    fields
}

/// Reads a header-form document: the first row names the fields, every
/// following non-blank row maps positionally onto those names. Missing
/// trailing fields default to empty text; surplus fields beyond the header
/// are dropped. Rows past `budget` are ignored (earliest rows are kept).
pub fn read_records(doc: &str, budget: Option<usize>) -> Vec<BTreeMap<String, String>> {
    let mut lines = doc.lines();
    let header = match lines.next() {
        Some(line) => split_delimited_line(line),
        None => return Vec::new(),
    };

    let mut records = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if budget.is_some_and(|limit| records.len() >= limit) {
            break;
        }

        let values = split_delimited_line(line);
        let mut record = BTreeMap::new();
        for (idx, name) in header.iter().enumerate() {
            record.insert(name.clone(), values.get(idx).cloned().unwrap_or_default());
        }
        records.push(record);
    }
    records
}

/// Reads a point-form document: a header row followed by `(date, equity)`
/// rows. Rows with fewer than two fields or a non-finite equity value are
/// silently skipped; a bad row never fails the document.
pub fn read_points(doc: &str, budget: usize) -> Vec<EquityPoint> {
    let mut points = Vec::new();
    for line in doc.lines().skip(1) {
        if points.len() >= budget {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = split_delimited_line(line);
        if fields.len() < 2 {
            continue;
        }
        let equity = match fields[1].trim().parse::<f64>() {
            Ok(value) if value.is_finite() => value,
            _ => continue,
        };

        points.push(EquityPoint {
            date: std::mem::take(&mut fields[0]),
            equity,
        });
    }
    points
}
