//! CSV reading and writing for member import and export.

use std::collections::HashMap;

use thiserror::Error;

use crate::import::RawImportRow;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("CSV file is empty")]
    Empty,
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("CSV file has more than {max} data rows")]
    TooManyRows { max: usize },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write CSV: {0}")]
    Io(#[from] std::io::Error),
}

fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Parses an uploaded member CSV into raw rows.
///
/// Recognized columns are `name`, `surname`, `email`, `phone`, `address`, `days` and
/// `price`, matched case-insensitively. Only `name` and `surname` are required; other
/// columns are ignored.
pub fn parse_member_rows(data: &[u8], max_rows: usize) -> Result<Vec<RawImportRow>, TabularError> {
    let data = strip_utf8_bom(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(TabularError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, header)| (header.trim().to_lowercase(), index))
        .collect();

    for required in ["name", "surname"] {
        if !columns.contains_key(required) {
            return Err(TabularError::MissingColumn(required));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        if rows.len() == max_rows {
            return Err(TabularError::TooManyRows { max: max_rows });
        }

        let field = |column: &str| -> Option<String> {
            columns
                .get(column)
                .and_then(|&index| record.get(index))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        rows.push(RawImportRow {
            name: field("name").unwrap_or_default(),
            surname: field("surname").unwrap_or_default(),
            email: field("email"),
            phone: field("phone"),
            address: field("address"),
            days: field("days"),
            price: field("price"),
        });
    }

    Ok(rows)
}

/// Writes `headers` followed by `rows` as CSV.
pub fn write_csv<I, R>(headers: &[&str], rows: I) -> Result<Vec<u8>, TabularError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|error| TabularError::Io(error.into_error()))
}
