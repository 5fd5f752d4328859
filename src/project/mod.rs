use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::core::{FlatRecord, Projection, Table};

const DISPLAY_TIMESTAMP: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour repr:12]:[minute]:[second] [period case:upper]"
);

/// Builds a table from flattened records.
///
/// With a field spec, a field becomes a column only if at least one record
/// carries it, either under its source path or already under its label. Columns
/// keep the field list's order and are named by label. Records missing a column get
/// `Value::Null` in that cell.
pub fn project(records: &[FlatRecord], projection: Projection) -> Table {
    let columns: Vec<(String, Vec<String>)> = match projection {
        Projection::Fields(spec) => spec
            .fields()
            .iter()
            .filter_map(|field| {
                let keys: Vec<String> = [field.path, field.label]
                    .into_iter()
                    .filter(|key| records.iter().any(|r| r.contains_key(*key)))
                    .map(str::to_string)
                    .collect();
                if keys.is_empty() {
                    None
                } else {
                    Some((field.label.to_string(), keys))
                }
            })
            .collect(),
        Projection::AllColumns => {
            let mut seen: Vec<String> = Vec::new();
            for record in records {
                for key in record.keys() {
                    if !seen.iter().any(|s| s == key) {
                        seen.push(key.clone());
                    }
                }
            }
            seen.into_iter().map(|k| (k.clone(), vec![k])).collect()
        }
    };

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|(_, keys)| {
                    keys.iter()
                        .find_map(|k| record.get(k))
                        .cloned()
                        .unwrap_or(Value::Null)
                })
                .collect()
        })
        .collect();

    Table {
        columns: columns.into_iter().map(|(label, _)| label).collect(),
        rows,
    }
}

/// Drops rows whose cell in `label` is null or missing. A table without the
/// column loses every row.
pub fn drop_rows_without(table: &mut Table, label: &str) {
    let idx = table.column_index(label);
    table.retain_rows(|row| match idx.and_then(|i| row.get(i)) {
        Some(Value::Null) | None => false,
        Some(_) => true,
    });
}

/// Rewrites RFC 3339 timestamps in `label` as `2023-09-26 03:04:05 PM`, in the
/// timestamp's own offset. Cells that do not parse are left as they are.
pub fn reformat_timestamps(table: &mut Table, label: &str) {
    table.map_column(label, |cell| match cell {
        Value::String(s) => display_timestamp(s)
            .map(Value::String)
            .unwrap_or_else(|| cell.clone()),
        other => other.clone(),
    });
}

fn display_timestamp(raw: &str) -> Option<String> {
    let ts = OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()?;
    ts.format(DISPLAY_TIMESTAMP).ok()
}
