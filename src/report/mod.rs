use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{
    Chart, ChartLegendPosition, ChartType, ExcelDateTime, Format, Table as SheetTable,
    TableColumn, TableStyle, Workbook, Worksheet, XlsxError,
};
use serde_json::Value;

use crate::core::{SummaryReport, SummaryValue, Table};

mod chart;

pub use chart::{ChartOutcome, DailyTotals, daily_totals};

pub const SUMMARY_SHEET: &str = "Summary";
pub const CHART_SHEET: &str = "Chart";

const DEFAULT_COLUMN_WIDTH: f64 = 12.0;
const MAX_CELL_CHARS: usize = 32_767;

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: &'static str,
    pub table: Table,
}

/// Everything that ends up in the workbook, in sheet order after Summary and Chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookContents {
    pub summary: SummaryReport,
    pub chart: ChartOutcome,
    pub sheets: Vec<Sheet>,
}

impl WorkbookContents {
    pub fn sheet_names(&self) -> Vec<&'static str> {
        let mut names = vec![SUMMARY_SHEET];
        if matches!(self.chart, ChartOutcome::Built(_)) {
            names.push(CHART_SHEET);
        }
        names.extend(self.sheets.iter().map(|s| s.name));
        names
    }
}

/// Writes the workbook. Any failure is a report-write failure.
pub fn write_workbook(path: &Path, contents: &WorkbookContents) -> Result<()> {
    let mut workbook = Workbook::new();
    fill_workbook(&mut workbook, contents).map_err(crate::exit::report_write_err)?;
    workbook
        .save(path)
        .with_context(|| format!("failed to save the workbook: {}", path.display()))
        .map_err(crate::exit::report_write_err)
}

fn fill_workbook(workbook: &mut Workbook, contents: &WorkbookContents) -> Result<()> {
    write_summary_sheet(workbook, &contents.summary)
        .with_context(|| format!("failed to write the {SUMMARY_SHEET} sheet"))?;
    if let ChartOutcome::Built(days) = &contents.chart {
        write_chart_sheet(workbook, days)
            .with_context(|| format!("failed to write the {CHART_SHEET} sheet"))?;
    }
    for sheet in &contents.sheets {
        write_table_sheet(workbook, sheet.name, &sheet.table)
            .with_context(|| format!("failed to write the {} sheet", sheet.name))?;
    }
    Ok(())
}

fn write_summary_sheet(workbook: &mut Workbook, summary: &SummaryReport) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(SUMMARY_SHEET)?;

    let headers = ["Name".to_string(), "Value".to_string()];
    write_headers(sheet, &headers)?;

    let mut label_width = headers[0].chars().count();
    let mut value_width = headers[1].chars().count();
    for (i, entry) in summary.entries().iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, clip(&entry.label))?;
        match &entry.value {
            SummaryValue::Marker => {}
            SummaryValue::Text(s) => {
                sheet.write_string(row, 1, clip(s))?;
            }
            SummaryValue::Count(n) => {
                sheet.write_number(row, 1, *n as f64)?;
            }
            SummaryValue::Gigabytes(gb) => {
                sheet.write_number(row, 1, *gb)?;
            }
        }
        label_width = label_width.max(entry.label.chars().count());
        value_width = value_width.max(entry.value.to_string().chars().count());
    }

    add_table(sheet, &headers, summary.len())?;
    sheet.set_column_width(0, label_width as f64)?;
    sheet.set_column_width(1, value_width as f64)?;
    Ok(())
}

fn write_chart_sheet(workbook: &mut Workbook, days: &[DailyTotals]) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(CHART_SHEET)?;

    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    sheet.write_string(0, 0, "Date")?;
    sheet.write_string(0, 1, "BackupSize-GB")?;
    sheet.write_string(0, 2, "PostComp-GB")?;
    for (i, day) in days.iter().enumerate() {
        let row = (i + 1) as u32;
        let date = ExcelDateTime::from_ymd(
            day.date.year() as u16,
            day.date.month() as u8,
            day.date.day(),
        )?;
        sheet.write_datetime_with_format(row, 0, &date, &date_format)?;
        sheet.write_number(row, 1, day.backup_gb)?;
        sheet.write_number(row, 2, day.post_comp_gb)?;
    }
    sheet.set_column_width(0, DEFAULT_COLUMN_WIDTH)?;

    let last_row = days.len() as u32;
    let mut chart = Chart::new(ChartType::Column);
    for col in 1..=2u16 {
        chart
            .add_series()
            .set_name((CHART_SHEET, 0, col))
            .set_categories((CHART_SHEET, 1, 0, last_row, 0))
            .set_values((CHART_SHEET, 1, col, last_row, col));
    }
    chart.x_axis().set_name("Date").set_date_axis(true);
    chart
        .y_axis()
        .set_name("Size(GB)")
        .set_major_gridlines(false);
    chart.legend().set_position(ChartLegendPosition::Top);
    chart.set_width(900).set_height(576);

    sheet.insert_chart(1, 4, &chart)?;
    Ok(())
}

fn write_table_sheet(workbook: &mut Workbook, name: &str, table: &Table) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    if table.columns.is_empty() {
        return Ok(());
    }

    write_headers(sheet, &table.columns)?;
    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            write_cell(sheet, r, c as u16, cell)?;
        }
    }

    add_table(sheet, &table.columns, table.len())?;
    for col in 0..table.columns.len() {
        sheet.set_column_width(col as u16, DEFAULT_COLUMN_WIDTH)?;
    }
    Ok(())
}

fn write_headers(sheet: &mut Worksheet, headers: &[String]) -> Result<(), XlsxError> {
    for (c, header) in headers.iter().enumerate() {
        sheet.write_string(0, c as u16, clip(header))?;
    }
    Ok(())
}

/// Wraps header plus `rows` data rows in a styled table. Header-only sheets
/// stay plain cells.
fn add_table(sheet: &mut Worksheet, headers: &[String], rows: usize) -> Result<(), XlsxError> {
    if headers.is_empty() || rows == 0 {
        return Ok(());
    }
    let columns: Vec<TableColumn> = headers
        .iter()
        .map(|h| TableColumn::new().set_header(h))
        .collect();
    let table = SheetTable::new()
        .set_columns(&columns)
        .set_style(TableStyle::Medium2);
    sheet.add_table(0, 0, rows as u32, (headers.len() - 1) as u16, &table)?;
    Ok(())
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Value) -> Result<(), XlsxError> {
    match cell {
        Value::Null => {}
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(v) => {
                sheet.write_number(row, col, v)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, clip(s))?;
        }
        other => {
            sheet.write_string(row, col, clip(&other.to_string()))?;
        }
    }
    Ok(())
}

/// Excel rejects cells longer than 32767 characters.
fn clip(s: &str) -> &str {
    match s.char_indices().nth(MAX_CELL_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contents(chart: ChartOutcome) -> WorkbookContents {
        WorkbookContents {
            summary: SummaryReport::new()
                .section("ASSET SUMMARY")
                .with("VMWARE_VIRTUAL_MACHINE", SummaryValue::Count(3))
                .with("Total Assets Size (GB)", SummaryValue::Gigabytes(12.5)),
            chart,
            sheets: vec![
                Sheet {
                    name: "Assets",
                    table: Table {
                        columns: vec!["Name".to_string(), "Size".to_string()],
                        rows: vec![
                            vec![json!("vm-01"), json!(1024)],
                            vec![json!("vm-02"), Value::Null],
                        ],
                    },
                },
                Sheet {
                    name: "ServerDR",
                    table: Table::default(),
                },
            ],
        }
    }

    #[test]
    fn clip_keeps_short_text_and_cuts_long_text() {
        assert_eq!(clip("abc"), "abc");
        let long = "é".repeat(MAX_CELL_CHARS + 5);
        assert_eq!(clip(&long).chars().count(), MAX_CELL_CHARS);
    }

    #[test]
    fn chart_sheet_listed_only_when_built() {
        let skipped = contents(ChartOutcome::Skipped {
            reason: "no data".to_string(),
        });
        assert_eq!(skipped.sheet_names(), vec!["Summary", "Assets", "ServerDR"]);

        let built = contents(ChartOutcome::Built(vec![]));
        assert_eq!(
            built.sheet_names(),
            vec!["Summary", "Chart", "Assets", "ServerDR"]
        );
    }

    #[test]
    fn workbook_is_written_with_empty_sheets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xlsx");
        let days = vec![DailyTotals {
            date: time::macros::date!(2026 - 10 - 01),
            backup_gb: 1.5,
            post_comp_gb: 0.25,
        }];
        write_workbook(&path, &contents(ChartOutcome::Built(days))).expect("write");
        let bytes = std::fs::read(&path).expect("read");
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn unwritable_path_is_a_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing-dir").join("out.xlsx");
        let err = write_workbook(
            &path,
            &contents(ChartOutcome::Skipped {
                reason: "x".to_string(),
            }),
        )
        .unwrap_err();
        assert_eq!(crate::exit::exit_code(&err), 30);
    }
}
