use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

use crate::aggregate::bytes_to_gb;
use crate::core::{Table, as_number};

const CREATE_TIME: &str = "createTime";
const ASSET_SIZE: &str = "Asset Size";
const POST_COMP: &str = "PostComp";

/// Backup volume for one calendar day of the report window.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub date: Date,
    pub backup_gb: f64,
    pub post_comp_gb: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Built(Vec<DailyTotals>),
    Skipped { reason: String },
}

impl ChartOutcome {
    /// Tries to aggregate the activities table; failure becomes `Skipped`.
    pub fn from_activities(activities: &Table) -> Self {
        match daily_totals(activities) {
            Ok(days) => ChartOutcome::Built(days),
            Err(err) => ChartOutcome::Skipped {
                reason: format!("{err:#}"),
            },
        }
    }
}

/// Sums per-activity GB figures by the calendar date of `createTime`,
/// oldest day first. Each activity is rounded to two decimals before summing.
pub fn daily_totals(activities: &Table) -> Result<Vec<DailyTotals>> {
    let Some(time_idx) = activities.column_index(CREATE_TIME) else {
        bail!("activities carry no {CREATE_TIME} column");
    };
    if activities.is_empty() {
        bail!("no activities in the report window");
    }
    let size_idx = activities.column_index(ASSET_SIZE);
    let post_idx = activities.column_index(POST_COMP);

    let mut by_day: BTreeMap<Date, (f64, f64)> = BTreeMap::new();
    for row in &activities.rows {
        let date = match row.get(time_idx) {
            Some(Value::String(s)) => OffsetDateTime::parse(s.trim(), &Rfc3339)
                .with_context(|| format!("unparsable {CREATE_TIME}: {s}"))?
                .date(),
            other => bail!("unusable {CREATE_TIME}: {other:?}"),
        };
        let gb_at = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .and_then(as_number)
                .map(bytes_to_gb)
                .unwrap_or(0.0)
        };
        let entry = by_day.entry(date).or_insert((0.0, 0.0));
        entry.0 += gb_at(size_idx);
        entry.1 += gb_at(post_idx);
    }

    Ok(by_day
        .into_iter()
        .map(|(date, (backup, post))| DailyTotals {
            date,
            backup_gb: round2(backup),
            post_comp_gb: round2(post),
        })
        .collect())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn activities(rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: vec![
                "Policy Name".to_string(),
                CREATE_TIME.to_string(),
                ASSET_SIZE.to_string(),
                POST_COMP.to_string(),
            ],
            rows,
        }
    }

    #[test]
    fn totals_are_grouped_by_day_in_date_order() {
        let table = activities(vec![
            vec![json!("p"), json!("2026-10-02T23:10:00.000Z"), json!(2 * GIB), json!(GIB)],
            vec![json!("p"), json!("2026-10-01T08:00:00.000Z"), json!(GIB), Value::Null],
            vec![json!("p"), json!("2026-10-02T01:00:00.000Z"), json!(GIB / 2), json!(GIB / 4)],
        ]);
        let days = daily_totals(&table).expect("totals");
        assert_eq!(
            days,
            vec![
                DailyTotals {
                    date: date!(2026 - 10 - 01),
                    backup_gb: 1.0,
                    post_comp_gb: 0.0
                },
                DailyTotals {
                    date: date!(2026 - 10 - 02),
                    backup_gb: 2.5,
                    post_comp_gb: 1.25
                },
            ]
        );
    }

    #[test]
    fn daily_halves_round_to_even() {
        let table = activities(vec![vec![
            json!("p"),
            json!("2026-10-03T10:00:00.000Z"),
            json!(GIB / 8),
            json!(GIB / 8 * 5),
        ]]);
        let days = daily_totals(&table).expect("totals");
        assert_eq!(days[0].backup_gb, 0.12);
        assert_eq!(days[0].post_comp_gb, 0.62);
    }

    #[test]
    fn chart_is_skipped_without_usable_timestamps() {
        let mut table = activities(vec![vec![
            json!("p"),
            json!("yesterday"),
            json!(1),
            json!(1),
        ]]);
        assert!(matches!(
            ChartOutcome::from_activities(&table),
            ChartOutcome::Skipped { .. }
        ));

        table.rows.clear();
        assert!(matches!(
            ChartOutcome::from_activities(&table),
            ChartOutcome::Skipped { .. }
        ));

        assert!(matches!(
            ChartOutcome::from_activities(&Table::default()),
            ChartOutcome::Skipped { .. }
        ));
    }
}
