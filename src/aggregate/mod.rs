use crate::core::{SummaryReport, SummaryValue, Table, as_number, as_text};
use crate::resources::DrCopies;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

pub const TRIAL_SKU: &str = "POWERPROTECT SW TRIAL";

const ONE_MB: f64 = 1_000_000.0;
const FIVE_MB: f64 = 5_000_000.0;

/// Bytes to GiB, rounded to two decimals with ties going to the even digit.
pub fn bytes_to_gb(bytes: f64) -> f64 {
    (bytes / GIB * 100.0).round_ties_even() / 100.0
}

/// Everything the summary sheet is computed from.
#[derive(Debug, Clone, Copy)]
pub struct SummaryInputs<'a> {
    pub dr_copies: &'a DrCopies,
    pub licenses: &'a Table,
    pub assets: &'a Table,
    pub activities: &'a Table,
    pub job_groups: &'a Table,
    pub dedup_containers: &'a Table,
    pub report_days: u32,
}

/// Builds the summary sheet. Section order is presentation order.
pub fn build_summary(inputs: &SummaryInputs<'_>) -> SummaryReport {
    let report = SummaryReport::new();
    let report = server_section(report, inputs.dr_copies);
    let report = license_section(report, inputs.licenses);
    let report = asset_section(report, inputs.assets);
    let report = activity_section(report, inputs.activities, inputs.report_days);
    let report = throughput_section(report, inputs.job_groups);
    dedup_section(report, inputs.dedup_containers)
}

pub fn server_section(report: SummaryReport, dr_copies: &DrCopies) -> SummaryReport {
    let mut report = report.section("PPDM SERVER DETAILS");
    if let Some(host) = dr_copies.first("hostname").and_then(as_text) {
        report.insert("PPDM Hostname", SummaryValue::Text(host));
    }
    if let Some(version) = dr_copies.first("version").and_then(as_text) {
        report.insert("PPDM Version", SummaryValue::Text(version));
    }
    report
}

/// Reads the first license key. Trial installs report their end date,
/// everything else its license type.
pub fn license_section(mut report: SummaryReport, licenses: &Table) -> SummaryReport {
    let first = |column: &str| {
        let idx = licenses.column_index(column)?;
        licenses.rows.first()?.get(idx).and_then(as_text)
    };

    let feature = first("featureName");
    if let Some(feature) = &feature {
        report.insert("License Feature", SummaryValue::Text(feature.clone()));
    }
    if feature.as_deref() == Some(TRIAL_SKU) {
        if let Some(end) = first("endDate") {
            report.insert("Expiry Date", SummaryValue::Text(end));
        }
    } else if let Some(license_type) = first("licenseType") {
        report.insert("License Type", SummaryValue::Text(license_type));
    }
    report
}

pub fn asset_section(report: SummaryReport, assets: &Table) -> SummaryReport {
    let mut report = report.section("ASSET SUMMARY");
    insert_counts(&mut report, assets, "Type");
    insert_counts(&mut report, assets, "Protection Status");
    report
        .with(
            "Total Assets Size (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(assets, "Size"))),
        )
        .with(
            "Protection Size (GB) - FETB",
            SummaryValue::Gigabytes(bytes_to_gb(sum(assets, "Protection Capacity(b)"))),
        )
}

/// Dedupe buckets overlap: a ratio below 1 also counts toward the
/// below-3 bucket, and a ratio of exactly 3 counts nowhere.
pub fn activity_section(report: SummaryReport, activities: &Table, days: u32) -> SummaryReport {
    let mut report = report.section(format!("ACTIVITIES SUMMARY - {days} DAYS"));
    insert_counts(&mut report, activities, "Status");
    report
        .with(
            "Backup Size (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(activities, "Asset Size"))),
        )
        .with(
            "Transferred Size (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(activities, "Data Transferred"))),
        )
        .with(
            "PostComp Size (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(activities, "PostComp"))),
        )
        .with(
            "Compression (< 1x) Clients",
            SummaryValue::Count(count_where(activities, "Dedupe Ratio", |r| r < 1.0)),
        )
        .with(
            "Compression (< 3x) Clients",
            SummaryValue::Count(count_where(activities, "Dedupe Ratio", |r| r < 3.0)),
        )
        .with(
            "Compression (> 3x) Clients",
            SummaryValue::Count(count_where(activities, "Dedupe Ratio", |r| r > 3.0)),
        )
}

/// Both thresholds are counted independently, so slow jobs land in both.
pub fn throughput_section(report: SummaryReport, job_groups: &Table) -> SummaryReport {
    report
        .with(
            "Backup Throughput (< 1MB) Clients",
            SummaryValue::Count(count_where(job_groups, "Throughput(bytes)", |t| t < ONE_MB)),
        )
        .with(
            "Backup Throughput (< 5MB) Clients",
            SummaryValue::Count(count_where(job_groups, "Throughput(bytes)", |t| t < FIVE_MB)),
        )
}

/// `dayPreComp`/`dayPostComp` are the storage system's own last-day figures.
pub fn dedup_section(report: SummaryReport, containers: &Table) -> SummaryReport {
    report
        .section("DATA DOMAIN SUMMARY - LAST DAY")
        .with(
            "PreComp (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(containers, "attributes.dayPreComp"))),
        )
        .with(
            "PostComp (GB)",
            SummaryValue::Gigabytes(bytes_to_gb(sum(containers, "attributes.dayPostComp"))),
        )
}

fn insert_counts(report: &mut SummaryReport, table: &Table, column: &str) {
    for (label, count) in count_by(table, column) {
        report.insert(label, SummaryValue::Count(count));
    }
}

/// Occurrences per distinct value, most frequent first; ties keep first-seen order.
pub fn count_by(table: &Table, column: &str) -> Vec<(String, u64)> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for key in table.column(column).filter_map(as_text) {
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
    counts
}

/// Column total; absent columns and non-numeric cells add nothing.
pub fn sum(table: &Table, column: &str) -> f64 {
    table.column(column).filter_map(as_number).sum()
}

pub fn count_where(table: &Table, column: &str, pred: impl Fn(f64) -> bool) -> u64 {
    table
        .column(column)
        .filter_map(as_number)
        .filter(|v| pred(*v))
        .count() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    fn count(report: &SummaryReport, label: &str) -> Option<u64> {
        match report.get(label) {
            Some(SummaryValue::Count(n)) => Some(*n),
            _ => None,
        }
    }

    fn gb(report: &SummaryReport, label: &str) -> Option<f64> {
        match report.get(label) {
            Some(SummaryValue::Gigabytes(v)) => Some(*v),
            _ => None,
        }
    }

    #[test]
    fn gb_conversion_rounds_to_two_places() {
        assert_eq!(bytes_to_gb(0.0), 0.0);
        assert_eq!(bytes_to_gb(GIB), 1.0);
        assert_eq!(bytes_to_gb(1_610_612_736.0), 1.5);
        assert_eq!(bytes_to_gb(123_456_789_012.0), 114.98);
    }

    #[test]
    fn gb_halves_round_to_even() {
        assert_eq!(bytes_to_gb(134_217_728.0), 0.12);
        assert_eq!(bytes_to_gb(671_088_640.0), 0.62);
        assert_eq!(bytes_to_gb(402_653_184.0), 0.38);
    }

    #[test]
    fn dedupe_buckets_overlap() {
        let activities = table(
            &["Dedupe Ratio"],
            vec![vec![json!(0.5)], vec![json!(2.0)], vec![json!(4.0)]],
        );
        let report = activity_section(SummaryReport::new(), &activities, 30);
        assert_eq!(count(&report, "Compression (< 1x) Clients"), Some(1));
        assert_eq!(count(&report, "Compression (< 3x) Clients"), Some(2));
        assert_eq!(count(&report, "Compression (> 3x) Clients"), Some(1));
    }

    #[test]
    fn dedupe_bucket_counts_are_ordered() {
        let ratios = [0.2, 0.9, 1.0, 2.9, 3.0, 3.1, 10.0];
        let mut rows: Vec<Vec<Value>> = ratios.iter().map(|r| vec![json!(r)]).collect();
        rows.push(vec![Value::Null]);
        let activities = table(&["Dedupe Ratio"], rows);
        let below_one = count_where(&activities, "Dedupe Ratio", |r| r < 1.0);
        let below_three = count_where(&activities, "Dedupe Ratio", |r| r < 3.0);
        let above_three = count_where(&activities, "Dedupe Ratio", |r| r > 3.0);
        assert_eq!((below_one, below_three, above_three), (2, 4, 2));
        assert!(below_one <= below_three);
        assert!(below_three <= ratios.len() as u64);
        assert!(below_one + below_three + above_three > ratios.len() as u64);
    }

    #[test]
    fn throughput_thresholds_count_independently() {
        let jobs = table(
            &["Throughput(bytes)"],
            vec![vec![json!(500_000)], vec![json!(2_000_000)], vec![json!(9_000_000)]],
        );
        let report = throughput_section(SummaryReport::new(), &jobs);
        assert_eq!(count(&report, "Backup Throughput (< 1MB) Clients"), Some(1));
        assert_eq!(count(&report, "Backup Throughput (< 5MB) Clients"), Some(2));
    }

    #[test]
    fn trial_license_reports_expiry_date() {
        let licenses = table(
            &["featureName", "endDate", "licenseType"],
            vec![vec![json!(TRIAL_SKU), json!("2026-12-31"), json!("EVALUATION")]],
        );
        let report = license_section(SummaryReport::new(), &licenses);
        assert_eq!(
            report.get("Expiry Date"),
            Some(&SummaryValue::Text("2026-12-31".to_string()))
        );
        assert_eq!(report.get("License Type"), None);
    }

    #[test]
    fn non_trial_license_reports_license_type() {
        let licenses = table(
            &["featureName", "endDate", "licenseType"],
            vec![vec![json!("POWERPROTECT DM"), json!("2030-01-01"), json!("PERMANENT")]],
        );
        let report = license_section(SummaryReport::new(), &licenses);
        assert_eq!(report.get("Expiry Date"), None);
        assert_eq!(
            report.get("License Type"),
            Some(&SummaryValue::Text("PERMANENT".to_string()))
        );
        assert_eq!(
            report.get("License Feature"),
            Some(&SummaryValue::Text("POWERPROTECT DM".to_string()))
        );
    }

    #[test]
    fn no_licenses_no_entries() {
        let report = license_section(SummaryReport::new(), &Table::default());
        assert!(report.is_empty());
    }

    #[test]
    fn absent_numbers_sum_to_zero() {
        let report = asset_section(SummaryReport::new(), &Table::default());
        assert_eq!(gb(&report, "Total Assets Size (GB)"), Some(0.0));
        assert_eq!(gb(&report, "Protection Size (GB) - FETB"), Some(0.0));

        let report = dedup_section(SummaryReport::new(), &Table::default());
        assert_eq!(gb(&report, "PreComp (GB)"), Some(0.0));
    }

    #[test]
    fn string_encoded_capacities_are_summed() {
        let containers = table(
            &["attributes.dayPreComp", "attributes.dayPostComp"],
            vec![
                vec![json!("1073741824"), json!("536870912")],
                vec![json!("1073741824"), Value::Null],
            ],
        );
        let report = dedup_section(SummaryReport::new(), &containers);
        assert_eq!(gb(&report, "PreComp (GB)"), Some(2.0));
        assert_eq!(gb(&report, "PostComp (GB)"), Some(0.5));
    }

    #[test]
    fn category_counts_are_most_frequent_first() {
        let assets = table(
            &["Type"],
            vec![
                vec![json!("FILE_SYSTEM")],
                vec![json!("VMWARE_VIRTUAL_MACHINE")],
                vec![json!("VMWARE_VIRTUAL_MACHINE")],
                vec![Value::Null],
            ],
        );
        assert_eq!(
            count_by(&assets, "Type"),
            vec![
                ("VMWARE_VIRTUAL_MACHINE".to_string(), 2),
                ("FILE_SYSTEM".to_string(), 1)
            ]
        );
    }

    #[test]
    fn sections_appear_in_presentation_order() {
        let dr = DrCopies::Fetched(table(
            &["hostname", "version"],
            vec![vec![json!("ppdm-01"), json!("19.14")]],
        ));
        let empty = Table::default();
        let report = build_summary(&SummaryInputs {
            dr_copies: &dr,
            licenses: &empty,
            assets: &empty,
            activities: &empty,
            job_groups: &empty,
            dedup_containers: &empty,
            report_days: 7,
        });
        let markers: Vec<&str> = report
            .entries()
            .iter()
            .filter(|e| e.value == SummaryValue::Marker)
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(
            markers,
            vec![
                "PPDM SERVER DETAILS",
                "ASSET SUMMARY",
                "ACTIVITIES SUMMARY - 7 DAYS",
                "DATA DOMAIN SUMMARY - LAST DAY"
            ]
        );
        assert_eq!(report.entries()[1].label, "PPDM Hostname");
    }
}
