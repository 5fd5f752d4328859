use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};
use tracing::{debug, warn};

use crate::api::ApiClient;
use crate::core::{FlatRecord, Projection, Table, flatten};
use crate::project::{drop_rows_without, project, reformat_timestamps};

pub mod fields;

/// Creation-time floor the appliance filters accept for "everything".
const HISTORY_FLOOR: &str = "2010-05-06T11:20:21.843Z";

const CUTOFF_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ApplianceConfig,
    Policies,
    Assets,
    InventorySources,
    StorageSystems,
    ProtectionEngines,
    AppAgents,
    Activities,
    JobGroups,
    DedupContainers,
    Licenses,
    DrCopies,
}

impl ResourceKind {
    /// Fetch order for one run.
    pub const ALL: [ResourceKind; 12] = [
        ResourceKind::ApplianceConfig,
        ResourceKind::Policies,
        ResourceKind::Assets,
        ResourceKind::InventorySources,
        ResourceKind::StorageSystems,
        ResourceKind::ProtectionEngines,
        ResourceKind::AppAgents,
        ResourceKind::Activities,
        ResourceKind::JobGroups,
        ResourceKind::DedupContainers,
        ResourceKind::Licenses,
        ResourceKind::DrCopies,
    ];

    pub const fn path(self) -> &'static str {
        match self {
            ResourceKind::ApplianceConfig => "/configurations",
            ResourceKind::Policies => "/protection-policies",
            ResourceKind::Assets => "/assets",
            ResourceKind::InventorySources => "/inventory-sources",
            ResourceKind::StorageSystems => "/storage-systems",
            ResourceKind::ProtectionEngines | ResourceKind::AppAgents => "/protection-engines",
            ResourceKind::Activities | ResourceKind::JobGroups => "/activities",
            ResourceKind::DedupContainers => "/datadomain-mtrees",
            ResourceKind::Licenses => "/licenses",
            ResourceKind::DrCopies => "/server-disaster-recovery-backups",
        }
    }

    /// Worksheet holding this resource; licenses only feed the summary.
    pub const fn sheet_name(self) -> Option<&'static str> {
        match self {
            ResourceKind::ApplianceConfig => Some("PPDMServer"),
            ResourceKind::Policies => Some("Policies"),
            ResourceKind::Assets => Some("Assets"),
            ResourceKind::InventorySources => Some("InvSources"),
            ResourceKind::StorageSystems => Some("Storage"),
            ResourceKind::ProtectionEngines => Some("ProtectionEngines"),
            ResourceKind::AppAgents => Some("AppAgents"),
            ResourceKind::Activities => Some("Activities"),
            ResourceKind::JobGroups => Some("JobGroups"),
            ResourceKind::DedupContainers => Some("DDStorageUnits"),
            ResourceKind::Licenses => None,
            ResourceKind::DrCopies => Some("ServerDR"),
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ResourceKind::ApplianceConfig => "appliance network config",
            ResourceKind::Policies => "protection policies",
            ResourceKind::Assets => "assets",
            ResourceKind::InventorySources => "inventory sources",
            ResourceKind::StorageSystems => "storage systems",
            ResourceKind::ProtectionEngines => "protection engines",
            ResourceKind::AppAgents => "app agents",
            ResourceKind::Activities => "activities",
            ResourceKind::JobGroups => "job groups",
            ResourceKind::DedupContainers => "DD storage units",
            ResourceKind::Licenses => "licenses",
            ResourceKind::DrCopies => "server DR copies",
        }
    }

    /// Sub-collection inside each `content` element, for kinds that wrap one.
    const fn nested_array(self) -> Option<&'static str> {
        match self {
            ResourceKind::ApplianceConfig => Some("networks"),
            ResourceKind::Licenses => Some("licenseKeys"),
            _ => None,
        }
    }

    pub const fn projection(self) -> Projection {
        match self {
            ResourceKind::Policies => Projection::Fields(fields::POLICIES),
            ResourceKind::Assets => Projection::Fields(fields::ASSETS),
            ResourceKind::InventorySources => Projection::Fields(fields::INVENTORY_SOURCES),
            ResourceKind::StorageSystems => Projection::Fields(fields::STORAGE_SYSTEMS),
            ResourceKind::Activities => Projection::Fields(fields::ACTIVITIES),
            ResourceKind::JobGroups => Projection::Fields(fields::JOB_GROUPS),
            ResourceKind::DedupContainers => Projection::Fields(fields::DEDUP_CONTAINERS),
            ResourceKind::DrCopies => Projection::Fields(fields::DR_COPIES),
            ResourceKind::ApplianceConfig
            | ResourceKind::ProtectionEngines
            | ResourceKind::AppAgents
            | ResourceKind::Licenses => Projection::AllColumns,
        }
    }

    pub fn query(self, cutoff: &Cutoff) -> Vec<(&'static str, String)> {
        match self {
            ResourceKind::Policies => vec![(
                "filter",
                format!(r#"type eq "ACTIVE" and createdAt gt "{HISTORY_FLOOR}""#),
            )],
            ResourceKind::Assets => vec![("filter", format!(r#"createdAt gt "{HISTORY_FLOOR}""#))],
            ResourceKind::Activities => activity_query("TASK", cutoff),
            ResourceKind::JobGroups => activity_query("JOB_GROUP", cutoff),
            _ => vec![],
        }
    }
}

fn activity_query(class_type: &str, cutoff: &Cutoff) -> Vec<(&'static str, String)> {
    vec![
        (
            "filter",
            format!(
                r#"category eq "PROTECT" and classType in ("{class_type}") and state in ("COMPLETED") and createTime gt "{}""#,
                cutoff.as_str()
            ),
        ),
        ("orderby", "createTime DESC".to_string()),
    ]
}

/// Lower bound on `createTime` for windowed queries, in the API's
/// `2023-09-26T10:11:12.345Z` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cutoff(String);

impl Cutoff {
    pub fn days_before(now: OffsetDateTime, days: u32) -> Result<Self> {
        let ts = now
            .to_offset(UtcOffset::UTC)
            .checked_sub(Duration::days(i64::from(days)))
            .ok_or_else(|| crate::exit::invalid_args("--rptdays is too large"))?;
        let s = ts
            .format(CUTOFF_FORMAT)
            .context("failed to format the report window cutoff")?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Calls the API for one kind and returns its records, flattened.
pub fn fetch_records(
    api: &dyn ApiClient,
    kind: ResourceKind,
    cutoff: &Cutoff,
) -> Result<Vec<FlatRecord>> {
    let body = api
        .get(kind.path(), &kind.query(cutoff))
        .with_context(|| format!("failed to fetch {}", kind.description()))?;
    let records = unwrap_envelope(kind, &body)?;
    debug!(kind = kind.description(), records = records.len(), "fetched");
    Ok(records)
}

fn unwrap_envelope(kind: ResourceKind, body: &Value) -> Result<Vec<FlatRecord>> {
    let content = body
        .get("content")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            crate::exit::api_request_err(anyhow!(
                "{} response has no `content` array",
                kind.path()
            ))
        })?;

    let records = match kind.nested_array() {
        None => content.iter().map(flatten).collect(),
        Some(key) => content
            .iter()
            .filter_map(|item| item.get(key).and_then(Value::as_array))
            .flatten()
            .map(flatten)
            .collect(),
    };
    Ok(records)
}

/// Projects records of one kind into their sheet shape.
pub fn shape(kind: ResourceKind, records: &[FlatRecord]) -> Table {
    let mut table = project(records, kind.projection());
    match kind {
        ResourceKind::Activities => drop_rows_without(&mut table, fields::POLICY_NAME),
        ResourceKind::JobGroups => {
            reformat_timestamps(&mut table, fields::JOB_START);
            reformat_timestamps(&mut table, fields::JOB_END);
        }
        _ => {}
    }
    table
}

pub fn fetch_table(api: &dyn ApiClient, kind: ResourceKind, cutoff: &Cutoff) -> Result<Table> {
    let records = fetch_records(api, kind, cutoff)?;
    Ok(shape(kind, &records))
}

/// Outcome of the one fetch allowed to fail without failing the run.
#[derive(Debug, Clone, PartialEq)]
pub enum DrCopies {
    Fetched(Table),
    Failed { reason: String },
}

impl DrCopies {
    /// The sheet contents; empty when the fetch failed.
    pub fn table(&self) -> Table {
        match self {
            DrCopies::Fetched(table) => table.clone(),
            DrCopies::Failed { .. } => Table::default(),
        }
    }

    /// First copy's value for `column`, if any copy was fetched.
    pub fn first(&self, column: &str) -> Option<&Value> {
        match self {
            DrCopies::Fetched(table) => {
                let idx = table.column_index(column)?;
                table.rows.first().and_then(|row| row.get(idx))
            }
            DrCopies::Failed { .. } => None,
        }
    }
}

pub fn fetch_dr_copies(api: &dyn ApiClient, cutoff: &Cutoff) -> DrCopies {
    match fetch_table(api, ResourceKind::DrCopies, cutoff) {
        Ok(table) => DrCopies::Fetched(table),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "server DR copies unavailable, continuing without them");
            DrCopies::Failed {
                reason: format!("{err:#}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    struct Canned(Value);

    impl ApiClient for Canned {
        fn get(&self, _path: &str, _query: &[(&'static str, String)]) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    impl ApiClient for Down {
        fn get(&self, path: &str, _query: &[(&'static str, String)]) -> Result<Value> {
            Err(anyhow!("connection reset while fetching {path}"))
        }
    }

    fn cutoff() -> Cutoff {
        Cutoff::days_before(datetime!(2026-10-18 12:30:45.678 UTC), 30).expect("cutoff")
    }

    #[test]
    fn cutoff_is_utc_with_milliseconds() {
        assert_eq!(cutoff().as_str(), "2026-09-18T12:30:45.678Z");
        let shifted =
            Cutoff::days_before(datetime!(2026-10-18 02:00:00 +09:00), 1).expect("cutoff");
        assert_eq!(shifted.as_str(), "2026-10-16T17:00:00.000Z");
    }

    #[test]
    fn window_past_the_calendar_range_is_invalid_args() {
        let err = Cutoff::days_before(datetime!(2026-10-18 12:00:00 UTC), 10_000_000).unwrap_err();
        assert_eq!(crate::exit::exit_code(&err), 2);
        assert!(err.to_string().contains("--rptdays"));
    }

    #[test]
    fn windowed_kinds_filter_on_create_time() {
        let q = ResourceKind::JobGroups.query(&cutoff());
        assert_eq!(q[0].0, "filter");
        assert!(q[0].1.contains(r#"classType in ("JOB_GROUP")"#));
        assert!(q[0].1.ends_with(r#"createTime gt "2026-09-18T12:30:45.678Z""#));
        assert_eq!(q[1], ("orderby", "createTime DESC".to_string()));
        assert!(ResourceKind::StorageSystems.query(&cutoff()).is_empty());
    }

    #[test]
    fn nested_envelopes_are_unwrapped() {
        let api = Canned(json!({"content": [
            {"licenseKeys": [{"featureName": "A"}, {"featureName": "B"}]},
            {"other": 1},
            {"licenseKeys": [{"featureName": "C"}]}
        ]}));
        let recs = fetch_records(&api, ResourceKind::Licenses, &cutoff()).expect("fetch");
        let names: Vec<&Value> = recs.iter().map(|r| &r["featureName"]).collect();
        assert_eq!(names, vec![&json!("A"), &json!("B"), &json!("C")]);
    }

    #[test]
    fn missing_content_is_an_api_error() {
        let api = Canned(json!({"error": "nope"}));
        let err = fetch_records(&api, ResourceKind::Assets, &cutoff()).unwrap_err();
        assert_eq!(crate::exit::exit_code(&err), 20);
    }

    #[test]
    fn activities_without_policy_are_not_reported() {
        let api = Canned(json!({"content": [
            {"protectionPolicy": {"name": "gold"}, "asset": {"name": "vm-1"}},
            {"asset": {"name": "orphan"}}
        ]}));
        let table = fetch_table(&api, ResourceKind::Activities, &cutoff()).expect("fetch");
        assert_eq!(table.len(), 1);
        assert_eq!(table.columns, vec!["Policy Name", "Asset Name"]);
    }

    #[test]
    fn dr_copies_failure_degrades_to_empty_sheet() {
        let dr = fetch_dr_copies(&Down, &cutoff());
        assert!(matches!(dr, DrCopies::Failed { .. }));
        assert!(dr.table().columns.is_empty());
        assert_eq!(dr.first("hostname"), None);
    }

    #[test]
    fn dr_copies_expose_first_record() {
        let api = Canned(json!({"content": [
            {"hostname": "ppdm-01", "version": "19.14.0-20"},
            {"hostname": "ppdm-01", "version": "19.13.0-1"}
        ]}));
        let dr = fetch_dr_copies(&api, &cutoff());
        assert_eq!(dr.first("version"), Some(&json!("19.14.0-20")));
    }
}
