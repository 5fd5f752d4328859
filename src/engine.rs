use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::aggregate::{SummaryInputs, build_summary};
use crate::api::{ApiClient, Endpoint, Session, SessionOptions};
use crate::core::Table;
use crate::logs::{RunLog, SheetLog, StepLog};
use crate::report::{ChartOutcome, Sheet, WorkbookContents, write_workbook};
use crate::resources::{Cutoff, DrCopies, ResourceKind, fetch_dr_copies, fetch_table};
use crate::ui::Progress;

/// Worksheets after Summary and Chart, left to right.
const SHEET_ORDER: [ResourceKind; 11] = [
    ResourceKind::Activities,
    ResourceKind::JobGroups,
    ResourceKind::Policies,
    ResourceKind::Assets,
    ResourceKind::InventorySources,
    ResourceKind::StorageSystems,
    ResourceKind::DedupContainers,
    ResourceKind::ProtectionEngines,
    ResourceKind::AppAgents,
    ResourceKind::ApplianceConfig,
    ResourceKind::DrCopies,
];

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub endpoint: Endpoint,
    pub user: String,
    pub session: SessionOptions,
    pub request: ReportRequest,
    pub run_log: bool,
    pub home_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub report_days: u32,
    pub output: PathBuf,
}

/// Every resource of one run, shaped into tables.
#[derive(Debug, Clone)]
pub struct Collected {
    tables: HashMap<ResourceKind, Table>,
    pub dr_copies: DrCopies,
}

impl Collected {
    pub fn table(&self, kind: ResourceKind) -> &Table {
        static EMPTY: Table = Table {
            columns: Vec::new(),
            rows: Vec::new(),
        };
        self.tables.get(&kind).unwrap_or(&EMPTY)
    }
}

pub struct Engine {
    opts: EngineOptions,
    progress: Progress,
}

impl Engine {
    pub fn new(opts: EngineOptions, progress: Progress) -> Self {
        Self { opts, progress }
    }

    /// Logs in, builds the workbook, then logs out. Logout is attempted on
    /// the failure path too, and its own failure never fails the run.
    pub fn run(&self, password: &str) -> Result<Generated> {
        let started_at = OffsetDateTime::now_utc();
        let session = Session::authenticate(
            &self.opts.endpoint,
            &self.opts.user,
            password,
            &self.opts.session,
        )?;
        self.progress.line(format!(
            "Logged in with user: {} to PPDM: {}",
            session.user(),
            session.host()
        ));

        let result = generate(&session, &self.opts.request, started_at, &self.progress);

        if let Ok(generated) = &result {
            if self.opts.run_log {
                self.write_run_log(started_at, generated);
            }
        }

        let user = session.user().to_string();
        let host = session.host().to_string();
        match session.logout() {
            Ok(()) => self
                .progress
                .line(format!("Logout for user: {user} from PPDM: {host}")),
            Err(err) => warn!(error = %format!("{err:#}"), %host, "logout failed"),
        }

        result
    }

    fn write_run_log(&self, started_at: OffsetDateTime, generated: &Generated) {
        let finished_at = OffsetDateTime::now_utc();
        let contents = &generated.contents;
        let sheets = contents
            .sheets
            .iter()
            .map(|s| SheetLog {
                name: s.name.to_string(),
                rows: s.table.len(),
                columns: s.table.columns.len(),
            })
            .collect();
        let dr_copies = match &generated.dr_copies {
            DrCopies::Fetched(_) => StepLog::ok(),
            DrCopies::Failed { reason } => StepLog::degraded(reason.clone()),
        };
        let chart = match &contents.chart {
            ChartOutcome::Built(_) => StepLog::ok(),
            ChartOutcome::Skipped { reason } => StepLog::degraded(reason.clone()),
        };

        let log = RunLog {
            schema_version: "1.0",
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: crate::logs::format_timestamp(started_at),
            finished_at: crate::logs::format_timestamp(finished_at),
            server: self.opts.endpoint.host.clone(),
            user: self.opts.user.clone(),
            report_days: self.opts.request.report_days,
            output: self.opts.request.output.display().to_string(),
            sheets,
            dr_copies,
            chart,
        };
        match crate::logs::write_run_log(&self.opts.home_dir, finished_at, &log) {
            Ok(path) => info!(path = %path.display(), "run log written"),
            Err(err) => warn!(error = %format!("{err:#}"), "failed to write run log"),
        }
    }
}

/// Fetches every resource in a fixed order, one request at a time.
pub fn collect(api: &dyn ApiClient, cutoff: &Cutoff, progress: &Progress) -> Result<Collected> {
    let mut tables = HashMap::new();
    let mut dr_copies = DrCopies::Fetched(Table::default());

    for kind in ResourceKind::ALL {
        let pb = progress.spinner(format!("Fetching {}...", kind.description()));
        let fetched = match kind {
            ResourceKind::DrCopies => {
                dr_copies = fetch_dr_copies(api, cutoff);
                None
            }
            _ => Some(fetch_table(api, kind, cutoff)),
        };
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        if let Some(table) = fetched {
            tables.insert(kind, table?);
        }
    }

    Ok(Collected { tables, dr_copies })
}

/// Turns collected tables into summary, chart and sheets.
pub fn assemble(collected: &Collected, report_days: u32) -> WorkbookContents {
    let summary = build_summary(&SummaryInputs {
        dr_copies: &collected.dr_copies,
        licenses: collected.table(ResourceKind::Licenses),
        assets: collected.table(ResourceKind::Assets),
        activities: collected.table(ResourceKind::Activities),
        job_groups: collected.table(ResourceKind::JobGroups),
        dedup_containers: collected.table(ResourceKind::DedupContainers),
        report_days,
    });

    let chart = ChartOutcome::from_activities(collected.table(ResourceKind::Activities));
    if let ChartOutcome::Skipped { reason } = &chart {
        warn!(%reason, "chart skipped");
    }

    let sheets = SHEET_ORDER
        .iter()
        .filter_map(|kind| {
            let name = kind.sheet_name()?;
            let table = match kind {
                ResourceKind::DrCopies => collected.dr_copies.table(),
                other => collected.table(*other).clone(),
            };
            Some(Sheet { name, table })
        })
        .collect();

    WorkbookContents {
        summary,
        chart,
        sheets,
    }
}

/// What one run produced.
#[derive(Debug, Clone)]
pub struct Generated {
    pub contents: WorkbookContents,
    pub dr_copies: DrCopies,
}

/// Collects, aggregates and writes the workbook through any API client.
pub fn generate(
    api: &dyn ApiClient,
    req: &ReportRequest,
    now: OffsetDateTime,
    progress: &Progress,
) -> Result<Generated> {
    let cutoff = Cutoff::days_before(now, req.report_days)?;
    let collected = collect(api, &cutoff, progress)?;
    let contents = assemble(&collected, req.report_days);

    write_workbook(&req.output, &contents)?;

    let output = req.output.display();
    progress.line(format!("Written Summary information to {output}"));
    if matches!(contents.chart, ChartOutcome::Built(_)) {
        progress.line(format!("Created column chart in {output}"));
    }
    for sheet in &contents.sheets {
        progress.line(format!("Written '{}' information to {output}", sheet.name));
    }
    progress.line("All the data written to the file");

    Ok(Generated {
        contents,
        dr_copies: collected.dr_copies,
    })
}
