use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use crate::api::{Endpoint, SessionOptions};
use crate::engine::{Engine, EngineOptions, ReportRequest};
use crate::ui::{Progress, UiConfig};

#[derive(Debug, Parser)]
#[command(
    name = "ppdmat",
    version,
    about = "Collect PowerProtect Data Manager inventory, activity and capacity data into an Excel workbook"
)]
pub struct Cli {
    /// Appliance DNS name or IP
    #[arg(short = 's', long)]
    pub server: String,
    /// API user [default: admin]
    #[arg(short = 'u', long, visible_alias = "usr")]
    pub user: Option<String>,
    #[arg(short = 'p', long, visible_alias = "pwd")]
    pub password: String,
    /// Report window in days [default: 30]
    #[arg(short = 'd', long, visible_aliases = ["days", "rd"])]
    pub rptdays: Option<u32>,
    /// Workbook path [default: ppdmdetails.xlsx]
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Print the summary as JSON after the workbook is written
    #[arg(long)]
    pub json: bool,
    #[arg(long)]
    pub verbose: bool,
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let home_dir = crate::config::effective_home_dir().map_err(crate::exit::invalid_args_err)?;
    let env_config_path = std::env::var_os("PPDMAT_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let server = cli.server.trim();
    if server.is_empty() {
        return Err(crate::exit::invalid_args("--server must not be empty"));
    }
    let report_days = cli.rptdays.unwrap_or(cfg.report.days);
    if report_days == 0 {
        return Err(crate::exit::invalid_args(
            "--rptdays must be greater than 0",
        ));
    }
    if cfg.server.accept_invalid_certs {
        tracing::debug!("TLS certificate validation is disabled");
    }

    let ui_cfg = UiConfig {
        stderr_is_tty: io::stderr().is_terminal(),
        // JSON output owns stdout.
        quiet: cli.quiet || cli.json,
        verbose: cli.verbose,
    };

    let engine = Engine::new(
        EngineOptions {
            endpoint: Endpoint {
                host: server.to_string(),
                port: cfg.server.port,
                api_root: cfg.server.api_root.clone(),
            },
            user: cli.user.clone().unwrap_or_else(|| cfg.server.user.clone()),
            session: SessionOptions {
                accept_invalid_certs: cfg.server.accept_invalid_certs,
                page_size: cfg.fetch.page_size,
            },
            request: ReportRequest {
                report_days,
                output: cli.output.clone().unwrap_or_else(|| cfg.report.output.clone()),
            },
            run_log: cfg.report.run_log,
            home_dir,
        },
        Progress::new(ui_cfg.clone()),
    );

    let generated = engine.run(&cli.password)?;

    if cli.json {
        write_json(&generated.contents.summary)?;
    } else if ui_cfg.verbose {
        crate::ui::print_summary(&generated.contents.summary, &ui_cfg);
    }
    Ok(())
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    use std::io::Write as _;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
