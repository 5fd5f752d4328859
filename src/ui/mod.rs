use std::io::{self, Write};
use std::time::Duration;

use anyhow::Error;
use indicatif::{ProgressBar, ProgressDrawTarget};

use crate::core::SummaryReport;

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub stderr_is_tty: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl UiConfig {
    /// Silent configuration for library callers and tests.
    pub fn silent() -> Self {
        Self {
            stderr_is_tty: false,
            quiet: true,
            verbose: false,
        }
    }
}

pub fn eprintln_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error:");
    let _ = writeln!(stderr, "  {err}");

    let mut causes = err.chain().skip(1).peekable();
    if causes.peek().is_some() {
        let _ = writeln!(stderr, "caused by:");
        for cause in causes {
            let _ = writeln!(stderr, "  - {cause}");
        }
    }

    let _ = writeln!(stderr, "next:");
    let _ = writeln!(
        stderr,
        "  - re-run with `--verbose` to log every API call"
    );
    let _ = writeln!(stderr, "  - see `ppdmat --help` for options");
}

/// Per-step progress output. Lines go to stdout, spinners to a TTY stderr.
#[derive(Debug, Clone)]
pub struct Progress {
    cfg: UiConfig,
}

impl Progress {
    pub fn new(cfg: UiConfig) -> Self {
        Self { cfg }
    }

    pub fn line(&self, msg: impl AsRef<str>) {
        if self.cfg.quiet {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", msg.as_ref());
    }

    pub fn spinner(&self, msg: impl Into<String>) -> Option<ProgressBar> {
        if self.cfg.quiet || !self.cfg.stderr_is_tty {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_message(msg.into());
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    }
}

pub fn print_summary(summary: &SummaryReport, cfg: &UiConfig) {
    if cfg.quiet {
        return;
    }
    let width = summary
        .entries()
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = io::stdout().lock();
    for entry in summary.entries() {
        let value = entry.value.to_string();
        if value.is_empty() {
            let _ = writeln!(out, "\n{}", entry.label);
        } else {
            let _ = writeln!(out, "  {:<width$}  {value}", entry.label);
        }
    }
}
