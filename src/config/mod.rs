use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub server: ServerConfig,
    pub fetch: FetchConfig,
    pub report: ReportConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub port: u16,
    pub api_root: String,
    pub user: String,
    /// Skip TLS certificate validation. On by default: appliances ship
    /// self-signed certificates. This is insecure.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchConfig {
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub days: u32,
    pub output: PathBuf,
    pub run_log: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8443,
                api_root: "/api/v2".to_string(),
                user: "admin".to_string(),
                accept_invalid_certs: true,
            },
            fetch: FetchConfig { page_size: 10_000 },
            report: ReportConfig {
                days: 30,
                output: PathBuf::from("ppdmdetails.xlsx"),
                run_log: true,
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    server: Option<RawServerConfig>,
    fetch: Option<RawFetchConfig>,
    report: Option<RawReportConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServerConfig {
    port: Option<u16>,
    api_root: Option<String>,
    user: Option<String>,
    accept_invalid_certs: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFetchConfig {
    page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawReportConfig {
    days: Option<u32>,
    output: Option<PathBuf>,
    run_log: Option<bool>,
}

pub fn effective_home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("the HOME environment variable is not set"))
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/ppdmat/config.toml")
}

pub fn load(config_path: Option<&Path>, home_dir: &Path) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = config_path
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| default_config_path(home_dir));

    if path.exists() {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let raw: RawConfig = toml::from_str(&s)
            .with_context(|| format!("failed to parse config file (TOML): {}", path.display()))?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg)?;
    validate(&cfg)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(server) = raw.server {
        if let Some(port) = server.port {
            cfg.server.port = port;
        }
        if let Some(api_root) = server.api_root {
            cfg.server.api_root = api_root;
        }
        if let Some(user) = server.user {
            cfg.server.user = user;
        }
        if let Some(accept_invalid_certs) = server.accept_invalid_certs {
            cfg.server.accept_invalid_certs = accept_invalid_certs;
        }
    }

    if let Some(fetch) = raw.fetch {
        if let Some(page_size) = fetch.page_size {
            cfg.fetch.page_size = page_size;
        }
    }

    if let Some(report) = raw.report {
        if let Some(days) = report.days {
            cfg.report.days = days;
        }
        if let Some(output) = report.output {
            cfg.report.output = output;
        }
        if let Some(run_log) = report.run_log {
            cfg.report.run_log = run_log;
        }
    }
}

fn apply_env_overrides(cfg: &mut EffectiveConfig) -> Result<()> {
    if let Ok(v) = std::env::var("PPDMAT_SERVER_PORT") {
        cfg.server.port = v
            .trim()
            .parse::<u16>()
            .with_context(|| "PPDMAT_SERVER_PORT")?;
    }
    if let Ok(v) = std::env::var("PPDMAT_SERVER_API_ROOT") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.server.api_root = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("PPDMAT_SERVER_USER") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.server.user = v.to_string();
        }
    }
    if let Ok(v) = std::env::var("PPDMAT_SERVER_ACCEPT_INVALID_CERTS") {
        cfg.server.accept_invalid_certs =
            parse_bool(&v).with_context(|| "PPDMAT_SERVER_ACCEPT_INVALID_CERTS")?;
    }
    if let Ok(v) = std::env::var("PPDMAT_FETCH_PAGE_SIZE") {
        cfg.fetch.page_size = v
            .trim()
            .parse::<u32>()
            .with_context(|| "PPDMAT_FETCH_PAGE_SIZE")?;
    }
    if let Ok(v) = std::env::var("PPDMAT_REPORT_DAYS") {
        cfg.report.days = v
            .trim()
            .parse::<u32>()
            .with_context(|| "PPDMAT_REPORT_DAYS")?;
    }
    if let Ok(v) = std::env::var("PPDMAT_REPORT_OUTPUT") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.report.output = PathBuf::from(v);
        }
    }
    if let Ok(v) = std::env::var("PPDMAT_REPORT_RUN_LOG") {
        cfg.report.run_log = parse_bool(&v).with_context(|| "PPDMAT_REPORT_RUN_LOG")?;
    }

    Ok(())
}

pub fn validate(cfg: &EffectiveConfig) -> Result<()> {
    if cfg.fetch.page_size == 0 {
        return Err(anyhow!("fetch.page_size must be greater than 0"));
    }
    if cfg.report.days == 0 {
        return Err(anyhow!("report.days must be greater than 0"));
    }
    if cfg.server.port == 0 {
        return Err(anyhow!("server.port must be greater than 0"));
    }
    Ok(())
}

fn parse_bool(s: &str) -> Result<bool> {
    let s = s.trim().to_ascii_lowercase();
    match s.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "invalid boolean: {s} (expected true|false|1|0|yes|no|on|off)"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let raw: RawConfig = toml::from_str(
            r#"
[server]
port = 9443
accept_invalid_certs = false

[report]
days = 7
output = "out/report.xlsx"
"#,
        )
        .expect("parse");
        let mut cfg = EffectiveConfig::default();
        apply_raw_config(&mut cfg, raw);
        assert_eq!(cfg.server.port, 9443);
        assert!(!cfg.server.accept_invalid_certs);
        assert_eq!(cfg.server.user, "admin");
        assert_eq!(cfg.report.days, 7);
        assert_eq!(cfg.report.output, PathBuf::from("out/report.xlsx"));
        assert_eq!(cfg.fetch.page_size, 10_000);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: Result<RawConfig, _> = toml::from_str("[server]\nhostname = \"x\"\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn zero_window_is_invalid() {
        let mut cfg = EffectiveConfig::default();
        assert!(validate(&cfg).is_ok());
        cfg.report.days = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn bools_accept_common_spellings() {
        assert!(parse_bool(" Yes ").expect("yes"));
        assert!(!parse_bool("off").expect("off"));
        assert!(parse_bool("maybe").is_err());
    }
}
