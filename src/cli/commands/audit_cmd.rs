//! `heirvault audit` — view the audit log.

use crate::cli::Cli;
use crate::errors::Result;

/// Parse a duration string like `7d`, `24h`, or `30m` into a
/// `chrono::Duration`.
#[cfg(feature = "audit-log")]
fn parse_since(s: &str) -> Result<chrono::Duration> {
    use crate::errors::HeirVaultError;

    let s = s.trim();
    if s.len() < 2 {
        return Err(HeirVaultError::CommandFailed(format!(
            "invalid duration '{s}' — use forms like 7d, 24h, 30m"
        )));
    }

    let (num, unit) = s.split_at(s.len() - 1);
    let value: i64 = num.parse().map_err(|_| {
        HeirVaultError::CommandFailed(format!("invalid duration '{s}' — use forms like 7d, 24h, 30m"))
    })?;

    match unit {
        "d" => Ok(chrono::Duration::days(value)),
        "h" => Ok(chrono::Duration::hours(value)),
        "m" => Ok(chrono::Duration::minutes(value)),
        _ => Err(HeirVaultError::CommandFailed(format!(
            "invalid duration unit '{unit}' — use d, h, or m"
        ))),
    }
}

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    use comfy_table::{ContentArrangement, Table};

    use crate::audit::AuditLog;
    use crate::cli::{output, vault_dir};
    use crate::errors::HeirVaultError;

    let dir = vault_dir(cli)?;
    let audit = AuditLog::open(&dir).ok_or_else(|| {
        HeirVaultError::AuditError(format!("cannot open audit log in {}", dir.display()))
    })?;

    let since_ts = match since {
        Some(s) => Some(chrono::Utc::now() - parse_since(s)?),
        None => None,
    };

    let entries = audit.query(last, since_ts)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Plan", "Subject", "Details"]);

    for entry in &entries {
        table.add_row(vec![
            entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.operation.clone(),
            entry.plan_id.clone().unwrap_or_else(|| "-".into()),
            entry.subject.clone().unwrap_or_else(|| "-".into()),
            entry.details.clone().unwrap_or_else(|| "-".into()),
        ]);
    }

    println!("{table}");

    Ok(())
}

/// Stub when the audit-log feature is disabled.
#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, _since: Option<&str>) -> Result<()> {
    crate::cli::output::warning(
        "This build has no audit log — rebuild with the `audit-log` feature.",
    );
    Ok(())
}

#[cfg(all(test, feature = "audit-log"))]
mod tests {
    use super::*;

    #[test]
    fn parses_days_hours_minutes() {
        assert_eq!(parse_since("7d").unwrap(), chrono::Duration::days(7));
        assert_eq!(parse_since("24h").unwrap(), chrono::Duration::hours(24));
        assert_eq!(parse_since("30m").unwrap(), chrono::Duration::minutes(30));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_since("").is_err());
        assert!(parse_since("d").is_err());
        assert!(parse_since("7w").is_err());
        assert!(parse_since("abc").is_err());
    }
}
