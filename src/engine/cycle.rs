//! Per-cycle summary

use chrono::{DateTime, Utc};
use reconcile::{FamilyReport, RemovalReport, StaticWriteReport};
use std::fmt;

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub started: DateTime<Utc>,
    /// False when the selection composed no query
    pub queried: bool,
    pub statics: StaticWriteReport,
    pub families: Vec<FamilyReport>,
    /// Flush error message, if persisting the store failed
    pub flush_error: Option<String>,
}

impl CycleReport {
    pub fn new(started: DateTime<Utc>) -> Self {
        Self {
            started,
            queried: false,
            statics: StaticWriteReport::default(),
            families: Vec::new(),
            flush_error: None,
        }
    }

    pub fn created(&self) -> usize {
        self.families.iter().map(|f| f.created.len()).sum()
    }

    pub fn removed(&self) -> usize {
        self.families.iter().map(|f| f.removed.len()).sum()
    }

    /// Every store operation that failed this cycle
    pub fn failures(&self) -> usize {
        self.statics.failures.len()
            + self.families.iter().map(|f| f.failures.len()).sum::<usize>()
            + usize::from(self.flush_error.is_some())
    }

    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.queried {
            return write!(f, "nothing selected");
        }
        write!(
            f,
            "{} values, {} created, {} removed",
            self.statics.written,
            self.created(),
            self.removed()
        )?;
        if !self.statics.skipped_domains.is_empty() {
            write!(f, ", skipped {}", self.statics.skipped_domains.join(", "))?;
        }
        let failures = self.failures();
        if failures > 0 {
            write!(f, ", {failures} failed")?;
        }
        Ok(())
    }
}

/// Summary line for a deselection prune
pub fn describe_prune(report: &RemovalReport) -> String {
    if report.failed.is_empty() {
        format!("pruned {}", report.removed.len())
    } else {
        format!("pruned {}, {} failed", report.removed.len(), report.failed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(name: &str, created: &[&str], removed: &[&str], failures: &[&str]) -> FamilyReport {
        let strings = |ids: &[&str]| ids.iter().map(|s| (*s).to_string()).collect();
        FamilyReport {
            family: name.to_string(),
            members: created.len(),
            structural: !created.is_empty() || !removed.is_empty(),
            created: strings(created),
            removed: strings(removed),
            failures: strings(failures),
        }
    }

    #[test]
    fn test_counts() {
        let mut report = CycleReport::new(Utc::now());
        report.queried = true;
        report.statics.written = 12;
        report.families = vec![
            family("container", &["docker.containers.a"], &["docker.containers.b"], &[]),
            family("share", &["shares.isos", "shares.appdata"], &[], &["shares.x"]),
        ];

        assert_eq!(report.created(), 3);
        assert_eq!(report.removed(), 1);
        assert_eq!(report.failures(), 1);
        assert!(!report.is_success());
        assert_eq!(report.to_string(), "12 values, 3 created, 1 removed, 1 failed");
    }

    #[test]
    fn test_display_skipped_and_empty() {
        let mut report = CycleReport::new(Utc::now());
        assert_eq!(report.to_string(), "nothing selected");

        report.queried = true;
        report.statics.skipped_domains = vec!["vms.list".to_string()];
        report.flush_error = Some("disk full".to_string());
        assert_eq!(report.to_string(), "0 values, 0 created, 0 removed, skipped vms.list, 1 failed");
    }

    #[test]
    fn test_describe_prune() {
        let report = RemovalReport {
            removed: vec!["docker".to_string()],
            failed: vec!["vms".to_string()],
        };
        assert_eq!(describe_prune(&report), "pruned 1, 1 failed");
        assert_eq!(describe_prune(&RemovalReport::default()), "pruned 0");
    }
}
