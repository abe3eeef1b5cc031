use std::fmt::Write;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Rejected,
    Misconfigured,
    UpstreamFailed,
    Failed,
}

#[derive(Debug)]
pub struct Metrics {
    pub started: SystemTime,
    pub created: u64,
    pub updated: u64,
    pub rejected: u64,
    pub misconfigured: u64,
    pub upstream_failed: u64,
    pub failed: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            started: SystemTime::now(),
            created: 0,
            updated: 0,
            rejected: 0,
            misconfigured: 0,
            upstream_failed: 0,
            failed: 0,
        }
    }
}

impl Metrics {
    pub fn record(&mut self, outcome: Outcome) {
        let count = match outcome {
            Outcome::Created => &mut self.created,
            Outcome::Updated => &mut self.updated,
            Outcome::Rejected => &mut self.rejected,
            Outcome::Misconfigured => &mut self.misconfigured,
            Outcome::UpstreamFailed => &mut self.upstream_failed,
            Outcome::Failed => &mut self.failed,
        };

        *count += 1;
    }

    pub fn submissions(&self) -> u64 {
        self.created
            + self.updated
            + self.rejected
            + self.misconfigured
            + self.upstream_failed
            + self.failed
    }

    pub fn render(&self) -> String {
        let uptime = self.started.elapsed().unwrap_or_default().as_secs();

        let mut page = String::new();

        for (name, val) in [
            ("uptime_seconds", uptime),
            ("submissions", self.submissions()),
            ("contacts_created", self.created),
            ("contacts_updated", self.updated),
            ("rejected", self.rejected),
            ("misconfigured", self.misconfigured),
            ("upstream_failed", self.upstream_failed),
            ("failed", self.failed),
        ] {
            let _ = writeln!(page, "{} {}", name, val);
        }

        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_outcomes_separately() {
        let mut metrics = Metrics::default();

        metrics.record(Outcome::Created);
        metrics.record(Outcome::Created);
        metrics.record(Outcome::Updated);
        metrics.record(Outcome::Rejected);
        metrics.record(Outcome::UpstreamFailed);

        assert_eq!(metrics.created, 2);
        assert_eq!(metrics.updated, 1);
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.misconfigured, 0);
        assert_eq!(metrics.upstream_failed, 1);
        assert_eq!(metrics.submissions(), 5);
    }

    #[test]
    fn renders_one_line_per_counter() {
        let mut metrics = Metrics::default();
        metrics.record(Outcome::Misconfigured);

        let page = metrics.render();

        assert_eq!(page.lines().count(), 8);
        assert!(page.contains("submissions 1\n"));
        assert!(page.contains("misconfigured 1\n"));
        assert!(page.contains("contacts_created 0\n"));
    }
}
