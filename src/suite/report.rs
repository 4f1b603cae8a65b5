use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    /// Setup failed, so the body never ran
    SetupFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub name: String,
    pub status: CaseStatus,
    pub message: Option<String>,
    pub duration_ms: u64,
    /// Teardown problems never change `status`
    pub teardown_errors: Vec<String>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub cases: Vec<CaseReport>,
}

impl SuiteReport {
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            started_at: Utc::now(),
            cases: Vec::new(),
        }
    }

    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.cases.len() - self.passed()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} passed, {} failed ({} total)",
            self.suite,
            self.passed(),
            self.failed(),
            self.cases.len()
        )
    }

    pub fn print(&self) {
        println!("{}", self.suite.blue().bold());
        for case in &self.cases {
            let marker = match case.status {
                CaseStatus::Passed => "✓".green(),
                CaseStatus::Failed => "✗".red(),
                CaseStatus::SetupFailed => "✗".red().bold(),
            };
            println!(
                "  {} {} {}",
                marker,
                case.name,
                format!("({} ms)", case.duration_ms).dimmed()
            );
            if let Some(message) = &case.message {
                println!("      {} {}", "→".blue(), message);
            }
            for error in &case.teardown_errors {
                println!("      {} {}", "⚠".yellow(), error);
            }
        }
        let summary = self.summary();
        if self.is_success() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }
}
