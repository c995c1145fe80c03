//! Completion report grouped by month.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chores_proto::resident::Assignee;
use chores_proto::task::{TaskInstance, TaskTitle};
use serde::Serialize;

use crate::calendar::Calendar;

/// One completed task in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Which chore.
    pub title: TaskTitle,
    /// Who did it.
    pub assignee: Assignee,
    /// Local date of completion.
    pub completed_on: NaiveDate,
}

/// Completions within one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyReport {
    /// `YYYY-MM`.
    pub month: String,
    /// Completions, oldest first.
    pub entries: Vec<ReportEntry>,
}

/// Groups completed tasks by local month, newest month first.
#[must_use]
pub fn completion_report(tasks: &[TaskInstance], calendar: &Calendar) -> Vec<MonthlyReport> {
    let mut months: BTreeMap<String, Vec<ReportEntry>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.completed) {
        let Some(at) = task.completed_at else {
            continue;
        };
        let completed_on = calendar.local_date(at);
        months
            .entry(completed_on.format("%Y-%m").to_string())
            .or_default()
            .push(ReportEntry {
                title: task.title,
                assignee: task.assigned_to.clone(),
                completed_on,
            });
    }
    months
        .into_iter()
        .rev()
        .map(|(month, mut entries)| {
            entries.sort_by_key(|e| e.completed_on);
            MonthlyReport { month, entries }
        })
        .collect()
}
