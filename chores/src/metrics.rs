//! Completion statistics per assignee.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use chores_proto::resident::Assignee;
use chores_proto::task::TaskInstance;
use serde::Serialize;

/// Statistics for one assignee (single resident or pair).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssigneeMetrics {
    /// Who the numbers are for.
    pub assignee: Assignee,
    /// Tasks assigned.
    pub total: usize,
    /// Tasks completed.
    pub completed: usize,
    /// `completed / total` as a percentage.
    pub completion_rate: f64,
    /// Completed on or before the deadline.
    pub on_time: usize,
    /// Completed after the deadline.
    pub late: usize,
    /// Mean days from creation to completion, if anything was completed.
    pub average_completion_days: Option<f64>,
    /// Completions in a row, each within a day of the next, ending now.
    pub streak: usize,
}

/// Board-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSummary {
    /// Tasks on the board.
    pub total: usize,
    /// Tasks completed.
    pub completed: usize,
    /// Distinct assignees.
    pub participants: usize,
    /// `completed / total` as a percentage.
    pub completion_rate: f64,
}

/// Summary plus per-assignee rows, best completion rate first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Board-wide totals.
    pub summary: BoardSummary,
    /// One row per assignee.
    pub assignees: Vec<AssigneeMetrics>,
}

/// Computes metrics over `tasks` as of `now`.
#[must_use]
pub fn compute(tasks: &[TaskInstance], now: DateTime<Utc>) -> MetricsReport {
    let mut groups: HashMap<&Assignee, Vec<&TaskInstance>> = HashMap::new();
    for task in tasks {
        groups.entry(&task.assigned_to).or_default().push(task);
    }

    let mut assignees: Vec<AssigneeMetrics> = groups
        .into_iter()
        .map(|(assignee, tasks)| assignee_metrics(assignee, &tasks, now))
        .collect();
    assignees.sort_by(|a, b| {
        b.completion_rate
            .total_cmp(&a.completion_rate)
            .then_with(|| a.assignee.to_string().cmp(&b.assignee.to_string()))
    });

    let completed = tasks.iter().filter(|t| t.completed).count();
    MetricsReport {
        summary: BoardSummary {
            total: tasks.len(),
            completed,
            participants: assignees.len(),
            completion_rate: percentage(completed, tasks.len()),
        },
        assignees,
    }
}

fn assignee_metrics(
    assignee: &Assignee,
    tasks: &[&TaskInstance],
    now: DateTime<Utc>,
) -> AssigneeMetrics {
    let done: Vec<(&TaskInstance, DateTime<Utc>)> = tasks
        .iter()
        .filter(|t| t.completed)
        .filter_map(|t| t.completed_at.map(|at| (*t, at)))
        .collect();
    let on_time = done
        .iter()
        .filter(|(task, at)| task.deadline.is_none_or(|deadline| *at <= deadline))
        .count();

    let average_completion_days = if done.is_empty() {
        None
    } else {
        let total_days: f64 = done
            .iter()
            .map(|(task, at)| days((*at - task.created_at).max(TimeDelta::zero())))
            .sum();
        Some(total_days / count_f64(done.len()))
    };

    let mut completions: Vec<DateTime<Utc>> = done.iter().map(|(_, at)| *at).collect();
    completions.sort_unstable_by(|a, b| b.cmp(a));

    AssigneeMetrics {
        assignee: assignee.clone(),
        total: tasks.len(),
        completed: done.len(),
        completion_rate: percentage(done.len(), tasks.len()),
        on_time,
        late: done.len() - on_time,
        average_completion_days,
        streak: streak(&completions, now),
    }
}

fn streak(newest_first: &[DateTime<Utc>], now: DateTime<Utc>) -> usize {
    let mut cursor = now;
    let mut count = 0;
    for &at in newest_first {
        if cursor - at > TimeDelta::days(1) {
            break;
        }
        count += 1;
        cursor = at;
    }
    count
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        count_f64(part) * 100.0 / count_f64(whole)
    }
}

#[allow(clippy::cast_precision_loss)]
const fn count_f64(n: usize) -> f64 {
    n as f64
}

#[allow(clippy::cast_precision_loss)]
fn days(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 / 86_400.0
}
