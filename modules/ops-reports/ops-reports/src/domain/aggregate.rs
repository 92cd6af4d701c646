//! Productivity rollups over projected issues.
//!
//! Issues are folded one by one into running tallies (overall and per assignee);
//! rates are only derived in [`ProductivityAggregator::finalize`], once every
//! issue has been counted.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use ops_reports_sdk::models::{ProductivityReport, ProductivitySummary, UserStats};

use super::issues::IssueRecord;
use super::numeric::percentage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Completed,
    InProgress,
    Todo,
}

impl Bucket {
    fn of(status_category: &str) -> Self {
        if status_category.to_ascii_lowercase().contains("progress") {
            Self::InProgress
        } else if status_category.eq_ignore_ascii_case("done") {
            Self::Completed
        } else {
            Self::Todo
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    total: u64,
    completed: u64,
    in_progress: u64,
    todo: u64,
    overdue: u64,
    completed_this_month: u64,
    time_spent: u64,
}

impl Tally {
    fn add(&mut self, bucket: Bucket, overdue: bool, this_month: bool, time_spent: u64) {
        self.total += 1;
        match bucket {
            Bucket::Completed => self.completed += 1,
            Bucket::InProgress => self.in_progress += 1,
            Bucket::Todo => self.todo += 1,
        }
        if overdue {
            self.overdue += 1;
        }
        if this_month {
            self.completed_this_month += 1;
        }
        self.time_spent += time_spent;
    }

    fn into_summary(self) -> ProductivitySummary {
        ProductivitySummary {
            completion_rate: percentage(self.completed, self.total),
            total: self.total,
            completed: self.completed,
            in_progress: self.in_progress,
            todo: self.todo,
            overdue: self.overdue,
            completed_this_month: self.completed_this_month,
        }
    }

    fn into_user_stats(self) -> UserStats {
        let avg_time_per_task = if self.completed == 0 {
            0
        } else {
            // Integer round-half-up of time_spent / completed.
            (self.time_spent + self.completed / 2) / self.completed
        };
        UserStats {
            completion_rate: percentage(self.completed, self.total),
            avg_time_per_task,
            total: self.total,
            completed: self.completed,
            in_progress: self.in_progress,
            todo: self.todo,
            overdue: self.overdue,
            completed_this_month: self.completed_this_month,
            total_time_spent: self.time_spent,
        }
    }
}

/// Accumulates issues relative to a fixed `today`.
#[derive(Debug, Clone)]
pub struct ProductivityAggregator {
    today: NaiveDate,
    overall: Tally,
    per_assignee: BTreeMap<String, Tally>,
}

impl ProductivityAggregator {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            overall: Tally::default(),
            per_assignee: BTreeMap::new(),
        }
    }

    pub fn fold(&mut self, issue: &IssueRecord) {
        let bucket = Bucket::of(&issue.status_category);
        let completed = bucket == Bucket::Completed;
        let overdue = !completed && issue.due_date.is_some_and(|due| due < self.today);
        let this_month = completed
            && issue.resolution_date.is_some_and(|resolved| {
                resolved.year() == self.today.year() && resolved.month() == self.today.month()
            });

        self.overall
            .add(bucket, overdue, this_month, issue.time_spent);
        if let Some(assignee) = &issue.assignee {
            self.per_assignee
                .entry(assignee.clone())
                .or_default()
                .add(bucket, overdue, this_month, issue.time_spent);
        }
    }

    #[must_use]
    pub fn finalize(self) -> ProductivityReport {
        ProductivityReport {
            summary: self.overall.into_summary(),
            user_stats: self
                .per_assignee
                .into_iter()
                .map(|(assignee, tally)| (assignee, tally.into_user_stats()))
                .collect(),
        }
    }
}

impl Extend<IssueRecord> for ProductivityAggregator {
    fn extend<T: IntoIterator<Item = IssueRecord>>(&mut self, iter: T) {
        for issue in iter {
            self.fold(&issue);
        }
    }
}
