//! Daily summary: a day's entries grouped by project and task type.
//! [summarize] is pure, rendering lives in [render].

pub mod render;

use std::collections::HashMap;

use chrono::Duration;

use crate::storage::entities::WorkEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryGroup {
    pub project: String,
    pub task_type: String,
    pub duration: Duration,
    pub descriptions: Vec<String>,
}

impl SummaryGroup {
    fn new(project: String, task_type: String) -> Self {
        Self {
            project,
            task_type,
            duration: Duration::zero(),
            descriptions: vec![],
        }
    }
}

/// Groups entries by (project, task type) in order of first appearance. Durations are summed,
/// descriptions are kept in their original order.
pub fn summarize(entries: &[WorkEntry]) -> Vec<SummaryGroup> {
    let mut groups = Vec::<SummaryGroup>::new();
    let mut index = HashMap::<(&str, &str), usize>::new();

    for entry in entries {
        let position = *index
            .entry((entry.project.as_str(), entry.task_type.as_str()))
            .or_insert_with(|| {
                groups.push(SummaryGroup::new(
                    entry.project.clone(),
                    entry.task_type.clone(),
                ));
                groups.len() - 1
            });

        let group = &mut groups[position];
        group.duration += entry.duration();
        if !entry.description.is_empty() {
            group.descriptions.push(entry.description.clone());
        }
    }

    groups
}

pub fn total_duration(groups: &[SummaryGroup]) -> Duration {
    groups
        .iter()
        .fold(Duration::zero(), |total, group| total + group.duration)
}
