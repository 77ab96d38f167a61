use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::duration::format_ms;
use crate::store::{Document, Frame, Project, Task, TimerState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("no such project: {0}")]
    ProjectNotFound(String),
    #[error("no such task: {0}")]
    TaskNotFound(String),
}

/// What to include in a report. No names means every project and task.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub project: Option<String>,
    pub task: Option<String>,
    pub tag: Option<String>,
    pub with_frames: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub projects: Vec<ProjectReport>,
    pub with_frames: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub name: String,
    pub total_ms: i64,
    pub tasks: Vec<TaskReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub name: String,
    pub tags: Vec<String>,
    pub total_ms: i64,
    pub frames: Vec<FrameLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FrameLine {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Aggregate totals per task and project. Read-only: naming an absent
/// project or task is an error, never a reason to create it. When a tag
/// filter is active, projects with no matching task are skipped entirely
/// and non-matching tasks contribute nothing to their project's total.
pub fn build(doc: &Document, filter: &ReportFilter) -> Result<Report, ReportError> {
    let selected: Vec<(&String, &Project)> = match &filter.project {
        Some(name) => {
            let project = doc
                .projects
                .get(name)
                .ok_or_else(|| ReportError::ProjectNotFound(name.clone()))?;
            vec![(name, project)]
        }
        None => doc.projects.iter().collect(),
    };

    let mut projects = Vec::new();
    for (project_name, project) in selected {
        let tasks: Vec<(&String, &Task)> = match &filter.task {
            Some(name) => {
                let task = project
                    .tasks
                    .get(name)
                    .ok_or_else(|| ReportError::TaskNotFound(name.clone()))?;
                vec![(name, task)]
            }
            None => project.tasks.iter().collect(),
        };

        if let Some(tag) = &filter.tag {
            let any_match = project
                .tasks
                .values()
                .any(|task| task.tags.iter().any(|t| t == tag));
            if !any_match {
                continue;
            }
        }

        let mut task_reports = Vec::new();
        let mut project_total = 0;
        for (task_name, task) in tasks {
            if let Some(tag) = &filter.tag {
                if !task.tags.iter().any(|t| t == tag) {
                    continue;
                }
            }
            let total: i64 = task.frames.iter().map(Frame::duration_ms).sum();
            project_total += total;
            let frames = if filter.with_frames {
                task.frames
                    .iter()
                    .map(|frame| FrameLine {
                        id: frame.id.clone(),
                        start: frame.start,
                        end: frame.end,
                        duration_ms: frame.duration_ms(),
                    })
                    .collect()
            } else {
                Vec::new()
            };
            task_reports.push(TaskReport {
                name: task_name.clone(),
                tags: task.tags.clone(),
                total_ms: total,
                frames,
            });
        }

        projects.push(ProjectReport {
            name: project_name.clone(),
            total_ms: project_total,
            tasks: task_reports,
        });
    }

    Ok(Report {
        projects,
        with_frames: filter.with_frames,
    })
}

/// Render as indented plain text, frame times in local time.
pub fn render(report: &Report) -> String {
    let mut lines = Vec::new();
    for project in &report.projects {
        lines.push(format!(
            "Project: {} ({})",
            project.name,
            format_ms(project.total_ms)
        ));
        for task in &project.tasks {
            if task.tags.is_empty() {
                lines.push(format!("  {} ({})", task.name, format_ms(task.total_ms)));
            } else {
                lines.push(format!(
                    "  {} [{}] ({})",
                    task.name,
                    task.tags.join(", "),
                    format_ms(task.total_ms)
                ));
            }
            for frame in &task.frames {
                let start = frame.start.with_timezone(&Local);
                let end = frame.end.with_timezone(&Local);
                lines.push(format!(
                    "    [{}] {} {} - {} ({})",
                    short_id(&frame.id),
                    start.format("%a %-d %b"),
                    start.format("%H:%M"),
                    end.format("%H:%M"),
                    format_ms(frame.duration_ms)
                ));
            }
            if report.with_frames {
                lines.push(String::new());
            }
        }
        if !report.with_frames {
            lines.push(String::new());
        }
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// The displayed handle for a frame: the random tail of its ULID, which
/// stays distinctive where the leading timestamp characters do not.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().rev().nth(7) {
        Some((idx, _)) => &id[idx..],
        None => id,
    }
}

#[derive(Debug, Clone)]
pub struct Status {
    pub project: String,
    pub task: String,
    pub tags: Vec<String>,
    pub start: DateTime<Utc>,
    pub elapsed_ms: i64,
}

/// Snapshot of the running timer, or `None` when idle. Never creates
/// entries: a timer on a task that was never tagged simply has no tags.
pub fn status(doc: &Document, now: DateTime<Utc>) -> Option<Status> {
    match &doc.state {
        TimerState::Idle => None,
        TimerState::Running {
            project,
            task,
            start,
        } => {
            let tags = doc
                .projects
                .get(project)
                .and_then(|p| p.tasks.get(task))
                .map(|t| t.tags.clone())
                .unwrap_or_default();
            Some(Status {
                project: project.clone(),
                task: task.clone(),
                tags,
                start: *start,
                elapsed_ms: (now - *start).num_milliseconds().max(0),
            })
        }
    }
}

pub fn render_status(status: &Status) -> String {
    let mut lines = Vec::new();
    if status.tags.is_empty() {
        lines.push(format!("Running: {} {}", status.project, status.task));
    } else {
        lines.push(format!(
            "Running: {} {} [{}]",
            status.project,
            status.task,
            status.tags.join(", ")
        ));
    }
    lines.push(format!(
        "  Started at: {} ({} ago)",
        status.start.with_timezone(&Local).format("%H:%M"),
        format_ms(status.elapsed_ms)
    ));
    lines.join("\n")
}
