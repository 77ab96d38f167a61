use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ulid::Ulid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Store file {} is corrupt: {}", .path.display(), .source)]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The persisted root: every project plus the single active timer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,
    #[serde(default)]
    pub state: TimerState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Always sorted and deduplicated.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One completed (start, end) interval recorded against a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// ULID minted at creation. Documents written by older versions lack
    /// ids; `Store::open` backfills them.
    #[serde(default)]
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Frame {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Frame {
            id: Ulid::new().to_string(),
            start,
            end,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }
}

/// The single process-wide timer. On disk this is the `state` object with a
/// `running` flag; in memory the running variant always carries its fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimerStateRepr", into = "TimerStateRepr")]
pub enum TimerState {
    #[default]
    Idle,
    Running {
        project: String,
        task: String,
        start: DateTime<Utc>,
    },
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }
}

#[derive(Serialize, Deserialize)]
struct TimerStateRepr {
    running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task: Option<String>,
}

impl TryFrom<TimerStateRepr> for TimerState {
    type Error = String;

    fn try_from(repr: TimerStateRepr) -> Result<Self, Self::Error> {
        if !repr.running {
            return Ok(TimerState::Idle);
        }
        match (repr.project, repr.task, repr.start) {
            (Some(project), Some(task), Some(start)) => Ok(TimerState::Running {
                project,
                task,
                start,
            }),
            _ => Err("running timer is missing project, task or start".to_string()),
        }
    }
}

impl From<TimerState> for TimerStateRepr {
    fn from(state: TimerState) -> Self {
        match state {
            TimerState::Idle => TimerStateRepr {
                running: false,
                start: None,
                project: None,
                task: None,
            },
            TimerState::Running {
                project,
                task,
                start,
            } => TimerStateRepr {
                running: true,
                start: Some(start),
                project: Some(project),
                task: Some(task),
            },
        }
    }
}

/// Owns the document between load and save. `save` only writes when a
/// command marked the document dirty, so read-only invocations never touch
/// the file.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    pub doc: Document,
    dirty: bool,
}

impl Store {
    /// A missing file yields a fresh empty document; a file that exists but
    /// does not parse is a hard error, never silently discarded.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let mut doc = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<Document>(&raw).map_err(|source| {
                StoreError::Corrupt {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Document::default(),
            Err(err) => return Err(StoreError::Io(err)),
        };
        let dirty = assign_missing_frame_ids(&mut doc) > 0;
        Ok(Store { path, doc, dirty })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write-temp-then-rename so a crash mid-write cannot clobber the store.
    pub fn save(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.doc)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        Ok(())
    }
}

/// Look up or create the task (and its project) under the given names.
pub fn ensure_task<'a>(doc: &'a mut Document, project: &str, task: &str) -> &'a mut Task {
    doc.projects
        .entry(project.to_string())
        .or_default()
        .tasks
        .entry(task.to_string())
        .or_default()
}

fn assign_missing_frame_ids(doc: &mut Document) -> usize {
    let mut assigned = 0;
    for project in doc.projects.values_mut() {
        for task in project.tasks.values_mut() {
            for frame in &mut task.frames {
                if frame.id.is_empty() {
                    frame.id = Ulid::new().to_string();
                    assigned += 1;
                }
            }
        }
    }
    assigned
}
