use thiserror::Error;

use crate::store::{ensure_task, Document};

/// Add or remove tags on a task, lazily creating the project/task. The tag
/// set is kept sorted and deduplicated; removing an absent tag is a no-op.
/// Returns the resulting tag set.
pub fn tag(
    doc: &mut Document,
    project: &str,
    task: &str,
    tags: &[String],
    remove: bool,
) -> Vec<String> {
    let entry = ensure_task(doc, project, task);
    if remove {
        entry.tags.retain(|existing| !tags.contains(existing));
    } else {
        entry.tags.extend(tags.iter().cloned());
    }
    entry.tags.sort();
    entry.tags.dedup();
    entry.tags.clone()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeleteError {
    #[error("no such project: {0}")]
    ProjectNotFound(String),
    #[error("no such task: {0}")]
    TaskNotFound(String),
    #[error("no frame matches {0:?}")]
    FrameNotFound(String),
    #[error("frame id {0:?} matches more than one frame")]
    AmbiguousFrame(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deleted {
    Project(String),
    Task(String),
    /// Full id of the removed frame.
    Frame(String),
}

/// Hierarchical deletion: a frame when `frame` is given, else a task when
/// `task` is given, else the whole project. Frames are addressed by their
/// full ULID or a unique tail of it (reports print the last eight
/// characters). Missing targets are errors rather than silent no-ops.
pub fn delete(
    doc: &mut Document,
    project: &str,
    task: Option<&str>,
    frame: Option<&str>,
) -> Result<Deleted, DeleteError> {
    let Some(task_name) = task else {
        doc.projects
            .remove(project)
            .ok_or_else(|| DeleteError::ProjectNotFound(project.to_string()))?;
        return Ok(Deleted::Project(project.to_string()));
    };

    let project_entry = doc
        .projects
        .get_mut(project)
        .ok_or_else(|| DeleteError::ProjectNotFound(project.to_string()))?;

    let Some(frame_id) = frame else {
        project_entry
            .tasks
            .remove(task_name)
            .ok_or_else(|| DeleteError::TaskNotFound(task_name.to_string()))?;
        return Ok(Deleted::Task(task_name.to_string()));
    };

    let task_entry = project_entry
        .tasks
        .get_mut(task_name)
        .ok_or_else(|| DeleteError::TaskNotFound(task_name.to_string()))?;

    let matches: Vec<usize> = task_entry
        .frames
        .iter()
        .enumerate()
        .filter(|(_, frame)| frame.id.ends_with(frame_id))
        .map(|(idx, _)| idx)
        .collect();
    match matches.as_slice() {
        [] => Err(DeleteError::FrameNotFound(frame_id.to_string())),
        [idx] => {
            let removed = task_entry.frames.remove(*idx);
            Ok(Deleted::Frame(removed.id))
        }
        _ => Err(DeleteError::AmbiguousFrame(frame_id.to_string())),
    }
}
