use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::store::{ensure_task, Document, Frame, TimerState};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("a timer is already running")]
    AlreadyRunning,
    #[error("no timer is running")]
    NotRunning,
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// `Idle -> Running`. Creates the project/task entries up front so tagging
/// and status can see them; the frame itself is only recorded on stop.
pub fn start(
    doc: &mut Document,
    project: &str,
    task: &str,
    now: DateTime<Utc>,
) -> Result<(), TimerError> {
    if doc.state.is_running() {
        return Err(TimerError::AlreadyRunning);
    }
    ensure_task(doc, project, task);
    doc.state = TimerState::Running {
        project: project.to_string(),
        task: task.to_string(),
        start: now,
    };
    Ok(())
}

/// Reset the running timer's start to `now`, keeping project and task.
/// Returns the names for display.
pub fn restart(doc: &mut Document, now: DateTime<Utc>) -> Result<(String, String), TimerError> {
    match &mut doc.state {
        TimerState::Running {
            project,
            task,
            start,
        } => {
            *start = now;
            Ok((project.clone(), task.clone()))
        }
        TimerState::Idle => Err(TimerError::NotRunning),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoppedFrame {
    pub project: String,
    pub task: String,
    pub frame: Frame,
}

/// `Running -> Idle`, appending the recorded frame to the task.
pub fn stop(doc: &mut Document, now: DateTime<Utc>) -> Result<StoppedFrame, TimerError> {
    let (project, task, started) = match &doc.state {
        TimerState::Running {
            project,
            task,
            start,
        } => (project.clone(), task.clone(), *start),
        TimerState::Idle => return Err(TimerError::NotRunning),
    };
    // A clock adjustment can put `now` before the recorded start; clamp to a
    // zero-length frame instead of recording a negative one.
    let end = if now < started { started } else { now };
    let frame = Frame::new(started, end);
    ensure_task(doc, &project, &task).frames.push(frame.clone());
    doc.state = TimerState::Idle;
    Ok(StoppedFrame {
        project,
        task,
        frame,
    })
}

/// `Running -> Idle` without recording anything.
pub fn cancel(doc: &mut Document) -> Result<(String, String), TimerError> {
    match std::mem::take(&mut doc.state) {
        TimerState::Running { project, task, .. } => Ok((project, task)),
        TimerState::Idle => Err(TimerError::NotRunning),
    }
}

/// Record a finished frame of the given length ending at `now`. Refused
/// while a timer runs so there is no ambiguity about what "now" belongs to.
pub fn add(
    doc: &mut Document,
    project: &str,
    task: &str,
    duration: Duration,
    now: DateTime<Utc>,
) -> Result<Frame, TimerError> {
    if doc.state.is_running() {
        return Err(TimerError::AlreadyRunning);
    }
    if duration <= Duration::zero() {
        return Err(TimerError::InvalidDuration(
            "duration must be positive".to_string(),
        ));
    }
    let frame = Frame::new(now - duration, now);
    ensure_task(doc, project, task).frames.push(frame.clone());
    Ok(frame)
}
