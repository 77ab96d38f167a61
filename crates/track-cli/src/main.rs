use std::env;
use std::path::Path;
use std::process::Command as EditorCommand;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{CommandFactory, Parser, Subcommand};

use track_core::report::{self, ReportFilter};
use track_core::store::Store;
use track_core::task_ops::{self, Deleted};
use track_core::{config, duration, timer};

#[derive(Parser)]
#[command(
    name = "track",
    version = track_core::version(),
    about = "Track time spent on projects and tasks"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start tracking time for a task
    Start { project: String, task: String },
    /// Restart the running timer from now
    Restart,
    /// Stop the running timer and record a frame
    Stop,
    /// Cancel the running timer without recording a frame
    Cancel,
    /// Record a finished frame ending now, e.g. `track add site docs 2h30m`
    Add {
        project: String,
        task: String,
        duration: String,
    },
    /// Delete a project, a task, or a single frame by id
    Delete {
        project: String,
        task: Option<String>,
        frame: Option<String>,
    },
    /// Add or remove tags on a task
    Tag {
        project: String,
        task: String,
        #[arg(required = true)]
        tags: Vec<String>,
        /// Remove the tags instead of adding them
        #[arg(short, long)]
        remove: bool,
    },
    /// Show the currently running timer
    Status,
    /// Report time spent per project and task
    Report {
        project: Option<String>,
        task: Option<String>,
        /// Only include tasks carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// List individual frames
        #[arg(short, long)]
        frames: bool,
    },
    /// Open the store file in $EDITOR
    Edit,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let store_path = config::store_path()
        .ok_or_else(|| anyhow!("cannot locate the data directory; set HOME or TRACK_DATA_DIR"))?;

    // The editor owns the file for the duration; loading (and possibly
    // failing on) the store first would lock the user out of fixing it.
    if matches!(command, Command::Edit) {
        return edit(&store_path);
    }

    let mut store = Store::open(store_path)?;
    dispatch(&mut store, command)?;
    store.save()?;
    Ok(())
}

fn dispatch(store: &mut Store, command: Command) -> Result<()> {
    match command {
        Command::Start { project, task } => {
            let now = Utc::now();
            timer::start(&mut store.doc, &project, &task, now)?;
            store.mark_dirty();
            println!("Started at {}", local_hhmm(now));
        }
        Command::Restart => {
            let now = Utc::now();
            timer::restart(&mut store.doc, now)?;
            store.mark_dirty();
            println!("Restarted at {}", local_hhmm(now));
        }
        Command::Stop => {
            let now = Utc::now();
            let stopped = timer::stop(&mut store.doc, now)?;
            store.mark_dirty();
            println!(
                "Added frame at {} (started {} ago)",
                local_hhmm(now),
                duration::format_ms(stopped.frame.duration_ms())
            );
        }
        Command::Cancel => {
            timer::cancel(&mut store.doc)?;
            store.mark_dirty();
            println!("Timer cancelled");
        }
        Command::Add {
            project,
            task,
            duration: shorthand,
        } => {
            let length = duration::parse(&shorthand)
                .ok_or_else(|| anyhow!("cannot parse duration {shorthand:?} (try \"2h30m\")"))?;
            let now = Utc::now();
            let frame = timer::add(&mut store.doc, &project, &task, length, now)?;
            store.mark_dirty();
            println!(
                "Added frame at {} (started {} ago)",
                local_hhmm(now),
                duration::format_ms(frame.duration_ms())
            );
        }
        Command::Delete {
            project,
            task,
            frame,
        } => {
            let deleted =
                task_ops::delete(&mut store.doc, &project, task.as_deref(), frame.as_deref())?;
            store.mark_dirty();
            match deleted {
                Deleted::Project(name) => println!("Deleted project {name}"),
                Deleted::Task(name) => println!("Deleted task {name}"),
                Deleted::Frame(id) => println!("Deleted frame {}", report::short_id(&id)),
            }
        }
        Command::Tag {
            project,
            task,
            tags,
            remove,
        } => {
            task_ops::tag(&mut store.doc, &project, &task, &tags, remove);
            store.mark_dirty();
            let verb = if remove { "Removed" } else { "Added" };
            let noun = if tags.len() == 1 { "tag" } else { "tags" };
            println!("{verb} {noun} {}", tags.join(" "));
        }
        Command::Status => match report::status(&store.doc, Utc::now()) {
            Some(status) => println!("{}", report::render_status(&status)),
            None => println!("No task running"),
        },
        Command::Report {
            project,
            task,
            tag,
            frames,
        } => {
            let filter = ReportFilter {
                project,
                task,
                tag,
                with_frames: frames,
            };
            let rendered = report::render(&report::build(&store.doc, &filter)?);
            if !rendered.is_empty() {
                println!("{rendered}");
            }
        }
        Command::Edit => unreachable!("edit never opens the store"),
    }
    Ok(())
}

/// Pure passthrough: `$EDITOR store.json` with inherited stdio.
fn edit(store_path: &Path) -> Result<()> {
    let editor = env::var("EDITOR")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "vi".to_string());
    let mut words = shell_words::split(&editor)
        .with_context(|| format!("cannot parse EDITOR {editor:?}"))?;
    if words.is_empty() {
        bail!("EDITOR is empty");
    }
    let program =
        which::which(&words[0]).with_context(|| format!("editor {:?} not found", words[0]))?;
    let status = EditorCommand::new(program)
        .args(&words.split_off(1))
        .arg(store_path)
        .status()
        .with_context(|| format!("failed to launch {editor:?}"))?;
    if !status.success() {
        bail!("editor exited with {status}");
    }
    Ok(())
}

fn local_hhmm(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%H:%M").to_string()
}
