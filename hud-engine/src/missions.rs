//! # missions
//!
//! Mission task-list feed. An external producer drops a JSON document at one
//! of a few well-known locations; this module reads it through a fallback
//! chain of [`MissionSource`]s and caches the parsed result for an hour.
//! The cache is owned by the engine task, so no locking here.
//!
//! Feed shape (field names fixed by the producer):
//! `{ "list_name": ..., "timestamp": ..., "tasks": [ { "text", "dueDate"?,
//! "hasSubtasks", "completedSubtasks"?, "totalSubtasks"? } ] }`

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MissionSourceError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

// ── Feed documents ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MissionFeed {
    list_name: String,
    /// Producer write time, epoch ms. Drives the 24 h outdated check.
    timestamp: i64,
    tasks: Vec<FeedTask>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedTask {
    text: String,
    #[serde(default)]
    due_date: Option<i64>,
    #[serde(default)]
    has_subtasks: bool,
    #[serde(default)]
    completed_subtasks: Option<u32>,
    #[serde(default)]
    total_subtasks: Option<u32>,
}

// ── Domain types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub text: String,
    pub due_at_ms: Option<i64>,
    /// (completed, total) when the task carries subtasks.
    pub subtasks: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissionList {
    pub list_name: String,
    pub tasks: Vec<Task>,
    /// Producer timestamp from the feed, epoch ms.
    pub timestamp_ms: i64,
}

impl From<MissionFeed> for MissionList {
    fn from(feed: MissionFeed) -> Self {
        let tasks = feed
            .tasks
            .into_iter()
            .map(|t| Task {
                text: t.text,
                due_at_ms: t.due_date,
                subtasks: if t.has_subtasks {
                    Some((
                        t.completed_subtasks.unwrap_or(0),
                        t.total_subtasks.unwrap_or(0),
                    ))
                } else {
                    None
                },
            })
            .collect();
        Self {
            list_name: feed.list_name,
            tasks,
            timestamp_ms: feed.timestamp,
        }
    }
}

// ── Sources ───────────────────────────────────────────────────────────────────

pub trait MissionSource: Send {
    fn name(&self) -> &str;
    /// Raw feed JSON, `Ok(None)` when this source has nothing (not an error).
    fn read(&self) -> Result<Option<String>, MissionSourceError>;
}

pub struct FileMissionSource {
    name: String,
    path: PathBuf,
}

impl FileMissionSource {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self { name: name.into(), path }
    }
}

impl MissionSource for FileMissionSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Option<String>, MissionSourceError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }
}

// ── Cache ─────────────────────────────────────────────────────────────────────

pub struct MissionCache {
    sources: Vec<Box<dyn MissionSource>>,
    cached: Option<MissionList>,
    last_load_at: Option<Instant>,
    reuse_window: Duration,
}

impl MissionCache {
    pub fn new(sources: Vec<Box<dyn MissionSource>>, reuse_window: Duration) -> Self {
        Self {
            sources,
            cached: None,
            last_load_at: None,
            reuse_window,
        }
    }

    /// Cached list, reloading through the source chain when the last read is
    /// older than the reuse window. A cached "nothing found" answer is reused
    /// for the same window, so an absent feed does not trigger a file probe
    /// sixty times a second.
    pub fn read(&mut self) -> Option<&MissionList> {
        let fresh = self
            .last_load_at
            .is_some_and(|t| t.elapsed() < self.reuse_window);
        if !fresh {
            self.cached = self.load();
            self.last_load_at = Some(Instant::now());
        }
        self.cached.as_ref()
    }

    /// Task-feed-updated notification: the next `read()` reloads regardless
    /// of age.
    pub fn invalidate(&mut self) {
        self.last_load_at = None;
    }

    fn load(&self) -> Option<MissionList> {
        for source in &self.sources {
            match source.read() {
                Ok(Some(raw)) => match serde_json::from_str::<MissionFeed>(&raw) {
                    Ok(feed) => {
                        debug!(source = source.name(), tasks = feed.tasks.len(), "mission feed loaded");
                        return Some(feed.into());
                    }
                    Err(e) => {
                        warn!(source = source.name(), error = %e, "mission feed unparseable, trying next source");
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(source = source.name(), error = %e, "mission source unreadable, trying next source");
                }
            }
        }
        debug!("no mission data found");
        None
    }
}

/// Display staleness is independent of the read cache: data strictly older
/// than the cutoff renders the outdated placeholder; exactly at the cutoff
/// still renders.
pub fn is_outdated(list: &MissionList, now_ms: i64, cutoff: Duration) -> bool {
    now_ms - list.timestamp_ms > cutoff.as_millis() as i64
}

/// Relative due label: "2w", "3d", "7h" or "Soon". Buckets use integer
/// division, so 6 days 23 hours is still "6d".
pub fn due_label(due_at_ms: i64, now_ms: i64) -> String {
    let left = due_at_ms - now_ms;
    let days = left / (1000 * 60 * 60 * 24);
    let hours = left / (1000 * 60 * 60);
    if days >= 7 {
        format!("{}w", days / 7)
    } else if days >= 1 {
        format!("{days}d")
    } else if hours >= 1 {
        format!("{hours}h")
    } else {
        "Soon".to_string()
    }
}
