//! Watch the local mirror directory and log what happens to it.

use crate::adb::AdbResult;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorEvent {
    Created(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    Accessed(PathBuf),
    Other(String),
}

impl fmt::Display for MirrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirrorEvent::Created(p) => write!(f, "created: {}", p.display()),
            MirrorEvent::Removed(p) => write!(f, "removed: {}", p.display()),
            MirrorEvent::Modified(p) => write!(f, "modified: {}", p.display()),
            MirrorEvent::Renamed { from, to } => {
                write!(f, "renamed: {} -> {}", from.display(), to.display())
            }
            MirrorEvent::Accessed(p) => write!(f, "accessed: {}", p.display()),
            MirrorEvent::Other(kind) => write!(f, "event: {kind}"),
        }
    }
}

/// Map a raw notify event to one entry per affected path.
pub fn classify(event: &Event) -> Vec<MirrorEvent> {
    let per_path = |make: fn(PathBuf) -> MirrorEvent| -> Vec<MirrorEvent> {
        event.paths.iter().cloned().map(make).collect()
    };
    match &event.kind {
        EventKind::Create(_) => per_path(MirrorEvent::Created),
        EventKind::Remove(_) => per_path(MirrorEvent::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
            vec![MirrorEvent::Renamed {
                from: event.paths[0].clone(),
                to: event.paths[1].clone(),
            }]
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => per_path(MirrorEvent::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => per_path(MirrorEvent::Created),
        EventKind::Modify(_) => per_path(MirrorEvent::Modified),
        EventKind::Access(_) => per_path(MirrorEvent::Accessed),
        other => vec![MirrorEvent::Other(format!("{other:?} {:?}", event.paths))],
    }
}

pub struct MirrorWatcher {
    dir: PathBuf,
    // dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl MirrorWatcher {
    pub fn new(dir: &Path) -> AdbResult<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(dir, RecursiveMode::Recursive)?;
        log::info!("watching {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
            _watcher: watcher,
            rx,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Next batch of classified events; None once the watcher is gone.
    pub async fn recv(&mut self) -> Option<Vec<MirrorEvent>> {
        loop {
            match self.rx.recv().await? {
                Ok(event) => return Some(classify(&event)),
                Err(e) => log::warn!("watch error on {}: {e}", self.dir.display()),
            }
        }
    }

    /// Log events until `stop` resolves; returns how many were seen.
    pub async fn run<F>(mut self, stop: F) -> AdbResult<usize>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);
        let mut seen = 0usize;
        loop {
            tokio::select! {
                _ = &mut stop => break,
                batch = self.recv() => match batch {
                    Some(events) => {
                        for event in events {
                            log::info!("{event}");
                            seen += 1;
                        }
                    }
                    None => break,
                },
            }
        }
        log::info!("stopped watching {} after {seen} events", self.dir.display());
        Ok(seen)
    }
}
