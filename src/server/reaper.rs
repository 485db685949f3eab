//! Child process reaping.
//!
//! Spawned children are handed to a single reaper task, which waits for each
//! of them to terminate, logs the exit and publishes a [`ChildExit`] to any
//! subscriber. Nothing runs in signal context.

use std::io;
use std::process::ExitStatus;

use tokio::process::Child;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info};

/// Exit status recorded when the program could not be executed at all.
pub const EXEC_FAILURE_STATUS: i32 = 2;

const EXIT_CHANNEL_CAPACITY: usize = 64;

/// A terminated child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` when no process was ever created.
    pub pid: Option<u32>,
    /// Exit code, `None` if the child was killed by a signal.
    pub code: Option<i32>,
}

enum ReaperEvent {
    Spawned(Child),
    ExecFailed,
}

/// Cloneable handle used to hand children over to the reaper.
#[derive(Clone)]
pub struct ReaperHandle {
    events: mpsc::UnboundedSender<ReaperEvent>,
    exits: broadcast::Sender<ChildExit>,
}

impl ReaperHandle {
    /// Passes ownership of `child` to the reaper.
    pub fn register(&self, child: Child) {
        if self.events.send(ReaperEvent::Spawned(child)).is_err() {
            error!("reaper is gone, child will not be reaped");
        }
    }

    /// Records a program that failed to start.
    pub fn exec_failed(&self) {
        if self.events.send(ReaperEvent::ExecFailed).is_err() {
            error!("reaper is gone, exec failure not recorded");
        }
    }

    /// Subscribes to exit notifications sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChildExit> {
        self.exits.subscribe()
    }
}

pub struct Reaper {
    events: mpsc::UnboundedReceiver<ReaperEvent>,
    exits: broadcast::Sender<ChildExit>,
    children: JoinSet<(Option<u32>, io::Result<ExitStatus>)>,
}

impl Reaper {
    pub fn new() -> (Self, ReaperHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (exits, _) = broadcast::channel(EXIT_CHANNEL_CAPACITY);

        let handle = ReaperHandle {
            events: events_tx,
            exits: exits.clone(),
        };
        let reaper = Self {
            events: events_rx,
            exits,
            children: JoinSet::new(),
        };
        (reaper, handle)
    }

    /// Runs until every handle is dropped and all children have exited.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Some(ReaperEvent::Spawned(mut child)) => {
                        let pid = child.id();
                        self.children.spawn(async move { (pid, child.wait().await) });
                    }
                    Some(ReaperEvent::ExecFailed) => self.publish(ChildExit {
                        pid: None,
                        code: Some(EXEC_FAILURE_STATUS),
                    }),
                    None => break,
                },
                Some(joined) = self.children.join_next() => self.reap(joined),
            }
        }

        while let Some(joined) = self.children.join_next().await {
            self.reap(joined);
        }
    }

    fn reap(
        &self,
        joined: Result<(Option<u32>, io::Result<ExitStatus>), tokio::task::JoinError>,
    ) {
        match joined {
            Ok((pid, Ok(status))) => {
                info!(pid, status = %status, "child exited");
                self.publish(ChildExit {
                    pid,
                    code: status.code(),
                });
            }
            Ok((pid, Err(e))) => error!(pid, error = %e, "waitpid failed"),
            Err(e) => error!(error = %e, "reaper task failed"),
        }
    }

    fn publish(&self, exit: ChildExit) {
        // nobody listening is fine
        let _ = self.exits.send(exit);
    }
}
