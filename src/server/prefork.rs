//! HTTP mode: a fixed pool of workers fed by a single acceptor.
//!
//! The acceptor pushes accepted streams onto a bounded queue and whichever
//! idle worker wins the receiver lock serves the next one. There is no
//! ordering or fairness guarantee between workers.

use std::sync::Arc;

use anyhow::bail;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::http::connection::Connection;

type Queue = Arc<Mutex<mpsc::Receiver<TcpStream>>>;

pub struct WorkerPool {
    queue: mpsc::Sender<TcpStream>,
    workers: JoinSet<usize>,
}

impl WorkerPool {
    /// Starts `num_workers` workers serving files from `www_root`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(num_workers: usize, www_root: &str) -> Self {
        let (tx, rx) = mpsc::channel(num_workers.max(1));
        let rx: Queue = Arc::new(Mutex::new(rx));
        let www_root: Arc<str> = Arc::from(www_root);

        let mut workers = JoinSet::new();
        for id in 1..=num_workers {
            info!(worker = id, "starting worker");
            workers.spawn(worker_loop(id, Arc::clone(&rx), Arc::clone(&www_root)));
        }

        Self { queue: tx, workers }
    }

    /// Number of workers still running.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Accepts connections until `shutdown` completes, handing each to the
    /// pool.
    ///
    /// On shutdown the queue is closed; workers finish the connection they
    /// hold, exit, and `run` returns once all of them are gone. Workers that
    /// exit while the pool is still accepting are logged, and the pool fails
    /// when none remain.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(workers = self.worker_count(), "acceptor running");

        let WorkerPool { queue, mut workers } = self;
        let mut queue = Some(queue);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown, if queue.is_some() => {
                    info!(workers = workers.len(), "closing the queue, draining workers");
                    queue = None;
                }
                accepted = listener.accept(), if queue.is_some() => match accepted {
                    Ok((stream, peer)) => {
                        info!(peer = %peer, "accepted connection");
                        if let Some(queue) = &queue {
                            dispatch(queue, stream).await?;
                        }
                    }
                    Err(e) => error!(error = %e, "accept failed"),
                },
                exited = workers.join_next() => match exited {
                    Some(exited) => reap_worker(exited),
                    None if queue.is_none() => {
                        info!("all workers drained");
                        return Ok(());
                    }
                    None => bail!("all workers exited"),
                },
            }
        }
    }
}

/// Queues a connection, waiting while the queue is full.
async fn dispatch(queue: &mpsc::Sender<TcpStream>, stream: TcpStream) -> anyhow::Result<()> {
    if queue.send(stream).await.is_err() {
        bail!("no worker left to take the connection");
    }
    Ok(())
}

fn reap_worker(exited: Result<usize, JoinError>) {
    match exited {
        Ok(id) => warn!(worker = id, "worker exited"),
        Err(e) if e.is_panic() => error!(error = %e, "worker crashed"),
        Err(e) => warn!(error = %e, "worker cancelled"),
    }
}

async fn worker_loop(id: usize, queue: Queue, www_root: Arc<str>) -> usize {
    let label = format!("Worker-{id}");

    loop {
        let next = queue.lock().await.recv().await;
        let Some(stream) = next else {
            break;
        };

        let mut conn = Connection::new(stream, label.as_str());
        conn.serve_http(&www_root).await;
        conn.close().await;
        info!(worker = %label, "worker finished job, waiting next one");
    }

    id
}
