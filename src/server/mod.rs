//! Listening socket and the two connection drivers.

pub mod exec;
pub mod listener;
pub mod prefork;
pub mod reaper;

use tracing::info;

use crate::config::{Config, Mode};
use crate::server::prefork::WorkerPool;

/// Binds the configured address and serves in the configured mode until
/// `shutdown` completes.
pub async fn run<F>(cfg: &Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let listener = listener::bind(&cfg.listen_addr(), cfg.backlog)?;

    match &cfg.mode {
        Mode::Http => {
            info!(workers = cfg.num_workers, www_root = %cfg.www_root, "starting http server");
            WorkerPool::start(cfg.num_workers, &cfg.www_root)
                .run(listener, shutdown)
                .await
        }
        Mode::Exec(program) => {
            info!(program = ?program, "forking a child per connection");
            tokio::select! {
                res = exec::run(listener, program.clone()) => res,
                _ = shutdown => Ok(()),
            }
        }
    }
}
