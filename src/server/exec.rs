//! Generic mode: every connection is handed to a freshly spawned program.
//!
//! The program's stdin is fed from the socket and its stdout and stderr are
//! copied back to it. The server itself never interprets those bytes.

use std::io;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::bail;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::Program;
use crate::server::reaper::{Reaper, ReaperHandle};

/// Where the awk interpreter lives.
pub const AWK_PATH: &str = "/usr/bin/awk";

const PIPE_BUF_SIZE: usize = 4096;

/// Builds the command for `program` with all three stdio streams piped.
pub fn command(program: &Program) -> Command {
    let mut cmd = match program {
        Program::Path(path) => Command::new(path),
        Program::Awk(one_liner) => {
            let mut cmd = Command::new(AWK_PATH);
            cmd.arg0("awk").arg(one_liner);
            cmd
        }
    };
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Accept loop of the generic mode. Runs until the task is dropped.
pub async fn run(listener: TcpListener, program: Program) -> anyhow::Result<()> {
    let (reaper, handle) = Reaper::new();
    tokio::spawn(reaper.run());
    serve(listener, Arc::new(program), handle).await
}

/// Like [`run`], reporting child exits through an existing reaper.
pub async fn serve(
    listener: TcpListener,
    program: Arc<Program>,
    reaper: ReaperHandle,
) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!(error = %e, "accept failed");
                continue;
            }
        };
        info!(peer = %peer, "accepted connection");

        let program = Arc::clone(&program);
        let reaper = reaper.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(socket, &program, &reaper).await {
                error!(peer = %peer, error = %e, "connection error");
            }
        });
    }
}

async fn serve_connection(
    socket: TcpStream,
    program: &Program,
    reaper: &ReaperHandle,
) -> anyhow::Result<()> {
    let mut child = match command(program).spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(program = ?program, error = %e, "exec failed");
            reaper.exec_failed();
            return Ok(());
        }
    };
    info!(pid = child.id(), "spawned child to serve client");

    let (Some(stdin), Some(stdout), Some(stderr)) =
        (child.stdin.take(), child.stdout.take(), child.stderr.take())
    else {
        reaper.register(child);
        bail!("child stdio is not piped");
    };
    reaper.register(child);

    pump(socket, stdin, stdout, stderr).await?;
    Ok(())
}

/// Shuttles bytes between a connection and a child's stdio until the child
/// closes both of its output streams.
///
/// Socket input goes to `stdin`, which is closed once the client stops
/// sending. When output ends the input side is abandoned and the socket is
/// shut down.
pub async fn pump<S, I, O, E>(socket: S, mut stdin: I, stdout: O, stderr: E) -> io::Result<u64>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncWrite + Unpin + Send + 'static,
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (mut rd, mut wr) = tokio::io::split(socket);

    let input = tokio::spawn(async move {
        match tokio::io::copy(&mut rd, &mut stdin).await {
            Ok(bytes) => debug!(bytes, "client input finished"),
            Err(e) => debug!(error = %e, "client input stopped"),
        }
        // dropping stdin here delivers EOF to the child
    });

    let copied = copy_output(stdout, stderr, &mut wr).await;
    input.abort();
    let shutdown = wr.shutdown().await;

    let copied = copied?;
    shutdown?;
    Ok(copied)
}

async fn copy_output<O, E, W>(mut stdout: O, mut stderr: E, wr: &mut W) -> io::Result<u64>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut out_buf = vec![0u8; PIPE_BUF_SIZE];
    let mut err_buf = vec![0u8; PIPE_BUF_SIZE];
    let mut out_open = true;
    let mut err_open = true;
    let mut total = 0u64;

    while out_open || err_open {
        let (n, from_stdout) = tokio::select! {
            res = stdout.read(&mut out_buf), if out_open => (res?, true),
            res = stderr.read(&mut err_buf), if err_open => (res?, false),
        };

        if n == 0 {
            if from_stdout {
                out_open = false;
            } else {
                err_open = false;
            }
            continue;
        }

        let chunk = if from_stdout { &out_buf[..n] } else { &err_buf[..n] };
        wr.write_all(chunk).await?;
        total += n as u64;
    }

    wr.flush().await?;
    Ok(total)
}
