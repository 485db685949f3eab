//! Server-level tests over loopback sockets.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use spysrv::config::Program;
use spysrv::server::exec::{self, AWK_PATH};
use spysrv::server::listener;
use spysrv::server::prefork::WorkerPool;
use spysrv::server::reaper::{Reaper, EXEC_FAILURE_STATUS};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const TEST_TIMEOUT: Duration = Duration::from_secs(10);

async fn roundtrip(addr: std::net::SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_worker_pool_serves_more_connections_than_workers() {
    let root = std::env::temp_dir().join(format!("spysrv-pool-{}", std::process::id()));
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("index.html"), "hello").unwrap();

    let listener = listener::bind("127.0.0.1:0", 16).unwrap();
    let addr = listener.local_addr().unwrap();

    let num_workers = 2;
    let pool = WorkerPool::start(num_workers, root.to_str().unwrap());
    assert_eq!(pool.worker_count(), num_workers);
    tokio::spawn(pool.run(listener, std::future::pending()));

    for _ in 0..num_workers + 1 {
        let response = timeout(TEST_TIMEOUT, roundtrip(addr, b"GET /index.html HTTP/1.1\r\n\r\n"))
            .await
            .expect("connection was served");
        let text = String::from_utf8(response).unwrap();

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("X-Srv-Connection: Worker-"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }
}

#[tokio::test]
async fn test_worker_pool_drains_on_shutdown() {
    let root = std::env::temp_dir().join(format!("spysrv-drain-{}", std::process::id()));
    fs::create_dir_all(&root).unwrap();

    let listener = listener::bind("127.0.0.1:0", 16).unwrap();
    let pool = WorkerPool::start(3, root.to_str().unwrap());

    let result = timeout(TEST_TIMEOUT, pool.run(listener, async {}))
        .await
        .expect("workers drained");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_worker_pool_fails_when_no_worker_is_left() {
    let listener = listener::bind("127.0.0.1:0", 16).unwrap();
    let pool = WorkerPool::start(0, "/nonexistent");

    let err = timeout(TEST_TIMEOUT, pool.run(listener, std::future::pending()))
        .await
        .expect("pool stopped")
        .unwrap_err();
    assert_eq!(err.to_string(), "all workers exited");
}

#[tokio::test]
async fn test_exec_mode_pipes_connection_through_program() {
    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(exec::run(listener, Program::Path("/bin/cat".to_string())));

    let response = timeout(TEST_TIMEOUT, roundtrip(addr, b"ping\npong\n"))
        .await
        .expect("cat finished");
    assert_eq!(response, b"ping\npong\n");
}

#[tokio::test]
async fn test_exec_mode_awk_one_liner() {
    if !Path::new(AWK_PATH).exists() {
        return;
    }

    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(exec::run(listener, Program::Awk("{ print toupper($0) }".to_string())));

    let response = timeout(TEST_TIMEOUT, roundtrip(addr, b"shout\n"))
        .await
        .expect("awk finished");
    assert_eq!(response, b"SHOUT\n");
}

#[tokio::test]
async fn test_exec_mode_forwards_stderr() {
    if !Path::new(AWK_PATH).exists() {
        return;
    }

    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    let program = Program::Awk("{ print $0 > \"/dev/stderr\" }".to_string());
    tokio::spawn(exec::run(listener, program));

    let response = timeout(TEST_TIMEOUT, roundtrip(addr, b"err\n"))
        .await
        .expect("awk finished");
    assert_eq!(response, b"err\n");
}

#[tokio::test]
async fn test_exec_mode_closes_when_program_exits_first() {
    if !Path::new(AWK_PATH).exists() {
        return;
    }

    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(exec::run(listener, Program::Awk("BEGIN { print \"bye\" }".to_string())));

    // the client keeps its write side open; the server must still close
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut response = Vec::new();
    timeout(TEST_TIMEOUT, stream.read_to_end(&mut response))
        .await
        .expect("connection closed after the program exited")
        .unwrap();
    assert_eq!(response, b"bye\n");
}

#[tokio::test]
async fn test_reaper_reports_child_exit() {
    let (reaper, handle) = Reaper::new();
    let mut exits = handle.subscribe();
    tokio::spawn(reaper.run());

    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    let program = Arc::new(Program::Path("/bin/cat".to_string()));
    tokio::spawn(exec::serve(listener, program, handle));

    timeout(TEST_TIMEOUT, roundtrip(addr, b"bye\n")).await.unwrap();

    let exit = timeout(TEST_TIMEOUT, exits.recv()).await.unwrap().unwrap();
    assert!(exit.pid.is_some());
    assert_eq!(exit.code, Some(0));
}

#[tokio::test]
async fn test_exec_failure_reports_distinct_status() {
    let (reaper, handle) = Reaper::new();
    let mut exits = handle.subscribe();
    tokio::spawn(reaper.run());

    let listener = listener::bind("127.0.0.1:0", 5).unwrap();
    let addr = listener.local_addr().unwrap();
    let program = Arc::new(Program::Path("/nonexistent/spysrv-program".to_string()));
    tokio::spawn(exec::serve(listener, program, handle));

    // send nothing, so the close is a clean EOF rather than a reset
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut response = Vec::new();
    timeout(TEST_TIMEOUT, stream.read_to_end(&mut response))
        .await
        .unwrap()
        .unwrap();
    assert!(response.is_empty());

    let exit = timeout(TEST_TIMEOUT, exits.recv()).await.unwrap().unwrap();
    assert_eq!(exit.pid, None);
    assert_eq!(exit.code, Some(EXEC_FAILURE_STATUS));
}
