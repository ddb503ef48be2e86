//! Shared utilities for integration testing.

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

use correlation_api::observability::{LogFormat, PropertyFilter, RecordLayer};
use correlation_api::{HttpServer, Shutdown};

/// In-memory log sink; each clone appends to the same buffer.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    /// Subscriber writing JSON records into this buffer.
    pub fn subscriber(&self, filter: PropertyFilter) -> impl tracing::Subscriber + Send + Sync {
        let writer = self.clone();
        Registry::default().with(RecordLayer::new(
            move || writer.clone(),
            LogFormat::Json,
            filter,
        ))
    }

    /// Every record written so far, parsed.
    pub fn records(&self) -> Vec<Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).expect("one JSON record per line"))
            .collect()
    }
}

/// Serve `server` on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_server(
    server: HttpServer,
) -> (SocketAddr, Shutdown, JoinHandle<Result<(), std::io::Error>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx));
    (addr, shutdown, handle)
}
