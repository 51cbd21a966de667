#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dof_sim::{DofSimServer, SimBridge};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A stand-in for the Isaac Sim bridge that answers each connection with the next
/// canned reply and hands back every script it received.
pub struct FakeBridge {
    pub addr: SocketAddr,
    accepted: Arc<Mutex<Vec<Instant>>>,
    handle: JoinHandle<Vec<String>>,
}

impl FakeBridge {
    pub async fn start(replies: Vec<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(Mutex::new(Vec::new()));

        let log = accepted.clone();
        let handle = tokio::spawn(async move {
            let mut received = Vec::new();
            for reply in replies {
                let (mut socket, _) = listener.accept().await.unwrap();
                log.lock().unwrap().push(Instant::now());
                let mut script = Vec::new();
                socket.read_to_end(&mut script).await.unwrap();
                received.push(String::from_utf8(script).unwrap());
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            received
        });

        Self {
            addr,
            accepted,
            handle,
        }
    }

    /// Bridge reply carrying `output` as what the script printed.
    pub fn ok(output: &str) -> String {
        serde_json::json!({ "status": "ok", "output": output }).to_string()
    }

    pub fn client(&self) -> SimBridge {
        SimBridge::new(&self.addr.ip().to_string(), self.addr.port())
            .with_timeouts(Duration::from_secs(2), Duration::from_secs(2))
    }

    pub fn server(&self) -> DofSimServer {
        self.server_with_settle_delay(Duration::ZERO)
    }

    pub fn server_with_settle_delay(&self, settle_delay: Duration) -> DofSimServer {
        DofSimServer::with_bridge(self.client(), settle_delay, "dof-sim")
    }

    /// When each connection so far was accepted.
    pub fn accepted_at(&self) -> Vec<Instant> {
        self.accepted.lock().unwrap().clone()
    }

    pub async fn scripts(self) -> Vec<String> {
        self.handle.await.unwrap()
    }
}
