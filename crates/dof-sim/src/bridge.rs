//! Client for Isaac Sim's TCP code-injection bridge.
//!
//! One command is one connection: the client writes Python source terminated by
//! a single LF, half-closes its write side, and reads until the bridge closes the
//! socket. The bridge answers with `{"status": "ok", "output": ...}` or
//! `{"status": "error", "error": ...}`.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::settings::BridgeSettings;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8226;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Could not connect to Isaac Sim at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Isaac Sim at {addr} did not answer within {after:?}")]
    Timeout { addr: String, after: Duration },
    #[error("I/O error talking to Isaac Sim: {0}")]
    Io(#[from] std::io::Error),
    #[error("Isaac Sim error: {0}")]
    Simulator(String),
}

#[derive(Debug, Clone)]
pub struct SimBridge {
    addr: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl Default for SimBridge {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl SimBridge {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(60),
        }
    }

    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self::new(&settings.host, settings.port)
            .with_timeouts(settings.connect_timeout(), settings.io_timeout())
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, io_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.io_timeout = io_timeout;
        self
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Run `source` inside Isaac Sim and return the text the script printed.
    ///
    /// Blank and non-JSON replies are turned into a synthetic
    /// `{"status": "success", "message": ...}` object. JSON that is not an
    /// object, or that carries a status other than `ok`, is an error.
    pub async fn exec(&self, source: &str) -> Result<String, BridgeError> {
        let mut payload = source.trim_end_matches('\n').to_string();
        payload.push('\n');
        tracing::debug!(addr = %self.addr, "Sending script to Isaac Sim:\n{}", payload);

        let raw = self.exchange(payload.as_bytes()).await?;
        tracing::debug!(addr = %self.addr, "Raw response from Isaac Sim:\n{}", raw);

        interpret_reply(&raw)
    }

    async fn exchange(&self, payload: &[u8]) -> Result<String, BridgeError> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| BridgeError::Timeout {
                addr: self.addr.clone(),
                after: self.connect_timeout,
            })?
            .map_err(|source| BridgeError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        let io = async {
            stream.write_all(payload).await?;
            stream.shutdown().await?;

            let mut data = Vec::new();
            stream.read_to_end(&mut data).await?;
            Ok::<_, std::io::Error>(data)
        };

        let data = timeout(self.io_timeout, io)
            .await
            .map_err(|_| BridgeError::Timeout {
                addr: self.addr.clone(),
                after: self.io_timeout,
            })??;

        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

fn success_message(message: &str) -> String {
    json!({ "status": "success", "message": message }).to_string()
}

pub(crate) fn interpret_reply(raw: &str) -> Result<String, BridgeError> {
    if raw.trim().is_empty() {
        tracing::error!("Received empty response from Isaac Sim");
        return Ok(success_message("Operation completed (no output)"));
    }

    let response = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            tracing::error!("Response from Isaac Sim is not an object: {}", raw);
            return Err(BridgeError::Simulator(format!(
                "Unexpected response: {}",
                raw.trim()
            )));
        }
        Err(_) => {
            tracing::error!("Failed to decode response: {}", raw);
            return Ok(success_message(raw));
        }
    };

    if response.get("status").and_then(Value::as_str) != Some("ok") {
        let error = response
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        tracing::error!("Error from Isaac Sim: {}", error);
        return Err(BridgeError::Simulator(error));
    }

    match response.get("output") {
        Some(Value::String(output)) if !output.is_empty() => Ok(output.clone()),
        Some(Value::Null) | None => Ok(success_message("Operation completed successfully")),
        Some(Value::String(_)) => Ok(success_message("Operation completed successfully")),
        Some(other) => Ok(other.to_string()),
    }
}
