//! Shared fixtures for the integration tests: a tiny HTTP/1.1 mock server on a
//! random local port that records every request it sees, and logger helpers.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use lib_toolkit::loggers::kit_logger::{KitLogger, LogLevel, LoggerOptions};

/// One request as received on the wire.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// e.g. `GET /search?a=1 HTTP/1.1`
    pub request_line: String,
    /// Lower-cased names, in wire order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn method(&self) -> &str {
        self.request_line.split(' ').next().unwrap_or_default()
    }

    /// Path and query as sent.
    pub fn target(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or_default()
    }

    pub fn query(&self) -> Option<&str> {
        self.target().split_once('?').map(|(_, q)| q)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Responder = Arc<dyn Fn(&RecordedRequest) -> Vec<u8> + Send + Sync>;

/// Mock server answering each connection once, then closing it.
pub struct MockServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Vec<u8> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind to random port");
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);

        let recorded = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = recorded.clone();
                let responder = responder.clone();
                tokio::spawn(async move {
                    serve_one(stream, recorded, responder).await;
                });
            }
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("No request reached the mock server")
    }
}

async fn serve_one(mut stream: TcpStream, recorded: Arc<Mutex<Vec<RecordedRequest>>>, responder: Responder) {
    let Ok(Some(request)) = read_request(&mut stream).await else {
        return;
    };
    let response = responder(&request);
    recorded.lock().unwrap().push(request);
    let _ = stream.write_all(&response).await;
    let _ = stream.flush().await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<RecordedRequest>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(RecordedRequest {
        request_line,
        headers,
        body,
    }))
}

/// A complete HTTP/1.1 response with a correct `Content-Length`.
pub fn reply(status_line: &str, content_type: &str, body: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        content_type,
        body.len(),
        body
    )
    .into_bytes()
}

/// A response whose body stops well short of its advertised length.
pub fn truncated_reply() -> Vec<u8> {
    b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 100\r\nConnection: close\r\n\r\nonly a few bytes"
        .to_vec()
}

/// URL on a local port nobody listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

/// Server that accepts connections and reads requests but never answers.
pub async fn silent_server_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = read_request(&mut stream).await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

/// Logger with every target switched off.
pub fn quiet_logger() -> Arc<KitLogger> {
    Arc::new(KitLogger::new(
        "test_quiet",
        Some(LoggerOptions {
            console_level: None,
            file_level: None,
            error_file_level: None,
            ..Default::default()
        }),
    ))
}

/// Logger writing every level to files under `dir`, nothing to the console.
pub fn file_logger(dir: &Path) -> Arc<KitLogger> {
    Arc::new(KitLogger::new(
        "test_http",
        Some(LoggerOptions {
            console_level: None,
            file_level: Some(LogLevel::Trace),
            error_file_level: Some(LogLevel::Error),
            log_dir: Some(dir.to_path_buf()),
            keep_files: 7,
        }),
    ))
}

/// Contents of the logger's info file, or an empty string if nothing was written yet.
pub fn info_log(logger: &KitLogger) -> String {
    logger
        .log_files()
        .0
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default()
}

/// Contents of the logger's error file, or an empty string if nothing was written yet.
pub fn error_log(logger: &KitLogger) -> String {
    logger
        .log_files()
        .1
        .and_then(|path| std::fs::read_to_string(path).ok())
        .unwrap_or_default()
}
