//! Scripted local HTTP server for the REST client tests
//!
//! Each connection is answered with the next scripted response and closed.
//! Once the script runs out the last response is repeated, which is how the
//! tests model an operation that never finishes.

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as the server saw it
#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub method: String,
    pub path: String,
    pub head: String,
    pub body: String,
}

impl SeenRequest {
    /// `METHOD /path?query`
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    pub fn has_header(&self, name: &str, value: &str) -> bool {
        let wanted = format!("{}: {}", name, value).to_ascii_lowercase();
        self.head
            .lines()
            .any(|l| l.trim().to_ascii_lowercase() == wanted)
    }
}

/// Requests received so far, shared with the server task
#[derive(Debug, Clone, Default)]
pub(crate) struct SeenRequests(Arc<Mutex<Vec<SeenRequest>>>);

impl SeenRequests {
    pub fn all(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.all().iter().map(SeenRequest::line).collect()
    }
}

pub(crate) struct StubServer {
    listener: TcpListener,
    pub base_url: String,
}

impl StubServer {
    pub async fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        Self { listener, base_url }
    }

    /// Start answering connections with `responses`, in order
    pub fn serve(self, responses: Vec<String>) -> SeenRequests {
        assert!(!responses.is_empty(), "stub server needs at least one response");

        let seen = SeenRequests::default();
        let recorder = seen.clone();

        tokio::spawn(async move {
            let mut next = 0;
            while let Ok((mut stream, _)) = self.listener.accept().await {
                if let Some(request) = read_request(&mut stream).await {
                    recorder.0.lock().unwrap().push(request);
                }

                let response = &responses[next.min(responses.len() - 1)];
                next += 1;

                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        seen
    }
}

/// Base URL nothing listens on
pub(crate) async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

/// A complete HTTP/1.1 response that closes the connection
pub(crate) fn response(status: u16, headers: &[(&str, &str)], body: &str) -> String {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Status",
    };

    let mut out = format!("HTTP/1.1 {} {}\r\n", status, reason);
    for (name, value) in headers {
        out.push_str(&format!("{}: {}\r\n", name, value));
    }
    out.push_str(&format!(
        "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    out
}

async fn read_request(stream: &mut TcpStream) -> Option<SeenRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    Some(SeenRequest {
        method,
        path,
        head,
        body,
    })
}
