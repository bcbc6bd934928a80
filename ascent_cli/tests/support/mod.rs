//! Loopback HTTP stub standing in for the training backend.
//!
//! Plain threads rather than tokio: each test blocks on the `ascent` child
//! process while the stub answers. `ascent_core/tests/http_transport.rs`
//! has the async counterpart used by the library's own transport tests.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// One request as received by the stub
#[derive(Debug)]
pub struct Captured {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.request_line.split(' ').nth(1).unwrap_or("")
    }
}

/// A canned answer for requests whose `METHOD path` starts with `prefix`
pub struct Route {
    pub prefix: &'static str,
    pub status: u16,
    pub body: &'static str,
}

pub fn route(prefix: &'static str, status: u16, body: &'static str) -> Route {
    Route {
        prefix,
        status,
        body,
    }
}

pub struct Stub {
    pub base_url: String,
    handle: JoinHandle<Vec<Captured>>,
}

impl Stub {
    /// Serve exactly `connections` requests, answering from `routes`
    pub fn start(connections: usize, routes: Vec<Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().expect("accept");
                let request = read_request(&mut stream);

                let (status, body) = routes
                    .iter()
                    .find(|r| request.request_line.starts_with(r.prefix))
                    .map(|r| (r.status, r.body))
                    .unwrap_or((404, r#"{"detail": "Not Found"}"#));

                let reply = format!(
                    "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                stream.write_all(reply.as_bytes()).expect("write reply");
                stream.flush().ok();
                captured.push(request);
            }
            captured
        });

        Self { base_url, handle }
    }

    /// Wait for all expected requests and return them
    pub fn finish(self) -> Vec<Captured> {
        self.handle.join().expect("stub thread panicked")
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let header_end = loop {
        let n = stream.read(&mut chunk).expect("read request");
        assert!(n > 0, "connection closed before headers were complete");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n").filter(|l| !l.is_empty());
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Captured {
        request_line,
        headers,
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    }
}
