//! Minimal HTTP/1.1 server that serves fake post pages for integration tests.
//!
//! `GET /<anything>/<id>` returns an HTML page with Open Graph tags for `<id>`,
//! unless `<id>` is listed as failing (500) or empty (200, no metadata).
//! Every request path is recorded so tests can assert what was fetched.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Default, Clone)]
pub struct PostServerOptions {
    /// Post ids answered with `500 Internal Server Error`.
    pub failing: HashSet<String>,
    /// Post ids answered with a page that carries no title or media.
    pub empty: HashSet<String>,
}

impl PostServerOptions {
    pub fn failing(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// Handle to a running server.
#[derive(Clone)]
pub struct PostServer {
    /// Base URL without trailing slash (e.g. "http://127.0.0.1:12345").
    pub base: String,
    hits: Arc<Mutex<Vec<String>>>,
    options: Arc<Mutex<PostServerOptions>>,
}

impl PostServer {
    /// Request paths (query included) in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }

    /// Change which ids fail; applies to the next request.
    pub fn set_options(&self, opts: PostServerOptions) {
        *self.options.lock().unwrap() = opts;
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(opts: PostServerOptions) -> PostServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = PostServer {
        base: format!("http://127.0.0.1:{}", port),
        hits: Arc::new(Mutex::new(Vec::new())),
        options: Arc::new(Mutex::new(opts)),
    };
    let shared = server.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = shared.clone();
            thread::spawn(move || handle(stream, &shared));
        }
    });
    server
}

fn handle(mut stream: std::net::TcpStream, server: &PostServer) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut first = request.lines().next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("");
    let target = first.next().unwrap_or("/").to_string();
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    server.hits.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("/");
    let id = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("").to_string();
    let opts = server.options.lock().unwrap().clone();

    let (status, body) = if opts.failing.contains(&id) {
        ("500 Internal Server Error", "oops".to_string())
    } else if opts.empty.contains(&id) {
        ("200 OK", "<html><head></head><body></body></html>".to_string())
    } else {
        ("200 OK", page(&id))
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body.as_bytes());
}

fn page(id: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head>\
         <title>fallback {id}</title>\
         <meta property=\"og:title\" content=\"Post {id}\">\
         <meta name=\"description\" content=\"About {id} &amp; more\">\
         <meta name=\"author\" content=\"Author of {id}\">\
         <meta property=\"og:image\" content=\"https://cdn.example/{id}/1.jpg\">\
         <meta property=\"og:image\" content=\"https://cdn.example/{id}/2.jpg\">\
         </head><body>post</body></html>"
    )
}
