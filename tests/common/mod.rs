#![allow(dead_code)]

use std::io::Read;
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use apitest_engine::{EngineConfig, Executor, RequestBody, RequestSpec};
use tiny_http::{Header, Response, Server};

/// What the test server saw for one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Canned reply: status, extra headers, body.
pub struct Reply {
    pub status: u16,
    pub headers: Vec<&'static str>,
    pub body: &'static str,
}

impl Reply {
    pub fn json(status: u16, body: &'static str) -> Self {
        Self {
            status,
            headers: vec!["Content-Type: application/json"],
            body,
        }
    }

    pub fn text(status: u16, body: &'static str) -> Self {
        Self {
            status,
            headers: vec!["Content-Type: text/plain"],
            body,
        }
    }

    pub fn with_header(mut self, header: &'static str) -> Self {
        self.headers.push(header);
        self
    }
}

/// Serve `replies` in order, one per request, then stop.
/// Returns the base URL and a channel of captured requests.
pub fn serve(replies: Vec<Reply>) -> (String, mpsc::Receiver<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for reply in replies {
            let Ok(mut request) = server.recv() else {
                return;
            };

            let mut body = String::new();
            let _ = request.as_reader().read_to_string(&mut body);
            let captured = Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                headers: request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string(), h.value.to_string()))
                    .collect(),
                body,
            };
            let _ = tx.send(captured);

            let mut response = Response::from_string(reply.body).with_status_code(reply.status);
            for raw in reply.headers {
                response = response.with_header(raw.parse::<Header>().unwrap());
            }
            let _ = request.respond(response);
        }
    });

    (format!("http://{addr}"), rx)
}

/// Accept one connection, read the request, then hold it open without answering.
pub fn hanging_server(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(hold);
        }
    });
    addr
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

pub fn executor() -> Executor {
    Executor::new(&EngineConfig::default()).unwrap()
}

pub fn spec(method: &str, url: &str, body: RequestBody) -> RequestSpec {
    RequestSpec {
        method: method.to_string(),
        url: url.to_string(),
        query: Vec::new(),
        headers: Default::default(),
        body,
        timeout: Duration::from_secs(5),
    }
}

pub fn received(rx: &mpsc::Receiver<Captured>) -> Captured {
    rx.recv_timeout(Duration::from_secs(5)).unwrap()
}
