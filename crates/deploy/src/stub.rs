//! Minimal HTTP endpoint for exercising the network adapters in tests.
//!
//! Every connection carries one request and is closed after the response.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
pub(crate) struct StubRequest {
    pub method: String,
    /// Path and query string.
    pub target: String,
    pub body: String,
}

impl StubRequest {
    /// Method name of a JSON-RPC call.
    pub fn rpc_method(&self) -> Option<String> {
        let call: Value = serde_json::from_str(&self.body).ok()?;
        call["method"].as_str().map(str::to_string)
    }
}

pub(crate) struct StubServer {
    url: Url,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    /// Serve `handler`'s JSON value as the body of every response.
    pub async fn start<H>(handler: H) -> Self
    where
        H: Fn(&StubRequest) -> Value + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().expect("Stub server has no address");
        let url = Url::parse(&format!("http://{addr}/")).expect("Invalid stub URL");

        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let handler = handler.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    recorded.lock().unwrap().push(request.clone());

                    let body = (*handler)(&request).to_string();
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { url, requests }
    }

    /// A JSON-RPC node. `handler(method, params)` returns the `result` member,
    /// or the message of an error response.
    pub async fn json_rpc<H>(handler: H) -> Self
    where
        H: Fn(&str, &Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::start(move |request| {
            let call: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            let method = call["method"].as_str().unwrap_or_default();
            match handler(method, &call["params"]) {
                Ok(result) => json!({"jsonrpc": "2.0", "id": call["id"], "result": result}),
                Err(message) => json!({
                    "jsonrpc": "2.0",
                    "id": call["id"],
                    "error": {"code": -32000, "message": message},
                }),
            }
        })
        .await
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON-RPC methods called so far, in order.
    pub fn rpc_methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(StubRequest::rpc_method)
            .collect()
    }

    /// Number of calls to one JSON-RPC method.
    pub fn rpc_count(&self, method: &str) -> usize {
        self.rpc_methods().iter().filter(|m| *m == method).count()
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<StubRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    Some(StubRequest {
        method: request_line.next()?.to_string(),
        target: request_line.next()?.to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    })
}
