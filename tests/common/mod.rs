//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// What the mock upstream saw of one request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub path: String,
    pub params: HashMap<String, String>,
    pub referer: Option<String>,
}

impl UpstreamRequest {
    pub fn is_geocode(&self) -> bool {
        self.path.ends_with("SearchServer/mozi")
    }

    pub fn is_routing(&self) -> bool {
        self.path.ends_with("RoutingManager/routingRequest")
    }
}

/// Start a programmable mock upstream on an ephemeral port.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(UpstreamRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Option<UpstreamRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));

    let referer = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("referer"))
        .map(|(_, value)| value.trim().to_string());

    Some(UpstreamRequest {
        path: path.to_string(),
        params: url::form_urlencoded::parse(query.as_bytes()).into_owned().collect(),
        referer,
    })
}

/// Geocoder reply with one named candidate.
pub fn geocode_body(name: &str, lon: f64, lat: f64) -> String {
    format!(r#"[{{"name":"{name}","location":{{"lat":{lat},"lon":{lon}}}}}]"#)
}

/// Routing reply whose primary route has the given segments and time.
pub fn routing_body(segments: &[u64], total_route_time: f64) -> String {
    let results: Vec<String> = segments
        .iter()
        .map(|length| format!(r#"{{"length":{length}}}"#))
        .collect();
    format!(
        r#"{{"response":{{"results":[{}],"totalRouteTime":{}}},"alternatives":[]}}"#,
        results.join(","),
        total_route_time
    )
}
