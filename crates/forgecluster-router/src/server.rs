//! The Router's own HTTP server: a stateless proxy in front of whatever
//! node is currently leader.
//!
//! Reuses [`forgecluster_rpc::http`] for request parsing and response
//! writing rather than re-implementing the wire format - the Router
//! speaks the same minimal HTTP/1.1 dialect as a node, it just terminates
//! requests differently.

use std::net::{TcpListener, TcpStream};
use std::time::Duration;

use forgecluster_registry::PeerRegistry;
use forgecluster_rpc::http::{self, Method, Request};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::RouterError;

const PROXY_TIMEOUT: Duration = Duration::from_secs(5);

/// Binds `addr` and serves forever, proxying every connection to the
/// cluster's current leader as found in `registry`.
pub fn serve(addr: &str, registry: PeerRegistry) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    tracing::info!(addr, "router listening");
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let registry = registry_handle(&registry);
                std::thread::spawn(move || handle_connection(stream, &registry));
            }
            Err(err) => warn!(error = %err, "accept failed"),
        }
    }
    Ok(())
}

// `PeerRegistry` re-reads its file on every call and holds no connection,
// so cloning just the path is enough to hand an independent handle to
// each connection thread.
fn registry_handle(registry: &PeerRegistry) -> PeerRegistry {
    PeerRegistry::new(registry.path().to_path_buf())
}

fn handle_connection(mut stream: TcpStream, registry: &PeerRegistry) {
    let request = match http::read_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(err) => {
            debug!(error = %err, "failed to read request");
            let _ = http::write_response(&mut stream, 400, "text/plain", b"Bad Request");
            return;
        }
    };

    if let Err(err) = dispatch(&mut stream, &request, registry) {
        debug!(error = %err, "failed to write response");
    }
}

fn dispatch(stream: &mut TcpStream, request: &Request, registry: &PeerRegistry) -> std::io::Result<()> {
    match (request.method, request.path.as_str()) {
        (Method::Get, "/NodeStatus") => {
            let leader = registry.get_leader().ok().flatten();
            let peers = registry.list_all().unwrap_or_default();
            http::write_json(
                stream,
                200,
                &json!({ "success": leader.is_some(), "leader": leader, "peers": peers }),
            )
        }
        (Method::Get, "/leader") => {
            let leader = registry.get_leader().ok().flatten();
            http::write_json(stream, 200, &json!({ "leader": leader }))
        }
        (Method::Get, "/peers") => {
            let peers = registry.list_all().unwrap_or_default();
            http::write_json(stream, 200, &peers)
        }
        (method, path) if path.starts_with("/proxy/") => {
            let subpath = &path["/proxy".len()..];
            proxy(stream, registry, method, subpath, &request.body)
        }
        _ => http::write_response(stream, 404, "text/plain", b"Not Found"),
    }
}

fn proxy(
    stream: &mut TcpStream,
    registry: &PeerRegistry,
    method: Method,
    path: &str,
    body: &[u8],
) -> std::io::Result<()> {
    match forward_to_leader(registry, method, path, body) {
        Ok((status, response_body)) => http::write_response(stream, status, "application/json", &response_body),
        Err(err) => {
            warn!(error = %err, "router failed to reach leader");
            let status = match err {
                RouterError::NoLeader => 503,
                RouterError::LeaderUnreachable | RouterError::Registry(_) => 502,
                RouterError::LeaderTimeout => 408,
            };
            http::write_json(stream, status, &json!({ "error": err.to_string() }))
        }
    }
}

fn forward_to_leader(
    registry: &PeerRegistry,
    method: Method,
    path: &str,
    body: &[u8],
) -> Result<(u16, Vec<u8>), RouterError> {
    let leader = registry.get_leader()?.ok_or(RouterError::NoLeader)?;
    let addr = format!("{}:{}", leader.host, leader.port);
    let method_str = match method {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Patch => "PATCH",
    };
    forgecluster_rpc::forward_raw(&addr, method_str, path, body, PROXY_TIMEOUT).map_err(|err| {
        if matches!(err.kind(), std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock) {
            RouterError::LeaderTimeout
        } else {
            RouterError::LeaderUnreachable
        }
    })
}
