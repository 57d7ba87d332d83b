//! Outbound peer RPCs and the generic client forwarding used by the
//! Router. Every call sets a short read/write timeout on the underlying
//! `TcpStream` and never blocks indefinitely - a hung peer is indistinguishable
//! from a dead one as far as the caller is concerned.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use forgecluster_consensus::{Heartbeat, HeartbeatAck, Replicate, ReplicateAck, RequestVote, VoteResponse};
use forgecluster_storage::LogEntry;
use forgecluster_types::LogIndex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::StateView;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("peer unreachable: {0}")]
    Unreachable(#[from] std::io::Error),
    #[error("malformed response from peer: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sends `request` to `addr` (`"host:port"`) with `timeout` and returns the
/// decoded JSON response body.
pub fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
    addr: &str,
    path: &str,
    request: &Req,
    timeout: Duration,
) -> Result<Resp, ClientError> {
    let body = serde_json::to_vec(request)?;
    let response = send(addr, "POST", path, &body, timeout)?;
    Ok(serde_json::from_slice(&response)?)
}

/// Sends a bodyless GET to `addr` and returns the decoded JSON response.
pub fn get_json<Resp: for<'de> Deserialize<'de>>(
    addr: &str,
    path: &str,
    timeout: Duration,
) -> Result<Resp, ClientError> {
    let response = send(addr, "GET", path, &[], timeout)?;
    Ok(serde_json::from_slice(&response)?)
}

fn send(addr: &str, method: &str, path: &str, body: &[u8], timeout: Duration) -> Result<Vec<u8>, std::io::Error> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let head = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response)?;
    let split = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map_or(response.len(), |pos| pos + 4);
    Ok(response[split..].to_vec())
}

pub fn request_vote(addr: &str, request: &RequestVote, timeout: Duration) -> Result<VoteResponse, ClientError> {
    post_json(addr, "/vote", request, timeout)
}

pub fn send_heartbeat(addr: &str, request: &Heartbeat, timeout: Duration) -> Result<HeartbeatAck, ClientError> {
    post_json(addr, "/heartbeat", request, timeout)
}

pub fn send_replicate(addr: &str, request: &Replicate, timeout: Duration) -> Result<ReplicateAck, ClientError> {
    post_json(addr, "/replicate", request, timeout)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStatus {
    pub node_id: forgecluster_types::NodeId,
    pub role: String,
    pub term: forgecluster_types::Term,
    pub peers: Vec<forgecluster_registry::Peer>,
}

pub fn fetch_status(addr: &str, timeout: Duration) -> Result<RemoteStatus, ClientError> {
    get_json(addr, "/status", timeout)
}

pub fn fetch_state(addr: &str, timeout: Duration) -> Result<StateView, ClientError> {
    get_json(addr, "/state", timeout)
}

pub fn fetch_logs_from(addr: &str, from_index: LogIndex, timeout: Duration) -> Result<Vec<LogEntry>, ClientError> {
    get_json(addr, &format!("/logs/{}", from_index.get()), timeout)
}

/// Forwards `method path` with `body` to `addr` verbatim and returns the
/// peer's status code and response body, without interpreting either -
/// used by the Router to proxy client API requests to whatever the
/// current leader returns.
pub fn forward_raw(
    addr: &str,
    method: &str,
    path: &str,
    body: &[u8],
    timeout: Duration,
) -> Result<(u16, Vec<u8>), std::io::Error> {
    let mut stream = TcpStream::connect(addr)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;

    let head = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(head.as_bytes())?;
    stream.write_all(body)?;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;

    let split = raw.windows(4).position(|w| w == b"\r\n\r\n").map_or(raw.len(), |pos| pos + 4);
    let status = raw
        .get(..split)
        .and_then(|head| std::str::from_utf8(head).ok())
        .and_then(|head| head.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(502);
    Ok((status, raw[split..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_times_out_against_a_closed_port() {
        let err = fetch_status("127.0.0.1:1", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, ClientError::Unreachable(_)));
    }
}
