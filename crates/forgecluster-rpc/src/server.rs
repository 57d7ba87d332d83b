//! The peer-to-peer and client API HTTP server.
//!
//! One blocking `std::net::TcpListener` accept loop, spawning one
//! short-lived `std::thread` per accepted connection - no async runtime,
//! no connection keep-alive. This is the one RPC acceptor driver the
//! top-level spec's concurrency model names.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use forgecluster_types::LogIndex;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::api::{NodeApi, SubmitError};
use crate::http::{self, Method, Request};

const STREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Binds `addr` and serves forever, handing each connection to its own
/// thread. Returns only on a fatal bind error; callers run this inside the
/// node's RPC acceptor thread.
pub fn serve(addr: &str, node: Arc<dyn NodeApi>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    tracing::info!(addr, "rpc server listening");
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let node = Arc::clone(&node);
                std::thread::spawn(move || handle_connection(stream, &node));
            }
            Err(err) => warn!(error = %err, "accept failed"),
        }
    }
    Ok(())
}

fn handle_connection(mut stream: TcpStream, node: &Arc<dyn NodeApi>) {
    let _ = stream.set_read_timeout(Some(STREAM_TIMEOUT));
    let _ = stream.set_write_timeout(Some(STREAM_TIMEOUT));

    let request = match http::read_request(&mut stream) {
        Ok(Some(request)) => request,
        Ok(None) => return,
        Err(err) => {
            debug!(error = %err, "failed to read request");
            let _ = http::write_response(&mut stream, 400, "text/plain", b"Bad Request");
            return;
        }
    };

    if let Err(err) = dispatch(&mut stream, &request, node) {
        debug!(error = %err, "failed to write response");
    }
}

fn dispatch(stream: &mut TcpStream, request: &Request, node: &Arc<dyn NodeApi>) -> std::io::Result<()> {
    match (request.method, request.path.as_str()) {
        (Method::Post, "/vote") => {
            let Some(body): Option<forgecluster_consensus::RequestVote> = parse_body(stream, request)? else {
                return Ok(());
            };
            http::write_json(stream, 200, &node.handle_vote(body))
        }
        (Method::Post, "/heartbeat") => {
            let Some(body): Option<forgecluster_consensus::Heartbeat> = parse_body(stream, request)? else {
                return Ok(());
            };
            http::write_json(stream, 200, &node.handle_heartbeat(body))
        }
        (Method::Post, "/replicate") => {
            let Some(body): Option<forgecluster_consensus::Replicate> = parse_body(stream, request)? else {
                return Ok(());
            };
            let ack = node.handle_replicate(body);
            let status = if ack.success { 200 } else { 400 };
            http::write_json(stream, status, &ack)
        }
        (Method::Get, "/status") => http::write_json(stream, 200, &node.status()),
        (Method::Get, "/state") => http::write_json(stream, 200, &node.state()),
        (Method::Get, path) if path.starts_with("/logs/") => {
            let from_index: u64 = path["/logs/".len()..].parse().unwrap_or(0);
            let entries = node.logs_from(LogIndex::new(from_index));
            http::write_json(stream, 200, &entries)
        }
        (Method::Post, "/api/v1/printers") => {
            let Some(body): Option<AddPrinterBody> = parse_body(stream, request)? else {
                return Ok(());
            };
            submit(
                stream,
                node,
                201,
                forgecluster_kernel::Command::AddPrinter {
                    id: body.id,
                    company: body.company,
                    model: body.model,
                },
            )
        }
        (Method::Get, "/api/v1/printers") => {
            http::write_json(stream, 200, &node.state().printers)
        }
        (Method::Post, "/api/v1/filaments") => {
            let Some(body): Option<AddFilamentBody> = parse_body(stream, request)? else {
                return Ok(());
            };
            submit(
                stream,
                node,
                201,
                forgecluster_kernel::Command::AddFilament {
                    id: body.id,
                    filament_type: body.r#type,
                    color: body.color,
                    total_weight_g: body.total_weight_in_grams,
                },
            )
        }
        (Method::Get, "/api/v1/filaments") => {
            http::write_json(stream, 200, &node.state().filaments)
        }
        (Method::Post, "/api/v1/jobs") => {
            let Some(body): Option<AddJobBody> = parse_body(stream, request)? else {
                return Ok(());
            };
            submit(
                stream,
                node,
                201,
                forgecluster_kernel::Command::AddJob {
                    id: body.id,
                    printer_id: body.printer_id,
                    filament_id: body.filament_id,
                    filepath: body.filepath,
                    print_weight_g: body.print_weight_in_grams,
                },
            )
        }
        (Method::Get, "/api/v1/jobs") => http::write_json(stream, 200, &node.state().jobs),
        (Method::Patch, path) if path.starts_with("/api/v1/jobs/") && path.ends_with("/status") => {
            let job_id = path["/api/v1/jobs/".len()..path.len() - "/status".len()].to_string();
            let Some(body): Option<UpdateStatusBody> = parse_body(stream, request)? else {
                return Ok(());
            };
            submit(
                stream,
                node,
                200,
                forgecluster_kernel::Command::UpdateJobStatus {
                    job_id,
                    new_status: body.status,
                },
            )
        }
        _ => http::write_response(stream, 404, "text/plain", b"Not Found"),
    }
}

fn submit(
    stream: &mut TcpStream,
    node: &Arc<dyn NodeApi>,
    success_status: u16,
    command: forgecluster_kernel::Command,
) -> std::io::Result<()> {
    match node.submit_command(command) {
        Ok(()) => http::write_json(stream, success_status, &json!({ "success": true })),
        Err(SubmitError::NotLeader) => {
            http::write_json(stream, 403, &json!({ "error": "This node is not the leader" }))
        }
        Err(SubmitError::Command(err)) => {
            http::write_json(stream, 400, &json!({ "error": err.to_string() }))
        }
        Err(SubmitError::QuorumUnreachable) => {
            http::write_json(stream, 500, &json!({ "error": "failed to replicate to a majority of peers" }))
        }
    }
}

/// Parses the JSON request body as `T`. On malformed JSON this writes a
/// `400` response itself and returns `Ok(None)` rather than propagating a
/// bare `io::Error` - callers check for `None` and return early, instead of
/// letting a bad body drop the connection with no response at all.
fn parse_body<T: for<'de> Deserialize<'de>>(
    stream: &mut TcpStream,
    request: &Request,
) -> std::io::Result<Option<T>> {
    match serde_json::from_slice(&request.body) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            http::write_json(stream, 400, &json!({ "error": format!("invalid request body: {err}") }))?;
            Ok(None)
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddPrinterBody {
    id: String,
    company: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct AddFilamentBody {
    id: String,
    r#type: String,
    color: String,
    total_weight_in_grams: f64,
}

#[derive(Debug, Deserialize)]
struct AddJobBody {
    id: String,
    printer_id: String,
    filament_id: String,
    filepath: String,
    print_weight_in_grams: f64,
}

#[derive(Debug, Deserialize)]
struct UpdateStatusBody {
    status: forgecluster_kernel::JobStatus,
}
