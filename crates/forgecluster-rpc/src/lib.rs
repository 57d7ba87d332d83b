//! `forgecluster-rpc`: hand-rolled HTTP/1.1 transport for both the
//! peer-to-peer consensus routes and the client-facing API.
//!
//! No web framework - a blocking accept loop with one thread per
//! connection on the server side, and a short-timeout `TcpStream` per call
//! on the client side. [`api::NodeApi`] is the only thing this crate knows
//! about a node; it never reaches back into the node's internals.

mod api;
mod client;
pub mod http;
mod server;

pub use api::{NodeApi, StateView, StatusView, SubmitError};
pub use client::{
    fetch_logs_from, fetch_state, fetch_status, forward_raw, get_json, post_json, request_vote,
    send_heartbeat, send_replicate, ClientError, RemoteStatus,
};
pub use server::serve;
