// Proxy module
//
// This module contains the request forwarding path:
// - forwarder: Director-driven forwarding engine around the upstream client
// - request_handler: Per-request logging wrapper used by both servers
// - http_server: Plaintext listener serve loop

pub mod forwarder;
pub mod http_server;
pub mod request_handler;

pub use forwarder::Forwarder;
