//! frontpx: a multi-listener reverse proxy front door for a single upstream.
//!
//! Settings are validated into a [`config::Config`], a [`director::Director`] is
//! built once from the upstream and strategy, and a [`supervisor::Supervisor`]
//! serves every configured endpoint with it.

pub mod config;
pub mod director;
pub mod proxy;
pub mod ssl_server;
pub mod supervisor;
pub mod transport;
pub mod utils;
