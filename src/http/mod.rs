//! HTCPCP over HTTP
//!
//! `dispatcher` holds the protocol rules; `server` wires them into axum.

pub mod dispatcher;
pub mod server;

pub use dispatcher::{DispatchError, Dispatcher, Verb};
pub use server::{router, serve};
