//! Realtime feed HTTP handler for the web layer.
//!
//! Only the Axum handler lives here. Connection bookkeeping and message types
//! live in the `sse` crate so `service` can wire them without depending on `web`.

pub mod handler;
