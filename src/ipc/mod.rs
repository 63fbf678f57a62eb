//! IPC listener that accepts input events over a Unix socket.
//!
//! External tools (scripts, key-bind helpers, touch daemons, etc.) can
//! connect to the socket and send newline-delimited JSON events.

pub mod listener;
