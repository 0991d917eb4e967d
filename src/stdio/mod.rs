//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout

pub mod transport;
