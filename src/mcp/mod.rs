//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides the line codec, request routing and the handshake handlers.

pub mod rpc;
pub mod server;
