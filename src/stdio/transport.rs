//! Line-delimited JSON-RPC over a byte stream
//!
//! One request is read, dispatched and answered before the next line is read.
//! The loop owns the writer, so response lines are never interleaved.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::errors::envelope_error_data;
use crate::mcp::rpc::{
    decode_line, encode_response, DecodeFailure, ErrorCode, Response, RpcError,
};
use crate::mcp::server::Session;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to read from client")]
    Read(#[source] io::Error),
    #[error("failed to write response")]
    Write(#[source] io::Error),
}

/// Longest accepted line, newline included.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Run until end of input. A read or write failure ends the loop as well;
/// there is no reconnect.
pub async fn serve<R, W>(
    session: &mut Session,
    reader: R,
    writer: W,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_with_limit(session, reader, writer, MAX_LINE_BYTES).await
}

/// Like [`serve`], but lines longer than `max_line_bytes` are discarded
/// up to their newline and never dispatched.
pub async fn serve_with_limit<R, W>(
    session: &mut Session,
    mut reader: R,
    mut writer: W,
    max_line_bytes: usize,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    info!(max_line_bytes, "stdio transport ready");

    loop {
        line.clear();
        let read = (&mut reader)
            .take(max_line_bytes as u64)
            .read_until(b'\n', &mut line)
            .await
            .map_err(TransportError::Read)?;
        if read == 0 {
            info!("input closed, shutting down");
            return Ok(());
        }

        if line.len() >= max_line_bytes && line.last() != Some(&b'\n') {
            let dropped = line.len() + skip_rest_of_line(&mut reader).await?;
            warn!(
                code = ErrorCode::ParseError.code(),
                dropped_bytes = dropped,
                "dropping oversized line"
            );
            continue;
        }

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        debug!(line = %String::from_utf8_lossy(&line).trim_end(), "read from client");

        let Some(response) = handle_line(session, &line) else {
            continue;
        };
        let Some(bytes) = encode_or_internal(&response) else {
            continue;
        };

        debug!(line = %String::from_utf8_lossy(&bytes).trim_end(), "write response");
        writer.write_all(&bytes).await.map_err(TransportError::Write)?;
        writer.flush().await.map_err(TransportError::Write)?;
    }
}

/// Consume input up to and including the next newline, returning the count.
async fn skip_rest_of_line<R>(reader: &mut R) -> Result<usize, TransportError>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let buffer = reader.fill_buf().await.map_err(TransportError::Read)?;
        if buffer.is_empty() {
            return Ok(skipped);
        }

        match buffer.iter().position(|byte| *byte == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(skipped + end + 1);
            }
            None => {
                let len = buffer.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

/// Decode one line and dispatch it. Lines that cannot be decoded are dropped
/// unless they carried an id the error can be addressed to.
pub fn handle_line(session: &mut Session, line: &[u8]) -> Option<Response> {
    match decode_line(line) {
        Ok(request) => session.handle_request(request),
        Err(DecodeFailure::InvalidEnvelope {
            id: Some(id),
            reason,
        }) => {
            warn!(code = ErrorCode::InvalidRequest.code(), reason, "invalid request envelope");
            Some(Response::failure(
                id,
                RpcError::new(ErrorCode::InvalidRequest, "Invalid Request")
                    .with_data(envelope_error_data(reason)),
            ))
        }
        Err(failure) => {
            warn!(code = failure.code().code(), error = %failure, "dropping undecodable line");
            None
        }
    }
}

fn encode_or_internal(response: &Response) -> Option<Vec<u8>> {
    match encode_response(response) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            error!(error = %err, "failed to encode response");
            let fallback = Response::failure(
                response.id.clone(),
                RpcError::new(ErrorCode::InternalError, "Internal error"),
            );
            encode_response(&fallback).ok()
        }
    }
}
