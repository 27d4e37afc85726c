// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Management socket: one request and one response per connection.

use thiserror::Error;
use tokio::net::UnixStream;
use tracing::{debug, error, warn};
use tw_engine::{EngineError, NewWatch};

use crate::lifecycle::Daemon;
use crate::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Request read timed out")]
    Timeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub async fn handle_connection(
    daemon: &mut Daemon,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(request) => request,
        Err(ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);
    let response = handle_request(daemon, request);
    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT).await?;
    Ok(())
}

fn handle_request(daemon: &mut Daemon, request: Request) -> Response {
    let engine = &daemon.engine;
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, "Client speaks a different protocol version");
            }
            Response::Hello {
                version: PROTOCOL_VERSION.to_string(),
            }
        }

        Request::Status => {
            let (delivered, failed) = daemon.delivery_counts();
            Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                domains: engine.domains(),
                delivered,
                failed,
            }
        }

        Request::CreateWatch {
            owner,
            domain,
            subject,
            condition,
            recurrence,
            expires_at,
        } => {
            let new = NewWatch {
                owner_id: owner,
                domain,
                subject,
                condition,
                recurrence,
                expires_at,
            };
            match engine.create_watch(new) {
                Ok(id) => Response::WatchCreated { id },
                Err(e) => error_response(e),
            }
        }

        Request::ListWatches { owner } => match engine.list_watches(&owner) {
            Ok(watches) => Response::Watches { watches },
            Err(e) => error_response(e),
        },

        Request::CancelWatch { owner, id } => match engine.cancel_watch(&id, &owner) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::DeleteWatch { owner, id } => match engine.delete_watch(&id, &owner) {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        },

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

/// Clients only ever see the public message; store failures are logged here
fn error_response(e: EngineError) -> Response {
    if let EngineError::Store(_) = e {
        error!("Request failed: {}", e);
    }
    Response::Error {
        message: e.public_message(),
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
