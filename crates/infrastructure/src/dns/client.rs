use super::transport::Transport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wiredns_domain::{Message, Query, TransportError};

/// Performs single request/response exchanges over a [`Transport`].
///
/// A truncated UDP answer is returned as-is; retrying over TCP is up to the
/// caller.
#[derive(Clone, Default)]
pub struct Client {
    transport: Transport,
}

impl Client {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.transport = self.transport.with_cancellation(token);
        self
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Dials `query.remote_addr`, sends the message and waits for one reply.
    pub async fn exchange(&self, query: &Query) -> Result<Message, TransportError> {
        let mut conn = self.transport.dial(&query.remote_addr).await?;
        conn.send(&query.message).await?;
        let response = conn.recv().await?;

        if response.id != query.message.id {
            return Err(TransportError::IdMismatch {
                expected: query.message.id,
                got: response.id,
            });
        }

        debug!(
            server = %query.remote_addr,
            id = response.id,
            answers = response.answers.len(),
            truncated = response.truncated,
            "Exchange complete"
        );
        Ok(response)
    }
}
