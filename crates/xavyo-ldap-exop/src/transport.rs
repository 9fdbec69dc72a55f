//! Request/response correlation and the Password Modify operation.
//!
//! The operation itself never touches sockets. A transport allocates message
//! IDs, writes messages and hands back a single-slot [`ResponseSlot`] that
//! resolves when the response carrying the same message ID arrives.
//! [`PendingRequests`] is the correlation table transports can build on.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use lber::structure::StructureTag;
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};

use crate::error::{ExopError, ExopResult};
use crate::message;
use crate::request::PasswordModifyRequest;
use crate::response::{self, PasswordModifyResult};

/// A connection able to carry LDAP messages.
#[async_trait]
pub trait LdapTransport: Send + Sync {
    /// Allocate the message ID for the next request.
    fn next_message_id(&self) -> i32;

    /// Transmit a complete LDAPMessage.
    ///
    /// The returned slot resolves with the response envelope, or reports a
    /// network error if the connection closes first.
    async fn send(&self, message: StructureTag) -> ExopResult<ResponseSlot>;
}

/// Single-slot handle for one outstanding request.
#[derive(Debug)]
pub struct ResponseSlot {
    message_id: i32,
    receiver: oneshot::Receiver<StructureTag>,
}

impl ResponseSlot {
    /// Message ID this slot is waiting for.
    #[must_use]
    pub fn message_id(&self) -> i32 {
        self.message_id
    }

    /// Wait for the response envelope.
    pub async fn recv(self) -> ExopResult<StructureTag> {
        self.receiver
            .await
            .map_err(|_| ExopError::network("ldap: response channel closed"))
    }
}

/// Next message ID in `1..=i32::MAX`, wrapping back to 1.
fn advance(id: i32) -> i32 {
    if (0..i32::MAX).contains(&id) {
        id + 1
    } else {
        1
    }
}

/// Outstanding requests keyed by message ID.
#[derive(Debug, Default)]
pub struct PendingRequests {
    next_id: AtomicI32,
    slots: Mutex<HashMap<i32, oneshot::Sender<StructureTag>>>,
}

impl PendingRequests {
    /// Create an empty table. Message IDs start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a message ID. Zero is reserved for unsolicited notifications.
    pub fn next_message_id(&self) -> i32 {
        let previous = self
            .next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |id| Some(advance(id)))
            .unwrap_or_else(|id| id);
        advance(previous)
    }

    /// Register a slot for `message_id`.
    ///
    /// Registering the same ID twice closes the earlier slot.
    pub fn register(&self, message_id: i32) -> ResponseSlot {
        let (sender, receiver) = oneshot::channel();
        let previous = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message_id, sender);
        if previous.is_some() {
            warn!(message_id, "Replaced an outstanding response slot");
        }
        ResponseSlot {
            message_id,
            receiver,
        }
    }

    /// Route a response envelope to the slot waiting for its message ID.
    ///
    /// Returns `false` if the envelope has no usable message ID or nobody is
    /// waiting for it.
    pub fn complete(&self, envelope: StructureTag) -> bool {
        let Some(message_id) = message::message_id(&envelope) else {
            debug!("Dropping response without a message ID");
            return false;
        };

        let sender = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&message_id);
        match sender {
            Some(sender) => sender.send(envelope).is_ok(),
            None => {
                debug!(message_id, "Dropping response for unknown message ID");
                false
            }
        }
    }

    /// Abandon one outstanding request; its slot reports a network error.
    pub fn cancel(&self, message_id: i32) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&message_id);
    }

    /// Close every outstanding slot, as when the connection goes away.
    pub fn close_all(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of requests still waiting for a response.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no request is waiting for a response.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run a Password Modify exchange over `transport`.
///
/// On a referral the error carries the referral URI, see
/// [`ExopError::partial_result`].
#[instrument(skip(transport, request), fields(message_id = tracing::field::Empty))]
pub async fn password_modify<T>(
    transport: &T,
    request: &PasswordModifyRequest,
) -> ExopResult<PasswordModifyResult>
where
    T: LdapTransport + ?Sized,
{
    let message_id = transport.next_message_id();
    tracing::Span::current().record("message_id", message_id);

    let envelope = message::wrap_request(message_id, request.encode()?);
    let slot = transport.send(envelope).await?;

    debug!(message_id, "Waiting for password modify response");
    let response = slot.recv().await?;
    debug!(message_id, "Got password modify response");

    response::decode(&response)
}
