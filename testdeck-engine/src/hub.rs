// Copyright (c) The testdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of run lifecycle messages to connected viewers.

use std::{collections::BTreeMap, fmt, sync::Mutex};
use testdeck_protocol::ClientMessage;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// Identifies one registered viewer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ViewerId(u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer-{}", self.0)
    }
}

/// A viewer's subscription: its id plus the receiving end of its channel.
///
/// Dropping the receiver is enough to disconnect; the next broadcast that
/// fails to deliver unregisters the viewer. Calling
/// [`BroadcastHub::unregister`] removes it eagerly.
#[derive(Debug)]
pub struct ViewerSubscription {
    /// The viewer's id, used to unregister.
    pub id: ViewerId,
    /// The stream of broadcast messages for this viewer.
    pub receiver: UnboundedReceiver<ClientMessage>,
}

/// The set of connected viewers.
///
/// Delivery is best-effort fan-out: each viewer's send is isolated, so a
/// disconnected viewer never blocks or affects delivery to the others.
/// Per-viewer message order matches emission order; the channels are
/// unbounded, so a slow viewer exerts no back-pressure on the supervisor.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    inner: Mutex<HubInner>,
}

#[derive(Debug, Default)]
struct HubInner {
    next_id: u64,
    viewers: BTreeMap<ViewerId, UnboundedSender<ClientMessage>>,
}

impl BroadcastHub {
    /// Creates a hub with no viewers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new viewer and returns its subscription.
    pub fn register(&self) -> ViewerSubscription {
        let (sender, receiver) = unbounded_channel();
        let mut inner = self.inner.lock().expect("hub mutex poisoned");
        let id = ViewerId(inner.next_id);
        inner.next_id += 1;
        inner.viewers.insert(id, sender);
        debug!(%id, viewers = inner.viewers.len(), "viewer registered");
        ViewerSubscription { id, receiver }
    }

    /// Removes a viewer. Returns false if it was already gone.
    pub fn unregister(&self, id: ViewerId) -> bool {
        let mut inner = self.inner.lock().expect("hub mutex poisoned");
        let removed = inner.viewers.remove(&id).is_some();
        if removed {
            debug!(%id, viewers = inner.viewers.len(), "viewer unregistered");
        }
        removed
    }

    /// The number of connected viewers.
    pub fn viewer_count(&self) -> usize {
        let inner = self.inner.lock().expect("hub mutex poisoned");
        inner.viewers.len()
    }

    /// Delivers a message to every connected viewer.
    ///
    /// A send only fails when the viewer's receiver has been dropped; that
    /// viewer is unregistered and the failure goes no further.
    pub fn broadcast(&self, message: &ClientMessage) {
        let mut inner = self.inner.lock().expect("hub mutex poisoned");
        let mut disconnected = Vec::new();
        for (id, sender) in &inner.viewers {
            if sender.send(message.clone()).is_err() {
                disconnected.push(*id);
            }
        }
        for id in disconnected {
            inner.viewers.remove(&id);
            debug!(%id, "viewer disconnected, unregistered during broadcast");
        }
    }
}
