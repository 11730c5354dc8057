//! In-memory transport for tests and radio-less embedders.
//!
//! `MockTransport` hands out a shared `MockLink` whose behavior is scripted
//! from the outside: recorded writes, injected notifications, refusal
//! toggles for each connection step, and simulated disconnects.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{DeviceInfo, HubLink, HubTransport, LinkEvent, NotificationReceiver, TransportError};
use crate::protocol::status::StatusFlags;

/// Outcome scripted for a single control write.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    Accept,
    /// Accept, but only after a delay (exercises queue ordering).
    AcceptAfter(Duration),
    Reject(String),
}

type WriteScript = Box<dyn Fn(usize, &[u8]) -> WriteOutcome + Send + Sync>;

/// Scriptable in-memory transport.
pub struct MockTransport {
    supported: bool,
    available: bool,
    cancel_selection: bool,
    fail_link: bool,
    device: DeviceInfo,
    link: Arc<MockLink>,
}

impl MockTransport {
    pub fn new() -> Self {
        let device = DeviceInfo {
            id: "00:00:00:00:00:01".to_string(),
            name: "mock-hub".to_string(),
        };
        Self {
            supported: true,
            available: true,
            cancel_selection: false,
            fail_link: false,
            link: Arc::new(MockLink::new(&device.name)),
            device,
        }
    }

    pub fn with_unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn with_unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_cancelled_selection(mut self) -> Self {
        self.cancel_selection = true;
        self
    }

    pub fn with_failing_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    /// Handle to the link this transport will hand out, for scripting and
    /// assertions while a session owns it.
    pub fn link(&self) -> Arc<MockLink> {
        self.link.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HubTransport for MockTransport {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn select_device(&self) -> Result<DeviceInfo, TransportError> {
        if self.cancel_selection {
            return Err(TransportError::SelectionCancelled);
        }
        Ok(self.device.clone())
    }

    async fn open_link(&self, _device: &DeviceInfo) -> Result<Arc<dyn HubLink>, TransportError> {
        if self.fail_link {
            return Err(TransportError::LinkFailed("mock link refused".to_string()));
        }
        Ok(self.link.clone())
    }
}

/// Scriptable in-memory link. Records every attempted write, including
/// rejected ones.
pub struct MockLink {
    name: String,
    service_present: AtomicBool,
    subscribe_refused: AtomicBool,
    closed: AtomicBool,
    capabilities: Mutex<Option<Vec<u8>>>,
    write_script: Mutex<Option<WriteScript>>,
    writes: Mutex<Vec<Vec<u8>>>,
    notify_tx: Mutex<Option<mpsc::UnboundedSender<LinkEvent>>>,
}

impl MockLink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            service_present: AtomicBool::new(true),
            subscribe_refused: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            capabilities: Mutex::new(None),
            write_script: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            notify_tx: Mutex::new(None),
        }
    }

    /// Script the capabilities characteristic value.
    pub fn set_capabilities(&self, bytes: Vec<u8>) {
        *self.capabilities.lock().unwrap() = Some(bytes);
    }

    /// Make service resolution fail, as for a non-hub peripheral.
    pub fn remove_service(&self) {
        self.service_present.store(false, Ordering::SeqCst);
    }

    /// Make the notification subscription fail.
    pub fn refuse_subscription(&self) {
        self.subscribe_refused.store(true, Ordering::SeqCst);
    }

    /// Script write outcomes. The closure receives the zero-based write index
    /// and the frame; unscripted links accept everything.
    pub fn script_writes<F>(&self, script: F)
    where
        F: Fn(usize, &[u8]) -> WriteOutcome + Send + Sync + 'static,
    {
        *self.write_script.lock().unwrap() = Some(Box::new(script));
    }

    /// All attempted frames, in write order.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Push a raw notification frame to the subscriber, if any.
    pub fn emit_notification(&self, frame: Vec<u8>) {
        if let Some(tx) = self.notify_tx.lock().unwrap().as_ref() {
            let _ = tx.send(LinkEvent::Notification(frame));
        }
    }

    /// Push a status report carrying `flags` and no trailing fields.
    pub fn emit_status(&self, flags: StatusFlags) {
        let mut frame = vec![0x00];
        frame.extend_from_slice(&flags.bits().to_le_bytes());
        self.emit_notification(frame);
    }

    /// Push a stdout notification.
    pub fn emit_stdout(&self, text: &str) {
        let mut frame = vec![0x01];
        frame.extend_from_slice(text.as_bytes());
        self.emit_notification(frame);
    }

    /// Simulate a transport-level drop: the link stops accepting writes and
    /// the subscriber sees `Disconnected`.
    pub fn emit_disconnect(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(tx) = self.notify_tx.lock().unwrap().as_ref() {
            let _ = tx.send(LinkEvent::Disconnected);
        }
    }
}

#[async_trait]
impl HubLink for MockLink {
    async fn resolve_service(&self) -> Result<(), TransportError> {
        if !self.service_present.load(Ordering::SeqCst) {
            return Err(TransportError::ServiceNotFound {
                device: self.name.clone(),
            });
        }
        Ok(())
    }

    async fn write_control(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        let index = {
            let mut writes = self.writes.lock().unwrap();
            writes.push(frame.to_vec());
            writes.len() - 1
        };
        let outcome = match self.write_script.lock().unwrap().as_ref() {
            Some(script) => script(index, frame),
            None => WriteOutcome::Accept,
        };
        match outcome {
            WriteOutcome::Accept => Ok(()),
            WriteOutcome::AcceptAfter(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            WriteOutcome::Reject(reason) => Err(TransportError::Io(reason)),
        }
    }

    async fn subscribe(&self) -> Result<NotificationReceiver, TransportError> {
        if self.subscribe_refused.load(Ordering::SeqCst) {
            return Err(TransportError::SubscribeRefused(
                "mock hub refuses notifications".to_string(),
            ));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *self.notify_tx.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn read_capabilities(&self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.capabilities.lock().unwrap().clone())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        // Dropping the sender ends the notification pump.
        *self.notify_tx.lock().unwrap() = None;
    }
}
