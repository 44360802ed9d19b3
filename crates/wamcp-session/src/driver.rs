// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Session Handle: a supervised browser-driver process spoken to over
//! JSONL on stdin/stdout.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, Semaphore, mpsc, oneshot};
use tracing::{debug, error, warn};

use wamcp_config::model::DriverConfig;
use wamcp_core::session::{
    GroupCreated, OutgoingMessage, ParticipantOutcome, WaChat, WaContact, WaMedia, WaMessage,
};
use wamcp_core::{ClientInfo, LifecycleSignal, SessionState, WaError, WhatsAppSession};

use crate::lifecycle::LifecycleTracker;
use crate::protocol::{DriverFrame, HostFrame, LifecycleEvent};

/// How long `destroy` waits for the driver to acknowledge before killing it.
const DESTROY_GRACE: Duration = Duration::from_secs(10);

/// Capacity of the channel carrying events to the session's event pump.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

type Pending = DashMap<u64, oneshot::Sender<Result<Value, WaError>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// A live session backed by the driver process.
pub struct DriverSession {
    writer: Mutex<Writer>,
    pending: Arc<Pending>,
    next_id: AtomicU64,
    closed: Arc<AtomicBool>,
    permits: Semaphore,
    lifecycle: Arc<LifecycleTracker>,
    child: Mutex<Option<Child>>,
}

#[derive(Deserialize)]
struct SentRef {
    id: String,
}

impl DriverSession {
    /// Spawn the driver process and start reading its output.
    ///
    /// Returns the session and the stream of events it emits.
    pub fn spawn(
        config: &DriverConfig,
    ) -> Result<(Arc<Self>, mpsc::Receiver<LifecycleEvent>), WaError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            WaError::internal_with(format!("failed to spawn driver `{}`", config.command), e)
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WaError::internal("driver stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WaError::internal("driver stdout unavailable"))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let line = line.trim_end();
                    if !line.is_empty() {
                        warn!(target: "wamcp::driver", "{line}");
                    }
                }
            });
        }

        debug!(command = %config.command, pid = ?child.id(), "driver process started");
        Ok(Self::start(stdout, stdin, config.max_in_flight, Some(child)))
    }

    /// Run the protocol over arbitrary streams. Used by [`Self::spawn`] and by tests.
    pub fn connect<R, W>(
        reader: R,
        writer: W,
        max_in_flight: usize,
    ) -> (Arc<Self>, mpsc::Receiver<LifecycleEvent>)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::start(reader, writer, max_in_flight, None)
    }

    fn start<R, W>(
        reader: R,
        writer: W,
        max_in_flight: usize,
        child: Option<Child>,
    ) -> (Arc<Self>, mpsc::Receiver<LifecycleEvent>)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = Arc::new(Self {
            writer: Mutex::new(Box::new(writer)),
            pending: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            closed: Arc::new(AtomicBool::new(false)),
            permits: Semaphore::new(max_in_flight.max(1)),
            lifecycle: Arc::new(LifecycleTracker::new()),
            child: Mutex::new(child),
        });

        tokio::spawn(read_loop(
            reader,
            Arc::clone(&session.pending),
            Arc::clone(&session.closed),
            Arc::clone(&session.lifecycle),
            events_tx,
        ));

        (session, events_rx)
    }

    /// The lifecycle tracker of this session.
    pub fn lifecycle(&self) -> &LifecycleTracker {
        &self.lifecycle
    }

    /// Issue one request and wait for its response.
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, WaError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| WaError::internal("driver session is closed"))?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        if self.closed.load(Ordering::SeqCst) {
            self.pending.remove(&id);
            return Err(driver_gone());
        }

        let line = HostFrame::Request { id, method, params }
            .encode()
            .map_err(|e| WaError::internal_with("failed to encode driver request", e))?;
        let written = {
            let mut writer = self.writer.lock().await;
            match writer.write_all(line.as_bytes()).await {
                Ok(()) => writer.flush().await,
                Err(e) => Err(e),
            }
        };
        if let Err(e) = written {
            self.pending.remove(&id);
            return Err(WaError::internal_with("failed to write to driver", e));
        }

        let value = rx.await.map_err(|_| driver_gone())??;
        serde_json::from_value(value)
            .map_err(|e| WaError::internal_with(format!("malformed `{method}` result from driver"), e))
    }
}

fn driver_gone() -> WaError {
    WaError::internal("WhatsApp driver exited")
}

/// Route responses to waiting callers and events to the tracker and pump.
async fn read_loop<R>(
    reader: R,
    pending: Arc<Pending>,
    closed: Arc<AtomicBool>,
    lifecycle: Arc<LifecycleTracker>,
    events: mpsc::Sender<LifecycleEvent>,
) where
    R: AsyncRead + Send + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "failed to read driver stdout");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match DriverFrame::decode(line) {
            Ok(DriverFrame::Response { id, result, error }) => {
                let Some((_, tx)) = pending.remove(&id) else {
                    warn!(id, "response for unknown request");
                    continue;
                };
                let outcome = match error {
                    Some(message) => Err(WaError::from_backend_message(message)),
                    None => Ok(result),
                };
                let _ = tx.send(outcome);
            }
            Ok(DriverFrame::Event { event, data }) => {
                match LifecycleEvent::from_frame(&event, data) {
                    Ok(decoded) => {
                        lifecycle.apply(&decoded);
                        match events.try_send(decoded) {
                            Ok(()) => {}
                            Err(TrySendError::Full(_)) => {
                                warn!(event, "event pump saturated, dropping event");
                            }
                            Err(TrySendError::Closed(_)) => {
                                debug!(event, "event pump gone, dropping event");
                            }
                        }
                    }
                    Err(e) => warn!(event, error = %e, "malformed driver event"),
                }
            }
            Err(e) => warn!(error = %e, "ignoring malformed driver line"),
        }
    }

    closed.store(true, Ordering::SeqCst);
    let ids: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for id in ids {
        if let Some((_, tx)) = pending.remove(&id) {
            let _ = tx.send(Err(driver_gone()));
        }
    }
    lifecycle.signal(LifecycleSignal::Disconnected);
    warn!("driver output closed, session disconnected");
}

#[async_trait]
impl WhatsAppSession for DriverSession {
    fn state(&self) -> SessionState {
        self.lifecycle.state()
    }

    fn info(&self) -> Option<ClientInfo> {
        self.lifecycle.info()
    }

    async fn get_contacts(&self) -> Result<Vec<WaContact>, WaError> {
        self.call("getContacts", json!({})).await
    }

    async fn get_contact_by_id(&self, contact_id: &str) -> Result<WaContact, WaError> {
        self.call("getContactById", json!({ "contactId": contact_id })).await
    }

    async fn get_chats(&self) -> Result<Vec<WaChat>, WaError> {
        self.call("getChats", json!({})).await
    }

    async fn get_chat_by_id(&self, chat_id: &str) -> Result<WaChat, WaError> {
        self.call("getChatById", json!({ "chatId": chat_id })).await
    }

    async fn fetch_messages(
        &self,
        chat_id: &str,
        limit: usize,
    ) -> Result<Vec<WaMessage>, WaError> {
        self.call("fetchMessages", json!({ "chatId": chat_id, "limit": limit }))
            .await
    }

    async fn get_number_id(&self, number: &str) -> Result<Option<String>, WaError> {
        self.call("getNumberId", json!({ "number": number })).await
    }

    async fn send_message(
        &self,
        chat_id: &str,
        message: OutgoingMessage,
    ) -> Result<String, WaError> {
        let sent: SentRef = self
            .call("sendMessage", json!({ "chatId": chat_id, "content": message }))
            .await?;
        Ok(sent.id)
    }

    async fn create_group(
        &self,
        name: &str,
        participant_ids: &[String],
    ) -> Result<GroupCreated, WaError> {
        self.call(
            "createGroup",
            json!({ "name": name, "participants": participant_ids }),
        )
        .await
    }

    async fn add_participants(
        &self,
        group_id: &str,
        participant_ids: &[String],
    ) -> Result<Vec<ParticipantOutcome>, WaError> {
        self.call(
            "addParticipants",
            json!({ "groupId": group_id, "participants": participant_ids }),
        )
        .await
    }

    async fn get_message_by_id(&self, message_id: &str) -> Result<Option<WaMessage>, WaError> {
        self.call("getMessageById", json!({ "messageId": message_id }))
            .await
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<WaMedia>, WaError> {
        self.call("downloadMedia", json!({ "messageId": message_id }))
            .await
    }

    async fn destroy(&self) -> Result<(), WaError> {
        let acknowledged =
            tokio::time::timeout(DESTROY_GRACE, self.call::<Value>("destroy", json!({}))).await;
        match acknowledged {
            Ok(Ok(_)) => debug!("driver acknowledged destroy"),
            Ok(Err(e)) => warn!(error = %e, "driver failed to destroy session cleanly"),
            Err(_) => warn!("driver did not acknowledge destroy in time"),
        }

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(DESTROY_GRACE, child.wait()).await {
                Ok(Ok(status)) => debug!(%status, "driver exited"),
                _ => {
                    warn!("killing driver process");
                    child
                        .kill()
                        .await
                        .map_err(|e| WaError::internal_with("failed to kill driver", e))?;
                }
            }
        }
        Ok(())
    }
}
