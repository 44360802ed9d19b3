// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client Session Factory: prepares the auth data directory, starts the
//! driver, and wires lifecycle events to logging, pairing-code display and
//! the webhook.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use wamcp_config::model::{AuthStrategy, WamcpConfig};
use wamcp_core::WaError;

use crate::driver::DriverSession;
use crate::protocol::LifecycleEvent;
use crate::qr;
use crate::webhook::WebhookDispatcher;

/// Browser profile lock left behind by a crashed run.
pub const SINGLETON_LOCK: &str = "SingletonLock";

/// Builds the one Session Handle of this process.
pub struct SessionFactory {
    config: WamcpConfig,
}

impl SessionFactory {
    pub fn new(config: &WamcpConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Remove the stale profile lock and create the data directories.
    ///
    /// Lock removal is best-effort. Directory creation failures abort.
    pub fn prepare_filesystem(&self) -> Result<PathBuf, WaError> {
        let auth_dir = PathBuf::from(&self.config.whatsapp.auth_data_path);
        let lock = auth_dir.join(SINGLETON_LOCK);
        match std::fs::remove_file(&lock) {
            Ok(()) => info!(path = %lock.display(), "removed stale browser profile lock"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %lock.display(), error = %e, "could not remove profile lock"),
        }

        for dir in [auth_dir.clone(), self.config.whatsapp.media_dir()] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                WaError::internal_with(format!("failed to create {}", dir.display()), e)
            })?;
        }
        Ok(auth_dir)
    }

    /// Parameters of the driver's `initialize` call.
    pub fn init_params(&self) -> Value {
        let whatsapp = &self.config.whatsapp;
        let puppeteer = if whatsapp.docker_container {
            json!({
                "headless": true,
                "userDataDir": whatsapp.auth_data_path,
                "args": ["--no-sandbox", "--single-process", "--no-zygote"],
            })
        } else {
            json!({ "headless": true })
        };
        json!({
            "authStrategy": whatsapp.effective_auth_strategy(),
            "authDataPath": whatsapp.auth_data_path,
            "puppeteer": puppeteer,
            "restartOnAuthFail": true,
        })
    }

    /// Start the driver and begin connecting.
    ///
    /// Returns as soon as the driver accepted `initialize`; readiness is
    /// reported later through the session state.
    pub async fn create(&self) -> Result<Arc<DriverSession>, WaError> {
        let auth_dir = self.prepare_filesystem()?;
        let strategy = self.config.whatsapp.effective_auth_strategy();
        if strategy == AuthStrategy::None && self.config.whatsapp.auth_strategy == AuthStrategy::Local
        {
            info!("container mode, credentials will not be persisted");
        }

        let webhook = WebhookDispatcher::new(&auth_dir, &self.config.webhook)?;
        let (session, events) = DriverSession::spawn(&self.config.driver)?;

        let pump = EventPump {
            qr_file: self.config.whatsapp.qr_code_file.as_ref().map(PathBuf::from),
            webhook,
        };
        tokio::spawn(pump.run(events));

        session
            .call::<Value>("initialize", self.init_params())
            .await
            .map_err(|e| e.context("Failed to initialize WhatsApp client"))?;
        info!(auth_strategy = %strategy, "WhatsApp client initializing");
        Ok(session)
    }
}

/// Consumes driver events after the lifecycle tracker has applied them.
pub struct EventPump {
    pub qr_file: Option<PathBuf>,
    pub webhook: WebhookDispatcher,
}

impl EventPump {
    pub async fn run(self, mut events: mpsc::Receiver<LifecycleEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("event stream closed");
    }

    async fn handle(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Qr(code) => {
                if let Err(e) = qr::present(&code, self.qr_file.as_deref()).await {
                    error!(error = %e, "failed to present QR code");
                }
            }
            LifecycleEvent::Ready(info) => info!(wid = %info.wid, "Client is ready!"),
            LifecycleEvent::Authenticated => info!("Authentication successful!"),
            LifecycleEvent::AuthFailure(reason) => error!(%reason, "Authentication failed"),
            LifecycleEvent::Disconnected(reason) => warn!(%reason, "Client was disconnected"),
            LifecycleEvent::Message(message) => {
                debug!(
                    from = %message.sender_id(),
                    name = message.notify_name.as_deref().unwrap_or("Unknown"),
                    "incoming message"
                );
                self.webhook.dispatch(&message);
            }
            LifecycleEvent::Unknown(name) => debug!(event = %name, "unhandled driver event"),
        }
    }
}
