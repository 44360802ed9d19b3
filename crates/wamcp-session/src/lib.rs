// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client Session Factory and Session Handle for the WhatsApp MCP bridge.
//!
//! The messaging backend runs as a separate browser-automation driver
//! process. [`DriverSession`] speaks line-delimited JSON to it, tracks the
//! connection lifecycle, and implements [`wamcp_core::WhatsAppSession`].
//! [`SessionFactory`] prepares the filesystem and starts one per process.

pub mod driver;
pub mod factory;
pub mod lifecycle;
pub mod protocol;
pub mod qr;
pub mod webhook;

pub use driver::DriverSession;
pub use factory::SessionFactory;
pub use lifecycle::LifecycleTracker;
pub use webhook::WebhookDispatcher;
