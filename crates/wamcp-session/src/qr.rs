// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pairing code presentation.

use std::path::Path;

use qrcode::QrCode;
use qrcode::render::{svg, unicode};
use tracing::info;

use wamcp_core::WaError;

fn encode(code: &str) -> Result<QrCode, WaError> {
    QrCode::new(code.as_bytes()).map_err(|e| WaError::internal_with("failed to encode QR code", e))
}

/// Render for a terminal using half-block characters.
pub fn render_terminal(code: &str) -> Result<String, WaError> {
    Ok(encode(code)?
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

/// Render as a standalone SVG document.
pub fn render_svg(code: &str) -> Result<String, WaError> {
    Ok(encode(code)?
        .render::<svg::Color<'_>>()
        .min_dimensions(256, 256)
        .build())
}

/// Show a pairing code: written to `file` as SVG when set, otherwise logged
/// as a terminal drawing.
pub async fn present(code: &str, file: Option<&Path>) -> Result<(), WaError> {
    match file {
        Some(path) => {
            let svg = render_svg(code)?;
            tokio::fs::write(path, svg).await.map_err(|e| {
                WaError::internal_with(format!("failed to write QR code to {}", path.display()), e)
            })?;
            info!(path = %path.display(), "QR code written. Scan it with your phone to log in.");
        }
        None => {
            let drawing = render_terminal(code)?;
            info!("QR code generated. Scan it with your phone to log in.\n{drawing}");
        }
    }
    Ok(())
}
