// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of backend Unix-second timestamps to ISO-8601 strings.

use chrono::{DateTime, SecondsFormat};

/// Render Unix seconds as an RFC 3339 UTC string with millisecond precision.
///
/// Out-of-range values render as the Unix epoch.
pub fn iso_from_unix(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}
