// SPDX-FileCopyrightText: 2026 WAMCP Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number and chat id normalization.
//!
//! Callers may pass bare digits (`"+1 (555) 010-2030"`) or an already
//! suffixed id (`"15550102030@c.us"`). Both normalize to the same
//! canonical form, and normalizing twice is a no-op.

/// Suffix of an individual contact id.
pub const CONTACT_SUFFIX: &str = "@c.us";

/// Server part of an individual contact id.
pub const CONTACT_SERVER: &str = "c.us";

/// Suffix of a group chat id.
pub const GROUP_SUFFIX: &str = "@g.us";

/// Strip the formatting characters people type into phone numbers.
pub fn sanitize_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '-' | ' ' | ')' | '('))
        .collect()
}

/// Normalize a phone number or contact id to `<digits>@c.us`.
pub fn normalize_contact_id(raw: &str) -> String {
    normalize_with_suffix(raw, CONTACT_SUFFIX)
}

/// Normalize a group id to `<digits>@g.us`.
pub fn normalize_group_id(raw: &str) -> String {
    normalize_with_suffix(raw, GROUP_SUFFIX)
}

/// Any existing server part is replaced, so a contact id passed where a
/// group id is expected still yields a single suffix.
fn normalize_with_suffix(raw: &str, suffix: &str) -> String {
    format!("{}{suffix}", sanitize_number(bare_number(raw.trim())))
}

/// The user part of a serialized id (`"111@c.us"` -> `"111"`).
pub fn bare_number(id: &str) -> &str {
    id.split_once('@').map_or(id, |(user, _)| user)
}

/// Make a message id safe to use as a file stem.
pub fn sanitize_file_stem(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
