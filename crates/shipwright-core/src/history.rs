// SPDX-FileCopyrightText: 2026 Shipwright Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only audit trails.
//!
//! Orders and movements carry a history of `{action, actor, timestamp,
//! note}` entries. [`AuditTrail`] exposes append and read access only, so
//! prior entries cannot be rewritten or removed through the type.

use serde::{Deserialize, Serialize};

/// One recorded action on an order or movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: String,
    pub actor: String,
    /// ISO 8601 UTC timestamp.
    pub timestamp: String,
    pub note: Option<String>,
}

impl HistoryEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn now(action: impl Into<String>, actor: impl Into<String>, note: Option<String>) -> Self {
        Self {
            action: action.into(),
            actor: actor.into(),
            timestamp: chrono::Utc::now()
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            note,
        }
    }
}

/// An append-only sequence of [`HistoryEntry`].
///
/// There is deliberately no `&mut` access to existing entries and no
/// removal operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail(Vec<HistoryEntry>);

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a trail from persisted entries (ordered oldest first).
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        Self(entries)
    }

    /// Append an entry. The only mutation the type supports.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.0.push(entry);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }
}

impl<'a> IntoIterator for &'a AuditTrail {
    type Item = &'a HistoryEntry;
    type IntoIter = std::slice::Iter<'a, HistoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_appends_in_order() {
        let mut trail = AuditTrail::new();
        trail.push(HistoryEntry::now("created", "system", None));
        trail.push(HistoryEntry::now("approved", "admin:1", Some("ok".into())));

        assert_eq!(trail.len(), 2);
        let actions: Vec<_> = trail.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["created", "approved"]);
        assert_eq!(trail.last().unwrap().note.as_deref(), Some("ok"));
    }

    #[test]
    fn serde_is_transparent() {
        let mut trail = AuditTrail::new();
        trail.push(HistoryEntry {
            action: "created".into(),
            actor: "system".into(),
            timestamp: "2026-03-01T00:00:00.000Z".into(),
            note: None,
        });
        let json = serde_json::to_string(&trail).unwrap();
        assert!(json.starts_with('['), "trail serializes as a bare array");

        let back: AuditTrail = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.last().unwrap().action, "created");
    }

    #[test]
    fn entry_timestamp_is_iso8601_utc() {
        let entry = HistoryEntry::now("created", "system", None);
        assert!(entry.timestamp.ends_with('Z'));
        assert!(entry.timestamp.contains('T'));
    }
}
