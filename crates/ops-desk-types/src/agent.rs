//! Agent identifiers and record ids

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend domain handler a command is routed to.
///
/// Unrecognised identifiers decode to [`AgentKind::Other`] so that a new
/// server-side agent never breaks history or quick-action listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentKind {
    Fee,
    Inventory,
    /// HR and task assignment
    Hr,
    Broadcast,
    Other,
}

impl AgentKind {
    /// Canonical wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Fee => "fee",
            AgentKind::Inventory => "inventory",
            AgentKind::Hr => "hr",
            AgentKind::Broadcast => "broadcast",
            AgentKind::Other => "other",
        }
    }

    /// The four routable agents, in display order.
    pub fn routable() -> [AgentKind; 4] {
        [
            AgentKind::Fee,
            AgentKind::Inventory,
            AgentKind::Hr,
            AgentKind::Broadcast,
        ]
    }
}

impl From<&str> for AgentKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fee" | "fees" => AgentKind::Fee,
            "inventory" => AgentKind::Inventory,
            "hr" | "task" | "hr_task" => AgentKind::Hr,
            "broadcast" => AgentKind::Broadcast,
            _ => AgentKind::Other,
        }
    }
}

impl From<String> for AgentKind {
    fn from(value: String) -> Self {
        AgentKind::from(value.as_str())
    }
}

impl From<AgentKind> for String {
    fn from(kind: AgentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-issued identifier: the backend sends integers for some records
/// and strings for others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Int(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_kind_accepts_aliases() {
        let kinds: Vec<AgentKind> =
            serde_json::from_str(r#"["fee", "Inventory", "task", "hr", "broadcast"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                AgentKind::Fee,
                AgentKind::Inventory,
                AgentKind::Hr,
                AgentKind::Hr,
                AgentKind::Broadcast
            ]
        );
    }

    #[test]
    fn unknown_agent_decodes_as_other() {
        let kind: AgentKind = serde_json::from_str(r#""transport""#).unwrap();
        assert_eq!(kind, AgentKind::Other);
    }

    #[test]
    fn agent_kind_serializes_canonically() {
        assert_eq!(serde_json::to_string(&AgentKind::Hr).unwrap(), r#""hr""#);
    }

    #[test]
    fn record_id_accepts_numbers_and_strings() {
        let ids: Vec<RecordId> = serde_json::from_str(r#"[7, "sch-2"]"#).unwrap();
        assert_eq!(ids, vec![RecordId::Int(7), RecordId::from("sch-2")]);
        assert_eq!(ids[0].to_string(), "7");
        assert_eq!(ids[1].to_string(), "sch-2");
    }
}
