//! Agent Registry
//!
//! Static display metadata for each backend agent. Pure lookup, no state.

use ops_desk_types::AgentKind;

/// How an agent is presented in badges, filters and quick-action groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentInfo {
    pub kind: AgentKind,
    pub display_name: &'static str,
    pub icon: &'static str,
    /// Hex accent colour
    pub color: &'static str,
}

static AGENTS: [AgentInfo; 4] = [
    AgentInfo {
        kind: AgentKind::Fee,
        display_name: "Fee Agent",
        icon: "wallet",
        color: "#16a34a",
    },
    AgentInfo {
        kind: AgentKind::Inventory,
        display_name: "Inventory Agent",
        icon: "package",
        color: "#2563eb",
    },
    AgentInfo {
        kind: AgentKind::Hr,
        display_name: "HR & Task Agent",
        icon: "users",
        color: "#9333ea",
    },
    AgentInfo {
        kind: AgentKind::Broadcast,
        display_name: "Broadcast Agent",
        icon: "megaphone",
        color: "#ea580c",
    },
];

static GENERAL: AgentInfo = AgentInfo {
    kind: AgentKind::Other,
    display_name: "General",
    icon: "sparkles",
    color: "#6b7280",
};

/// Display metadata for an agent; unknown agents get the neutral entry.
pub fn agent_info(kind: AgentKind) -> &'static AgentInfo {
    AGENTS
        .iter()
        .find(|info| info.kind == kind)
        .unwrap_or(&GENERAL)
}

/// All routable agents in canonical display order
pub fn all_agents() -> &'static [AgentInfo] {
    &AGENTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_routable_agent_is_registered() {
        for kind in AgentKind::routable() {
            assert_eq!(agent_info(kind).kind, kind);
        }
    }

    #[test]
    fn registry_order_matches_routable_order() {
        let kinds: Vec<AgentKind> = all_agents().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, AgentKind::routable().to_vec());
    }

    #[test]
    fn unknown_agent_falls_back_to_general() {
        let info = agent_info(AgentKind::Other);
        assert_eq!(info.display_name, "General");
    }
}
