/// Enumerations shared across the topology model.
///
/// [`NodeType`] is a closed set: every type-specific behaviour is an
/// exhaustive `match` in this module so that adding a variant is a compile
/// error at each site that must handle it.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a node in a multi-agent execution topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// A human or external caller that initiates an execution.
    User,
    /// A top-level agent.
    Agent,
    /// An agent invoked by another agent.
    SubAgent,
    /// A tool call.
    Tool,
    /// A model (LLM) call.
    Llm,
}

impl NodeType {
    /// Every variant, in flow order.
    pub const ALL: [NodeType; 5] = [
        NodeType::User,
        NodeType::Agent,
        NodeType::SubAgent,
        NodeType::Tool,
        NodeType::Llm,
    ];

    /// Returns the `snake_case` wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::User => "user",
            NodeType::Agent => "agent",
            NodeType::SubAgent => "sub_agent",
            NodeType::Tool => "tool",
            NodeType::Llm => "llm",
        }
    }

    /// Returns a human-readable label for legends and CLI output.
    pub fn display_name(self) -> &'static str {
        match self {
            NodeType::User => "User",
            NodeType::Agent => "Agent",
            NodeType::SubAgent => "Sub-agent",
            NodeType::Tool => "Tool",
            NodeType::Llm => "LLM",
        }
    }

    /// Returns `true` for node types that are always hierarchy roots,
    /// regardless of incoming edges.
    pub fn is_entry_point(self) -> bool {
        match self {
            NodeType::User => true,
            NodeType::Agent | NodeType::SubAgent | NodeType::Tool | NodeType::Llm => false,
        }
    }

    /// Column hint for left-to-right flow layouts: callers sit left of callees.
    pub fn flow_rank(self) -> u8 {
        match self {
            NodeType::User => 0,
            NodeType::Agent => 1,
            NodeType::SubAgent => 2,
            NodeType::Tool | NodeType::Llm => 3,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown node type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownNodeType(pub String);

impl fmt::Display for UnknownNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown node type {:?}: expected one of user, agent, sub_agent, tool, llm",
            self.0
        )
    }
}

impl std::error::Error for UnknownNodeType {}

impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownNodeType(s.to_owned()))
    }
}
