//! Core types for the draftloom reconciliation engine.
//!
//! This module defines the fundamental identifiers shared by every
//! subsystem: the node-kind vocabulary of the editor palette and the
//! device class used to key viewport memory.
//!
//! For the version/draft types, see [`crate::versions`]; for runtime
//! status types (save lifecycle), see [`crate::save`].
//!
//! # Examples
//!
//! ```rust
//! use draftloom::types::{DeviceType, NodeKind};
//!
//! let kind = NodeKind::Condition;
//! assert_eq!(kind.as_str(), "condition");
//!
//! // Wire strings round-trip; unknown kinds are preserved but flagged.
//! let decoded = NodeKind::decode("telepathy");
//! assert!(!decoded.is_recognized());
//!
//! assert_eq!(DeviceType::from_width(640.0), DeviceType::Mobile);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the kind of a node within a workflow graph.
///
/// The kind determines which parameter form the editor renders and which
/// structural validation rules apply (see [`crate::model::validate`]).
/// Wire payloads carry the snake_case string form; decoding an unknown
/// string yields [`Other`](Self::Other) so foreign payloads survive a
/// round-trip, but merge and history restoration drop unrecognized kinds
/// before touching the live graph.
///
/// # Examples
///
/// ```rust
/// use draftloom::types::NodeKind;
///
/// assert_eq!(NodeKind::ParallelSplit.as_str(), "parallel_split");
/// assert_eq!(NodeKind::decode("agent"), NodeKind::Agent);
/// assert_eq!(
///     NodeKind::decode("shiny_new_kind"),
///     NodeKind::Other("shiny_new_kind".to_string()),
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Agent,
    VoiceAgent,
    Condition,
    ParallelSplit,
    ParallelJoin,
    State,
    Watch,
    Transform,
    WaitForUserInput,
    AssistantMessage,
    UserMessage,
    JsonVectorStore,
    Widget,
    /// Entry point of the workflow. Exactly one per graph; protected from
    /// deletion.
    Start,
    End,
    Mcp,
    FileSearch,
    Guardrails,
    Note,
    HumanApproval,
    /// Forward-compatibility fallback for kinds this build does not know.
    Other(String),
}

impl NodeKind {
    /// All kinds the current editor palette recognizes, in palette order.
    pub const RECOGNIZED: [NodeKind; 20] = [
        NodeKind::Start,
        NodeKind::End,
        NodeKind::Agent,
        NodeKind::VoiceAgent,
        NodeKind::Condition,
        NodeKind::ParallelSplit,
        NodeKind::ParallelJoin,
        NodeKind::State,
        NodeKind::Watch,
        NodeKind::Transform,
        NodeKind::WaitForUserInput,
        NodeKind::AssistantMessage,
        NodeKind::UserMessage,
        NodeKind::JsonVectorStore,
        NodeKind::Widget,
        NodeKind::Mcp,
        NodeKind::FileSearch,
        NodeKind::Guardrails,
        NodeKind::Note,
        NodeKind::HumanApproval,
    ];

    /// The wire string for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Agent => "agent",
            NodeKind::VoiceAgent => "voice_agent",
            NodeKind::Condition => "condition",
            NodeKind::ParallelSplit => "parallel_split",
            NodeKind::ParallelJoin => "parallel_join",
            NodeKind::State => "state",
            NodeKind::Watch => "watch",
            NodeKind::Transform => "transform",
            NodeKind::WaitForUserInput => "wait_for_user_input",
            NodeKind::AssistantMessage => "assistant_message",
            NodeKind::UserMessage => "user_message",
            NodeKind::JsonVectorStore => "json_vector_store",
            NodeKind::Widget => "widget",
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Mcp => "mcp",
            NodeKind::FileSearch => "file_search",
            NodeKind::Guardrails => "guardrails",
            NodeKind::Note => "note",
            NodeKind::HumanApproval => "human_approval",
            NodeKind::Other(s) => s,
        }
    }

    /// Decode a wire string back into a kind.
    ///
    /// Unrecognized strings become [`Other`](Self::Other) rather than an
    /// error, so payloads written by a newer editor still parse.
    pub fn decode(s: &str) -> Self {
        for kind in Self::RECOGNIZED {
            if kind.as_str() == s {
                return kind;
            }
        }
        NodeKind::Other(s.to_string())
    }

    /// Returns `true` if this kind is part of the current palette.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, NodeKind::Other(_))
    }

    /// Returns `true` if this is the [`Start`](Self::Start) kind.
    #[must_use]
    pub fn is_start(&self) -> bool {
        matches!(self, Self::Start)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::decode(&s)
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::decode(s)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> String {
        kind.as_str().to_string()
    }
}

/// Device class participating in the viewport-memory key.
///
/// Recomputed reactively from the host's width breakpoint; switching
/// class invalidates the active viewport key and triggers a fresh
/// lookup/restore cycle (see [`crate::viewport`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    /// Width at or below which a surface is classified as mobile.
    pub const MOBILE_BREAKPOINT: f64 = 768.0;

    /// Classify a surface width in logical pixels.
    #[must_use]
    pub fn from_width(width: f64) -> Self {
        if width <= Self::MOBILE_BREAKPOINT {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }

    /// The wire string for this device class.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
