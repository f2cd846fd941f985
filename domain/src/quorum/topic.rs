//! Voting topics and the options they offer.

use super::recommendation::Recommendation;
use crate::agent::AgentId;
use crate::core::error::VotingError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Free-form context passed to workers alongside a topic.
pub type TopicContext = BTreeMap<String, Value>;

/// Identifier of a voting round, unique within a voting engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(String);

impl RoundId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoundId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a topic asks the swarm to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicKind {
    /// A strategic choice between alternatives
    Decision,
    /// An immediate action to take
    Action,
}

/// One choice on the ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOption {
    /// Unique within the topic
    pub id: String,
    /// The recommendation this option stands for
    pub value: Recommendation,
    pub description: String,
    /// Agent whose report introduced the option, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_by: Option<AgentId>,
}

impl VoteOption {
    pub fn new(
        id: impl Into<String>,
        value: Recommendation,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            value,
            description: description.into(),
            proposed_by: None,
        }
    }

    /// An option whose value is the label equal to its id.
    pub fn labeled(id: impl Into<String>, description: impl Into<String>) -> Self {
        let id = id.into();
        let value = Recommendation::label(id.clone());
        Self::new(id, value, description)
    }

    pub fn proposed_by(mut self, agent: impl Into<AgentId>) -> Self {
        self.proposed_by = Some(agent.into());
        self
    }
}

/// The question put to a voting round.
///
/// Immutable once a round opens: the round keeps its own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingTopic {
    pub id: String,
    pub kind: TopicKind,
    pub question: String,
    /// Ballot options, in the order used by the deterministic tie-break
    pub options: Vec<VoteOption>,
    #[serde(default)]
    pub context: TopicContext,
}

impl VotingTopic {
    pub fn new(
        id: impl Into<String>,
        kind: TopicKind,
        question: impl Into<String>,
        options: Vec<VoteOption>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            question: question.into(),
            options,
            context: TopicContext::new(),
        }
    }

    pub fn with_context(mut self, context: TopicContext) -> Self {
        self.context = context;
        self
    }

    /// Reject topics that cannot be voted on.
    pub fn validate(&self) -> Result<(), VotingError> {
        if self.options.is_empty() {
            return Err(VotingError::InvalidTopic(format!(
                "topic '{}' has no options",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.id.as_str()) {
                return Err(VotingError::InvalidTopic(format!(
                    "topic '{}' has duplicate option id '{}'",
                    self.id, option.id
                )));
            }
        }
        Ok(())
    }

    pub fn option(&self, option_id: &str) -> Option<&VoteOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// Position of an option in the original ballot order.
    pub fn position(&self, option_id: &str) -> Option<usize> {
        self.options.iter().position(|o| o.id == option_id)
    }

    /// Find the option whose value is structurally equal to `value`.
    pub fn option_for(&self, value: &Recommendation) -> Option<&VoteOption> {
        self.options
            .iter()
            .find(|o| o.value.structurally_equal(value))
    }
}
