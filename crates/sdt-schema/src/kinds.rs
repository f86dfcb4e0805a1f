//! Document kinds and the schema file each one is validated against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The seven document kinds with a fixed schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Template,
    Rule,
    Agent,
    Project,
    Execution,
    Event,
    Billing,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 7] = [
        DocumentKind::Template,
        DocumentKind::Rule,
        DocumentKind::Agent,
        DocumentKind::Project,
        DocumentKind::Execution,
        DocumentKind::Event,
        DocumentKind::Billing,
    ];

    /// File name of the kind's schema within the schema directory.
    pub fn schema_file(self) -> &'static str {
        match self {
            DocumentKind::Template => "template.schema.json",
            DocumentKind::Rule => "rule.schema.json",
            DocumentKind::Agent => "agent.schema.json",
            DocumentKind::Project => "project.schema.json",
            DocumentKind::Execution => "execution.schema.json",
            DocumentKind::Event => "event.schema.json",
            DocumentKind::Billing => "billing.schema.json",
        }
    }

    /// Label used in failure reports.
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Template => "Template",
            DocumentKind::Rule => "Rule",
            DocumentKind::Agent => "Agent",
            DocumentKind::Project => "Project",
            DocumentKind::Execution => "Execution",
            DocumentKind::Event => "Event",
            DocumentKind::Billing => "Billing",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Template => "template",
            DocumentKind::Rule => "rule",
            DocumentKind::Agent => "agent",
            DocumentKind::Project => "project",
            DocumentKind::Execution => "execution",
            DocumentKind::Event => "event",
            DocumentKind::Billing => "billing",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`DocumentKind`] from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown document kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for DocumentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}
