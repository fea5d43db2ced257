//! Audit event actors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who caused an audit event.
///
/// Serialized as a bare string (`"System"`, `"Client"`, or the named actor).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditActor {
    /// The engine itself or another automated process.
    System,
    /// The data subject acting on their own record.
    Client,
    /// Any other named actor, e.g. a therapist or administrator id.
    Named(String),
}

impl AuditActor {
    /// Create a named actor.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::from(name)
    }

    /// Get a display identifier for this actor.
    pub fn identifier(&self) -> &str {
        match self {
            Self::System => "System",
            Self::Client => "Client",
            Self::Named(name) => name,
        }
    }
}

impl Default for AuditActor {
    fn default() -> Self {
        Self::System
    }
}

impl fmt::Display for AuditActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

impl From<String> for AuditActor {
    fn from(s: String) -> Self {
        match s.as_str() {
            "System" => Self::System,
            "Client" => Self::Client,
            _ => Self::Named(s),
        }
    }
}

impl From<&str> for AuditActor {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<AuditActor> for String {
    fn from(actor: AuditActor) -> Self {
        match actor {
            AuditActor::Named(name) => name,
            other => other.identifier().to_string(),
        }
    }
}
