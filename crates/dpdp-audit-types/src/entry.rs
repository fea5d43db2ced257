//! Audit log entry.

use crate::{AuditAction, AuditActor, AuditEntryId, ComplianceImpact};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Data category recorded when the event names none.
pub const DEFAULT_DATA_CATEGORY: &str = "General";

/// Address recorded when no request context supplies one.
pub const DEFAULT_IP_ADDRESS: &str = "127.0.0.1";

/// Keys in `details` that name the affected data category, in lookup order.
const DATA_CATEGORY_KEYS: [&str; 2] = ["dataCategory", "data_category"];

/// One immutable record in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique entry identifier.
    pub id: AuditEntryId,
    /// Data subject the event concerns.
    pub client_id: String,
    /// Event name.
    pub action: AuditAction,
    /// Affected data category.
    pub data_category: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Who caused the event.
    pub user_id: AuditActor,
    /// Originating address.
    pub ip_address: String,
    /// Structured event payload.
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Compliance impact.
    pub compliance_impact: ComplianceImpact,
}

impl AuditLogEntry {
    /// Create a new entry builder.
    pub fn builder(client_id: impl Into<String>, action: AuditAction) -> AuditLogEntryBuilder {
        AuditLogEntryBuilder::new(client_id, action)
    }

    /// Look up a details field.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }
}

/// Builder for constructing audit entries.
#[derive(Debug)]
pub struct AuditLogEntryBuilder {
    client_id: String,
    action: AuditAction,
    actor: AuditActor,
    impact: Option<ComplianceImpact>,
    data_category: Option<String>,
    ip_address: Option<String>,
    timestamp: Option<DateTime<Utc>>,
    details: Map<String, Value>,
}

impl AuditLogEntryBuilder {
    /// Create a new builder.
    pub fn new(client_id: impl Into<String>, action: AuditAction) -> Self {
        Self {
            client_id: client_id.into(),
            action,
            actor: AuditActor::System,
            impact: None,
            data_category: None,
            ip_address: None,
            timestamp: None,
            details: Map::new(),
        }
    }

    /// Set the actor (defaults to `System`).
    pub fn actor(mut self, actor: AuditActor) -> Self {
        self.actor = actor;
        self
    }

    /// Set the impact (defaults to the action's default impact).
    pub fn impact(mut self, impact: ComplianceImpact) -> Self {
        self.impact = Some(impact);
        self
    }

    /// Set the data category explicitly.
    pub fn data_category(mut self, category: impl Into<String>) -> Self {
        self.data_category = Some(category.into());
        self
    }

    /// Set the originating address.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Override the event time.
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add one details field.
    ///
    /// A value that cannot be serialized is recorded as its error message.
    pub fn detail(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        let json = serde_json::to_value(value).unwrap_or_else(|e| {
            warn!(action = %self.action, key = %key, error = %e, "audit detail not serializable");
            Value::String(format!("<unserializable: {e}>"))
        });
        self.details.insert(key, json);
        self
    }

    /// Merge a JSON payload into the details.
    ///
    /// Objects are merged field by field; any other value is stored under `value`.
    pub fn details(mut self, payload: Value) -> Self {
        match payload {
            Value::Object(fields) => self.details.extend(fields),
            Value::Null => {}
            other => {
                self.details.insert("value".to_string(), other);
            }
        }
        self
    }

    /// Build the entry.
    pub fn build(self) -> AuditLogEntry {
        let data_category = self
            .data_category
            .or_else(|| {
                DATA_CATEGORY_KEYS
                    .iter()
                    .find_map(|key| self.details.get(*key).and_then(Value::as_str))
                    .map(String::from)
            })
            .unwrap_or_else(|| DEFAULT_DATA_CATEGORY.to_string());

        AuditLogEntry {
            id: AuditEntryId::new(),
            client_id: self.client_id,
            compliance_impact: self.impact.unwrap_or_else(|| self.action.default_impact()),
            action: self.action,
            data_category,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            user_id: self.actor,
            ip_address: self
                .ip_address
                .unwrap_or_else(|| DEFAULT_IP_ADDRESS.to_string()),
            details: self.details,
        }
    }
}
