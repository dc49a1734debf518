//! Authorization audit events.

use crate::types::{Action, Resource};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

/// What an audit event records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditKind {
    PermissionCheck {
        resource: Resource,
        action: Action,
        #[serde(skip_serializing_if = "Option::is_none")]
        resource_owner_id: Option<String>,
        granted: bool,
    },
    RouteCheck {
        path: String,
        granted: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    ImpersonationStarted {
        target_id: String,
    },
    ImpersonationStopped {
        target_id: String,
    },
}

/// Authorization audit event.
#[derive(Debug, Clone, Serialize)]
pub struct AuthzAuditEvent {
    pub timestamp: DateTime<Utc>,
    /// The real operator, even while impersonating.
    pub actor_id: String,
    /// The identity decisions were made for, when it differs from the actor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_id: Option<String>,
    #[serde(flatten)]
    pub kind: AuditKind,
}

impl AuthzAuditEvent {
    pub fn new(actor_id: impl Into<String>, kind: AuditKind) -> Self {
        Self {
            timestamp: Utc::now(),
            actor_id: actor_id.into(),
            effective_id: None,
            kind,
        }
    }

    pub fn on_behalf_of(mut self, effective_id: impl Into<String>) -> Self {
        let effective_id = effective_id.into();
        if effective_id != self.actor_id {
            self.effective_id = Some(effective_id);
        }
        self
    }

    /// Whether the event records a refused request.
    pub fn is_denial(&self) -> bool {
        matches!(
            self.kind,
            AuditKind::PermissionCheck { granted: false, .. }
                | AuditKind::RouteCheck { granted: false, .. }
        )
    }

    /// Emit the event through `tracing`.
    pub fn log(&self) {
        let payload = serde_json::to_string(&self.kind).unwrap_or_default();
        if self.is_denial() {
            warn!(
                target: "storeguard::audit",
                actor_id = %self.actor_id,
                effective_id = ?self.effective_id,
                event = %payload,
                "Authorization denied"
            );
        } else {
            info!(
                target: "storeguard::audit",
                actor_id = %self.actor_id,
                effective_id = ?self.effective_id,
                event = %payload,
                "Authorization event"
            );
        }
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuthzAuditEvent);
}

/// Sink that writes events to the `storeguard::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuthzAuditEvent) {
        event.log();
    }
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuthzAuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuthzAuditEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuthzAuditEvent) {
        self.events.lock().push(event);
    }
}
