//! Role-based alert fan-out.
//!
//! Turns one materialized threat into per-recipient alert records and
//! delivery attempts. Alerting is best-effort relative to persistence:
//! a failed channel send is counted in the result, never raised to the
//! scan loop.

use crate::push::{PushEvent, PushHub};
use crate::store::Store;
use chrono::Utc;
use coastal_domain::{
    AlertPriority, AlertRecord, DeliveryChannel, DeliveryStatus, Recipient, StakeholderRole,
    ThreatRecord,
};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Roles notified about every materialized threat, regardless of severity.
pub const ALWAYS_NOTIFY_ROLES: [StakeholderRole; 2] = [
    StakeholderRole::EmergencyManagement,
    StakeholderRole::CivilDefence,
];

/// Above this severity every active recipient qualifies, whatever their role.
pub const HIGH_SEVERITY_THRESHOLD: f64 = 7.0;

/// Outcome summary for one fan-out pass.
#[derive(Debug, Clone, Serialize, Default)]
pub struct FanoutResult {
    pub total_recipients: usize,
    pub sent: usize,
    pub failed: usize,
}

/// A recipient is eligible when active and either always-notified by role or
/// the threat clears the high-severity threshold.
pub fn is_eligible(recipient: &Recipient, threat: &ThreatRecord) -> bool {
    recipient.active
        && (ALWAYS_NOTIFY_ROLES.contains(&recipient.role)
            || threat.severity > HIGH_SEVERITY_THRESHOLD)
}

// ============================================================================
// Role templates
// ============================================================================

pub(crate) struct AlertTemplate {
    pub title: String,
    pub message: String,
    pub channels: Vec<DeliveryChannel>,
}

/// Fixed per-role template table. The role enum is closed, so adding a role
/// forces a decision here; roles without a dedicated template share the
/// generic advisory.
pub(crate) fn render_alert(role: StakeholderRole, threat: &ThreatRecord) -> AlertTemplate {
    use DeliveryChannel::*;

    let type_name = threat.threat_type.to_string().replace('_', " ");
    match role {
        StakeholderRole::EmergencyManagement => AlertTemplate {
            title: format!("RESPONSE REQUIRED: {} (severity {:.1})", type_name, threat.severity),
            message: format!(
                "Activate coastal response protocol. {} Confidence {:.0}%.",
                threat.description,
                threat.confidence * 100.0
            ),
            channels: vec![InApp, Sms, Email, Webhook],
        },
        StakeholderRole::CityGovernment => AlertTemplate {
            title: format!("Coastal hazard advisory: {}", type_name),
            message: format!(
                "A {} event has been detected in your jurisdiction. {} Coordinate with local disaster response offices.",
                type_name, threat.description
            ),
            channels: vec![InApp, Email],
        },
        StakeholderRole::EnvironmentalNgo => AlertTemplate {
            title: format!("Ecosystem threat detected: {}", type_name),
            message: format!(
                "{} Blue carbon habitats in the affected area may need assessment.",
                threat.description
            ),
            channels: vec![InApp, Email],
        },
        StakeholderRole::Fisherfolk => AlertTemplate {
            title: format!("Sea condition warning: {}", type_name),
            message: format!(
                "Unsafe conditions detected (severity {:.1}). Secure boats and gear, avoid going out until the advisory lifts.",
                threat.severity
            ),
            channels: vec![InApp, Sms],
        },
        StakeholderRole::CivilDefence => AlertTemplate {
            title: format!("MOBILIZE: {} (severity {:.1})", type_name, threat.severity),
            message: format!(
                "Pre-position assets near the affected coastline. {}",
                threat.description
            ),
            channels: vec![InApp, Sms, Webhook],
        },
        // Generic advisory for roles without a dedicated template.
        StakeholderRole::CoastalResident | StakeholderRole::Researcher => AlertTemplate {
            title: format!("Coastal alert: {}", type_name),
            message: format!("{} Monitor official channels for updates.", threat.description),
            channels: vec![InApp],
        },
    }
}

// ============================================================================
// Delivery
// ============================================================================

/// Attempt one channel. In-app delivery is the persisted record plus the
/// push event and always succeeds; the other channels are stubbed sends that
/// fail when the recipient lacks the contact detail.
async fn deliver(
    recipient: &Recipient,
    alert: &AlertRecord,
    channel: DeliveryChannel,
) -> std::result::Result<(), String> {
    match channel {
        DeliveryChannel::InApp => Ok(()),
        DeliveryChannel::Email => match &recipient.email {
            Some(address) => {
                debug!(to = %address, alert = %alert.id, "stub email send");
                Ok(())
            }
            None => Err("no email address on file".into()),
        },
        DeliveryChannel::Sms => match &recipient.phone {
            Some(number) => {
                debug!(to = %number, alert = %alert.id, "stub sms send");
                Ok(())
            }
            None => Err("no phone number on file".into()),
        },
        DeliveryChannel::Webhook => match &recipient.webhook_url {
            Some(url) => {
                debug!(to = %url, alert = %alert.id, "stub webhook post");
                Ok(())
            }
            None => Err("no webhook url configured".into()),
        },
    }
}

/// Fan-out engine with explicit store and push-hub dependencies.
pub struct AlertFanout {
    store: Arc<Store>,
    push: Arc<PushHub>,
}

impl AlertFanout {
    pub fn new(store: Arc<Store>, push: Arc<PushHub>) -> Self {
        Self { store, push }
    }

    /// Dispatch alerts for one threat to every eligible recipient.
    pub async fn dispatch(&self, threat: &ThreatRecord) -> FanoutResult {
        let recipients = self.store.active_recipients().await;
        let eligible: Vec<Recipient> = recipients
            .into_iter()
            .filter(|r| is_eligible(r, threat))
            .collect();

        let mut result = FanoutResult {
            total_recipients: eligible.len(),
            ..Default::default()
        };

        for recipient in &eligible {
            let template = render_alert(recipient.role, threat);
            let alert = AlertRecord {
                id: Uuid::new_v4(),
                recipient_id: recipient.id,
                threat_id: threat.id,
                threat_type: threat.threat_type,
                priority: AlertPriority::from_severity(threat.severity),
                title: template.title,
                message: template.message,
                channels: template.channels,
                status: DeliveryStatus::Sent,
                created_at: Utc::now(),
                read_at: None,
            };

            if let Err(e) = self.store.insert_alert(alert.clone()).await {
                error!(recipient = %recipient.name, error = %e, "failed to persist alert");
                result.failed += 1;
                continue;
            }

            // Channels are attempted independently; one failing does not
            // abort the others or the fan-out.
            let attempts = join_all(
                alert
                    .channels
                    .iter()
                    .map(|channel| deliver(recipient, &alert, *channel)),
            )
            .await;

            let mut delivered_any = false;
            for (channel, outcome) in alert.channels.iter().zip(attempts) {
                match outcome {
                    Ok(()) => {
                        delivered_any = true;
                        result.sent += 1;
                    }
                    Err(reason) => {
                        warn!(
                            recipient = %recipient.name,
                            channel = ?channel,
                            reason,
                            "alert channel delivery failed"
                        );
                        result.failed += 1;
                    }
                }
            }

            if !delivered_any {
                let _ = self
                    .store
                    .set_alert_status(alert.id, DeliveryStatus::Failed)
                    .await;
            }

            self.push
                .send_to(recipient.id, PushEvent::NewAlert { alert })
                .await;
        }

        info!(
            threat = %threat.id,
            recipients = result.total_recipients,
            sent = result.sent,
            failed = result.failed,
            "alert fan-out complete"
        );
        result
    }
}
