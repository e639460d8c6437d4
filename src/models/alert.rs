//! Alerts raised by the monitor and control components.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    DeviceOffline,
    HarvestReady,
    ScheduleOverdue,
}

impl AlertType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DeviceOffline => "device_offline",
            Self::HarvestReady => "harvest_ready",
            Self::ScheduleOverdue => "schedule_overdue",
        }
    }

    /// Severity each alert type is raised with
    pub const fn default_severity(self) -> AlertSeverity {
        match self {
            Self::DeviceOffline => AlertSeverity::Medium,
            Self::HarvestReady => AlertSeverity::Low,
            Self::ScheduleOverdue => AlertSeverity::Medium,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    Critical,
}

impl AlertSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert to insert. Never mutated after creation; acknowledgement happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub shelf_id: String,
    pub schedule_id: Option<String>,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,
    pub acknowledged: bool,
}

impl NewAlert {
    pub fn new(
        shelf_id: impl Into<String>,
        schedule_id: Option<String>,
        alert_type: AlertType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            shelf_id: shelf_id.into(),
            schedule_id,
            alert_type,
            severity: alert_type.default_severity(),
            message: message.into(),
            acknowledged: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_type() {
        let alert = NewAlert::new("S1", None, AlertType::DeviceOffline, "offline");
        assert_eq!(alert.severity, AlertSeverity::Medium);
        assert!(!alert.acknowledged);

        let alert = NewAlert::new("S1", Some("sch-1".to_string()), AlertType::HarvestReady, "ready");
        assert_eq!(alert.severity, AlertSeverity::Low);
    }

    #[test]
    fn test_alert_type_wire_names() {
        assert_eq!(
            serde_json::to_value(AlertType::ScheduleOverdue).unwrap(),
            serde_json::json!("schedule_overdue")
        );
    }
}
