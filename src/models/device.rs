//! Device commands and gateway entity states.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::CONTROLLABLE_DOMAINS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Heater,
    Fan,
    Humidifier,
    Dehumidifier,
    Light,
    Pump,
}

impl DeviceType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heater => "heater",
            Self::Fan => "fan",
            Self::Humidifier => "humidifier",
            Self::Dehumidifier => "dehumidifier",
            Self::Light => "light",
            Self::Pump => "pump",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceAction {
    TurnOn,
    TurnOff,
    Toggle,
}

impl DeviceAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::Toggle => "toggle",
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shelf-level command; ephemeral, never persisted by the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCommand {
    pub shelf_id: String,
    pub device_type: DeviceType,
    pub action: DeviceAction,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl DeviceCommand {
    pub fn turn_on(
        shelf_id: impl Into<String>,
        device_type: DeviceType,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            shelf_id: shelf_id.into(),
            device_type,
            action: DeviceAction::TurnOn,
            parameters,
        }
    }
}

/// Entity state as reported by the gateway's `/api/states`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
    pub last_changed: Option<String>,
    pub last_updated: Option<String>,
}

impl EntityState {
    /// Domain part of the entity id (`switch` for `switch.heater_1`)
    pub fn domain(&self) -> &str {
        entity_domain(&self.entity_id)
    }

    pub fn is_controllable(&self) -> bool {
        CONTROLLABLE_DOMAINS
            .iter()
            .any(|prefix| self.entity_id.starts_with(prefix))
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.get("friendly_name").and_then(|v| v.as_str())
    }
}

/// Domain part of an entity id
pub fn entity_domain(entity_id: &str) -> &str {
    entity_id.split('.').next().unwrap_or(entity_id)
}

/// Controllable device recorded by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    pub entity_id: String,
    pub domain: String,
    pub friendly_name: Option<String>,
    pub state: String,
}

impl From<&EntityState> for DiscoveredDevice {
    fn from(entity: &EntityState) -> Self {
        Self {
            entity_id: entity.entity_id.clone(),
            domain: entity.domain().to_string(),
            friendly_name: entity.friendly_name().map(str::to_string),
            state: entity.state.clone(),
        }
    }
}
