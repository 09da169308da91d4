use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActuatorKind {
    Pump,
    Fan,
    Light,
}

impl ActuatorKind {
    pub fn all() -> &'static [ActuatorKind] {
        &[ActuatorKind::Pump, ActuatorKind::Fan, ActuatorKind::Light]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActuatorKind::Pump => "PUMP",
            ActuatorKind::Fan => "FAN",
            ActuatorKind::Light => "LIGHT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pump" => Some(ActuatorKind::Pump),
            "fan" => Some(ActuatorKind::Fan),
            "light" | "lights" => Some(ActuatorKind::Light),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    On,
    Off,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "ON",
            Action::Off => "OFF",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "on" | "1" | "true" => Some(Action::On),
            "off" | "0" | "false" => Some(Action::Off),
            _ => None,
        }
    }

    pub fn from_bool(on: bool) -> Self {
        if on {
            Action::On
        } else {
            Action::Off
        }
    }

    pub fn is_on(&self) -> bool {
        matches!(self, Action::On)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stored state of one actuator in one greenhouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorState {
    pub id: i64,
    pub greenhouse_id: i64,
    pub kind: ActuatorKind,
    pub state: Action,
    pub last_toggled: DateTime<Utc>,
}

/// What a device polls to learn which outputs to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorCommands {
    pub pump: bool,
    pub fan: bool,
    pub light: bool,
}

impl ActuatorCommands {
    /// Actuators without a stored row stay `false`.
    pub fn from_states(states: &[ActuatorState]) -> Self {
        let mut commands = Self::default();
        for actuator in states {
            let on = actuator.state.is_on();
            match actuator.kind {
                ActuatorKind::Pump => commands.pump = on,
                ActuatorKind::Fan => commands.fan = on,
                ActuatorKind::Light => commands.light = on,
            }
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_kind_from_str_valid() {
        assert_eq!(ActuatorKind::from_str("PUMP"), Some(ActuatorKind::Pump));
        assert_eq!(ActuatorKind::from_str("fan"), Some(ActuatorKind::Fan));
        assert_eq!(ActuatorKind::from_str("Light"), Some(ActuatorKind::Light));
    }

    #[test]
    fn actuator_kind_from_str_invalid() {
        assert_eq!(ActuatorKind::from_str("heater"), None);
        assert_eq!(ActuatorKind::from_str(""), None);
    }

    #[test]
    fn actuator_kind_round_trip() {
        for kind in ActuatorKind::all() {
            assert_eq!(
                ActuatorKind::from_str(kind.as_str()),
                Some(*kind),
                "Round-trip failed for {:?}",
                kind
            );
        }
    }

    #[test]
    fn action_from_str() {
        assert_eq!(Action::from_str("ON"), Some(Action::On));
        assert_eq!(Action::from_str("off"), Some(Action::Off));
        assert_eq!(Action::from_str("1"), Some(Action::On));
        assert_eq!(Action::from_str("dim"), None);
    }

    #[test]
    fn action_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Action::On).unwrap(), "\"ON\"");
        assert_eq!(
            serde_json::to_string(&ActuatorKind::Light).unwrap(),
            "\"LIGHT\""
        );
    }

    #[test]
    fn commands_default_to_off_for_missing_actuators() {
        let states = vec![ActuatorState {
            id: 1,
            greenhouse_id: 1,
            kind: ActuatorKind::Fan,
            state: Action::On,
            last_toggled: Utc::now(),
        }];

        let commands = ActuatorCommands::from_states(&states);
        assert!(!commands.pump);
        assert!(commands.fan);
        assert!(!commands.light);
    }
}
