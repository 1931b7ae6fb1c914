//! Exploration pacing settings.
use crate::combat::CombatConfig;
use crate::constants::{
    DEFAULT_CHOICE_THRESHOLD_MAX, DEFAULT_CHOICE_THRESHOLD_MIN, DEFAULT_HISTORY_LIMIT,
    DEFAULT_MAX_EVENT_INTERVAL_SECS, DEFAULT_MIN_EVENT_INTERVAL_SECS,
};
use crate::error::SettingsError;
use crate::numbers::u64_to_f64;
use serde::{Deserialize, Serialize};

const DEFAULT_SETTINGS_DATA: &str = include_str!("../data/exploration.json");

/// Host-supplied knobs read by the exploration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default = "ExplorationSettings::fallback")]
pub struct ExplorationSettings {
    pub min_event_interval_secs: f64,
    pub max_event_interval_secs: f64,
    /// Divides the event interval; 2.0 produces entries twice as often.
    pub event_speed: f64,
    pub auto_pause_on_choice: bool,
    pub history_limit: usize,
    pub choice_threshold_min: u32,
    pub choice_threshold_max: u32,
    pub combat: CombatConfig,
}

impl ExplorationSettings {
    fn fallback() -> Self {
        Self {
            min_event_interval_secs: DEFAULT_MIN_EVENT_INTERVAL_SECS,
            max_event_interval_secs: DEFAULT_MAX_EVENT_INTERVAL_SECS,
            event_speed: 1.0,
            auto_pause_on_choice: true,
            history_limit: DEFAULT_HISTORY_LIMIT,
            choice_threshold_min: DEFAULT_CHOICE_THRESHOLD_MIN,
            choice_threshold_max: DEFAULT_CHOICE_THRESHOLD_MAX,
            combat: CombatConfig::default(),
        }
    }

    /// Parse and validate settings from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` when the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self =
            serde_json::from_str(json).map_err(|err| SettingsError::Parse(err.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Repair values a host may hand over unchecked: non-positive intervals
    /// and speeds fall back to defaults, inverted ranges are swapped.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let fallback = Self::fallback();
        if !(self.min_event_interval_secs.is_finite() && self.min_event_interval_secs > 0.0) {
            self.min_event_interval_secs = fallback.min_event_interval_secs;
        }
        if !(self.max_event_interval_secs.is_finite() && self.max_event_interval_secs > 0.0) {
            self.max_event_interval_secs = fallback.max_event_interval_secs;
        }
        if self.min_event_interval_secs > self.max_event_interval_secs {
            std::mem::swap(
                &mut self.min_event_interval_secs,
                &mut self.max_event_interval_secs,
            );
        }
        if !(self.event_speed.is_finite() && self.event_speed > 0.0) {
            self.event_speed = fallback.event_speed;
        }
        if self.history_limit == 0 {
            self.history_limit = fallback.history_limit;
        }
        if self.choice_threshold_min > self.choice_threshold_max {
            std::mem::swap(
                &mut self.choice_threshold_min,
                &mut self.choice_threshold_max,
            );
        }
        if !(self.combat.crit_multiplier.is_finite() && self.combat.crit_multiplier >= 1.0) {
            self.combat.crit_multiplier = fallback.combat.crit_multiplier;
        }
        self.combat.damage_variance = self.combat.damage_variance.max(0);
        self.combat.max_rounds = self.combat.max_rounds.max(1);
        self
    }

    /// # Errors
    ///
    /// Returns `SettingsError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), SettingsError> {
        check_range(
            "min_event_interval_secs",
            self.min_event_interval_secs,
            0.1,
            3_600.0,
        )?;
        check_range(
            "max_event_interval_secs",
            self.max_event_interval_secs,
            0.1,
            3_600.0,
        )?;
        if self.min_event_interval_secs > self.max_event_interval_secs {
            return Err(SettingsError::OrderViolation {
                field: "min_event_interval_secs",
                other: "max_event_interval_secs",
                value: self.min_event_interval_secs,
                limit: self.max_event_interval_secs,
            });
        }
        check_range("event_speed", self.event_speed, 0.1, 10.0)?;
        check_range(
            "history_limit",
            u64_to_f64(u64::try_from(self.history_limit).unwrap_or(u64::MAX)),
            1.0,
            10_000.0,
        )?;
        check_range(
            "choice_threshold_min",
            f64::from(self.choice_threshold_min),
            0.0,
            1_000.0,
        )?;
        if self.choice_threshold_min > self.choice_threshold_max {
            return Err(SettingsError::OrderViolation {
                field: "choice_threshold_min",
                other: "choice_threshold_max",
                value: f64::from(self.choice_threshold_min),
                limit: f64::from(self.choice_threshold_max),
            });
        }
        check_range(
            "combat.crit_multiplier",
            self.combat.crit_multiplier,
            1.0,
            10.0,
        )?;
        Ok(())
    }
}

impl Default for ExplorationSettings {
    fn default() -> Self {
        serde_json::from_str(DEFAULT_SETTINGS_DATA).unwrap_or_else(|_| Self::fallback())
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if !value.is_finite() || !(min..=max).contains(&value) {
        return Err(SettingsError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_fallback() {
        let settings = ExplorationSettings::default();
        assert_eq!(settings, ExplorationSettings::fallback());
        settings.validate().expect("defaults are valid");
    }

    #[test]
    fn empty_object_parses_to_defaults() {
        let parsed = ExplorationSettings::from_json("{}").expect("parse");
        assert_eq!(parsed, ExplorationSettings::default());
        assert_eq!(parsed.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn history_limit_above_bound_is_rejected() {
        let err = ExplorationSettings::from_json(r#"{"history_limit": 20000}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::RangeViolation { field, .. } if field == "history_limit"
        ));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let settings = ExplorationSettings::from_json(r#"{"auto_pause_on_choice": false}"#)
            .expect("parse");
        assert!(!settings.auto_pause_on_choice);
        assert!((settings.max_event_interval_secs - 8.0).abs() < f64::EPSILON);
        assert_eq!(settings.combat, CombatConfig::default());
    }

    #[test]
    fn inverted_interval_is_rejected() {
        let err = ExplorationSettings::from_json(
            r#"{"min_event_interval_secs": 9.0, "max_event_interval_secs": 4.0}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OrderViolation { field, .. } if field == "min_event_interval_secs"
        ));
    }

    #[test]
    fn speed_out_of_range_is_rejected() {
        let err = ExplorationSettings::from_json(r#"{"event_speed": 0.0}"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::RangeViolation { field, .. } if field == "event_speed"
        ));
    }

    #[test]
    fn normalization_repairs_inverted_and_non_positive_values() {
        let settings = ExplorationSettings {
            min_event_interval_secs: 12.0,
            max_event_interval_secs: 4.0,
            event_speed: -2.0,
            history_limit: 0,
            choice_threshold_min: 9,
            choice_threshold_max: 2,
            ..ExplorationSettings::default()
        }
        .normalized();
        assert!((settings.min_event_interval_secs - 4.0).abs() < f64::EPSILON);
        assert!((settings.max_event_interval_secs - 12.0).abs() < f64::EPSILON);
        assert!((settings.event_speed - 1.0).abs() < f64::EPSILON);
        assert_eq!(settings.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(
            (settings.choice_threshold_min, settings.choice_threshold_max),
            (2, 9)
        );
        settings.validate().expect("normalized settings validate");
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let settings = ExplorationSettings {
            min_event_interval_secs: 0.0,
            ..ExplorationSettings::default()
        }
        .normalized();
        assert!((settings.min_event_interval_secs - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_json_reports_parse_error() {
        assert!(matches!(
            ExplorationSettings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }
}
