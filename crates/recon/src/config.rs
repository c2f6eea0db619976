use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::schema::{CanonicalField, HeaderSchema};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StocktakeConfig {
    /// Only records whose normalized condition equals this are expected.
    pub target_condition: String,
    pub schema: HeaderSchema,
    pub intake: IntakeConfig,
}

impl Default for StocktakeConfig {
    fn default() -> Self {
        Self {
            target_condition: "new".into(),
            schema: HeaderSchema::default(),
            intake: IntakeConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Intake timings
// ---------------------------------------------------------------------------

/// Timings for the two scan producers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Keyboard-wedge inactivity gap that ends a code.
    pub wedge_gap_ms: u64,
    /// Window in which a camera decoder repeat of the same text is ignored.
    pub camera_cooldown_ms: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            wedge_gap_ms: 55,
            camera_cooldown_ms: 800,
        }
    }
}

impl IntakeConfig {
    pub fn wedge_gap(&self) -> Duration {
        Duration::from_millis(self.wedge_gap_ms)
    }

    pub fn camera_cooldown(&self) -> Duration {
        Duration::from_millis(self.camera_cooldown_ms)
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl StocktakeConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: StocktakeConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_condition.trim().is_empty() {
            return Err(ConfigError::Validation(
                "target_condition must not be empty".into(),
            ));
        }

        for field in CanonicalField::ALL {
            let spellings = self.schema.spellings(field);
            let required = CanonicalField::REQUIRED.contains(&field);
            if required && spellings.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "schema.{}: at least one spelling is required",
                    field.name().to_lowercase()
                )));
            }
            // An empty needle would match every header cell
            if spellings.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "schema.{}: blank spelling",
                    field.name().to_lowercase()
                )));
            }
        }

        if self.intake.wedge_gap_ms == 0 {
            return Err(ConfigError::Validation("intake.wedge_gap_ms must be > 0".into()));
        }
        if self.intake.camera_cooldown_ms == 0 {
            return Err(ConfigError::Validation(
                "intake.camera_cooldown_ms must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Target condition as compared against `InventoryRecord::normalized_condition`.
    pub fn normalized_target(&self) -> String {
        self.target_condition.trim().to_lowercase()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
