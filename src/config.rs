use crate::error::{FieldPlanError, Result};
use crate::logic::fertilizer::FertilizerPolicy;
use crate::logic::growth_stage::StageTable;
use crate::logic::irrigation::IrrigationPolicy;
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine configuration. Every section falls back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Scenario file used when `--scenario` is not given.
    #[serde(default)]
    pub scenario: Option<PathBuf>,
    #[serde(default)]
    pub irrigation: IrrigationPolicy,
    #[serde(default)]
    pub fertilizer: FertilizerPolicy,
    #[serde(default)]
    pub growth_stages: StageTable,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    4
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Config {
    /// Loads the first config found. An explicit path must exist; without
    /// one, a missing file means built-in defaults.
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(FieldPlanError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config = Self::from_file(&config_path)?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| FieldPlanError::Config(format!("Failed to read config: {}", e)))?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // Substitute environment variables
        let content = Self::substitute_env_vars(content)?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| FieldPlanError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Search for config.yaml in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        // Try current directory first
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        // Try XDG config directory
        dirs::config_dir()
            .map(|dir| dir.join("fieldplan").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/fieldplan/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FieldPlanError::Config("Cannot determine config directory".into()))?
            .join("fieldplan");
        Ok(config_dir.join("config.yaml"))
    }

    /// Cross-section consistency; parse-time checks cover the rest.
    pub fn validate(&self) -> Result<()> {
        self.irrigation.validate()?;
        self.fertilizer.validate(&self.growth_stages)?;
        if self.batch.max_concurrency == 0 {
            return Err(FieldPlanError::Config(
                "batch.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the config and the path it was written to.
    pub fn setup_interactive(target: Option<PathBuf>) -> Result<(Self, PathBuf)> {
        let input_err = |e: dialoguer::Error| FieldPlanError::Config(format!("Input error: {}", e));
        let mut config = Config::default();

        println!();
        println!("Let's set up fieldplan. Press enter to keep a default.");
        println!();

        println!("Scenario");
        let scenario: String = Input::new()
            .with_prompt("  Default scenario file (blank for none)")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(input_err)?;
        config.scenario = (!scenario.is_empty()).then(|| PathBuf::from(scenario));

        println!();
        println!("Irrigation");
        config.irrigation.default_root_depth_m = Input::new()
            .with_prompt("  Root depth when a field has none (m)")
            .default(config.irrigation.default_root_depth_m)
            .interact_text()
            .map_err(input_err)?;

        config.irrigation.application_efficiency.default = Input::new()
            .with_prompt("  Application efficiency for unlisted methods")
            .default(config.irrigation.application_efficiency.default)
            .interact_text()
            .map_err(input_err)?;

        println!();
        println!("Fertilizer");
        let thresholds = &mut config.fertilizer.thresholds;
        thresholds.nitrogen_topdress_kg_ha = Input::new()
            .with_prompt("  Uncovered N deficit that triggers top-dressing (kg/ha)")
            .default(thresholds.nitrogen_topdress_kg_ha)
            .interact_text()
            .map_err(input_err)?;

        thresholds.overdue_grace_days = Input::new()
            .with_prompt("  Days before a planned application counts as overdue")
            .default(thresholds.overdue_grace_days)
            .interact_text()
            .map_err(input_err)?;

        println!();
        println!("Batch");
        config.batch.max_concurrency = Input::new()
            .with_prompt("  Fields computed concurrently")
            .default(config.batch.max_concurrency)
            .interact_text()
            .map_err(input_err)?;

        println!();
        config.validate()?;

        let config_path = match target {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        if config_path.exists() {
            let overwrite = Confirm::new()
                .with_prompt(format!("{} exists. Overwrite?", config_path.display()))
                .default(false)
                .interact()
                .map_err(input_err)?;
            if !overwrite {
                return Err(FieldPlanError::Config("Setup cancelled".into()));
            }
        }

        config.write(&config_path)?;
        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FieldPlanError::Config(format!("Failed to serialize config: {}", e)))?;

        // Write with a header comment
        let content = format!(
            "# fieldplan configuration\n# Generated by `fieldplan init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Replaces `${VAR_NAME}` with the variable's value; unset variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let mut result = content.to_string();

        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| FieldPlanError::Config(format!("Bad substitution pattern: {}", e)))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GrowthStage;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch.max_concurrency, 4);
        assert_eq!(config.fertilizer.thresholds.nitrogen_topdress_kg_ha, 20.0);
        assert_eq!(config.fertilizer.thresholds.overdue_grace_days, 7);
        assert_eq!(config.growth_stages.thresholds().len(), 6);
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = r#"
irrigation:
  default_root_depth_m: 0.9
fertilizer:
  thresholds:
    nitrogen_topdress_kg_ha: 30
batch:
  max_concurrency: 8
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.irrigation.default_root_depth_m, 0.9);
        assert_eq!(config.fertilizer.thresholds.nitrogen_topdress_kg_ha, 30.0);
        assert_eq!(config.fertilizer.thresholds.overdue_grace_days, 7);
        assert_eq!(config.batch.max_concurrency, 8);
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("FIELDPLAN_TEST_SCENARIO", "/tmp/farm.yaml");
        let config =
            Config::from_yaml_str("scenario: ${FIELDPLAN_TEST_SCENARIO}\n").unwrap();
        assert_eq!(config.scenario, Some(PathBuf::from("/tmp/farm.yaml")));

        let untouched = Config::substitute_env_vars("x: ${FIELDPLAN_SURELY_UNSET_VAR}").unwrap();
        assert_eq!(untouched, "x: ${FIELDPLAN_SURELY_UNSET_VAR}");
    }

    #[test]
    fn custom_stage_table_round_trips() {
        let yaml = r#"
growth_stages:
  - { stage: Sowing, progress: 0.0 }
  - { stage: Germination, progress: 0.1 }
  - { stage: Vegetative, progress: 0.45 }
  - { stage: Flowering, progress: 0.65 }
  - { stage: GrainFilling, progress: 0.9 }
  - { stage: Maturity, progress: 1.0 }
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.growth_stages.onset_fraction(GrowthStage::Flowering),
            Some(0.45)
        );
    }

    #[test]
    fn inconsistent_policies_are_rejected() {
        assert!(Config::from_yaml_str("batch:\n  max_concurrency: 0\n").is_err());
        assert!(Config::from_yaml_str(
            "fertilizer:\n  deficit_bands: { adequate_below: 0.5, critical_from: 0.2 }\n"
        )
        .is_err());
        // Distribution uses Flowering, which this table lacks.
        let yaml = r#"
growth_stages:
  - { stage: Sowing, progress: 0.0 }
  - { stage: Maturity, progress: 1.0 }
"#;
        assert!(Config::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let missing = PathBuf::from("/nonexistent/fieldplan/config.yaml");
        assert!(matches!(
            Config::load(Some(missing)),
            Err(FieldPlanError::Config(_))
        ));
    }

    #[test]
    fn written_config_loads_back() {
        let dir = std::env::temp_dir().join(format!("fieldplan-config-{}", std::process::id()));
        let path = dir.join("config.yaml");
        let mut config = Config::default();
        config.batch.max_concurrency = 2;
        config.write(&path).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(dir).ok();
    }
}
