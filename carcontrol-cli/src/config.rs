//! Scenario loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use subaru_carcontrol::{
    ActuatorCommand, BrakeAssist, HudIndicators, Limits, PassThroughKind, PassThroughMessage,
};

/// Replay scenario (loaded from a .toml file)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub cycles: Vec<CycleConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Print decoded signal values under each frame (txt only)
    #[serde(default)]
    pub decode_signals: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Txt,
    Json,
}

/// One entry of the cycle list, possibly repeated
///
/// Vehicle state carries over between entries: a message given here replaces
/// the previous one of that kind, kinds not listed keep their last value.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CycleConfig {
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub steer: f32,
    #[serde(default)]
    pub gas: f32,
    #[serde(default)]
    pub brake: f32,
    #[serde(default)]
    pub driver_torque: i32,
    #[serde(default)]
    pub cancel: bool,
    #[serde(default)]
    pub hud: HudIndicators,
    #[serde(default)]
    pub brake_assist: BrakeAssist,
    /// Bump every inbound counter by one on each repetition after the first
    #[serde(default)]
    pub advance_counters: bool,
    #[serde(default)]
    pub messages: BTreeMap<PassThroughKind, PassThroughMessage>,
}

fn default_repeat() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl CycleConfig {
    pub fn actuators(&self) -> ActuatorCommand {
        ActuatorCommand::new(self.steer, self.gas, self.brake)
    }
}

impl ScenarioConfig {
    /// Total number of control cycles once repeats are expanded
    pub fn total_cycles(&self) -> u64 {
        self.cycles.iter().map(|c| u64::from(c.repeat)).sum()
    }
}

/// Load a scenario from a TOML file
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file: {:?}", path))?;

    parse_scenario(&content).with_context(|| format!("Failed to load scenario file: {:?}", path))
}

/// Parse and validate scenario TOML
pub fn parse_scenario(content: &str) -> Result<ScenarioConfig> {
    let scenario: ScenarioConfig = toml::from_str(content).context("Invalid scenario TOML")?;

    scenario.limits.validate().context("Invalid [limits] section")?;
    if scenario.cycles.is_empty() {
        log::warn!("Scenario has no cycles");
    }

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
        [limits]
        steer_delta_up = 40

        [output]
        format = "json"

        [[cycles]]
        repeat = 3
        steer = 0.5
        gas = 0.25
        driver_torque = -20
        advance_counters = true

        [cycles.hud]
        lead_visible = true

        [cycles.messages.distance]
        counter = 4

        [cycles.messages.distance.signals]
        Cruise_Set_Speed = 65

        [[cycles]]
        enabled = false
        cancel = true

        [cycles.brake_assist]
        active = true
        pressure = 200
    "#;

    #[test]
    fn test_scenario_deserialization() {
        let scenario = parse_scenario(SCENARIO).unwrap();

        assert_eq!(scenario.limits.steer_delta_up, 40);
        assert_eq!(scenario.limits.steer_max, 2047);
        assert_eq!(scenario.output.format, OutputFormat::Json);
        assert_eq!(scenario.cycles.len(), 2);
        assert_eq!(scenario.total_cycles(), 4);

        let first = &scenario.cycles[0];
        assert!(first.enabled);
        assert_eq!(first.actuators(), ActuatorCommand::new(0.5, 0.25, 0.0));
        assert!(first.hud.lead_visible);
        let distance = &first.messages[&PassThroughKind::Distance];
        assert_eq!(distance.counter, 4);
        assert_eq!(distance.signals["Cruise_Set_Speed"], 65.0);

        let second = &scenario.cycles[1];
        assert!(!second.enabled);
        assert!(second.cancel);
        assert!(second.brake_assist.active);
        assert!(second.messages.is_empty());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let err = parse_scenario("[limits]\nsteer_step = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("steer_step"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();

        let scenario = load_scenario(file.path()).unwrap();
        assert_eq!(scenario.cycles.len(), 2);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_scenario(Path::new("does-not-exist.toml")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.toml"));
    }
}
