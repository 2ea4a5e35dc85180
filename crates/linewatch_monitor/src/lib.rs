//! Line monitor orchestration.
//!
//! Loads a TOML config, selects the I/O backend, and builds a fully
//! configured scan engine.
//!
//! Supported modes:
//! - `sim`: SimBackend (CI/unit tests, demos)
//! - `gpio`: memory-mapped GPIO backend (reserved)

use linewatch_engine::{EdgeSelect, LineMode, Pattern, ScanEngine};
use linewatch_hal::clock::SystemClock;
use linewatch_hal::config::LineMap;
use linewatch_hal::sim::SimBackend;
use linewatch_hal::traits::{HalError, LineBackend, LineId};
use serde::Deserialize;
use std::collections::HashMap;

/// Slot table capacity of monitor-built engines.
pub const MONITOR_CAPACITY: usize = 16;

pub type MonitorEngine = ScanEngine<Box<dyn LineBackend>, SystemClock, MONITOR_CAPACITY>;

/// Top-level monitor config, deserialized from TOML.
#[derive(Debug, Deserialize)]
pub struct MonitorConfig {
    pub mode: ModeConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub lines: LineMap,
    #[serde(default)]
    pub debounce: HashMap<String, u32>,
    #[serde(default)]
    pub edges: HashMap<String, EdgeConfig>,
    #[serde(default)]
    pub priority: HashMap<String, u8>,
    #[serde(default)]
    pub pattern: Vec<PatternSection>,
}

#[derive(Debug, Deserialize)]
pub struct ModeConfig {
    #[serde(rename = "type")]
    pub mode_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_cycle_time")]
    pub cycle_time_ms: u64,
    #[serde(default)]
    pub max_cycles: u64,
}

fn default_cycle_time() -> u64 {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cycle_time_ms: default_cycle_time(),
            max_cycles: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeConfig {
    Rising,
    Falling,
    Both,
}

impl From<EdgeConfig> for EdgeSelect {
    fn from(value: EdgeConfig) -> Self {
        match value {
            EdgeConfig::Rising => EdgeSelect::Rising,
            EdgeConfig::Falling => EdgeSelect::Falling,
            EdgeConfig::Both => EdgeSelect::Both,
        }
    }
}

/// One `[[pattern]]` section. `members` non-empty makes it a composite
/// over those lines.
#[derive(Debug, Deserialize)]
pub struct PatternSection {
    pub line: String,
    pub target_bits: u8,
    #[serde(default)]
    pub timing_window: u32,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Parsed mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Sim,
    Gpio,
}

impl MonitorConfig {
    /// Parse from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Parse from TOML file path.
    pub fn from_file(path: &str) -> Result<Self, MonitorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MonitorError::ConfigError(format!("{path}: {e}")))?;
        Self::from_toml(&content).map_err(|e| MonitorError::ConfigError(e.to_string()))
    }

    /// Resolve the mode from config.
    pub fn backend_mode(&self) -> Result<BackendMode, MonitorError> {
        match self.mode.mode_type.as_str() {
            "sim" => Ok(BackendMode::Sim),
            "gpio" => Ok(BackendMode::Gpio),
            other => Err(MonitorError::ConfigError(format!(
                "unknown mode type: {other}"
            ))),
        }
    }

    pub fn priority_of(&self, name: &str) -> u8 {
        self.priority.get(name).copied().unwrap_or(0)
    }

    fn line_id(&self, name: &str) -> Result<LineId, MonitorError> {
        self.lines
            .id(name)
            .ok_or_else(|| MonitorError::ConfigError(format!("unknown line name: {name}")))
    }
}

/// Create an I/O backend from monitor config.
pub fn create_backend(config: &MonitorConfig) -> Result<Box<dyn LineBackend>, MonitorError> {
    match config.backend_mode()? {
        BackendMode::Sim => Ok(Box::new(SimBackend::new())),
        BackendMode::Gpio => Err(MonitorError::ConfigError(
            "gpio backend not yet implemented".into(),
        )),
    }
}

/// Build a scan engine from config: configure every named line, then apply
/// debounce, edge, priority, and pattern settings. Settings that name an
/// unmapped line are config errors.
pub fn build_engine(
    config: &MonitorConfig,
    backend: Box<dyn LineBackend>,
) -> Result<MonitorEngine, MonitorError> {
    let clock = SystemClock::new(config.runtime.cycle_time_ms);
    let mut engine = ScanEngine::new(backend, clock, config.runtime.cycle_time_ms);

    for &id in config.lines.inputs.values() {
        engine.configure_line(id, LineMode::Input)?;
    }
    for &id in config.lines.outputs.values() {
        engine.configure_line(id, LineMode::Output)?;
    }
    for (name, &ticks) in &config.debounce {
        engine.set_debounce(config.line_id(name)?, ticks)?;
    }
    for (name, &edge) in &config.edges {
        engine.set_edge_select(config.line_id(name)?, edge.into())?;
    }
    for (name, &priority) in &config.priority {
        engine.set_priority(config.line_id(name)?, priority)?;
    }
    for section in &config.pattern {
        let id = config.line_id(&section.line)?;
        let pattern = if section.members.is_empty() {
            Pattern::timed(section.target_bits, section.timing_window)
        } else {
            if section.timing_window != 0 {
                return Err(MonitorError::ConfigError(format!(
                    "pattern on {}: timing_window is not supported for composites",
                    section.line
                )));
            }
            let mut mask: u16 = 0;
            for member in &section.members {
                let member_id = config.line_id(member)?;
                if member_id > 15 {
                    return Err(MonitorError::ConfigError(format!(
                        "pattern member {member}: line {member_id} is outside the composite mask"
                    )));
                }
                mask |= 1 << member_id;
            }
            Pattern::composite(section.target_bits, mask)
        };
        engine.set_pattern(id, pattern)?;
    }
    Ok(engine)
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    ConfigError(String),
    #[error("engine error: {0}")]
    EngineError(#[from] linewatch_engine::EngineError),
    #[error("HAL error: {0}")]
    HalError(#[from] HalError),
}
