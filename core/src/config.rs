use serde::{Deserialize, Serialize};
use std::path::Path;

/// How an amount at one level is converted into another level's units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingPolicy {
    /// Factor `1000^distance` in both directions, for any distance.
    #[default]
    Exponential,
    /// Bit-for-bit parity with the first shipped purse:
    /// - upward factor is `1000 * distance`, not `1000^distance`
    /// - add ignores amounts two or more levels below the purse
    /// - subtract divides by `1000 * distance` below the purse,
    ///   which flips the sign and increases the balance
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurseConfig {
    /// Transactions between automatic saves.
    #[serde(default = "default_save_ticks")]
    pub save_ticks: u32,
    #[serde(default)]
    pub scaling: ScalingPolicy,
}

fn default_save_ticks() -> u32 {
    1
}

impl Default for PurseConfig {
    fn default() -> Self {
        Self {
            save_ticks: default_save_ticks(),
            scaling:    ScalingPolicy::default(),
        }
    }
}

impl PurseConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: PurseConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        Ok(config)
    }

    pub fn with_save_ticks(mut self, save_ticks: u32) -> Self {
        self.save_ticks = save_ticks;
        self
    }

    pub fn with_scaling(mut self, scaling: ScalingPolicy) -> Self {
        self.scaling = scaling;
        self
    }
}
