use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use cincuentazo::{MAX_MACHINES, MIN_MACHINES};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Settings for one match, loadable from a JSON file.
///
/// Every field is optional in the file; missing ones take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub human_name: String,
    pub machines: usize,
    /// Machines pause for a random time in this range (in milliseconds)
    /// before playing, so that a person can follow along.
    pub think_ms_min: u64,
    pub think_ms_max: u64,
    pub seed: Option<u64>,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            human_name: String::from("You"),
            machines: 1,
            think_ms_min: 2000,
            think_ms_max: 4000,
            seed: None,
        }
    }
}

impl MatchConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file '{}'", path.display()))?;
        Self::from_json(&json)
            .with_context(|| format!("Invalid config file '{}'", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !(MIN_MACHINES..=MAX_MACHINES).contains(&self.machines) {
            anyhow::bail!(
                "The number of machines must be between {} and {}, not {}",
                MIN_MACHINES,
                MAX_MACHINES,
                self.machines
            );
        }
        if self.think_ms_min > self.think_ms_max {
            anyhow::bail!(
                "think_ms_min ({}) is larger than think_ms_max ({})",
                self.think_ms_min,
                self.think_ms_max
            );
        }
        if self.human_name.trim().is_empty() {
            anyhow::bail!("The human player needs a name");
        }
        Ok(())
    }

    /// Sets both ends of the think time range.
    pub fn with_think_ms(mut self, ms: u64) -> Self {
        self.think_ms_min = ms;
        self.think_ms_max = ms;
        self
    }

    pub fn think_time<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        Duration::from_millis(rng.gen_range(self.think_ms_min..=self.think_ms_max))
    }
}
