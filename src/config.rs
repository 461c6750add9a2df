use crate::action::ActionTuning;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub aliases: HashMap<String, String>,
    pub tuning: ActionTuning,
}

impl RuntimeConfig {
    // Rewrites ":myalias rest" into its configured target before parsing.
    pub fn resolve_alias(&self, line: &str) -> String {
        let Some(rest) = line.strip_prefix(':') else {
            return line.to_string();
        };
        let mut tokens = rest.splitn(2, ' ');
        let word = tokens.next().unwrap_or_default().to_ascii_lowercase();
        match (self.aliases.get(&word), tokens.next()) {
            (Some(target), Some(tail)) => format!(":{target} {tail}"),
            (Some(target), None) => format!(":{target}"),
            (None, _) => line.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
struct MantaConfigFile {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
    #[serde(default)]
    actions: Vec<ActionSpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct ActionSpec {
    name: String,
    #[serde(default, alias = "timeout")]
    timeout_ms: Option<i64>,
    #[serde(default)]
    retries: Option<u32>,
}

pub fn load(path: Option<&Path>) -> Result<RuntimeConfig> {
    let Some(path) = path else {
        return Ok(RuntimeConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let file: MantaConfigFile = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    let mut config = RuntimeConfig {
        aliases: file
            .aliases
            .into_iter()
            .map(|(alias, target)| (alias.to_ascii_lowercase(), target.to_ascii_lowercase()))
            .collect(),
        tuning: ActionTuning::default(),
    };
    for action in file.actions {
        let name = action.name.to_ascii_lowercase();
        if let Some(timeout_ms) = action.timeout_ms {
            config.tuning.timeout_ms.insert(name.clone(), timeout_ms);
        }
        if let Some(retries) = action.retries {
            config.tuning.retries.insert(name, retries);
        }
    }
    Ok(config)
}
