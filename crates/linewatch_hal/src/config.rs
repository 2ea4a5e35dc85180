use crate::traits::LineId;
use serde::Deserialize;
use std::collections::HashMap;

/// Symbolic line names mapped to line ids, split by direction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineMap {
    #[serde(default)]
    pub inputs: HashMap<String, LineId>,
    #[serde(default)]
    pub outputs: HashMap<String, LineId>,
}

impl LineMap {
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Resolve a name across both tables.
    pub fn id(&self, name: &str) -> Option<LineId> {
        self.inputs
            .get(name)
            .or_else(|| self.outputs.get(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_tables() {
        let toml = r#"
[inputs]
start_button = 2
stop_button = 3

[outputs]
status_led = 0
"#;
        let map = LineMap::from_toml(toml).unwrap();
        assert_eq!(map.id("start_button"), Some(2));
        assert_eq!(map.id("status_led"), Some(0));
        assert_eq!(map.id("missing"), None);
    }

    #[test]
    fn empty_tables_are_fine() {
        let map = LineMap::from_toml("").unwrap();
        assert!(map.inputs.is_empty());
        assert!(map.outputs.is_empty());
    }
}
