use std::collections::HashMap;

use crate::error::PresetError;

use super::definition::PresetDefinition;

/// Presets by name, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: Vec<PresetDefinition>,
    by_name: HashMap<String, usize>,
}

impl PresetRegistry {
    pub fn new(presets: Vec<PresetDefinition>) -> Result<Self, PresetError> {
        let mut by_name = HashMap::with_capacity(presets.len());
        for (index, preset) in presets.iter().enumerate() {
            if preset.runs.is_empty() {
                return Err(PresetError::EmptyPreset(preset.name.clone()));
            }
            if by_name.insert(preset.name.clone(), index).is_some() {
                return Err(PresetError::DuplicatePreset(preset.name.clone()));
            }
        }
        Ok(Self { presets, by_name })
    }

    pub fn get(&self, name: &str) -> Result<&PresetDefinition, PresetError> {
        self.by_name
            .get(name)
            .map(|index| &self.presets[*index])
            .ok_or_else(|| PresetError::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PresetDefinition> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
