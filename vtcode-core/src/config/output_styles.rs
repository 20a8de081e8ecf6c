// Placeholder module to fix compilation error
// This module should be properly implemented later

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputStyle {
    pub name: String,
    pub content: String,
    pub config: OutputStyleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputStyleConfig {
    pub keep_coding_instructions: bool,
}

#[derive(Debug, Clone)]
pub struct OutputStyleManager {
    styles: HashMap<String, OutputStyle>,
}

impl OutputStyleManager {
    pub fn new() -> Self {
        Self {
            styles: HashMap::new(),
        }
    }

    pub fn load_from_directory(_directory: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new())
    }

    pub fn get_style(&self, name: &str) -> Option<&OutputStyle> {
        self.styles.get(name)
    }

    pub fn list_styles(&self) -> Vec<(String, &OutputStyle)> {
        self.styles.iter().map(|(k, v)| (k.clone(), v)).collect()
    }
}