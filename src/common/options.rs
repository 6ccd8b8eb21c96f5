use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

// Encode options
//------------------------------------------------------------------------------

/// Host-supplied encode configuration.
///
/// Every field is optional. Unset fields keep the sentinel defaults below, and nothing is
/// clamped here: range checks belong to [`validate`](crate::builder::validate::validate).
///
/// | Field           | Default   | Valid range                                  |
/// |-----------------|-----------|----------------------------------------------|
/// | color_number    | 8         | 4 or 8                                       |
/// | module_size     | 12        | >= 0, 0 keeps the codec default              |
/// | symbol_width    | 0 (auto)  | >= 0, master symbol width in pixels          |
/// | symbol_height   | 0 (auto)  | >= 0, master symbol height in pixels         |
/// | symbol_number   | 1         | 1-61                                         |
/// | ecc_levels      | empty     | each 0-10, at most one per symbol            |
/// | symbol_versions | empty     | each component 1-32, at most one per symbol  |
/// | symbol_positions| empty     | each 0-60, one per symbol for multi-symbol   |
/// | color_space     | 0         | 0 (RGB, PNG) or 1 (CMYK, TIFF)               |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncodeOptions {
    pub color_number: i32,
    pub module_size: i32,
    pub symbol_width: i32,
    pub symbol_height: i32,
    pub symbol_number: i32,
    pub ecc_levels: Vec<i32>,
    pub symbol_versions: Vec<(i32, i32)>,
    pub symbol_positions: Vec<i32>,
    pub color_space: i32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            color_number: 8,
            module_size: 12,
            symbol_width: 0,
            symbol_height: 0,
            symbol_number: 1,
            ecc_levels: Vec::new(),
            symbol_versions: Vec::new(),
            symbol_positions: Vec::new(),
            color_space: 0,
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON. Omitted keys keep their defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        serde_json::to_string(self).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    pub fn color_number(&mut self, color_number: i32) -> &mut Self {
        self.color_number = color_number;
        self
    }

    pub fn module_size(&mut self, module_size: i32) -> &mut Self {
        self.module_size = module_size;
        self
    }

    pub fn symbol_width(&mut self, symbol_width: i32) -> &mut Self {
        self.symbol_width = symbol_width;
        self
    }

    pub fn symbol_height(&mut self, symbol_height: i32) -> &mut Self {
        self.symbol_height = symbol_height;
        self
    }

    pub fn symbol_number(&mut self, symbol_number: i32) -> &mut Self {
        self.symbol_number = symbol_number;
        self
    }

    pub fn ecc_levels(&mut self, ecc_levels: &[i32]) -> &mut Self {
        self.ecc_levels = ecc_levels.to_vec();
        self
    }

    pub fn symbol_versions(&mut self, symbol_versions: &[(i32, i32)]) -> &mut Self {
        self.symbol_versions = symbol_versions.to_vec();
        self
    }

    pub fn symbol_positions(&mut self, symbol_positions: &[i32]) -> &mut Self {
        self.symbol_positions = symbol_positions.to_vec();
        self
    }

    pub fn color_space(&mut self, color_space: i32) -> &mut Self {
        self.color_space = color_space;
        self
    }
}

/// Pairs up versions given in flat form: `x0 y0 x1 y1 ...`
pub fn versions_from_flat(flat: &[i32]) -> ConfigResult<Vec<(i32, i32)>> {
    if flat.len() % 2 != 0 {
        return Err(ConfigError::UnpairedVersions(flat.len()));
    }
    Ok(flat.chunks_exact(2).map(|p| (p[0], p[1])).collect())
}
