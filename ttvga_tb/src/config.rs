//! Testbench configuration.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! { "testcases": ["reset_low.test_basic_waveform_dump"], "waves_dir": "sim_build" }
//! ```
//!
//! Command line flags are applied on top of the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TtvgaTbResult;

mod defaults {
    pub const TOPLEVEL: &str = "tt_um_vga";
    pub const RECORD_WAVES: bool = true;
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TbConfig {
    /// Module name written to the waveform scope.
    pub toplevel: String,
    /// Scenarios to run, by full name or test name. Empty runs all of them.
    pub testcases: Vec<String>,
    /// Directory receiving one VCD file per scenario.
    pub waves_dir: Option<PathBuf>,
    pub record_waves: bool,
    /// Compiled DUT to simulate instead of the behavioural model.
    pub dut_library: Option<PathBuf>,
}

impl Default for TbConfig {
    fn default() -> Self {
        Self {
            toplevel: defaults::TOPLEVEL.to_string(),
            testcases: vec![],
            waves_dir: None,
            record_waves: defaults::RECORD_WAVES,
            dut_library: None,
        }
    }
}

impl TbConfig {
    pub fn from_json(json: &str) -> TtvgaTbResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> TtvgaTbResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Waveforms are written only when recorded and given a directory.
    pub fn waveform_path(&self, scenario_name: &str) -> Option<PathBuf> {
        if !self.record_waves {
            return None;
        }
        let file_name = format!("{}.vcd", scenario_name.replace(['.', '/'], "_"));
        self.waves_dir.as_ref().map(|dir| dir.join(file_name))
    }
}
