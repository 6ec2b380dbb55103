use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tmd_core::errors::{ErrorInfo, TmdError};

/// Beam-energy configuration selecting which amplitude table to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyConfig {
    /// Built-in single-cell table with zero amplitude.
    Default,
    /// Debug table used during development.
    Debug,
    /// 5 GeV electrons on 41 GeV protons.
    E5x41,
    /// 10 GeV electrons on 100 GeV protons.
    E10x100,
    /// 18 GeV electrons on 275 GeV protons.
    E18x275,
}

impl EnergyConfig {
    /// Identifier as written on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyConfig::Default => "default",
            EnergyConfig::Debug => "0x0",
            EnergyConfig::E5x41 => "5x41",
            EnergyConfig::E10x100 => "10x100",
            EnergyConfig::E18x275 => "18x275",
        }
    }

    /// Table file name relative to the tables directory; `None` for the built-in table.
    pub fn table_file(&self) -> Option<&'static str> {
        match self {
            EnergyConfig::Default => None,
            EnergyConfig::Debug => Some("AUT_0x0_XQZPhPerp.txt"),
            EnergyConfig::E5x41 => Some("AUT_average_PV20_EPIC_piplus_sqrts=28.636.txt"),
            EnergyConfig::E10x100 => Some("AUT_average_PV20_EPIC_piplus_sqrts=63.246.txt"),
            EnergyConfig::E18x275 => Some("AUT_average_PV20_EPIC_piplus_sqrts=140.712.txt"),
        }
    }

    /// Resolves the table path under `tables_dir`.
    pub fn table_path(&self, tables_dir: &Path) -> Option<PathBuf> {
        self.table_file().map(|file| tables_dir.join(file))
    }
}

impl fmt::Display for EnergyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergyConfig {
    type Err = TmdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(EnergyConfig::Default),
            "0x0" => Ok(EnergyConfig::Debug),
            "5x41" => Ok(EnergyConfig::E5x41),
            "10x100" => Ok(EnergyConfig::E10x100),
            "18x275" => Ok(EnergyConfig::E18x275),
            other => Err(TmdError::Config(
                ErrorInfo::new(
                    "unknown-energy",
                    format!("unknown energy configuration: {other}"),
                )
                .with_hint("expected one of default, 0x0, 5x41, 10x100, 18x275"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_roundtrip() {
        for config in [
            EnergyConfig::Default,
            EnergyConfig::Debug,
            EnergyConfig::E5x41,
            EnergyConfig::E10x100,
            EnergyConfig::E18x275,
        ] {
            assert_eq!(config.as_str().parse::<EnergyConfig>().unwrap(), config);
        }
        assert_eq!(
            "7x7".parse::<EnergyConfig>().unwrap_err().info().code,
            "unknown-energy"
        );
        assert!(EnergyConfig::Default.table_path(Path::new("tables")).is_none());
    }
}
