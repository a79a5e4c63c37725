//! Manufacturing lifecycle states reported by the node manufacturing registry

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MfgStatus {
    LabelGenerated,
    UnderAssembly,
    AssemblyCompleted,
    ModuleTest,
    ProductionTestFailed,
    ProductionTestCompleted,
    NodeInTransit,
}

impl MfgStatus {
    pub const ALL: [MfgStatus; 7] = [
        Self::LabelGenerated,
        Self::UnderAssembly,
        Self::AssemblyCompleted,
        Self::ModuleTest,
        Self::ProductionTestFailed,
        Self::ProductionTestCompleted,
        Self::NodeInTransit,
    ];

    /// Human readable label, as NMR reports it
    pub fn label(&self) -> &'static str {
        match self {
            Self::LabelGenerated => "label generated",
            Self::UnderAssembly => "under assembly",
            Self::AssemblyCompleted => "assembly completed",
            Self::ModuleTest => "under module test",
            Self::ProductionTestFailed => "production test failed",
            Self::ProductionTestCompleted => "production test completed",
            Self::NodeInTransit => "node in transit to org",
        }
    }

    /// Symbolic name used by the factory tooling
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LabelGenerated => "StatusLabelGenerated",
            Self::UnderAssembly => "StatusUnderAssembly",
            Self::AssemblyCompleted => "StatusAssemblyCompleted",
            Self::ModuleTest => "StatusModuleTest",
            Self::ProductionTestFailed => "StatusProductionTestFail",
            Self::ProductionTestCompleted => "StatusProductionTestCompleted",
            Self::NodeInTransit => "StatusNodeIntransit",
        }
    }
}

impl Default for MfgStatus {
    fn default() -> Self {
        Self::NodeInTransit
    }
}

impl fmt::Display for MfgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MfgStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(s) || status.symbol().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown manufacturing status: {}", s))
    }
}

impl Serialize for MfgStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MfgStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
