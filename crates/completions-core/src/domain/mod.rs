pub mod completion_data;
pub mod errors;
pub mod settings;

pub use completion_data::{CellAddress, CompletionData, CompletionMetadata};
pub use errors::{
    CompletionError, CompletionResult, ComputeResult, ErrorCategory, ExitPlaceholder,
};
pub use settings::{CombinationMode, CompdatExportType, ExportSettings, FileSplit};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Field,
}

impl UnitSystem {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "METRIC",
            Self::Field => "FIELD",
        }
    }
}

impl Display for UnitSystem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Completion kinds in the order files and tables are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompletionType {
    Fishbones,
    Fracture,
    Perforation,
}

impl CompletionType {
    pub const ALL: [CompletionType; 3] = [Self::Fishbones, Self::Fracture, Self::Perforation];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fishbones => "Fishbones",
            Self::Fracture => "Fracture",
            Self::Perforation => "Perforation",
        }
    }

    pub const fn table_heading(self) -> &'static str {
        match self {
            Self::Fishbones => "FISHBONES",
            Self::Fracture => "FRACTURE",
            Self::Perforation => "PERFORATION",
        }
    }
}

impl Display for CompletionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellDirection {
    I,
    J,
    K,
}

impl CellDirection {
    pub const fn axis(self) -> usize {
        match self {
            Self::I => 0,
            Self::J => 1,
            Self::K => 2,
        }
    }

    pub const fn from_axis(axis: usize) -> Self {
        match axis {
            0 => Self::I,
            1 => Self::J,
            _ => Self::K,
        }
    }

    /// Penetration direction as written in the COMPDAT DIR column.
    pub const fn compdat_token(self) -> &'static str {
        match self {
            Self::I => "'X'",
            Self::J => "'Y'",
            Self::K => "'Z'",
        }
    }
}
