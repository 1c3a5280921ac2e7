use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileSplit {
    #[default]
    UnifiedFile,
    SplitOnWell,
    SplitOnWellAndCompletionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompdatExportType {
    #[default]
    TransmissibilitiesAndDefaults,
    WpimultAndDefaultConnectionFactors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CombinationMode {
    #[default]
    Individually,
    Combined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub folder: PathBuf,
    pub file_split: FileSplit,
    pub compdat_export: CompdatExportType,
    pub combination_mode: CombinationMode,
    pub include_perforations: bool,
    pub include_fishbones: bool,
    pub include_fractures: bool,
    pub include_msw: bool,
    pub exclude_main_bore_for_fishbones: bool,
    pub use_lateral_ntg: bool,
    pub time_step: usize,
    pub include_zero_transmissibility_connections: bool,
    pub export_welspecs: bool,
    pub export_data_source_as_comment: bool,
    pub include_fracture_debug_info: bool,
    pub custom_file_name: Option<String>,
    /// Glob patterns selecting well paths by name; empty selects every well.
    pub well_filters: Vec<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("."),
            file_split: FileSplit::default(),
            compdat_export: CompdatExportType::default(),
            combination_mode: CombinationMode::default(),
            include_perforations: true,
            include_fishbones: true,
            include_fractures: true,
            include_msw: false,
            exclude_main_bore_for_fishbones: false,
            use_lateral_ntg: false,
            time_step: 0,
            include_zero_transmissibility_connections: false,
            export_welspecs: false,
            export_data_source_as_comment: true,
            include_fracture_debug_info: false,
            custom_file_name: None,
            well_filters: Vec::new(),
        }
    }
}
