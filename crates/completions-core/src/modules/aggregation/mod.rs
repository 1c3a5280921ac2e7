//! Per-cell combination of the completion records of one well.

use crate::common::constants::DARCY_METRIC;
use crate::domain::{CombinationMode, CompdatExportType, CompletionData, CompletionType};
use crate::model::grid::GridProvider;
use crate::modules::export::ExportLog;
use crate::modules::transmissibility::cell_flow_properties;
use crate::modules::transmissibility::equations::transmissibility_as_simulator_does;
use crate::numerics::{stable_sum, stable_weighted_mean};
use std::collections::HashMap;

/// Output order of the groups when completion types are kept apart.
const INDIVIDUAL_GROUP_ORDER: [CompletionType; 3] = [
    CompletionType::Fracture,
    CompletionType::Fishbones,
    CompletionType::Perforation,
];

/// Records keyed by global cell index, in first-insertion order.
#[derive(Debug, Default)]
struct CellGroups {
    positions: HashMap<usize, usize>,
    groups: Vec<Vec<CompletionData>>,
}

impl CellGroups {
    fn push(&mut self, completion: CompletionData) {
        let next = self.groups.len();
        let position = *self
            .positions
            .entry(completion.global_cell_index())
            .or_insert(next);
        if position == next {
            self.groups.push(Vec::new());
        }
        self.groups[position].push(completion);
    }
}

/// Combines `completions` (in creation order: perforations, fishbones,
/// fractures) into one record per cell, or per cell and type.
pub fn aggregate_well_completions(
    completions: Vec<CompletionData>,
    mode: CombinationMode,
    export_type: CompdatExportType,
    grid: &dyn GridProvider,
    log: &mut ExportLog,
) -> Vec<CompletionData> {
    let mut partitions: Vec<CellGroups> = match mode {
        CombinationMode::Combined => vec![CellGroups::default()],
        CombinationMode::Individually => INDIVIDUAL_GROUP_ORDER
            .iter()
            .map(|_| CellGroups::default())
            .collect(),
    };
    for completion in completions {
        let partition = match mode {
            CombinationMode::Combined => 0,
            CombinationMode::Individually => INDIVIDUAL_GROUP_ORDER
                .iter()
                .position(|kind| *kind == completion.completion_type)
                .unwrap_or(0),
        };
        partitions[partition].push(completion);
    }

    let mut combined = Vec::new();
    for partition in partitions {
        for group in partition.groups {
            if let Some(completion) = combine_cell_completions(group, export_type, grid, log) {
                combined.push(completion);
            }
        }
    }
    combined
}

/// Merges records for one cell. Skin, diameter, kh, direction, type and
/// ordering come from the first record; transmissibilities add.
pub fn combine_cell_completions(
    group: Vec<CompletionData>,
    export_type: CompdatExportType,
    grid: &dyn GridProvider,
    log: &mut ExportLog,
) -> Option<CompletionData> {
    let mut iter = group.iter();
    let mut combined = iter.next()?.clone();

    if group.len() > 1 {
        if is_suspicious_duplicate(&group) {
            log.warning(
                "AGGREGATION.DUPLICATE",
                format!(
                    "Found {} completions for well '{}' in cell {:?}; they are combined into one connection",
                    group.len(),
                    combined.well_name,
                    combined.cell.one_based_ijk()
                ),
            );
        }
        let transmissibilities: Vec<f64> =
            group.iter().map(|completion| completion.transmissibility).collect();
        combined.transmissibility = stable_sum(&transmissibilities);
        combined.contribution_count = group
            .iter()
            .map(|completion| completion.contribution_count)
            .sum();
        combined.is_main_bore = group.iter().any(|completion| completion.is_main_bore);
        combined.metadata = group
            .iter()
            .flat_map(|completion| completion.metadata.iter().cloned())
            .collect();
        combined.d_factor = if group.iter().any(|completion| completion.d_factor.is_some()) {
            let d_factors: Vec<f64> = group
                .iter()
                .map(|completion| completion.d_factor.unwrap_or(0.0))
                .collect();
            stable_weighted_mean(&d_factors, &transmissibilities)
                .map(|mean| mean / group.len() as f64)
        } else {
            None
        };
    }

    if !combined.transmissibility.is_finite() {
        log.error(
            "AGGREGATION.NON_FINITE",
            format!(
                "Invalid transmissibility for well '{}' in cell {:?}; connection not exported",
                combined.well_name,
                combined.cell.one_based_ijk()
            ),
        );
        return None;
    }

    if export_type == CompdatExportType::WpimultAndDefaultConnectionFactors {
        combined.wpimult = wpimult(&combined, grid);
        if combined.wpimult.is_none() {
            log.warning(
                "AGGREGATION.WPIMULT",
                format!(
                    "Could not compute WPIMULT for well '{}' in cell {:?}",
                    combined.well_name,
                    combined.cell.one_based_ijk()
                ),
            );
        }
    }
    Some(combined)
}

/// Several fishbone parts or fracture cells in one cell are expected;
/// anything else merged into one cell is reported.
fn is_suspicious_duplicate(group: &[CompletionData]) -> bool {
    let first_type = group[0].completion_type;
    first_type == CompletionType::Perforation
        || group
            .iter()
            .any(|completion| completion.completion_type != first_type)
}

/// Ratio of the computed factor to the one the simulator derives itself for
/// a full-cell penetration along the main direction.
fn wpimult(completion: &CompletionData, grid: &dyn GridProvider) -> Option<f64> {
    let properties = cell_flow_properties(grid, completion.global_cell_index())?;
    let reference = transmissibility_as_simulator_does(
        &properties,
        completion.direction,
        0.5 * completion.diameter,
        completion.skin,
        DARCY_METRIC,
    );
    let ratio = completion.transmissibility / reference;
    (reference > 0.0 && ratio.is_finite()).then_some(ratio)
}
