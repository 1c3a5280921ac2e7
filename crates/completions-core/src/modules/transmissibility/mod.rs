//! Connection factors for perforations, fishbones and fractures.

pub mod condenser;
pub mod equations;
pub mod fishbones;
pub mod fracture;
pub mod perforation;

use crate::domain::CompletionData;
use crate::model::grid::GridProvider;
use crate::modules::export::ExportLog;
use equations::CellFlowProperties;

pub use fishbones::FishbonesGenerator;
pub use fracture::FractureGenerator;
pub use perforation::PerforationGenerator;

pub fn cell_flow_properties(grid: &dyn GridProvider, cell: usize) -> Option<CellFlowProperties> {
    Some(CellFlowProperties {
        dimensions: grid.cell_dimensions(cell)?,
        permeability: grid.permeability(cell),
        net_to_gross: grid.net_to_gross(cell),
    })
}

/// Drops records the simulator cannot use. Non-finite factors are always
/// dropped with an error; zero factors unless `keep_zero` is set.
pub(crate) fn retain_exportable(
    completions: &mut Vec<CompletionData>,
    keep_zero: bool,
    log: &mut ExportLog,
) {
    completions.retain(|completion| {
        if !completion.transmissibility.is_finite() {
            log.error(
                "COMPLETION.NON_FINITE",
                format!(
                    "Invalid transmissibility for well '{}' in cell {:?}; connection not exported",
                    completion.well_name,
                    completion.cell.one_based_ijk()
                ),
            );
            return false;
        }
        keep_zero || completion.transmissibility > 0.0
    });
}
