use super::equations::{CellFlowProperties, cell_main_direction, total_kh, well_bore_transmissibility};
use super::{cell_flow_properties, retain_exportable};
use crate::common::constants::DARCY_METRIC;
use crate::domain::{CellAddress, CompletionData, CompletionType, ComputeResult};
use crate::model::completions::{Completion, FishbonesSubs};
use crate::model::fishbones_geometry::lateral_trajectories;
use crate::modules::export::ExportContext;
use crate::modules::intersection::{find_cell_intersections, find_intersections_in_range};
use crate::modules::traits::{CompletionGenerator, WellCompletionRequest};
use crate::numerics::Vec3;
use std::collections::HashMap;

/// Fishbone laterals, and the main bore along the subs unless excluded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FishbonesGenerator;

/// One piece of well bore inside one cell.
#[derive(Debug, Clone)]
struct WellBorePart {
    cell: CellAddress,
    lengths: Vec3,
    well_radius: f64,
    skin: f64,
    is_main_bore: bool,
    md: f64,
    source: String,
}

/// Parts grouped by global cell index in first-seen order.
#[derive(Debug, Default)]
struct PartsPerCell {
    positions: HashMap<usize, usize>,
    cells: Vec<Vec<WellBorePart>>,
}

impl PartsPerCell {
    fn push(&mut self, part: WellBorePart) {
        let next = self.cells.len();
        let position = *self
            .positions
            .entry(part.cell.global_cell_index)
            .or_insert(next);
        if position == next {
            self.cells.push(Vec::new());
        }
        self.cells[position].push(part);
    }
}

impl CompletionGenerator for FishbonesGenerator {
    fn completion_type(&self) -> CompletionType {
        CompletionType::Fishbones
    }

    fn generate(
        &self,
        request: &WellCompletionRequest<'_>,
        context: &mut ExportContext<'_>,
    ) -> ComputeResult<Vec<CompletionData>> {
        let include_main_bore = !context.settings.exclude_main_bore_for_fishbones;
        let use_lateral_ntg = context.settings.use_lateral_ntg;

        let mut parts = PartsPerCell::default();
        for fishbones in request.completions.iter().filter_map(|completion| match completion {
            Completion::Fishbones(fishbones) if fishbones.enabled => Some(fishbones),
            _ => None,
        }) {
            collect_lateral_parts(request, fishbones, &mut parts)?;
            if include_main_bore {
                collect_main_bore_parts(request, fishbones, &mut parts);
            }
        }

        let mut completions = Vec::new();
        for cell_parts in &parts.cells {
            let Some(properties) = cell_parts
                .first()
                .and_then(|part| cell_flow_properties(request.grid, part.cell.global_cell_index))
            else {
                continue;
            };
            for part in cell_parts {
                completions.push(part_completion(
                    request.well_name,
                    part,
                    &properties,
                    cell_parts.len(),
                    use_lateral_ntg,
                ));
            }
        }

        retain_exportable(
            &mut completions,
            context.settings.include_zero_transmissibility_connections,
            &mut context.log,
        );
        tracing::debug!(
            well = request.well_name,
            count = completions.len(),
            "fishbones connections"
        );
        Ok(completions)
    }
}

fn collect_lateral_parts(
    request: &WellCompletionRequest<'_>,
    fishbones: &FishbonesSubs,
    parts: &mut PartsPerCell,
) -> ComputeResult<()> {
    for lateral in lateral_trajectories(fishbones, request.geometry)? {
        let intersections = find_cell_intersections(
            request.grid,
            lateral.geometry.points(),
            lateral.geometry.measured_depths(),
        );
        for intersection in intersections {
            parts.push(WellBorePart {
                cell: intersection.cell.clone(),
                lengths: intersection.lengths_in_cell,
                well_radius: 0.5 * fishbones.hole_diameter,
                skin: fishbones.skin_factor,
                is_main_bore: false,
                md: intersection.start_md,
                source: format!(
                    "{}: Sub: {} Lateral: {}",
                    fishbones.name,
                    lateral.sub_index + 1,
                    lateral.lateral_index + 1
                ),
            });
        }
    }
    Ok(())
}

fn collect_main_bore_parts(
    request: &WellCompletionRequest<'_>,
    fishbones: &FishbonesSubs,
    parts: &mut PartsPerCell,
) {
    let (Some(start_md), Some(end_md)) = (fishbones.start_md(), fishbones.end_md()) else {
        return;
    };
    for intersection in find_intersections_in_range(request.grid, request.geometry, start_md, end_md)
    {
        parts.push(WellBorePart {
            cell: intersection.cell.clone(),
            lengths: intersection.lengths_in_cell,
            well_radius: 0.5 * fishbones.main_bore_diameter,
            skin: fishbones.main_bore_skin_factor,
            is_main_bore: true,
            md: intersection.start_md,
            source: format!("{}: Main bore", fishbones.name),
        });
    }
}

/// The cell is shared between `part_count` bore parts, so each part sees
/// the cell size along its main direction divided by that count.
fn part_completion(
    well_name: &str,
    part: &WellBorePart,
    properties: &CellFlowProperties,
    part_count: usize,
    use_lateral_ntg: bool,
) -> CompletionData {
    let direction = cell_main_direction(properties.dimensions, part.lengths);
    let mut adjusted = *properties;
    adjusted.dimensions[direction.axis()] /= part_count.max(1) as f64;

    let transmissibility = well_bore_transmissibility(
        &adjusted,
        part.lengths,
        use_lateral_ntg,
        part.well_radius,
        part.skin,
        DARCY_METRIC,
    );
    let mut completion = CompletionData::new(
        well_name,
        part.cell.clone(),
        CompletionType::Fishbones,
        part.md,
    );
    completion.set_transmissibility_data(
        transmissibility,
        total_kh(&adjusted, part.lengths, use_lateral_ntg),
        part.skin,
        2.0 * part.well_radius,
        direction,
    );
    completion.is_main_bore = part.is_main_bore;
    completion.add_metadata(
        "Fishbones",
        format!("{} Transmissibility: {:.4E}", part.source, transmissibility),
    );
    completion
}
