use super::model::{
    MswCellConnection, MswCompletion, MswCompletionKind, MswExportInfo, MswSegment,
    MswSubSegment, ValveParameters,
};
use crate::common::constants::{ICD_VALVE_SEGMENT_LENGTH, MIN_INTERSECTION_LENGTH};
use crate::domain::ComputeResult;
use crate::model::completions::{Completion, FishbonesSubs, FractureOrientation};
use crate::model::fishbones_geometry::{LateralTrajectory, lateral_trajectories};
use crate::model::fracture_template::FractureTemplate;
use crate::model::grid::GridProvider;
use crate::model::well_path::{WellPath, WellPathGeometry};
use crate::modules::export::ExportLog;
use crate::modules::intersection::{
    find_cell_intersections, find_intersections_in_range, split_to_max_length,
};
use crate::modules::transmissibility::fracture::fracture_connections;
use crate::modules::traits::WellCompletionRequest;

const MAIN_STEM_LABEL: &str = "Main stem";

fn export_info(well: &WellPath) -> ComputeResult<MswExportInfo> {
    well.msw.validate(&well.name)?;
    let geometry = &well.geometry;
    let top_md = well
        .msw
        .reference_md
        .unwrap_or_else(|| geometry.start_md())
        .clamp(geometry.start_md(), geometry.end_md());
    let mut info = MswExportInfo::new(well.well_name_for_export(), top_md, geometry.tvd_at_md(top_md));
    info.top_well_bore_volume = well.msw.top_well_bore_volume;
    info.liner_diameter = well.msw.liner_diameter;
    info.roughness_factor = well.msw.roughness_factor;
    info.length_and_depth = well.msw.length_and_depth;
    info.pressure_drop = well.msw.pressure_drop;
    Ok(info)
}

/// `[start_md, end_md]` cut into `trunc(length / max_length) + 1` equal pieces.
fn main_stem_pieces(
    geometry: &WellPathGeometry,
    start_md: f64,
    end_md: f64,
    max_length: f64,
) -> Vec<MswSegment> {
    let length = end_md - start_md;
    if length <= MIN_INTERSECTION_LENGTH {
        return Vec::new();
    }
    let count = if max_length > 0.0 {
        (length / max_length).trunc() as usize + 1
    } else {
        1
    };
    (0..count)
        .map(|piece| {
            let start = start_md + length * piece as f64 / count as f64;
            let end = start_md + length * (piece + 1) as f64 / count as f64;
            MswSegment::new(
                MAIN_STEM_LABEL,
                start,
                end,
                geometry.tvd_at_md(start),
                geometry.tvd_at_md(end),
            )
        })
        .collect()
}

/// Main stem following the grid cells from `top_md` to `end_md`, contiguous
/// in MD even across inactive cells.
fn main_stem_along_cells(
    grid: &dyn GridProvider,
    geometry: &WellPathGeometry,
    top_md: f64,
    end_md: f64,
    max_length: f64,
) -> Vec<MswSegment> {
    let intersections = find_intersections_in_range(grid, geometry, top_md, end_md);
    let mut previous_end = top_md;
    let mut segments = Vec::new();
    for piece in split_to_max_length(&intersections, max_length) {
        if piece.end_md - previous_end <= MIN_INTERSECTION_LENGTH {
            continue;
        }
        segments.push(MswSegment::new(
            MAIN_STEM_LABEL,
            previous_end,
            piece.end_md,
            geometry.tvd_at_md(previous_end),
            piece.end_tvd(),
        ));
        previous_end = piece.end_md;
    }
    segments
}

fn segment_index_for_md(segments: &[MswSegment], md: f64) -> Option<usize> {
    let last = segments.len().checked_sub(1)?;
    Some(
        segments
            .iter()
            .position(|segment| segment.contains_md(md))
            .unwrap_or(if md >= segments[last].end_md { last } else { 0 }),
    )
}

fn cell_connections(
    grid: &dyn GridProvider,
    geometry: &WellPathGeometry,
    start_md: f64,
    end_md: f64,
) -> Vec<MswCellConnection> {
    if end_md <= start_md {
        return Vec::new();
    }
    find_intersections_in_range(grid, geometry, start_md, end_md)
        .iter()
        .map(MswCellConnection::from)
        .collect()
}

fn valve_completion(
    kind: MswCompletionKind,
    label: String,
    geometry: &WellPathGeometry,
    md: f64,
    info: &MswExportInfo,
    valve: ValveParameters,
) -> MswCompletion {
    let tvd = geometry.tvd_at_md(md);
    let mut completion = MswCompletion::new(kind, label, info.liner_diameter, info.roughness_factor);
    completion
        .sub_segments
        .push(MswSubSegment::new(md, md + ICD_VALVE_SEGMENT_LENGTH, tvd, tvd));
    completion.valve = Some(valve);
    completion
}

fn lateral_completion(
    grid: &dyn GridProvider,
    fishbones: &FishbonesSubs,
    lateral: &LateralTrajectory,
) -> MswCompletion {
    let mut completion = MswCompletion::new(
        MswCompletionKind::Fishbones,
        format!(
            "{}: Sub {} Lateral {}",
            fishbones.name,
            lateral.sub_index + 1,
            lateral.lateral_index + 1
        ),
        fishbones.lateral_tubing_diameter,
        fishbones.open_hole_roughness,
    );
    let intersections = find_cell_intersections(
        grid,
        lateral.geometry.points(),
        lateral.geometry.measured_depths(),
    );
    for intersection in &intersections {
        let mut sub_segment = MswSubSegment::new(
            intersection.start_md,
            intersection.end_md,
            intersection.start_tvd(),
            intersection.end_tvd(),
        );
        sub_segment.connections.push(MswCellConnection::from(intersection));
        completion.sub_segments.push(sub_segment);
    }
    completion
}

/// Main stem from the top down to each fishbone sub, with the sub's ICD and
/// laterals on the segment ending at the sub.
pub fn build_fishbones_msw(
    grid: &dyn GridProvider,
    well: &WellPath,
    exclude_main_bore: bool,
    log: &mut ExportLog,
) -> ComputeResult<Option<MswExportInfo>> {
    let fishbones: Vec<&FishbonesSubs> = well
        .completions
        .iter()
        .filter_map(|completion| match completion {
            Completion::Fishbones(fishbones) if fishbones.enabled => Some(fishbones),
            _ => None,
        })
        .collect();
    let mut subs: Vec<(f64, usize, usize)> = fishbones
        .iter()
        .enumerate()
        .flat_map(|(owner, fishbones)| {
            fishbones
                .sub_measured_depths
                .iter()
                .enumerate()
                .map(move |(sub_index, md)| (*md, owner, sub_index))
        })
        .collect();
    if subs.is_empty() {
        return Ok(None);
    }
    subs.sort_by(|lhs, rhs| lhs.0.total_cmp(&rhs.0));

    let laterals: Vec<Vec<LateralTrajectory>> = fishbones
        .iter()
        .map(|fishbones| lateral_trajectories(fishbones, &well.geometry))
        .collect::<ComputeResult<_>>()?;

    let mut info = export_info(well)?;
    let geometry = &well.geometry;
    let mut segments: Vec<MswSegment> = Vec::new();
    let mut previous_md = info.top_md;

    for (md, owner, sub_index) in subs.iter().copied() {
        if md > previous_md {
            segments.extend(main_stem_pieces(
                geometry,
                previous_md,
                md,
                well.msw.max_segment_length,
            ));
            previous_md = md;
        }
        if segments.is_empty() {
            let tvd = geometry.tvd_at_md(md);
            segments.push(MswSegment::new(MAIN_STEM_LABEL, md, md, tvd, tvd));
        }
        let Some(segment) = segments.last_mut() else {
            continue;
        };

        let sub = fishbones[owner];
        if sub.icd_count > 0 {
            segment.completions.push(valve_completion(
                MswCompletionKind::FishbonesIcd,
                format!("{}: Sub {} ICD", sub.name, sub_index + 1),
                geometry,
                md,
                &info,
                ValveParameters {
                    flow_coefficient: sub.icd_flow_coefficient,
                    area: sub.icd_area(),
                },
            ));
        }
        for lateral in laterals[owner]
            .iter()
            .filter(|lateral| lateral.sub_index == sub_index)
        {
            segment
                .completions
                .push(lateral_completion(grid, sub, lateral));
        }
    }

    if !exclude_main_bore {
        let first_sub = subs[0].0;
        let last_sub = subs[subs.len() - 1].0;
        for segment in &mut segments {
            segment.connections = cell_connections(
                grid,
                geometry,
                segment.start_md.max(first_sub),
                segment.end_md.min(last_sub),
            );
        }
    }

    for segment in segments {
        info.add_segment(segment)?;
    }
    info.number_segments(log)?;
    Ok(Some(info))
}

/// Main stem along the grid cells; each fracture hangs off the segment
/// holding its start.
pub fn build_fractures_msw(
    grid: &dyn GridProvider,
    well: &WellPath,
    templates: &[FractureTemplate],
    log: &mut ExportLog,
) -> ComputeResult<Option<MswExportInfo>> {
    let fractures: Vec<_> = well
        .completions
        .iter()
        .filter_map(|completion| match completion {
            Completion::Fracture(fracture) if fracture.enabled => Some(fracture),
            _ => None,
        })
        .collect();
    if fractures.is_empty() {
        return Ok(None);
    }

    let mut info = export_info(well)?;
    let geometry = &well.geometry;
    let mut segments = main_stem_along_cells(
        grid,
        geometry,
        info.top_md,
        geometry.end_md(),
        well.msw.max_segment_length,
    );
    if segments.is_empty() {
        log.warning(
            "MSW.NO_MAIN_STEM",
            format!(
                "Well '{}' does not pass through active cells; no fracture MSW data exported",
                info.well_name
            ),
        );
        return Ok(None);
    }

    let request = WellCompletionRequest::for_well_path(grid, well, templates);
    for fracture in fractures {
        let Some(template) = templates
            .iter()
            .find(|template| template.name == fracture.template)
        else {
            log.warning(
                "MSW.FRACTURE_TEMPLATE",
                format!(
                    "Fracture '{}' has no template and is left out of the MSW export",
                    fracture.name
                ),
            );
            continue;
        };
        let start_md = match fracture.orientation {
            FractureOrientation::AlongWellPath => {
                fracture.measured_depth - 0.5 * template.perforation_length
            }
            _ => fracture.measured_depth,
        };
        let Some(index) = segment_index_for_md(&segments, start_md) else {
            continue;
        };
        let connections = match fracture_connections(&request, fracture, template) {
            Ok(connections) => connections,
            Err(error) => {
                log.error(
                    "MSW.FRACTURE_CONNECTIONS",
                    format!("Fracture '{}' could not be condensed: {error}", fracture.name),
                );
                continue;
            }
        };

        let md = fracture.measured_depth;
        let tvd = geometry.tvd_at_md(md);
        let width = template.width();
        let mut sub_segment = MswSubSegment::new(md, md + width, tvd, tvd);
        sub_segment.connections = connections
            .into_iter()
            .map(|completion| MswCellConnection {
                cell: completion.cell,
                start_md: md,
                end_md: md + width,
            })
            .collect();
        let mut completion = MswCompletion::new(
            MswCompletionKind::Fracture,
            fracture.name.clone(),
            info.liner_diameter,
            info.roughness_factor,
        );
        completion.sub_segments.push(sub_segment);
        segments[index].completions.push(completion);
    }

    for segment in segments {
        info.add_segment(segment)?;
    }
    info.number_segments(log)?;
    Ok(Some(info))
}

/// Main stem down to the deepest open perforation, with perforated cells
/// connected on the main stem and ICD valves on their segments.
pub fn build_perforations_msw(
    grid: &dyn GridProvider,
    well: &WellPath,
    time_step: usize,
    log: &mut ExportLog,
) -> ComputeResult<Option<MswExportInfo>> {
    let intervals: Vec<_> = well
        .completions
        .iter()
        .filter_map(|completion| match completion {
            Completion::Perforation(interval) if interval.is_active_at(time_step) => Some(interval),
            _ => None,
        })
        .collect();
    let Some(deepest) = intervals
        .iter()
        .map(|interval| interval.end_md)
        .reduce(f64::max)
    else {
        return Ok(None);
    };

    let mut info = export_info(well)?;
    let geometry = &well.geometry;
    let mut segments = main_stem_along_cells(
        grid,
        geometry,
        info.top_md,
        deepest,
        well.msw.max_segment_length,
    );
    if segments.is_empty() {
        return Ok(None);
    }

    for segment in &mut segments {
        for interval in &intervals {
            segment.connections.extend(cell_connections(
                grid,
                geometry,
                segment.start_md.max(interval.start_md),
                segment.end_md.min(interval.end_md),
            ));
        }
        segment
            .connections
            .sort_by(|lhs, rhs| lhs.start_md.total_cmp(&rhs.start_md));
    }

    for valve in well.completions.iter().filter_map(|completion| match completion {
        Completion::IcdValve(valve) => Some(valve),
        _ => None,
    }) {
        let Some(index) = segment_index_for_md(&segments, valve.measured_depth) else {
            continue;
        };
        let completion = valve_completion(
            MswCompletionKind::PerforationIcd,
            valve.name.clone(),
            geometry,
            valve.measured_depth,
            &info,
            ValveParameters {
                flow_coefficient: valve.flow_coefficient,
                area: valve.area(),
            },
        );
        segments[index].completions.push(completion);
    }

    for segment in segments {
        info.add_segment(segment)?;
    }
    info.number_segments(log)?;
    Ok(Some(info))
}
