use super::{cell_flow_properties, retain_exportable};
use super::condenser::{FractureNetwork, condense_to_well};
use super::equations::{
    CellFlowProperties, center_to_center_transmissibility, fracture_cell_to_well_linear,
    fracture_cell_to_well_radial, fracture_half_cell_transmissibility,
    matrix_to_fracture_transmissibility, total_connection_factor,
};
use crate::common::constants::DARCY_METRIC;
use crate::domain::{CellDirection, CompletionData, CompletionType, ComputeResult};
use crate::model::completions::{Completion, FractureOrientation, WellFracture};
use crate::model::fracture_template::{
    ConductivityType, FractureCell, FractureGrid, FractureTemplate,
};
use crate::model::grid::GridProvider;
use crate::model::well_path::WellPathGeometry;
use crate::modules::export::ExportContext;
use crate::modules::intersection::find_cell_containing_point;
use crate::modules::traits::{CompletionGenerator, WellCompletionRequest};
use crate::numerics::hexahedron;
use crate::numerics::linalg::LuError;
use crate::numerics::{Vec3, add3, cross3, dot3, normalize3, scale3};
use std::collections::HashMap;

/// Summary of one exported fracture, written as a comment block.
#[derive(Debug, Clone, PartialEq)]
pub struct FractureReportItem {
    pub well_name: String,
    pub fracture_name: String,
    pub template_name: String,
    pub transmissibility: f64,
    pub connection_count: usize,
    pub area: f64,
    /// Area-weighted kf·wf, mD·m.
    pub conductivity: f64,
    /// Area-weighted matrix permeability normal to the fracture, mD.
    pub matrix_permeability: f64,
    pub half_length: f64,
    pub height: f64,
}

impl FractureReportItem {
    pub fn dimensionless_conductivity(&self) -> f64 {
        let denominator = self.matrix_permeability * self.half_length;
        if denominator > 0.0 {
            self.conductivity / denominator
        } else {
            0.0
        }
    }
}

/// Fracture plane placed in the reservoir. `u` is horizontal along the
/// plane, `v` points down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FracturePlane {
    pub origin: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub normal: Vec3,
    pub well_tangent: Vec3,
}

impl FracturePlane {
    pub fn new(geometry: &WellPathGeometry, fracture: &WellFracture) -> Self {
        let origin = geometry.point_at_md(fracture.measured_depth);
        let well_tangent = geometry.tangent_at_md(fracture.measured_depth);
        let horizontal = normalize3([well_tangent[0], well_tangent[1], 0.0]);
        let u = match fracture.orientation {
            FractureOrientation::Transverse => horizontal
                .map(|along| [-along[1], along[0], 0.0])
                .unwrap_or([1.0, 0.0, 0.0]),
            FractureOrientation::AlongWellPath => horizontal.unwrap_or([1.0, 0.0, 0.0]),
            FractureOrientation::Azimuth { degrees } => {
                let azimuth = degrees.to_radians();
                [azimuth.sin(), azimuth.cos(), 0.0]
            }
        };
        let v = [0.0, 0.0, -1.0];
        Self {
            origin,
            u,
            v,
            normal: cross3(u, v),
            well_tangent,
        }
    }

    pub fn world_point(&self, plane_point: [f64; 2]) -> Vec3 {
        add3(
            self.origin,
            add3(scale3(self.u, plane_point[0]), scale3(self.v, plane_point[1])),
        )
    }

    /// Cell direction closest to the well at the fracture.
    pub fn well_direction(&self) -> CellDirection {
        let magnitudes = self.well_tangent.map(f64::abs);
        let axis = (0..3)
            .max_by(|lhs, rhs| magnitudes[*lhs].total_cmp(&magnitudes[*rhs]))
            .unwrap_or(2);
        CellDirection::from_axis(axis)
    }
}

/// A fracture cell placed in its host grid cell.
#[derive(Debug, Clone, Copy)]
struct MappedCell {
    host: usize,
    matrix_transmissibility: f64,
    normal_permeability: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FractureGenerator;

impl CompletionGenerator for FractureGenerator {
    fn completion_type(&self) -> CompletionType {
        CompletionType::Fracture
    }

    fn generate(
        &self,
        request: &WellCompletionRequest<'_>,
        context: &mut ExportContext<'_>,
    ) -> ComputeResult<Vec<CompletionData>> {
        let debug = context.settings.include_fracture_debug_info;
        let mut completions = Vec::new();

        for fracture in request.completions.iter().filter_map(|completion| match completion {
            Completion::Fracture(fracture) if fracture.enabled => Some(fracture),
            _ => None,
        }) {
            let Some(template) = request
                .templates
                .iter()
                .find(|template| template.name == fracture.template)
            else {
                context.log.error(
                    "FRACTURE.MISSING_TEMPLATE",
                    format!(
                        "Fracture '{}' on well '{}' refers to unknown template '{}'",
                        fracture.name, request.well_name, fracture.template
                    ),
                );
                continue;
            };
            if let Err(error) = template.validate() {
                context.log.error("FRACTURE.INVALID_TEMPLATE", error.message());
                continue;
            }

            let mut debug_lines = Vec::new();
            let fracture_completions = match fracture_completions(
                request,
                fracture,
                template,
                debug.then_some(&mut debug_lines),
            ) {
                Ok(result) => result,
                Err(error) => {
                    context.log.error(
                        "FRACTURE.CONDENSATION",
                        format!(
                            "Fracture '{}' on well '{}' could not be condensed: {error}",
                            fracture.name, request.well_name
                        ),
                    );
                    continue;
                }
            };

            if fracture_completions.completions.is_empty() {
                context.log.warning(
                    "FRACTURE.NO_CELLS",
                    format!(
                        "Fracture '{}' on well '{}' does not intersect any active cell",
                        fracture.name, request.well_name
                    ),
                );
            }
            context.fracture_report.push(fracture_completions.report);
            context.fracture_debug.extend(debug_lines);
            completions.extend(fracture_completions.completions);
        }

        retain_exportable(
            &mut completions,
            context.settings.include_zero_transmissibility_connections,
            &mut context.log,
        );
        tracing::debug!(
            well = request.well_name,
            count = completions.len(),
            "fracture connections"
        );
        Ok(completions)
    }
}

#[derive(Debug, Clone)]
struct FractureCompletions {
    completions: Vec<CompletionData>,
    report: FractureReportItem,
}

fn fracture_completions(
    request: &WellCompletionRequest<'_>,
    fracture: &WellFracture,
    template: &FractureTemplate,
    mut debug_lines: Option<&mut Vec<String>>,
) -> Result<FractureCompletions, LuError> {
    let plane = FracturePlane::new(request.geometry, fracture);
    let fracture_grid = template.fracture_grid();

    let mapped: Vec<Option<MappedCell>> = fracture_grid
        .cells
        .iter()
        .map(|cell| map_fracture_cell(request.grid, &plane, cell, template.skin_factor))
        .collect();

    if let Some(lines) = debug_lines.as_deref_mut() {
        lines.push(format!(
            "-- Fracture {} on well {} (template {})",
            fracture.name, request.well_name, template.name
        ));
        lines.push("--   I   J   Host(I J K)       Area  Conductivity   MatrixTrans".to_string());
        for (cell, mapped) in fracture_grid.cells.iter().zip(&mapped) {
            let Some(mapped) = mapped else {
                continue;
            };
            let host_ijk = request
                .grid
                .cell_address(mapped.host)
                .map(|address| address.one_based_ijk())
                .unwrap_or([0; 3]);
            lines.push(format!(
                "  {:3} {:3}   {:3} {:3} {:3}   {:10.4} {:12.4} {:14.6E}",
                cell.i + 1,
                cell.j + 1,
                host_ijk[0],
                host_ijk[1],
                host_ijk[2],
                cell.area(),
                cell.conductivity,
                mapped.matrix_transmissibility
            ));
        }
    }

    let per_host = match template.conductivity_type {
        ConductivityType::Infinite => sum_per_host(&mapped),
        ConductivityType::Finite => {
            let network = fracture_network(&fracture_grid, &mapped, template, fracture);
            condense_to_well(&network)?
        }
    };

    let mut completions = Vec::with_capacity(per_host.len());
    for (host, transmissibility) in &per_host {
        let Some(address) = request.grid.cell_address(*host) else {
            continue;
        };
        let mut completion = CompletionData::new(
            request.well_name,
            address,
            CompletionType::Fracture,
            fracture.measured_depth,
        );
        completion.set_transmissibility_data(
            *transmissibility,
            0.0,
            0.0,
            template.well_diameter,
            plane.well_direction(),
        );
        completion.add_metadata(
            "Fracture",
            format!(
                "{} Template: {} Transmissibility: {:.4E}",
                fracture.name, template.name, transmissibility
            ),
        );
        completions.push(completion);
    }

    let report = report_item(request.well_name, fracture, template, &fracture_grid, &mapped, &per_host);
    Ok(FractureCompletions {
        completions,
        report,
    })
}

/// Connections of one fracture, without report or debug output.
pub fn fracture_connections(
    request: &WellCompletionRequest<'_>,
    fracture: &WellFracture,
    template: &FractureTemplate,
) -> Result<Vec<CompletionData>, LuError> {
    fracture_completions(request, fracture, template, None).map(|result| result.completions)
}

fn map_fracture_cell(
    grid: &dyn GridProvider,
    plane: &FracturePlane,
    cell: &FractureCell,
    skin: f64,
) -> Option<MappedCell> {
    if cell.conductivity <= 0.0 {
        return None;
    }
    let host = find_cell_containing_point(grid, plane.world_point(cell.center))?;
    let properties = cell_flow_properties(grid, host)?;
    let corners = grid.cell_corners(host)?;
    let axes = hexahedron::axis_vectors(&corners).map(|axis| normalize3(axis).unwrap_or([0.0; 3]));
    let (matrix_transmissibility, normal_permeability) =
        matrix_to_fracture(&properties, axes, plane.normal, cell, skin);
    Some(MappedCell {
        host,
        matrix_transmissibility,
        normal_permeability,
    })
}

/// Flow from both sides of the fracture cell into the cell's host.
fn matrix_to_fracture(
    properties: &CellFlowProperties,
    axes: [Vec3; 3],
    normal: Vec3,
    cell: &FractureCell,
    skin: f64,
) -> (f64, f64) {
    let area = cell.area();
    let fracture_length = cell.size[0];
    let mut components = [0.0; 3];
    let mut normal_permeability = 0.0;
    for axis in 0..3 {
        let weight = dot3(normal, axes[axis]).abs();
        let net_to_gross = if axis < 2 { properties.net_to_gross } else { 1.0 };
        components[axis] = matrix_to_fracture_transmissibility(
            properties.permeability[axis],
            net_to_gross,
            area * weight,
            properties.dimensions[axis],
            skin,
            fracture_length,
            DARCY_METRIC,
        );
        normal_permeability += properties.permeability[axis] * weight;
    }
    (
        total_connection_factor(components[0], components[1], components[2]),
        normal_permeability,
    )
}

fn sum_per_host(mapped: &[Option<MappedCell>]) -> Vec<(usize, f64)> {
    let mut order = Vec::new();
    let mut totals: HashMap<usize, f64> = HashMap::new();
    for cell in mapped.iter().flatten() {
        let total = totals.entry(cell.host).or_insert_with(|| {
            order.push(cell.host);
            0.0
        });
        *total += cell.matrix_transmissibility;
    }
    order
        .into_iter()
        .map(|host| (host, totals.get(&host).copied().unwrap_or(0.0)))
        .collect()
}

fn fracture_network(
    fracture_grid: &FractureGrid,
    mapped: &[Option<MappedCell>],
    template: &FractureTemplate,
    fracture: &WellFracture,
) -> FractureNetwork {
    let mut network = FractureNetwork::new(fracture_grid.cells.len());

    for cell in &fracture_grid.cells {
        if cell.conductivity <= 0.0 {
            continue;
        }
        let index = fracture_grid.index_of(cell.i, cell.j);
        let neighbours = [
            (fracture_grid.cell(cell.i + 1, cell.j), 0),
            (fracture_grid.cell(cell.i, cell.j + 1), 1),
        ];
        for (neighbour, axis) in neighbours {
            let Some(neighbour) = neighbour.filter(|neighbour| neighbour.conductivity > 0.0) else {
                continue;
            };
            let across = 1 - axis;
            let transmissibility = center_to_center_transmissibility(
                fracture_half_cell_transmissibility(
                    cell.conductivity,
                    cell.size[axis],
                    cell.size[across],
                    DARCY_METRIC,
                ),
                fracture_half_cell_transmissibility(
                    neighbour.conductivity,
                    neighbour.size[axis],
                    neighbour.size[across],
                    DARCY_METRIC,
                ),
            );
            network.internal_links.push((
                index,
                fracture_grid.index_of(neighbour.i, neighbour.j),
                transmissibility,
            ));
        }
        if let Some(mapped) = mapped[index] {
            network
                .matrix_links
                .push((index, mapped.host, mapped.matrix_transmissibility));
        }
    }

    let well_radius = 0.5 * template.well_diameter;
    match fracture.orientation {
        FractureOrientation::AlongWellPath => {
            let half_perforation = 0.5 * template.perforation_length;
            for cell in &fracture_grid.cells {
                if cell.conductivity <= 0.0 || !cell.contains(cell.center[0], 0.0) {
                    continue;
                }
                let low = (cell.center[0] - 0.5 * cell.size[0]).max(-half_perforation);
                let high = (cell.center[0] + 0.5 * cell.size[0]).min(half_perforation);
                if high <= low {
                    continue;
                }
                network.well_links.push((
                    fracture_grid.index_of(cell.i, cell.j),
                    fracture_cell_to_well_linear(
                        cell.conductivity,
                        cell.size[1],
                        high - low,
                        template.skin_factor,
                        DARCY_METRIC,
                    ),
                ));
            }
        }
        FractureOrientation::Transverse | FractureOrientation::Azimuth { .. } => {
            if let Some(cell) = fracture_grid
                .cells
                .iter()
                .find(|cell| cell.conductivity > 0.0 && cell.contains(0.0, 0.0))
            {
                network.well_links.push((
                    fracture_grid.index_of(cell.i, cell.j),
                    fracture_cell_to_well_radial(
                        cell.conductivity,
                        cell.size,
                        well_radius,
                        template.skin_factor,
                        DARCY_METRIC,
                    ),
                ));
            }
        }
    }
    network
}

fn report_item(
    well_name: &str,
    fracture: &WellFracture,
    template: &FractureTemplate,
    fracture_grid: &FractureGrid,
    mapped: &[Option<MappedCell>],
    per_host: &[(usize, f64)],
) -> FractureReportItem {
    let mut area = 0.0;
    let mut conductivity = 0.0;
    let mut mapped_area = 0.0;
    let mut matrix_permeability = 0.0;
    for (cell, mapped) in fracture_grid.cells.iter().zip(mapped) {
        if cell.conductivity <= 0.0 {
            continue;
        }
        area += cell.area();
        conductivity += cell.area() * cell.conductivity;
        if let Some(mapped) = mapped {
            mapped_area += cell.area();
            matrix_permeability += cell.area() * mapped.normal_permeability;
        }
    }
    FractureReportItem {
        well_name: well_name.to_string(),
        fracture_name: fracture.name.clone(),
        template_name: template.name.clone(),
        transmissibility: per_host.iter().map(|(_, value)| value).sum(),
        connection_count: per_host.len(),
        area,
        conductivity: if area > 0.0 { conductivity / area } else { 0.0 },
        matrix_permeability: if mapped_area > 0.0 {
            matrix_permeability / mapped_area
        } else {
            0.0
        },
        half_length: template.half_length(),
        height: template.height(),
    }
}

#[cfg(test)]
mod tests {
    use super::{FractureGenerator, FracturePlane, FractureReportItem};
    use crate::domain::{CompletionData, CompletionType, ExportSettings, UnitSystem};
    use crate::model::completions::{Completion, FractureOrientation, WellFracture};
    use crate::model::fracture_template::{ConductivityType, FractureGeometry, FractureTemplate};
    use crate::model::grid::{CartesianGridSpec, GridCase};
    use crate::model::well_path::{WellPath, WellPathGeometry};
    use crate::modules::export::{ExportContext, ExportLog};
    use crate::modules::{CompletionGenerator, WellCompletionRequest};

    fn case() -> GridCase {
        GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([8, 8, 2], [10.0, 10.0, 5.0], [0.0, 0.0], -1000.0),
        )
        .expect("grid")
    }

    fn template(conductivity_type: ConductivityType) -> FractureTemplate {
        FractureTemplate {
            name: "Ellipse".to_string(),
            geometry: FractureGeometry::Ellipse {
                half_length: 15.0,
                height: 8.0,
                width: 0.01,
                permeability: 1000.0,
            },
            conductivity_type,
            ..FractureTemplate::default()
        }
    }

    fn horizontal_well() -> WellPath {
        let geometry = WellPathGeometry::new(
            vec![[0.0, 45.0, -1005.0], [80.0, 45.0, -1005.0]],
            vec![0.0, 80.0],
        )
        .expect("geometry");
        WellPath::new("FR-1", UnitSystem::Metric, geometry).with_completion(Completion::Fracture(
            WellFracture {
                name: "F1".to_string(),
                measured_depth: 35.0,
                template: "Ellipse".to_string(),
                orientation: FractureOrientation::Transverse,
                enabled: true,
            },
        ))
    }

    fn run(templates: &[FractureTemplate]) -> (Vec<CompletionData>, Vec<FractureReportItem>, ExportLog) {
        let case = case();
        let well = horizontal_well();
        let request = WellCompletionRequest::for_well_path(&case, &well, templates);
        let mut context = ExportContext::new(Some(&case), ExportSettings::default());
        let completions = FractureGenerator
            .generate(&request, &mut context)
            .expect("fractures");
        (completions, context.fracture_report, context.log)
    }

    #[test]
    fn transverse_plane_is_perpendicular_to_horizontal_well() {
        let well = horizontal_well();
        let Completion::Fracture(fracture) = &well.completions[0] else {
            panic!("fracture expected");
        };
        let plane = FracturePlane::new(&well.geometry, fracture);
        assert_eq!(plane.u, [0.0, 1.0, 0.0]);
        assert_eq!(plane.world_point([2.0, 1.0]), [35.0, 47.0, -1006.0]);
        assert!((plane.normal[0].abs() - 1.0).abs() < 1.0e-12);
    }

    #[test]
    fn infinite_conductivity_fracture_connects_every_host_cell() {
        let (completions, reports, _) = run(&[template(ConductivityType::Infinite)]);

        assert_eq!(completions.len(), 6);
        for completion in &completions {
            assert_eq!(completion.completion_type, CompletionType::Fracture);
            assert_eq!(completion.cell.ijk[0], 3);
            assert!(completion.transmissibility > 0.0);
            assert_eq!(completion.ordering_md, 35.0);
        }
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.connection_count, 6);
        let total: f64 = completions.iter().map(|completion| completion.transmissibility).sum();
        assert!((report.transmissibility - total).abs() < 1.0e-9 * total);
        assert!((report.conductivity - 10.0).abs() < 1.0e-9);
        assert!(report.dimensionless_conductivity() > 0.0);
    }

    #[test]
    fn finite_conductivity_lowers_total_transmissibility() {
        let (infinite, _, _) = run(&[template(ConductivityType::Infinite)]);
        let (finite, _, _) = run(&[template(ConductivityType::Finite)]);

        let total = |completions: &[CompletionData]| -> f64 {
            completions.iter().map(|completion| completion.transmissibility).sum()
        };
        assert!(!finite.is_empty());
        assert!(total(&finite) > 0.0);
        assert!(total(&finite) < total(&infinite));
    }

    #[test]
    fn unknown_template_is_logged_and_skipped() {
        let (completions, reports, log) = run(&[]);
        assert!(completions.is_empty());
        assert!(reports.is_empty());
        assert_eq!(log.entries_with_code("FRACTURE.MISSING_TEMPLATE").count(), 1);
    }
}
