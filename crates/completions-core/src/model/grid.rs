use crate::domain::{CellAddress, CompletionError, ComputeResult, UnitSystem};
use crate::numerics::hexahedron::{self, HexCorners};
use crate::numerics::{BoundingBox, Vec3};
use std::ops::Range;

/// Location of a cell inside its own grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellLocation {
    pub grid_index: usize,
    pub ijk: [usize; 3],
}

/// Read-only view of a simulation case used by the export pipeline.
///
/// Grid 0 is the main grid; LGRs follow. Global cell indices run over all
/// grids. Geometry is metric with z as elevation.
pub trait GridProvider {
    fn case_name(&self) -> &str;
    fn unit_system(&self) -> UnitSystem;
    fn grid_count(&self) -> usize;
    /// `None` for the main grid.
    fn grid_name(&self, grid_index: usize) -> Option<&str>;
    fn grid_dimensions(&self, grid_index: usize) -> [usize; 3];
    fn global_cell_index(&self, grid_index: usize, ijk: [usize; 3]) -> Option<usize>;
    fn cell_location(&self, global_cell_index: usize) -> Option<CellLocation>;
    fn is_active(&self, global_cell_index: usize) -> bool;
    fn cell_corners(&self, global_cell_index: usize) -> Option<HexCorners>;
    /// LGR refining this main-grid cell, if any.
    fn child_grid_of_cell(&self, global_cell_index: usize) -> Option<usize>;
    /// LGR cells refining this main-grid cell.
    fn cells_refining(&self, global_cell_index: usize) -> Vec<usize>;
    fn permeability(&self, global_cell_index: usize) -> Vec3;
    fn net_to_gross(&self, global_cell_index: usize) -> f64;
    fn porosity(&self, global_cell_index: usize) -> f64;
    fn cells_in_grid(&self, grid_index: usize) -> Range<usize>;

    fn cell_address(&self, global_cell_index: usize) -> Option<CellAddress> {
        let location = self.cell_location(global_cell_index)?;
        Some(CellAddress {
            global_cell_index,
            grid_index: location.grid_index,
            grid_name: self.grid_name(location.grid_index).map(str::to_string),
            ijk: location.ijk,
        })
    }

    fn cell_dimensions(&self, global_cell_index: usize) -> Option<Vec3> {
        self.cell_corners(global_cell_index)
            .map(|corners| hexahedron::dimensions(&corners))
    }

    fn has_active_cells(&self) -> bool {
        self.cells_in_grid(0).any(|cell| self.is_active(cell))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct GridPart {
    name: Option<String>,
    dimensions: [usize; 3],
    first_cell: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct CellRecord {
    corners: HexCorners,
    grid_index: usize,
    ijk: [usize; 3],
    active: bool,
    permeability: Vec3,
    net_to_gross: f64,
    porosity: f64,
    child_grid: Option<usize>,
    refined_by: Vec<usize>,
}

/// Cartesian main grid description; layers stack downward from `top`.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianGridSpec {
    pub origin: [f64; 2],
    pub top: f64,
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub dz: Vec<f64>,
}

impl CartesianGridSpec {
    pub fn uniform(dimensions: [usize; 3], cell_size: Vec3, origin: [f64; 2], top: f64) -> Self {
        Self {
            origin,
            top,
            dx: vec![cell_size[0]; dimensions[0]],
            dy: vec![cell_size[1]; dimensions[1]],
            dz: vec![cell_size[2]; dimensions[2]],
        }
    }

    pub fn dimensions(&self) -> [usize; 3] {
        [self.dx.len(), self.dy.len(), self.dz.len()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LgrSpec {
    pub name: String,
    /// Zero-based inclusive main-grid box.
    pub parent_min: [usize; 3],
    pub parent_max: [usize; 3],
    pub refinement: [usize; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellProperty {
    PermX,
    PermY,
    PermZ,
    NetToGross,
    Porosity,
}

/// In-memory structured case with optional local grid refinements.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCase {
    name: String,
    unit_system: UnitSystem,
    grids: Vec<GridPart>,
    cells: Vec<CellRecord>,
}

impl GridCase {
    pub fn cartesian(
        name: impl Into<String>,
        unit_system: UnitSystem,
        spec: &CartesianGridSpec,
    ) -> ComputeResult<Self> {
        let dimensions = spec.dimensions();
        if dimensions.contains(&0) {
            return Err(CompletionError::input_validation(
                "INPUT.GRID_DIMENSIONS",
                format!("grid dimensions must be positive, got {dimensions:?}"),
            ));
        }
        if [&spec.dx, &spec.dy, &spec.dz]
            .iter()
            .any(|sizes| sizes.iter().any(|size| !(*size > 0.0)))
        {
            return Err(CompletionError::input_validation(
                "INPUT.GRID_CELL_SIZE",
                "cell sizes must be positive",
            ));
        }

        let x_edges = cumulative_edges(spec.origin[0], &spec.dx, 1.0);
        let y_edges = cumulative_edges(spec.origin[1], &spec.dy, 1.0);
        let z_edges = cumulative_edges(spec.top, &spec.dz, -1.0);

        let mut cells = Vec::with_capacity(dimensions.iter().product());
        for k in 0..dimensions[2] {
            for j in 0..dimensions[1] {
                for i in 0..dimensions[0] {
                    cells.push(CellRecord {
                        corners: hexahedron::box_corners(
                            [x_edges[i], y_edges[j]],
                            [x_edges[i + 1], y_edges[j + 1]],
                            z_edges[k],
                            z_edges[k + 1],
                        ),
                        grid_index: 0,
                        ijk: [i, j, k],
                        active: true,
                        permeability: [100.0, 100.0, 10.0],
                        net_to_gross: 1.0,
                        porosity: 0.2,
                        child_grid: None,
                        refined_by: Vec::new(),
                    });
                }
            }
        }

        Ok(Self {
            name: name.into(),
            unit_system,
            grids: vec![GridPart {
                name: None,
                dimensions,
                first_cell: 0,
            }],
            cells,
        })
    }

    /// Sets a main-grid property, either one value for all cells or one per cell.
    pub fn set_property(&mut self, property: CellProperty, values: &[f64]) -> ComputeResult<()> {
        let main_cells = self.cells_in_grid(0);
        if values.len() != 1 && values.len() != main_cells.len() {
            return Err(CompletionError::input_validation(
                "INPUT.GRID_PROPERTY",
                format!(
                    "property {property:?} has {} values, expected 1 or {}",
                    values.len(),
                    main_cells.len()
                ),
            ));
        }
        for cell in main_cells {
            let value = if values.len() == 1 {
                values[0]
            } else {
                values[cell]
            };
            let record = &mut self.cells[cell];
            match property {
                CellProperty::PermX => record.permeability[0] = value,
                CellProperty::PermY => record.permeability[1] = value,
                CellProperty::PermZ => record.permeability[2] = value,
                CellProperty::NetToGross => record.net_to_gross = value,
                CellProperty::Porosity => record.porosity = value,
            }
        }
        self.propagate_to_lgrs();
        Ok(())
    }

    pub fn set_active_cells(&mut self, active: &[bool]) -> ComputeResult<()> {
        let main_cells = self.cells_in_grid(0);
        if active.len() != main_cells.len() {
            return Err(CompletionError::input_validation(
                "INPUT.GRID_ACTNUM",
                format!(
                    "active cell flags have {} values, expected {}",
                    active.len(),
                    main_cells.len()
                ),
            ));
        }
        for cell in main_cells {
            self.cells[cell].active = active[cell];
        }
        self.propagate_to_lgrs();
        Ok(())
    }

    /// Refines a box of main-grid cells. LGR cells inherit the properties of
    /// the host cell they lie in.
    pub fn add_lgr(&mut self, spec: &LgrSpec) -> ComputeResult<usize> {
        let main_dims = self.grids[0].dimensions;
        let valid_box = (0..3).all(|axis| {
            spec.parent_min[axis] <= spec.parent_max[axis]
                && spec.parent_max[axis] < main_dims[axis]
                && spec.refinement[axis] > 0
        });
        if !valid_box {
            return Err(CompletionError::input_validation(
                "INPUT.LGR_BOX",
                format!("LGR '{}' has an invalid parent box or refinement", spec.name),
            ));
        }

        let span = [
            spec.parent_max[0] - spec.parent_min[0] + 1,
            spec.parent_max[1] - spec.parent_min[1] + 1,
            spec.parent_max[2] - spec.parent_min[2] + 1,
        ];
        let mut parents = Vec::new();
        for pk in 0..span[2] {
            for pj in 0..span[1] {
                for pi in 0..span[0] {
                    let ijk = [
                        spec.parent_min[0] + pi,
                        spec.parent_min[1] + pj,
                        spec.parent_min[2] + pk,
                    ];
                    let parent = self.main_cell_index(ijk);
                    if self.cells[parent].child_grid.is_some() {
                        return Err(CompletionError::input_validation(
                            "INPUT.LGR_OVERLAP",
                            format!(
                                "LGR '{}' overlaps an existing refinement at main cell {:?}",
                                spec.name, ijk
                            ),
                        ));
                    }
                    parents.push(((pi, pj, pk), parent));
                }
            }
        }

        let grid_index = self.grids.len();
        let dimensions = [
            span[0] * spec.refinement[0],
            span[1] * spec.refinement[1],
            span[2] * spec.refinement[2],
        ];
        let first_cell = self.cells.len();
        self.grids.push(GridPart {
            name: Some(spec.name.clone()),
            dimensions,
            first_cell,
        });

        let refinement = spec.refinement;
        for k in 0..dimensions[2] {
            for j in 0..dimensions[1] {
                for i in 0..dimensions[0] {
                    let parent_offset = (i / refinement[0], j / refinement[1], k / refinement[2]);
                    let parent = parents
                        .iter()
                        .find(|(offset, _)| *offset == parent_offset)
                        .map(|(_, parent)| *parent)
                        .ok_or_else(|| {
                            CompletionError::internal(
                                "SYS.LGR_PARENT",
                                format!("no host cell for LGR '{}' cell {:?}", spec.name, [i, j, k]),
                            )
                        })?;
                    let host = self.cells[parent].clone();
                    let local = [i % refinement[0], j % refinement[1], k % refinement[2]];
                    let corners = refined_corners(&host.corners, local, refinement);
                    let global = self.cells.len();
                    self.cells.push(CellRecord {
                        corners,
                        grid_index,
                        ijk: [i, j, k],
                        active: host.active,
                        permeability: host.permeability,
                        net_to_gross: host.net_to_gross,
                        porosity: host.porosity,
                        child_grid: None,
                        refined_by: Vec::new(),
                    });
                    self.cells[parent].refined_by.push(global);
                }
            }
        }
        for (_, parent) in parents {
            self.cells[parent].child_grid = Some(grid_index);
        }
        Ok(grid_index)
    }

    pub fn main_grid_bounding_box(&self) -> Option<BoundingBox> {
        self.cells_in_grid(0)
            .map(|cell| hexahedron::bounding_box(&self.cells[cell].corners))
            .reduce(|mut lhs, rhs| {
                lhs.include(rhs.min);
                lhs.include(rhs.max);
                lhs
            })
    }

    fn main_cell_index(&self, ijk: [usize; 3]) -> usize {
        let dims = self.grids[0].dimensions;
        ijk[0] + dims[0] * (ijk[1] + dims[1] * ijk[2])
    }

    fn propagate_to_lgrs(&mut self) {
        for parent in self.cells_in_grid(0) {
            let host = self.cells[parent].clone();
            for child in host.refined_by {
                let record = &mut self.cells[child];
                record.active = host.active;
                record.permeability = host.permeability;
                record.net_to_gross = host.net_to_gross;
                record.porosity = host.porosity;
            }
        }
    }
}

fn cumulative_edges(start: f64, sizes: &[f64], sign: f64) -> Vec<f64> {
    let mut edges = Vec::with_capacity(sizes.len() + 1);
    edges.push(start);
    let mut position = start;
    for size in sizes {
        position += sign * size;
        edges.push(position);
    }
    edges
}

fn refined_corners(host: &HexCorners, local: [usize; 3], refinement: [usize; 3]) -> HexCorners {
    let fraction = |axis: usize, offset: usize| (local[axis] + offset) as f64 / refinement[axis] as f64;
    let corner = |di: usize, dj: usize, dk: usize| {
        hexahedron::trilinear_point(host, [fraction(0, di), fraction(1, dj), fraction(2, dk)])
    };
    [
        corner(0, 0, 0),
        corner(1, 0, 0),
        corner(1, 1, 0),
        corner(0, 1, 0),
        corner(0, 0, 1),
        corner(1, 0, 1),
        corner(1, 1, 1),
        corner(0, 1, 1),
    ]
}

impl GridProvider for GridCase {
    fn case_name(&self) -> &str {
        &self.name
    }

    fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    fn grid_count(&self) -> usize {
        self.grids.len()
    }

    fn grid_name(&self, grid_index: usize) -> Option<&str> {
        self.grids.get(grid_index).and_then(|grid| grid.name.as_deref())
    }

    fn grid_dimensions(&self, grid_index: usize) -> [usize; 3] {
        self.grids
            .get(grid_index)
            .map(|grid| grid.dimensions)
            .unwrap_or([0, 0, 0])
    }

    fn global_cell_index(&self, grid_index: usize, ijk: [usize; 3]) -> Option<usize> {
        let grid = self.grids.get(grid_index)?;
        let dims = grid.dimensions;
        if (0..3).any(|axis| ijk[axis] >= dims[axis]) {
            return None;
        }
        Some(grid.first_cell + ijk[0] + dims[0] * (ijk[1] + dims[1] * ijk[2]))
    }

    fn cell_location(&self, global_cell_index: usize) -> Option<CellLocation> {
        self.cells.get(global_cell_index).map(|cell| CellLocation {
            grid_index: cell.grid_index,
            ijk: cell.ijk,
        })
    }

    fn is_active(&self, global_cell_index: usize) -> bool {
        self.cells
            .get(global_cell_index)
            .is_some_and(|cell| cell.active)
    }

    fn cell_corners(&self, global_cell_index: usize) -> Option<HexCorners> {
        self.cells.get(global_cell_index).map(|cell| cell.corners)
    }

    fn child_grid_of_cell(&self, global_cell_index: usize) -> Option<usize> {
        self.cells
            .get(global_cell_index)
            .and_then(|cell| cell.child_grid)
    }

    fn cells_refining(&self, global_cell_index: usize) -> Vec<usize> {
        self.cells
            .get(global_cell_index)
            .map(|cell| cell.refined_by.clone())
            .unwrap_or_default()
    }

    fn permeability(&self, global_cell_index: usize) -> Vec3 {
        self.cells
            .get(global_cell_index)
            .map(|cell| cell.permeability)
            .unwrap_or([0.0; 3])
    }

    fn net_to_gross(&self, global_cell_index: usize) -> f64 {
        self.cells
            .get(global_cell_index)
            .map(|cell| cell.net_to_gross)
            .unwrap_or(1.0)
    }

    fn porosity(&self, global_cell_index: usize) -> f64 {
        self.cells
            .get(global_cell_index)
            .map(|cell| cell.porosity)
            .unwrap_or(0.0)
    }

    fn cells_in_grid(&self, grid_index: usize) -> Range<usize> {
        match self.grids.get(grid_index) {
            Some(grid) => {
                let count: usize = grid.dimensions.iter().product();
                grid.first_cell..grid.first_cell + count
            }
            None => 0..0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CartesianGridSpec, CellProperty, GridCase, GridProvider, LgrSpec};
    use crate::domain::{ErrorCategory, UnitSystem};

    fn three_layer_case() -> GridCase {
        GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([3, 3, 3], [100.0, 100.0, 10.0], [0.0, 0.0], -1000.0),
        )
        .expect("grid should build")
    }

    #[test]
    fn cartesian_grid_indexes_cells_i_fastest() {
        let case = three_layer_case();
        assert_eq!(case.grid_count(), 1);
        assert_eq!(case.global_cell_index(0, [1, 2, 1]), Some(1 + 3 * (2 + 3)));
        assert_eq!(case.global_cell_index(0, [3, 0, 0]), None);

        let corners = case.cell_corners(13).expect("corners");
        assert_eq!(corners[0], [100.0, 100.0, -1010.0]);
        assert_eq!(corners[6], [200.0, 200.0, -1020.0]);
        assert_eq!(case.cell_dimensions(13), Some([100.0, 100.0, 10.0]));
    }

    #[test]
    fn properties_accept_constant_or_per_cell_values() {
        let mut case = three_layer_case();
        case.set_property(CellProperty::PermX, &[250.0]).expect("constant");
        let ntg: Vec<f64> = (0..27).map(|cell| cell as f64 / 27.0).collect();
        case.set_property(CellProperty::NetToGross, &ntg)
            .expect("per cell");

        assert_eq!(case.permeability(5)[0], 250.0);
        assert_eq!(case.net_to_gross(9), 9.0 / 27.0);

        let error = case
            .set_property(CellProperty::Porosity, &[0.1, 0.2])
            .expect_err("length mismatch");
        assert_eq!(error.category(), ErrorCategory::InputValidationError);
    }

    #[test]
    fn lgr_refines_parent_cells_and_inherits_properties() {
        let mut case = three_layer_case();
        case.set_property(CellProperty::PermZ, &[42.0]).expect("perm");
        let lgr = case
            .add_lgr(&LgrSpec {
                name: "LGR1".to_string(),
                parent_min: [1, 1, 1],
                parent_max: [1, 1, 1],
                refinement: [2, 2, 2],
            })
            .expect("lgr should build");

        assert_eq!(lgr, 1);
        assert_eq!(case.grid_name(1), Some("LGR1"));
        assert_eq!(case.grid_dimensions(1), [2, 2, 2]);
        let parent = case.global_cell_index(0, [1, 1, 1]).expect("parent");
        assert_eq!(case.child_grid_of_cell(parent), Some(1));
        let children = case.cells_refining(parent);
        assert_eq!(children.len(), 8);
        for child in children {
            assert_eq!(case.permeability(child)[2], 42.0);
            assert_eq!(case.cell_dimensions(child), Some([50.0, 50.0, 5.0]));
        }
        let address = case.cell_address(case.cells_in_grid(1).start).expect("address");
        assert_eq!(address.grid_name.as_deref(), Some("LGR1"));
    }

    #[test]
    fn overlapping_lgrs_are_rejected() {
        let mut case = three_layer_case();
        let spec = LgrSpec {
            name: "A".to_string(),
            parent_min: [0, 0, 0],
            parent_max: [1, 0, 0],
            refinement: [3, 3, 1],
        };
        case.add_lgr(&spec).expect("first lgr");
        let error = case
            .add_lgr(&LgrSpec {
                name: "B".to_string(),
                ..spec
            })
            .expect_err("overlap");
        assert_eq!(error.placeholder(), "INPUT.LGR_OVERLAP");
    }

    #[test]
    fn inactive_cells_propagate_to_refinements() {
        let mut case = three_layer_case();
        case.add_lgr(&LgrSpec {
            name: "L".to_string(),
            parent_min: [0, 0, 0],
            parent_max: [0, 0, 0],
            refinement: [1, 1, 2],
        })
        .expect("lgr");
        let mut active = vec![true; 27];
        active[0] = false;
        case.set_active_cells(&active).expect("actnum");

        assert!(!case.is_active(0));
        for child in case.cells_refining(0) {
            assert!(!case.is_active(child));
        }
        assert!(case.has_active_cells());
    }
}
