use super::completions::WellFracture;
use super::grid::GridProvider;
use super::well_path::WellPathGeometry;
use crate::domain::{CompletionError, ComputeResult};
use crate::numerics::hexahedron;
use crate::numerics::{add3, scale3};

/// A well known only from the main-grid cells it connects to.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationWell {
    pub name: String,
    /// Zero-based main-grid IJK, ordered from the well head downward.
    pub cells: Vec<[usize; 3]>,
    pub fractures: Vec<WellFracture>,
}

impl SimulationWell {
    /// Centerline through the connected cells, starting at the top face of
    /// the first cell.
    pub fn centerline(&self, grid: &dyn GridProvider) -> ComputeResult<WellPathGeometry> {
        let mut points = Vec::with_capacity(self.cells.len() + 1);
        for (position, ijk) in self.cells.iter().enumerate() {
            let corners = grid
                .global_cell_index(0, *ijk)
                .and_then(|cell| grid.cell_corners(cell))
                .ok_or_else(|| {
                    CompletionError::input_validation(
                        "INPUT.SIMULATION_WELL_CELL",
                        format!(
                            "simulation well '{}' references cell {:?} outside the main grid",
                            self.name, ijk
                        ),
                    )
                })?;
            if position == 0 {
                let top_center = corners[..4]
                    .iter()
                    .fold([0.0; 3], |acc, corner| add3(acc, *corner));
                points.push(scale3(top_center, 0.25));
            }
            points.push(hexahedron::center(&corners));
        }
        WellPathGeometry::from_points(points, 0.0)
    }
}
