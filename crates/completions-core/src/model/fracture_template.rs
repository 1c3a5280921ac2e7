use crate::common::constants::ELLIPSE_FRACTURE_CELLS_PER_AXIS;
use crate::domain::{CompletionError, ComputeResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConductivityType {
    #[default]
    Infinite,
    Finite,
}

/// Fracture shape and conductivity, in the fracture plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FractureGeometry {
    #[serde(rename_all = "camelCase")]
    Ellipse {
        half_length: f64,
        height: f64,
        width: f64,
        /// Proppant permeability in mD.
        permeability: f64,
    },
    /// Rectilinear grid with cell edges along the plane (`x_edges`) and depth
    /// below the fracture center (`depth_edges`), conductivity per cell in mD·m.
    #[serde(rename_all = "camelCase")]
    StimPlan {
        x_edges: Vec<f64>,
        depth_edges: Vec<f64>,
        conductivity: Vec<Vec<f64>>,
        width: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FractureTemplate {
    pub name: String,
    pub geometry: FractureGeometry,
    pub conductivity_type: ConductivityType,
    pub skin_factor: f64,
    pub well_diameter: f64,
    /// Perforated length along the well for fractures aligned with the well.
    pub perforation_length: f64,
}

impl Default for FractureTemplate {
    fn default() -> Self {
        Self {
            name: "Fracture Template".to_string(),
            geometry: FractureGeometry::Ellipse {
                half_length: 50.0,
                height: 20.0,
                width: 0.01,
                permeability: 10_000.0,
            },
            conductivity_type: ConductivityType::default(),
            skin_factor: 0.0,
            well_diameter: 0.216,
            perforation_length: 1.0,
        }
    }
}

/// One cell of the discretized fracture plane. `center[0]` runs along the
/// plane, `center[1]` is depth below the fracture center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractureCell {
    pub i: usize,
    pub j: usize,
    pub center: [f64; 2],
    pub size: [f64; 2],
    pub conductivity: f64,
}

impl FractureCell {
    pub fn area(&self) -> f64 {
        self.size[0] * self.size[1]
    }

    pub fn contains(&self, u: f64, v: f64) -> bool {
        (u - self.center[0]).abs() <= 0.5 * self.size[0] + 1.0e-9
            && (v - self.center[1]).abs() <= 0.5 * self.size[1] + 1.0e-9
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FractureGrid {
    pub columns: usize,
    pub rows: usize,
    /// Row-major, `j * columns + i`.
    pub cells: Vec<FractureCell>,
}

impl FractureGrid {
    pub fn cell(&self, i: usize, j: usize) -> Option<&FractureCell> {
        (i < self.columns && j < self.rows).then(|| &self.cells[j * self.columns + i])
    }

    pub fn index_of(&self, i: usize, j: usize) -> usize {
        j * self.columns + i
    }
}

impl FractureTemplate {
    pub fn validate(&self) -> ComputeResult<()> {
        match &self.geometry {
            FractureGeometry::Ellipse {
                half_length,
                height,
                width,
                ..
            } => {
                if *half_length <= 0.0 || *height <= 0.0 || *width <= 0.0 {
                    return Err(CompletionError::input_validation(
                        "INPUT.FRACTURE_TEMPLATE",
                        format!("template '{}' needs positive ellipse dimensions", self.name),
                    ));
                }
            }
            FractureGeometry::StimPlan {
                x_edges,
                depth_edges,
                conductivity,
                ..
            } => {
                let increasing = |edges: &[f64]| edges.windows(2).all(|pair| pair[1] > pair[0]);
                let shape_ok = x_edges.len() >= 2
                    && depth_edges.len() >= 2
                    && conductivity.len() == depth_edges.len() - 1
                    && conductivity
                        .iter()
                        .all(|row| row.len() == x_edges.len() - 1);
                if !shape_ok || !increasing(x_edges) || !increasing(depth_edges) {
                    return Err(CompletionError::input_validation(
                        "INPUT.FRACTURE_TEMPLATE",
                        format!(
                            "template '{}' has inconsistent grid edges and conductivity rows",
                            self.name
                        ),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        match &self.geometry {
            FractureGeometry::Ellipse { width, .. } | FractureGeometry::StimPlan { width, .. } => {
                *width
            }
        }
    }

    pub fn half_length(&self) -> f64 {
        match &self.geometry {
            FractureGeometry::Ellipse { half_length, .. } => *half_length,
            FractureGeometry::StimPlan { x_edges, .. } => x_edges
                .iter()
                .fold(0.0_f64, |acc, value| acc.max(value.abs())),
        }
    }

    pub fn height(&self) -> f64 {
        match &self.geometry {
            FractureGeometry::Ellipse { height, .. } => *height,
            FractureGeometry::StimPlan { depth_edges, .. } => {
                depth_edges[depth_edges.len() - 1] - depth_edges[0]
            }
        }
    }

    pub fn fracture_grid(&self) -> FractureGrid {
        match &self.geometry {
            FractureGeometry::Ellipse {
                half_length,
                height,
                width,
                permeability,
            } => {
                let count = ELLIPSE_FRACTURE_CELLS_PER_AXIS;
                let x_edges = even_edges(-half_length, *half_length, count);
                let depth_edges = even_edges(-0.5 * height, 0.5 * height, count);
                let semi_height = 0.5 * height;
                build_grid(&x_edges, &depth_edges, |u, v| {
                    let inside = (u / half_length).powi(2) + (v / semi_height).powi(2) <= 1.0;
                    if inside { permeability * width } else { 0.0 }
                })
            }
            FractureGeometry::StimPlan {
                x_edges,
                depth_edges,
                conductivity,
                ..
            } => {
                let mut values = conductivity.iter().flatten().copied();
                build_grid(x_edges, depth_edges, |_, _| values.next().unwrap_or(0.0))
            }
        }
    }

    pub fn scale_lengths(&mut self, factor: f64) {
        match &mut self.geometry {
            FractureGeometry::Ellipse {
                half_length,
                height,
                width,
                ..
            } => {
                *half_length *= factor;
                *height *= factor;
                *width *= factor;
            }
            FractureGeometry::StimPlan {
                x_edges,
                depth_edges,
                conductivity,
                width,
            } => {
                x_edges.iter_mut().for_each(|value| *value *= factor);
                depth_edges.iter_mut().for_each(|value| *value *= factor);
                conductivity
                    .iter_mut()
                    .flatten()
                    .for_each(|value| *value *= factor);
                *width *= factor;
            }
        }
        self.well_diameter *= factor;
        self.perforation_length *= factor;
    }
}

fn even_edges(start: f64, end: f64, count: usize) -> Vec<f64> {
    (0..=count)
        .map(|index| start + (end - start) * index as f64 / count as f64)
        .collect()
}

/// Cells are visited row by row, top row first.
fn build_grid(
    x_edges: &[f64],
    depth_edges: &[f64],
    mut conductivity: impl FnMut(f64, f64) -> f64,
) -> FractureGrid {
    let columns = x_edges.len().saturating_sub(1);
    let rows = depth_edges.len().saturating_sub(1);
    let mut cells = Vec::with_capacity(columns * rows);
    for j in 0..rows {
        for i in 0..columns {
            let center = [
                0.5 * (x_edges[i] + x_edges[i + 1]),
                0.5 * (depth_edges[j] + depth_edges[j + 1]),
            ];
            cells.push(FractureCell {
                i,
                j,
                center,
                size: [x_edges[i + 1] - x_edges[i], depth_edges[j + 1] - depth_edges[j]],
                conductivity: conductivity(center[0], center[1]),
            });
        }
    }
    FractureGrid {
        columns,
        rows,
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::{FractureGeometry, FractureTemplate};

    #[test]
    fn ellipse_grid_covers_bounding_rectangle() {
        let template = FractureTemplate::default();
        let grid = template.fracture_grid();
        assert_eq!(grid.columns, 35);
        assert_eq!(grid.rows, 35);

        let total_area: f64 = grid.cells.iter().map(|cell| cell.area()).sum();
        assert!((total_area - 100.0 * 20.0).abs() < 1.0e-6);

        let center = grid.cell(17, 17).expect("center cell");
        assert_eq!(center.conductivity, 10_000.0 * 0.01);
        let corner = grid.cell(0, 0).expect("corner cell");
        assert_eq!(corner.conductivity, 0.0);
    }

    #[test]
    fn stimplan_grid_keeps_row_major_conductivity() {
        let template = FractureTemplate {
            name: "SP".to_string(),
            geometry: FractureGeometry::StimPlan {
                x_edges: vec![-10.0, 0.0, 10.0],
                depth_edges: vec![-5.0, 5.0],
                conductivity: vec![vec![1.0, 2.0]],
                width: 0.005,
            },
            ..FractureTemplate::default()
        };
        template.validate().expect("valid template");
        let grid = template.fracture_grid();
        assert_eq!(grid.cells.len(), 2);
        assert_eq!(grid.cell(1, 0).expect("cell").conductivity, 2.0);
        assert_eq!(template.half_length(), 10.0);
        assert_eq!(template.height(), 10.0);
    }

    #[test]
    fn inconsistent_stimplan_rows_are_rejected() {
        let template = FractureTemplate {
            geometry: FractureGeometry::StimPlan {
                x_edges: vec![0.0, 1.0, 2.0],
                depth_edges: vec![0.0, 1.0],
                conductivity: vec![vec![1.0]],
                width: 0.01,
            },
            ..FractureTemplate::default()
        };
        let error = template.validate().expect_err("shape mismatch");
        assert_eq!(error.placeholder(), "INPUT.FRACTURE_TEMPLATE");
    }
}
