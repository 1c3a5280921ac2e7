//! JSON project file: case, well paths, simulation wells, templates and
//! export settings. Lengths are converted to meters on load.

use super::completions::{
    Completion, MswParameters, NonDarcyParameters, WellExportSettings, WellFracture,
};
use super::fracture_template::FractureTemplate;
use super::grid::{CartesianGridSpec, CellProperty, GridCase, LgrSpec};
use super::simulation_well::SimulationWell;
use super::well_path::{WellPath, WellPathGeometry};
use crate::common::units::meters_per_unit;
use crate::domain::{CompletionError, ComputeResult, ExportSettings, UnitSystem};
use crate::numerics::{Vec3, scale3};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ProjectLoadError {
    #[error("failed to read project file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] CompletionError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub case: CaseInput,
    #[serde(default)]
    pub well_paths: Vec<WellPathInput>,
    #[serde(default)]
    pub simulation_wells: Vec<SimulationWellInput>,
    /// Template lengths are in the case unit system.
    #[serde(default)]
    pub fracture_templates: Vec<FractureTemplate>,
    #[serde(default)]
    pub settings: ExportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseInput {
    pub name: String,
    #[serde(default)]
    pub unit_system: UnitSystem,
    #[serde(default)]
    pub origin: [f64; 2],
    pub top: f64,
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub dz: Vec<f64>,
    #[serde(default)]
    pub properties: PropertyInput,
    /// One flag per main-grid cell, I fastest.
    pub active: Option<Vec<bool>>,
    #[serde(default)]
    pub lgrs: Vec<LgrInput>,
}

/// Each property is either a single value or one value per main-grid cell.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyInput {
    pub perm_x: Option<Vec<f64>>,
    pub perm_y: Option<Vec<f64>>,
    pub perm_z: Option<Vec<f64>>,
    pub net_to_gross: Option<Vec<f64>>,
    pub porosity: Option<Vec<f64>>,
}

/// Parent box in one-based inclusive IJK.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LgrInput {
    pub name: String,
    pub parent_min: [usize; 3],
    pub parent_max: [usize; 3],
    pub refinement: [usize; 3],
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WellPathInput {
    pub name: String,
    pub export_name: Option<String>,
    /// Defaults to the case unit system.
    pub unit_system: Option<UnitSystem>,
    pub points: Vec<Vec3>,
    /// Accumulated from the point distances when absent.
    pub measured_depths: Option<Vec<f64>>,
    #[serde(default)]
    pub start_md: f64,
    #[serde(default)]
    pub completions: Vec<Completion>,
    #[serde(default)]
    pub msw: MswParameters,
    #[serde(default)]
    pub non_darcy: NonDarcyParameters,
    #[serde(default)]
    pub export: WellExportSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationWellInput {
    pub name: String,
    /// One-based main-grid IJK from the well head downward.
    pub cells: Vec<[usize; 3]>,
    #[serde(default)]
    pub fractures: Vec<WellFracture>,
}

/// Loaded project with every length in meters.
#[derive(Debug, Clone)]
pub struct Project {
    pub case: GridCase,
    pub well_paths: Vec<WellPath>,
    pub simulation_wells: Vec<SimulationWell>,
    pub fracture_templates: Vec<FractureTemplate>,
    pub settings: ExportSettings,
}

pub fn load_project(path: &Path) -> Result<Project, ProjectLoadError> {
    let content = fs::read_to_string(path).map_err(|source| ProjectLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let input: ProjectInput =
        serde_json::from_str(&content).map_err(|source| ProjectLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(input.into_project()?)
}

impl ProjectInput {
    pub fn into_project(self) -> ComputeResult<Project> {
        let case_unit_system = self.case.unit_system;
        let case = self.case.into_grid()?;

        let case_scale = meters_per_unit(case_unit_system);
        let mut fracture_templates = self.fracture_templates;
        for template in &mut fracture_templates {
            template.scale_lengths(case_scale);
        }

        let well_paths = self
            .well_paths
            .into_iter()
            .map(|well| well.into_well_path(case_unit_system))
            .collect::<ComputeResult<Vec<_>>>()?;

        let simulation_wells = self
            .simulation_wells
            .into_iter()
            .map(|well| well.into_simulation_well(case_scale))
            .collect::<ComputeResult<Vec<_>>>()?;

        Ok(Project {
            case,
            well_paths,
            simulation_wells,
            fracture_templates,
            settings: self.settings,
        })
    }
}

fn zero_based(name: &str, ijk: [usize; 3]) -> ComputeResult<[usize; 3]> {
    if ijk.contains(&0) {
        return Err(CompletionError::input_validation(
            "INPUT.CELL_INDEX",
            format!("'{name}' uses cell {ijk:?}; indices are one-based"),
        ));
    }
    Ok([ijk[0] - 1, ijk[1] - 1, ijk[2] - 1])
}

impl CaseInput {
    fn into_grid(self) -> ComputeResult<GridCase> {
        let scale = meters_per_unit(self.unit_system);
        let scaled = |values: &[f64]| -> Vec<f64> {
            values.iter().map(|value| value * scale).collect()
        };
        let spec = CartesianGridSpec {
            origin: [self.origin[0] * scale, self.origin[1] * scale],
            top: self.top * scale,
            dx: scaled(&self.dx),
            dy: scaled(&self.dy),
            dz: scaled(&self.dz),
        };
        let mut case = GridCase::cartesian(&self.name, self.unit_system, &spec)?;

        let properties = [
            (CellProperty::PermX, self.properties.perm_x),
            (CellProperty::PermY, self.properties.perm_y),
            (CellProperty::PermZ, self.properties.perm_z),
            (CellProperty::NetToGross, self.properties.net_to_gross),
            (CellProperty::Porosity, self.properties.porosity),
        ];
        for (property, values) in properties {
            if let Some(values) = values {
                case.set_property(property, &values)?;
            }
        }
        if let Some(active) = &self.active {
            case.set_active_cells(active)?;
        }
        for lgr in &self.lgrs {
            case.add_lgr(&LgrSpec {
                name: lgr.name.clone(),
                parent_min: zero_based(&lgr.name, lgr.parent_min)?,
                parent_max: zero_based(&lgr.name, lgr.parent_max)?,
                refinement: lgr.refinement,
            })?;
        }
        Ok(case)
    }
}

impl WellPathInput {
    fn into_well_path(self, case_unit_system: UnitSystem) -> ComputeResult<WellPath> {
        let unit_system = self.unit_system.unwrap_or(case_unit_system);
        let scale = meters_per_unit(unit_system);
        let points: Vec<Vec3> = self.points.iter().map(|point| scale3(*point, scale)).collect();
        let geometry = match self.measured_depths {
            Some(mds) => {
                WellPathGeometry::new(points, mds.iter().map(|md| md * scale).collect())?
            }
            None => WellPathGeometry::from_points(points, self.start_md * scale)?,
        };

        let mut well = WellPath::new(self.name, unit_system, geometry);
        well.export_name = self.export_name;
        well.completions = self.completions;
        well.msw = self.msw;
        well.non_darcy = self.non_darcy;
        well.export = self.export;
        if scale != 1.0 {
            for completion in &mut well.completions {
                completion.scale_lengths(scale);
            }
            well.msw.scale_lengths(scale);
            well.export.reference_depth = well.export.reference_depth.map(|depth| depth * scale);
            well.export.drainage_radius = well.export.drainage_radius.map(|radius| radius * scale);
        }
        well.msw.validate(&well.name)?;
        Ok(well)
    }
}

impl SimulationWellInput {
    fn into_simulation_well(self, scale: f64) -> ComputeResult<SimulationWell> {
        let cells = self
            .cells
            .iter()
            .map(|ijk| zero_based(&self.name, *ijk))
            .collect::<ComputeResult<Vec<_>>>()?;
        let mut fractures = self.fractures;
        for fracture in &mut fractures {
            fracture.measured_depth *= scale;
        }
        Ok(SimulationWell {
            name: self.name,
            cells,
            fractures,
        })
    }
}
