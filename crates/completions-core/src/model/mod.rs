pub mod completions;
pub mod fishbones_geometry;
pub mod fracture_template;
pub mod grid;
pub mod project;
pub mod simulation_well;
pub mod well_path;
