//! Connection factor equations. Inputs are metric: m, mD, cP, bar, day.

use crate::domain::CellDirection;
use crate::numerics::Vec3;
use std::f64::consts::PI;

/// Peaceman equivalent radius for an anisotropic cell cross-section.
pub fn peaceman_equivalent_radius(d1: f64, d2: f64, k1: f64, k2: f64) -> f64 {
    let k21 = (k2 / k1).sqrt();
    let k12 = (k1 / k2).sqrt();
    0.28 * (d2 * d2 * k12 + d1 * d1 * k21).sqrt() / ((k1 / k2).powf(0.25) + (k2 / k1).powf(0.25))
}

/// Peaceman connection factor for flow perpendicular to the (d1, d2) plane.
#[allow(clippy::too_many_arguments)]
pub fn wellbore_transmissibility_component(
    length: f64,
    k1: f64,
    k2: f64,
    d1: f64,
    d2: f64,
    well_radius: f64,
    skin: f64,
    darcy: f64,
) -> f64 {
    if length <= 0.0 || k1 <= 0.0 || k2 <= 0.0 {
        return 0.0;
    }
    let k = (k1 * k2).sqrt();
    let r0 = peaceman_equivalent_radius(d1, d2, k1, k2);
    darcy * 2.0 * PI * k * length / ((r0 / well_radius).ln() + skin)
}

pub fn total_connection_factor(tx: f64, ty: f64, tz: f64) -> f64 {
    (tx * tx + ty * ty + tz * tz).sqrt()
}

/// Cell properties needed by the well bore equations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFlowProperties {
    pub dimensions: Vec3,
    pub permeability: Vec3,
    pub net_to_gross: f64,
}

impl CellFlowProperties {
    /// NTG applied to horizontal lengths.
    pub fn lateral_ntg(&self, use_lateral_ntg: bool) -> f64 {
        if use_lateral_ntg {
            self.net_to_gross
        } else {
            1.0
        }
    }

    fn scaled_lengths(&self, lengths: Vec3, use_lateral_ntg: bool) -> Vec3 {
        let lateral = self.lateral_ntg(use_lateral_ntg);
        [
            lengths[0] * lateral,
            lengths[1] * lateral,
            lengths[2] * self.net_to_gross,
        ]
    }
}

/// Combined connection factor for a trajectory with `lengths` along I, J, K.
pub fn well_bore_transmissibility(
    cell: &CellFlowProperties,
    lengths: Vec3,
    use_lateral_ntg: bool,
    well_radius: f64,
    skin: f64,
    darcy: f64,
) -> f64 {
    let [dx, dy, dz] = cell.dimensions;
    let [kx, ky, kz] = cell.permeability;
    let [lx, ly, lz] = cell.scaled_lengths(lengths, use_lateral_ntg);
    let tx = wellbore_transmissibility_component(lx, ky, kz, dy, dz, well_radius, skin, darcy);
    let ty = wellbore_transmissibility_component(ly, kx, kz, dx, dz, well_radius, skin, darcy);
    let tz = wellbore_transmissibility_component(lz, ky, kx, dy, dx, well_radius, skin, darcy);
    total_connection_factor(tx, ty, tz)
}

pub fn total_kh(cell: &CellFlowProperties, lengths: Vec3, use_lateral_ntg: bool) -> f64 {
    let [kx, ky, kz] = cell.permeability;
    let [lx, ly, lz] = cell.scaled_lengths(lengths, use_lateral_ntg);
    let khx = (ky * kz).sqrt() * lx;
    let khy = (kx * kz).sqrt() * ly;
    let khz = (kx * ky).sqrt() * lz;
    total_connection_factor(khx, khy, khz)
}

pub fn effective_h(cell: &CellFlowProperties, lengths: Vec3, use_lateral_ntg: bool) -> f64 {
    let [lx, ly, lz] = cell.scaled_lengths(lengths, use_lateral_ntg);
    total_connection_factor(lx, ly, lz)
}

/// Length-weighted permeability seen by the trajectory; zero for no length.
pub fn effective_k(cell: &CellFlowProperties, lengths: Vec3, use_lateral_ntg: bool) -> f64 {
    let h = effective_h(cell, lengths, use_lateral_ntg);
    if h <= 0.0 {
        return 0.0;
    }
    total_kh(cell, lengths, use_lateral_ntg) / h
}

/// Axis along which the trajectory covers the largest fraction of the cell.
pub fn cell_main_direction(dimensions: Vec3, lengths: Vec3) -> CellDirection {
    let fraction = |axis: usize| {
        if dimensions[axis] > 0.0 {
            (lengths[axis] / dimensions[axis]).abs()
        } else {
            0.0
        }
    };
    let (x, y, z) = (fraction(0), fraction(1), fraction(2));
    if x >= y && x >= z {
        CellDirection::I
    } else if y >= x && y >= z {
        CellDirection::J
    } else {
        CellDirection::K
    }
}

/// Connection factor the simulator computes itself for a full-cell
/// penetration along `direction`; the reference for WPIMULT.
pub fn transmissibility_as_simulator_does(
    cell: &CellFlowProperties,
    direction: CellDirection,
    well_radius: f64,
    skin: f64,
    darcy: f64,
) -> f64 {
    let [dx, dy, dz] = cell.dimensions;
    let [kx, ky, kz] = cell.permeability;
    match direction {
        CellDirection::I => {
            wellbore_transmissibility_component(dx, ky, kz, dy, dz, well_radius, skin, darcy)
        }
        CellDirection::J => {
            wellbore_transmissibility_component(dy, kx, kz, dx, dz, well_radius, skin, darcy)
        }
        CellDirection::K => wellbore_transmissibility_component(
            dz * cell.net_to_gross,
            ky,
            kx,
            dy,
            dx,
            well_radius,
            skin,
            darcy,
        ),
    }
}

/// Non-Darcy D-factor from the inertial coefficient correlation.
#[allow(clippy::too_many_arguments)]
pub fn computed_d_factor(
    alpha: f64,
    inertial_coefficient: f64,
    permeability_scaling: f64,
    porosity_scaling: f64,
    effective_permeability: f64,
    effective_h: f64,
    porosity: f64,
    well_radius: f64,
    relative_gas_density: f64,
    gas_viscosity: f64,
) -> Option<f64> {
    if effective_h <= 0.0 || well_radius <= 0.0 || gas_viscosity <= 0.0 {
        return None;
    }
    let beta = inertial_coefficient
        * effective_permeability.powf(permeability_scaling)
        * porosity.powf(porosity_scaling);
    let d_factor = alpha * beta * effective_permeability / (effective_h * well_radius)
        * relative_gas_density
        / gas_viscosity;
    d_factor.is_finite().then_some(d_factor)
}

/// Matrix-to-fracture connection factor through one face direction.
pub fn matrix_to_fracture_transmissibility(
    permeability: f64,
    net_to_gross: f64,
    area: f64,
    cell_size_length: f64,
    skin: f64,
    fracture_length: f64,
    darcy: f64,
) -> f64 {
    let denominator = cell_size_length + skin * fracture_length / PI;
    if denominator <= 0.0 {
        return 0.0;
    }
    8.0 * darcy * permeability * net_to_gross * area / denominator
}

/// Fracture cell to well where the well pierces the fracture cell.
pub fn fracture_cell_to_well_radial(
    conductivity: f64,
    cell_size: [f64; 2],
    well_radius: f64,
    skin: f64,
    darcy: f64,
) -> f64 {
    let r0 = 0.14 * (cell_size[0] * cell_size[0] + cell_size[1] * cell_size[1]).sqrt();
    darcy * 2.0 * PI * conductivity / ((r0 / well_radius).ln() + skin)
}

/// Fracture cell to well where the well runs `perforated_length` along the cell.
pub fn fracture_cell_to_well_linear(
    conductivity: f64,
    cell_height: f64,
    perforated_length: f64,
    skin: f64,
    darcy: f64,
) -> f64 {
    let denominator = 0.5 * cell_height + skin * cell_height / PI;
    if denominator <= 0.0 {
        return 0.0;
    }
    darcy * conductivity * perforated_length / denominator
}

/// Half-cell transmissibility inside the fracture plane.
pub fn fracture_half_cell_transmissibility(
    conductivity: f64,
    size_along_flow: f64,
    size_across_flow: f64,
    darcy: f64,
) -> f64 {
    if size_along_flow <= 0.0 {
        return 0.0;
    }
    darcy * conductivity * size_across_flow / (0.5 * size_along_flow)
}

/// Harmonic combination of two half-cell transmissibilities.
pub fn center_to_center_transmissibility(half_a: f64, half_b: f64) -> f64 {
    if half_a <= 0.0 || half_b <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 / half_a + 1.0 / half_b)
}
