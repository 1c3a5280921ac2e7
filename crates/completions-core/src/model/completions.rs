use crate::domain::{CompletionError, ComputeResult};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Completions owned by a well path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Completion {
    Perforation(PerforationInterval),
    Fishbones(FishbonesSubs),
    Fracture(WellFracture),
    IcdValve(IcdValve),
}

impl Completion {
    /// Rescales every length, used when input is given in feet.
    pub fn scale_lengths(&mut self, factor: f64) {
        match self {
            Self::Perforation(perforation) => {
                perforation.start_md *= factor;
                perforation.end_md *= factor;
                perforation.diameter *= factor;
            }
            Self::Fishbones(fishbones) => {
                for md in &mut fishbones.sub_measured_depths {
                    *md *= factor;
                }
                fishbones.lateral_length *= factor;
                fishbones.build_angle_deg_per_length /= factor;
                fishbones.hole_diameter *= factor;
                fishbones.icd_orifice_diameter *= factor;
                fishbones.lateral_tubing_diameter *= factor;
                fishbones.open_hole_roughness *= factor;
                fishbones.main_bore_diameter *= factor;
            }
            Self::Fracture(fracture) => fracture.measured_depth *= factor,
            Self::IcdValve(valve) => {
                valve.measured_depth *= factor;
                valve.orifice_diameter *= factor;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PerforationInterval {
    pub start_md: f64,
    pub end_md: f64,
    pub diameter: f64,
    pub skin_factor: f64,
    pub enabled: bool,
    /// First time step the interval is open; `None` means open from the start.
    pub active_from_time_step: Option<usize>,
}

impl Default for PerforationInterval {
    fn default() -> Self {
        Self {
            start_md: 0.0,
            end_md: 0.0,
            diameter: 0.216,
            skin_factor: 0.0,
            enabled: true,
            active_from_time_step: None,
        }
    }
}

impl PerforationInterval {
    pub fn is_active_at(&self, time_step: usize) -> bool {
        self.enabled
            && self
                .active_from_time_step
                .is_none_or(|first_step| time_step >= first_step)
    }
}

/// Fishbone subs drilled from the main bore, each sending out laterals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FishbonesSubs {
    pub name: String,
    pub sub_measured_depths: Vec<f64>,
    pub laterals_per_sub: usize,
    pub lateral_length: f64,
    pub exit_angle_deg: f64,
    pub build_angle_deg_per_length: f64,
    pub rotation_offset_deg: f64,
    pub hole_diameter: f64,
    pub skin_factor: f64,
    pub icd_count: usize,
    pub icd_orifice_diameter: f64,
    pub icd_flow_coefficient: f64,
    pub lateral_tubing_diameter: f64,
    pub open_hole_roughness: f64,
    pub main_bore_diameter: f64,
    pub main_bore_skin_factor: f64,
    pub enabled: bool,
}

impl Default for FishbonesSubs {
    fn default() -> Self {
        Self {
            name: "Fishbones".to_string(),
            sub_measured_depths: Vec::new(),
            laterals_per_sub: 3,
            lateral_length: 11.0,
            exit_angle_deg: 35.0,
            build_angle_deg_per_length: 6.0,
            rotation_offset_deg: 0.0,
            hole_diameter: 0.012,
            skin_factor: 0.0,
            icd_count: 2,
            icd_orifice_diameter: 0.007,
            icd_flow_coefficient: 1.5,
            lateral_tubing_diameter: 0.008,
            open_hole_roughness: 0.001,
            main_bore_diameter: 0.216,
            main_bore_skin_factor: 0.0,
            enabled: true,
        }
    }
}

impl FishbonesSubs {
    /// Combined flow area of the ICDs on one sub.
    pub fn icd_area(&self) -> f64 {
        let radius = 0.5 * self.icd_orifice_diameter;
        PI * radius * radius * self.icd_count as f64
    }

    pub fn start_md(&self) -> Option<f64> {
        self.sub_measured_depths.iter().copied().reduce(f64::min)
    }

    pub fn end_md(&self) -> Option<f64> {
        self.sub_measured_depths.iter().copied().reduce(f64::max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FractureOrientation {
    #[default]
    Transverse,
    AlongWellPath,
    Azimuth { degrees: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WellFracture {
    pub name: String,
    pub measured_depth: f64,
    pub template: String,
    pub orientation: FractureOrientation,
    pub enabled: bool,
}

impl Default for WellFracture {
    fn default() -> Self {
        Self {
            name: "Fracture".to_string(),
            measured_depth: 0.0,
            template: String::new(),
            orientation: FractureOrientation::default(),
            enabled: true,
        }
    }
}

/// Inflow control device placed on the main bore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IcdValve {
    pub name: String,
    pub measured_depth: f64,
    pub flow_coefficient: f64,
    pub orifice_diameter: f64,
    pub count: usize,
}

impl Default for IcdValve {
    fn default() -> Self {
        Self {
            name: "ICD".to_string(),
            measured_depth: 0.0,
            flow_coefficient: 0.7,
            orifice_diameter: 0.008,
            count: 1,
        }
    }
}

impl IcdValve {
    pub fn area(&self) -> f64 {
        let radius = 0.5 * self.orifice_diameter;
        PI * radius * radius * self.count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LengthAndDepth {
    #[default]
    Inc,
    Abs,
}

impl LengthAndDepth {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inc => "INC",
            Self::Abs => "ABS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PressureDrop {
    #[default]
    HydrostaticFriction,
    HydrostaticFrictionAcceleration,
    Hydrostatic,
}

impl PressureDrop {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HydrostaticFriction => "HF-",
            Self::HydrostaticFrictionAcceleration => "HFA",
            Self::Hydrostatic => "H--",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MswParameters {
    pub liner_diameter: f64,
    pub roughness_factor: f64,
    pub length_and_depth: LengthAndDepth,
    pub pressure_drop: PressureDrop,
    pub max_segment_length: f64,
    /// Measured depth of the top segment; defaults to the trajectory start.
    pub reference_md: Option<f64>,
    pub top_well_bore_volume: Option<f64>,
}

impl Default for MswParameters {
    fn default() -> Self {
        Self {
            liner_diameter: 0.152,
            roughness_factor: 1.0e-5,
            length_and_depth: LengthAndDepth::default(),
            pressure_drop: PressureDrop::default(),
            max_segment_length: 200.0,
            reference_md: None,
            top_well_bore_volume: None,
        }
    }
}

impl MswParameters {
    /// Segment splitting divides by `max_segment_length`, so it must be a
    /// positive finite length.
    pub fn validate(&self, well_name: &str) -> ComputeResult<()> {
        if !(self.max_segment_length.is_finite() && self.max_segment_length > 0.0) {
            return Err(CompletionError::input_validation(
                "INPUT.MSW_SEGMENT_LENGTH",
                format!(
                    "well '{well_name}' has maximum MSW segment length {}; it must be positive",
                    self.max_segment_length
                ),
            ));
        }
        if !(self.liner_diameter.is_finite() && self.liner_diameter > 0.0) {
            return Err(CompletionError::input_validation(
                "INPUT.MSW_LINER_DIAMETER",
                format!(
                    "well '{well_name}' has liner diameter {}; it must be positive",
                    self.liner_diameter
                ),
            ));
        }
        Ok(())
    }

    pub fn scale_lengths(&mut self, factor: f64) {
        self.liner_diameter *= factor;
        self.roughness_factor *= factor;
        self.max_segment_length *= factor;
        self.reference_md = self.reference_md.map(|md| md * factor);
        self.top_well_bore_volume = self
            .top_well_bore_volume
            .map(|volume| volume * factor * factor * factor);
    }
}

/// Non-Darcy flow treatment for perforation connections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NonDarcyParameters {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    UserDefined { d_factor: f64 },
    #[serde(rename_all = "camelCase")]
    Computed {
        inertial_coefficient: f64,
        permeability_scaling: f64,
        porosity_scaling: f64,
        relative_gas_density: f64,
        gas_viscosity: f64,
    },
}

impl NonDarcyParameters {
    pub fn computed_defaults() -> Self {
        Self::Computed {
            inertial_coefficient: 883.90,
            permeability_scaling: -1.1045,
            porosity_scaling: 0.0,
            relative_gas_density: 0.8,
            gas_viscosity: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WellExportSettings {
    pub group_name: String,
    pub preferred_phase: String,
    pub reference_depth: Option<f64>,
    pub drainage_radius: Option<f64>,
}

impl Default for WellExportSettings {
    fn default() -> Self {
        Self {
            group_name: "GROUP1".to_string(),
            preferred_phase: "OIL".to_string(),
            reference_depth: None,
            drainage_radius: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Completion, FractureOrientation, MswParameters, NonDarcyParameters, PerforationInterval,
    };

    #[test]
    fn completions_parse_from_tagged_json() {
        let completions: Vec<Completion> = serde_json::from_str(
            r#"[
                { "type": "perforation", "startMd": 100.0, "endMd": 120.0 },
                { "type": "fishbones", "name": "FB1", "subMeasuredDepths": [150.0, 162.0] },
                { "type": "fracture", "name": "F1", "measuredDepth": 200.0,
                  "template": "Ellipse", "orientation": { "azimuth": { "degrees": 30.0 } } },
                { "type": "icdValve", "measuredDepth": 110.0, "count": 2 }
            ]"#,
        )
        .expect("completions should parse");

        assert_eq!(completions.len(), 4);
        match &completions[0] {
            Completion::Perforation(perforation) => {
                assert_eq!(perforation.end_md, 120.0);
                assert_eq!(perforation.diameter, 0.216);
            }
            other => panic!("unexpected completion {other:?}"),
        }
        match &completions[2] {
            Completion::Fracture(fracture) => {
                assert_eq!(fracture.orientation, FractureOrientation::Azimuth { degrees: 30.0 })
            }
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[test]
    fn perforation_activation_follows_time_step() {
        let perforation = PerforationInterval {
            active_from_time_step: Some(3),
            ..PerforationInterval::default()
        };
        assert!(!perforation.is_active_at(2));
        assert!(perforation.is_active_at(3));

        let disabled = PerforationInterval {
            enabled: false,
            ..PerforationInterval::default()
        };
        assert!(!disabled.is_active_at(10));
    }

    #[test]
    fn non_darcy_parameters_parse_by_kind() {
        let parameters: NonDarcyParameters =
            serde_json::from_str(r#"{ "kind": "userDefined", "dFactor": 0.002 }"#)
                .expect("non-darcy should parse");
        assert_eq!(parameters, NonDarcyParameters::UserDefined { d_factor: 0.002 });
    }

    #[test]
    fn msw_parameters_reject_non_positive_segment_length() {
        assert!(MswParameters::default().validate("W1").is_ok());
        for length in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let parameters = MswParameters {
                max_segment_length: length,
                ..MswParameters::default()
            };
            let error = parameters.validate("W1").expect_err("invalid length");
            assert_eq!(error.placeholder(), "INPUT.MSW_SEGMENT_LENGTH");
        }
    }
}
