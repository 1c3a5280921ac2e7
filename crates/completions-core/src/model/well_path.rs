use super::completions::{Completion, MswParameters, NonDarcyParameters, WellExportSettings};
use crate::domain::{CompletionError, ComputeResult, UnitSystem};
use crate::numerics::{Vec3, distance3, lerp3, normalize3, sub3};

/// Polyline trajectory with measured depth per point. `z` is elevation, so
/// true vertical depth is `-z`.
#[derive(Debug, Clone, PartialEq)]
pub struct WellPathGeometry {
    points: Vec<Vec3>,
    measured_depths: Vec<f64>,
}

impl WellPathGeometry {
    pub fn new(points: Vec<Vec3>, measured_depths: Vec<f64>) -> ComputeResult<Self> {
        if points.len() != measured_depths.len() {
            return Err(CompletionError::input_validation(
                "INPUT.WELL_PATH_GEOMETRY",
                format!(
                    "well path has {} points but {} measured depths",
                    points.len(),
                    measured_depths.len()
                ),
            ));
        }
        if points.len() < 2 {
            return Err(CompletionError::input_validation(
                "INPUT.WELL_PATH_GEOMETRY",
                "well path needs at least two points",
            ));
        }
        if measured_depths.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(CompletionError::input_validation(
                "INPUT.WELL_PATH_GEOMETRY",
                "measured depths must be non-decreasing",
            ));
        }
        Ok(Self {
            points,
            measured_depths,
        })
    }

    /// Measured depth accumulated from the point-to-point distances.
    pub fn from_points(points: Vec<Vec3>, start_md: f64) -> ComputeResult<Self> {
        let mut measured_depths = Vec::with_capacity(points.len());
        let mut md = start_md;
        for (index, point) in points.iter().enumerate() {
            if index > 0 {
                md += distance3(points[index - 1], *point);
            }
            measured_depths.push(md);
        }
        Self::new(points, measured_depths)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn measured_depths(&self) -> &[f64] {
        &self.measured_depths
    }

    pub fn true_vertical_depths(&self) -> Vec<f64> {
        self.points.iter().map(|point| -point[2]).collect()
    }

    pub fn start_md(&self) -> f64 {
        self.measured_depths[0]
    }

    pub fn end_md(&self) -> f64 {
        self.measured_depths[self.measured_depths.len() - 1]
    }

    /// Index of the segment holding `md`, with the interpolation fraction.
    fn locate(&self, md: f64) -> (usize, f64) {
        let mds = &self.measured_depths;
        let last_segment = mds.len() - 2;
        let segment = match mds.iter().position(|value| *value > md) {
            Some(0) => 0,
            Some(index) => (index - 1).min(last_segment),
            None => last_segment,
        };
        let span = mds[segment + 1] - mds[segment];
        let fraction = if span > 0.0 {
            ((md - mds[segment]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (segment, fraction)
    }

    /// Interpolated point, clamped to the trajectory ends.
    pub fn point_at_md(&self, md: f64) -> Vec3 {
        let (segment, fraction) = self.locate(md);
        lerp3(self.points[segment], self.points[segment + 1], fraction)
    }

    pub fn tvd_at_md(&self, md: f64) -> f64 {
        -self.point_at_md(md)[2]
    }

    pub fn tangent_at_md(&self, md: f64) -> Vec3 {
        let (segment, _) = self.locate(md);
        normalize3(sub3(self.points[segment + 1], self.points[segment])).unwrap_or([0.0, 0.0, -1.0])
    }

    /// Points between `start_md` and `end_md`, with interpolated end points.
    pub fn clipped_point_subset(&self, start_md: f64, end_md: f64) -> (Vec<Vec3>, Vec<f64>) {
        let start_md = start_md.max(self.start_md());
        let end_md = end_md.min(self.end_md());
        if end_md <= start_md {
            return (Vec::new(), Vec::new());
        }
        let mut points = vec![self.point_at_md(start_md)];
        let mut mds = vec![start_md];
        for (point, md) in self.points.iter().zip(&self.measured_depths) {
            if *md > start_md && *md < end_md {
                points.push(*point);
                mds.push(*md);
            }
        }
        points.push(self.point_at_md(end_md));
        mds.push(end_md);
        (points, mds)
    }
}

/// A well path with its completions and export parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct WellPath {
    pub name: String,
    pub export_name: Option<String>,
    pub unit_system: UnitSystem,
    pub geometry: WellPathGeometry,
    pub completions: Vec<Completion>,
    pub msw: MswParameters,
    pub non_darcy: NonDarcyParameters,
    pub export: WellExportSettings,
}

impl WellPath {
    pub fn new(name: impl Into<String>, unit_system: UnitSystem, geometry: WellPathGeometry) -> Self {
        Self {
            name: name.into(),
            export_name: None,
            unit_system,
            geometry,
            completions: Vec::new(),
            msw: MswParameters::default(),
            non_darcy: NonDarcyParameters::default(),
            export: WellExportSettings::default(),
        }
    }

    /// Name written to the keyword tables.
    pub fn well_name_for_export(&self) -> &str {
        self.export_name.as_deref().unwrap_or(&self.name)
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completions.push(completion);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::WellPathGeometry;
    use crate::domain::ErrorCategory;

    fn l_shaped() -> WellPathGeometry {
        WellPathGeometry::from_points(
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, -100.0], [50.0, 0.0, -100.0]],
            0.0,
        )
        .expect("geometry")
    }

    #[test]
    fn measured_depth_follows_polyline_length() {
        let geometry = l_shaped();
        assert_eq!(geometry.measured_depths(), &[0.0, 100.0, 150.0]);
        assert_eq!(geometry.true_vertical_depths(), vec![0.0, 100.0, 100.0]);
    }

    #[test]
    fn interpolation_clamps_at_ends() {
        let geometry = l_shaped();
        assert_eq!(geometry.point_at_md(50.0), [0.0, 0.0, -50.0]);
        assert_eq!(geometry.point_at_md(125.0), [25.0, 0.0, -100.0]);
        assert_eq!(geometry.point_at_md(-10.0), [0.0, 0.0, 0.0]);
        assert_eq!(geometry.point_at_md(900.0), [50.0, 0.0, -100.0]);
        assert_eq!(geometry.tvd_at_md(100.0), 100.0);
        assert_eq!(geometry.tangent_at_md(120.0), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn clipped_subset_keeps_inner_vertices() {
        let geometry = l_shaped();
        let (points, mds) = geometry.clipped_point_subset(90.0, 110.0);
        assert_eq!(mds, vec![90.0, 100.0, 110.0]);
        assert_eq!(points[0], [0.0, 0.0, -90.0]);
        assert_eq!(points[2], [10.0, 0.0, -100.0]);

        let (points, mds) = geometry.clipped_point_subset(200.0, 300.0);
        assert!(points.is_empty() && mds.is_empty());
    }

    #[test]
    fn decreasing_measured_depth_is_rejected() {
        let error = WellPathGeometry::new(
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, -1.0]],
            vec![10.0, 5.0],
        )
        .expect_err("decreasing md");
        assert_eq!(error.category(), ErrorCategory::InputValidationError);
    }
}
