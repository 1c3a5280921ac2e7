use super::completions::FishbonesSubs;
use super::well_path::WellPathGeometry;
use crate::domain::ComputeResult;
use crate::numerics::{Vec3, add3, cross3, normalize3, rotate_about_axis, scale3};

const LATERAL_STEP_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct LateralTrajectory {
    pub sub_index: usize,
    pub lateral_index: usize,
    pub sub_md: f64,
    /// Measured depth continues from the sub's position on the main bore.
    pub geometry: WellPathGeometry,
}

/// Builds the lateral trajectories leaving every sub of `fishbones`.
pub fn lateral_trajectories(
    fishbones: &FishbonesSubs,
    main_bore: &WellPathGeometry,
) -> ComputeResult<Vec<LateralTrajectory>> {
    let mut laterals = Vec::new();
    if fishbones.lateral_length <= 0.0 || fishbones.laterals_per_sub == 0 {
        return Ok(laterals);
    }

    for (sub_index, sub_md) in fishbones.sub_measured_depths.iter().copied().enumerate() {
        let origin = main_bore.point_at_md(sub_md);
        let tangent = main_bore.tangent_at_md(sub_md);
        let reference = normalize3(cross3(tangent, [0.0, 0.0, 1.0])).unwrap_or([1.0, 0.0, 0.0]);

        for lateral_index in 0..fishbones.laterals_per_sub {
            let rotation = (fishbones.rotation_offset_deg
                + 360.0 * lateral_index as f64 / fishbones.laterals_per_sub as f64)
                .to_radians();
            let radial = rotate_about_axis(reference, tangent, rotation);
            let points = trace_lateral(fishbones, origin, tangent, radial);
            let geometry = WellPathGeometry::from_points(points, sub_md)?;
            laterals.push(LateralTrajectory {
                sub_index,
                lateral_index,
                sub_md,
                geometry,
            });
        }
    }
    Ok(laterals)
}

fn trace_lateral(fishbones: &FishbonesSubs, origin: Vec3, tangent: Vec3, radial: Vec3) -> Vec<Vec3> {
    let mut points = vec![origin];
    let mut position = origin;
    let mut travelled = 0.0;
    while travelled < fishbones.lateral_length {
        let step = LATERAL_STEP_LENGTH.min(fishbones.lateral_length - travelled);
        let angle = (fishbones.exit_angle_deg + fishbones.build_angle_deg_per_length * travelled)
            .min(90.0)
            .to_radians();
        let direction = add3(scale3(tangent, angle.cos()), scale3(radial, angle.sin()));
        position = add3(position, scale3(direction, step));
        points.push(position);
        travelled += step;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::lateral_trajectories;
    use crate::model::completions::FishbonesSubs;
    use crate::model::well_path::WellPathGeometry;
    use crate::numerics::distance3;

    fn horizontal_bore() -> WellPathGeometry {
        WellPathGeometry::from_points(vec![[0.0, 0.0, -1000.0], [500.0, 0.0, -1000.0]], 1000.0)
            .expect("geometry")
    }

    #[test]
    fn every_sub_emits_configured_lateral_count() {
        let fishbones = FishbonesSubs {
            sub_measured_depths: vec![1100.0, 1200.0],
            laterals_per_sub: 4,
            lateral_length: 10.5,
            ..FishbonesSubs::default()
        };
        let laterals = lateral_trajectories(&fishbones, &horizontal_bore()).expect("laterals");

        assert_eq!(laterals.len(), 8);
        for lateral in &laterals {
            let mds = lateral.geometry.measured_depths();
            assert_eq!(mds[0], lateral.sub_md);
            assert!((mds[mds.len() - 1] - lateral.sub_md - 10.5).abs() < 1.0e-9);
        }
        assert_eq!(laterals[4].sub_index, 1);
        assert_eq!(laterals[4].geometry.points()[0], [200.0, 0.0, -1000.0]);
    }

    #[test]
    fn laterals_leave_the_main_bore() {
        let fishbones = FishbonesSubs {
            sub_measured_depths: vec![1100.0],
            laterals_per_sub: 2,
            ..FishbonesSubs::default()
        };
        let laterals = lateral_trajectories(&fishbones, &horizontal_bore()).expect("laterals");
        let tip_first = *laterals[0].geometry.points().last().expect("tip");
        let tip_second = *laterals[1].geometry.points().last().expect("tip");

        // Opposite laterals end on opposite sides of the bore.
        assert!(distance3(tip_first, tip_second) > 1.0);
        assert!((tip_first[1] + tip_second[1]).abs() < 1.0e-9);
        assert!((tip_first[2] + tip_second[2] + 2000.0).abs() < 1.0e-9);
    }

    #[test]
    fn zero_length_laterals_produce_nothing() {
        let fishbones = FishbonesSubs {
            sub_measured_depths: vec![1100.0],
            lateral_length: 0.0,
            ..FishbonesSubs::default()
        };
        assert!(
            lateral_trajectories(&fishbones, &horizontal_bore())
                .expect("laterals")
                .is_empty()
        );
    }
}
