//! Hexahedral cell geometry.
//!
//! Corner order: 0..3 walk the top face (K-) as (i-,j-), (i+,j-), (i+,j+),
//! (i-,j+); corners 4..7 repeat the pattern on the bottom face (K+).

use super::{BoundingBox, Vec3, add3, cross3, dot3, length3, lerp3, scale3, sub3};

pub type HexCorners = [Vec3; 8];

const FACE_QUADS: [[usize; 4]; 6] = [
    [0, 3, 7, 4],
    [1, 2, 6, 5],
    [0, 1, 5, 4],
    [3, 2, 6, 7],
    [0, 1, 2, 3],
    [4, 5, 6, 7],
];

const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

const PARAMETER_EPSILON: f64 = 1.0e-10;

pub fn center(corners: &HexCorners) -> Vec3 {
    let sum = corners.iter().fold([0.0; 3], |acc, corner| add3(acc, *corner));
    scale3(sum, 1.0 / 8.0)
}

pub fn bounding_box(corners: &HexCorners) -> BoundingBox {
    let mut bbox = BoundingBox {
        min: corners[0],
        max: corners[0],
    };
    for corner in &corners[1..] {
        bbox.include(*corner);
    }
    bbox
}

/// Mean edge vectors along the cell's I, J and K directions.
pub fn axis_vectors(corners: &HexCorners) -> [Vec3; 3] {
    let mean = |pairs: [(usize, usize); 4]| {
        let sum = pairs.iter().fold([0.0; 3], |acc, &(from, to)| {
            add3(acc, sub3(corners[to], corners[from]))
        });
        scale3(sum, 0.25)
    };
    [
        mean([(0, 1), (3, 2), (4, 5), (7, 6)]),
        mean([(0, 3), (1, 2), (4, 7), (5, 6)]),
        mean([(0, 4), (1, 5), (2, 6), (3, 7)]),
    ]
}

/// Cell extent (DX, DY, DZ) along the local axes.
pub fn dimensions(corners: &HexCorners) -> Vec3 {
    let axes = axis_vectors(corners);
    [length3(axes[0]), length3(axes[1]), length3(axes[2])]
}

/// Absolute projections of `vector` onto the cell's unit local axes.
pub fn lengths_in_local_axes(corners: &HexCorners, vector: Vec3) -> Vec3 {
    let axes = axis_vectors(corners);
    let mut lengths = [0.0; 3];
    for (axis, length) in axes.iter().zip(lengths.iter_mut()) {
        let axis_length = length3(*axis);
        if axis_length > 0.0 {
            *length = (dot3(vector, *axis) / axis_length).abs();
        }
    }
    lengths
}

pub fn contains_point(corners: &HexCorners, point: Vec3) -> bool {
    let scale = dimensions(corners).iter().fold(0.0_f64, |acc, value| acc.max(*value));
    let tolerance = scale.max(1.0) * 1.0e-9;
    let bbox = bounding_box(corners);
    if !bbox.contains(point, tolerance) {
        return false;
    }
    TETRAHEDRA.iter().any(|tet| {
        point_in_tetrahedron(
            [corners[tet[0]], corners[tet[1]], corners[tet[2]], corners[tet[3]]],
            point,
        )
    })
}

fn point_in_tetrahedron(tet: [Vec3; 4], point: Vec3) -> bool {
    let e1 = sub3(tet[1], tet[0]);
    let e2 = sub3(tet[2], tet[0]);
    let e3 = sub3(tet[3], tet[0]);
    let volume = dot3(e1, cross3(e2, e3));
    if volume.abs() <= f64::EPSILON {
        return false;
    }
    let rel = sub3(point, tet[0]);
    let l1 = dot3(rel, cross3(e2, e3)) / volume;
    let l2 = dot3(e1, cross3(rel, e3)) / volume;
    let l3 = dot3(e1, cross3(e2, rel)) / volume;
    let l0 = 1.0 - l1 - l2 - l3;
    [l0, l1, l2, l3]
        .iter()
        .all(|value| *value >= -PARAMETER_EPSILON)
}

/// Line parameters in [0, 1] where the segment crosses a face triangle.
fn face_crossings(corners: &HexCorners, start: Vec3, end: Vec3) -> Vec<f64> {
    let direction = sub3(end, start);
    let mut crossings = Vec::new();
    for quad in FACE_QUADS {
        for triangle in [[quad[0], quad[1], quad[2]], [quad[0], quad[2], quad[3]]] {
            if let Some(t) = segment_triangle_parameter(
                start,
                direction,
                [
                    corners[triangle[0]],
                    corners[triangle[1]],
                    corners[triangle[2]],
                ],
            ) {
                crossings.push(t);
            }
        }
    }
    crossings
}

fn segment_triangle_parameter(origin: Vec3, direction: Vec3, triangle: [Vec3; 3]) -> Option<f64> {
    let edge1 = sub3(triangle[1], triangle[0]);
    let edge2 = sub3(triangle[2], triangle[0]);
    let p = cross3(direction, edge2);
    let determinant = dot3(edge1, p);
    if determinant.abs() <= f64::EPSILON * length3(edge1) * length3(edge2) * length3(direction) {
        return None;
    }
    let inverse = 1.0 / determinant;
    let s = sub3(origin, triangle[0]);
    let u = dot3(s, p) * inverse;
    if !(-PARAMETER_EPSILON..=1.0 + PARAMETER_EPSILON).contains(&u) {
        return None;
    }
    let q = cross3(s, edge1);
    let v = dot3(direction, q) * inverse;
    if v < -PARAMETER_EPSILON || u + v > 1.0 + PARAMETER_EPSILON {
        return None;
    }
    let t = dot3(edge2, q) * inverse;
    (-PARAMETER_EPSILON..=1.0 + PARAMETER_EPSILON)
        .contains(&t)
        .then(|| t.clamp(0.0, 1.0))
}

/// Parameter intervals of the segment `start`..`end` lying inside the cell.
pub fn clip_segment(corners: &HexCorners, start: Vec3, end: Vec3) -> Vec<(f64, f64)> {
    let mut parameters = face_crossings(corners, start, end);
    parameters.push(0.0);
    parameters.push(1.0);
    parameters.sort_by(f64::total_cmp);
    parameters.dedup_by(|lhs, rhs| (*lhs - *rhs).abs() <= PARAMETER_EPSILON);

    let mut intervals: Vec<(f64, f64)> = Vec::new();
    for window in parameters.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        if t1 - t0 <= PARAMETER_EPSILON {
            continue;
        }
        let midpoint = lerp3(start, end, 0.5 * (t0 + t1));
        if !contains_point(corners, midpoint) {
            continue;
        }
        match intervals.last_mut() {
            Some(last) if (last.1 - t0).abs() <= PARAMETER_EPSILON => last.1 = t1,
            _ => intervals.push((t0, t1)),
        }
    }
    intervals
}

/// Corners of an axis-aligned box; `top` is the K- face elevation.
pub fn box_corners(min_xy: [f64; 2], max_xy: [f64; 2], top: f64, bottom: f64) -> HexCorners {
    [
        [min_xy[0], min_xy[1], top],
        [max_xy[0], min_xy[1], top],
        [max_xy[0], max_xy[1], top],
        [min_xy[0], max_xy[1], top],
        [min_xy[0], min_xy[1], bottom],
        [max_xy[0], min_xy[1], bottom],
        [max_xy[0], max_xy[1], bottom],
        [min_xy[0], max_xy[1], bottom],
    ]
}

/// Trilinear interpolation inside the cell; `uvw` in [0, 1]^3 along I, J, K.
pub fn trilinear_point(corners: &HexCorners, uvw: Vec3) -> Vec3 {
    let [u, v, w] = uvw;
    let top = lerp3(
        lerp3(corners[0], corners[1], u),
        lerp3(corners[3], corners[2], u),
        v,
    );
    let bottom = lerp3(
        lerp3(corners[4], corners[5], u),
        lerp3(corners[7], corners[6], u),
        v,
    );
    lerp3(top, bottom, w)
}

#[cfg(test)]
mod tests {
    use super::{
        box_corners, center, clip_segment, contains_point, dimensions, lengths_in_local_axes,
        trilinear_point,
    };

    fn unit_cell() -> super::HexCorners {
        box_corners([0.0, 0.0], [10.0, 20.0], 0.0, -5.0)
    }

    #[test]
    fn box_cell_dimensions_and_center() {
        let corners = unit_cell();
        assert_eq!(dimensions(&corners), [10.0, 20.0, 5.0]);
        assert_eq!(center(&corners), [5.0, 10.0, -2.5]);
        assert_eq!(trilinear_point(&corners, [0.5, 0.5, 0.5]), [5.0, 10.0, -2.5]);
    }

    #[test]
    fn containment_uses_closed_cell() {
        let corners = unit_cell();
        assert!(contains_point(&corners, [5.0, 10.0, -2.5]));
        assert!(contains_point(&corners, [0.0, 0.0, 0.0]));
        assert!(!contains_point(&corners, [11.0, 10.0, -2.5]));
        assert!(!contains_point(&corners, [5.0, 10.0, 1.0]));
    }

    #[test]
    fn vertical_segment_through_cell_is_clipped_at_faces() {
        let corners = unit_cell();
        let intervals = clip_segment(&corners, [5.0, 10.0, 5.0], [5.0, 10.0, -15.0]);
        assert_eq!(intervals.len(), 1);
        let (t0, t1) = intervals[0];
        assert!((t0 - 0.25).abs() < 1.0e-9);
        assert!((t1 - 0.5).abs() < 1.0e-9);
    }

    #[test]
    fn segment_outside_cell_yields_no_interval() {
        let corners = unit_cell();
        assert!(clip_segment(&corners, [20.0, 0.0, 0.0], [30.0, 0.0, -5.0]).is_empty());
    }

    #[test]
    fn segment_starting_inside_keeps_start_parameter() {
        let corners = unit_cell();
        let intervals = clip_segment(&corners, [5.0, 10.0, -2.5], [15.0, 10.0, -2.5]);
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].0, 0.0);
        assert!((intervals[0].1 - 0.5).abs() < 1.0e-9);
    }

    #[test]
    fn diagonal_vector_projects_onto_local_axes() {
        let corners = unit_cell();
        let lengths = lengths_in_local_axes(&corners, [3.0, -4.0, -2.0]);
        assert!((lengths[0] - 3.0).abs() < 1.0e-12);
        assert!((lengths[1] - 4.0).abs() < 1.0e-12);
        assert!((lengths[2] - 2.0).abs() < 1.0e-12);
    }
}
