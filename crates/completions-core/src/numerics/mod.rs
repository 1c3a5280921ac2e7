pub mod hexahedron;
pub mod linalg;

pub type Vec3 = [f64; 3];

pub fn add3(lhs: Vec3, rhs: Vec3) -> Vec3 {
    [lhs[0] + rhs[0], lhs[1] + rhs[1], lhs[2] + rhs[2]]
}

pub fn sub3(lhs: Vec3, rhs: Vec3) -> Vec3 {
    [lhs[0] - rhs[0], lhs[1] - rhs[1], lhs[2] - rhs[2]]
}

pub fn scale3(value: Vec3, factor: f64) -> Vec3 {
    [value[0] * factor, value[1] * factor, value[2] * factor]
}

pub fn dot3(lhs: Vec3, rhs: Vec3) -> f64 {
    lhs[0] * rhs[0] + lhs[1] * rhs[1] + lhs[2] * rhs[2]
}

pub fn cross3(lhs: Vec3, rhs: Vec3) -> Vec3 {
    [
        lhs[1] * rhs[2] - lhs[2] * rhs[1],
        lhs[2] * rhs[0] - lhs[0] * rhs[2],
        lhs[0] * rhs[1] - lhs[1] * rhs[0],
    ]
}

pub fn length3(value: Vec3) -> f64 {
    dot3(value, value).sqrt()
}

pub fn distance3(lhs: Vec3, rhs: Vec3) -> f64 {
    length3(sub3(lhs, rhs))
}

/// Unit vector, or `None` for a zero-length input.
pub fn normalize3(value: Vec3) -> Option<Vec3> {
    let length = length3(value);
    (length > f64::EPSILON).then(|| scale3(value, 1.0 / length))
}

pub fn lerp3(start: Vec3, end: Vec3, t: f64) -> Vec3 {
    add3(start, scale3(sub3(end, start), t))
}

/// Rotates `value` about the unit `axis` by `angle` radians (Rodrigues).
pub fn rotate_about_axis(value: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    let term_parallel = scale3(axis, dot3(axis, value) * (1.0 - cos));
    let term_cross = scale3(cross3(axis, value), sin);
    add3(add3(scale3(value, cos), term_cross), term_parallel)
}

/// Neumaier variant of Kahan summation: the compensation also survives a
/// term larger than the running sum.
fn compensated_add(sum: &mut f64, compensation: &mut f64, value: f64) {
    let next = *sum + value;
    if sum.abs() >= value.abs() {
        *compensation += (*sum - next) + value;
    } else {
        *compensation += (value - next) + *sum;
    }
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut compensation = 0.0;

    for &value in values {
        compensated_add(&mut sum, &mut compensation, value);
    }

    sum + compensation
}

pub fn stable_weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.len() != weights.len() {
        return None;
    }

    let total_weight = stable_sum(weights);
    if total_weight == 0.0 {
        return None;
    }

    let mut sum = 0.0;
    let mut compensation = 0.0;
    for (&value, &weight) in values.iter().zip(weights) {
        compensated_add(&mut sum, &mut compensation, value * weight);
    }
    Some((sum + compensation) / total_weight)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for point in iter {
            bbox.include(*point);
        }
        Some(bbox)
    }

    pub fn include(&mut self, point: Vec3) {
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn overlaps(&self, other: &Self, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            self.min[axis] <= other.max[axis] + tolerance
                && other.min[axis] <= self.max[axis] + tolerance
        })
    }

    pub fn contains(&self, point: Vec3, tolerance: f64) -> bool {
        (0..3).all(|axis| {
            point[axis] >= self.min[axis] - tolerance && point[axis] <= self.max[axis] + tolerance
        })
    }
}
