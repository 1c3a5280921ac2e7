//! Well trajectory versus grid cell intersection.

use crate::common::constants::MIN_INTERSECTION_LENGTH;
use crate::domain::CellAddress;
use crate::model::grid::GridProvider;
use crate::model::well_path::WellPathGeometry;
use crate::numerics::hexahedron::{self, HexCorners};
use crate::numerics::{BoundingBox, Vec3, add3, distance3, lerp3, normalize3, sub3};

/// One contiguous piece of trajectory inside one active cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCellIntersection {
    pub cell: CellAddress,
    pub start_md: f64,
    pub end_md: f64,
    pub start_point: Vec3,
    pub end_point: Vec3,
    /// Trajectory length projected on the cell's I, J and K axes.
    pub lengths_in_cell: Vec3,
}

impl GridCellIntersection {
    pub fn global_cell_index(&self) -> usize {
        self.cell.global_cell_index
    }

    pub fn start_tvd(&self) -> f64 {
        -self.start_point[2]
    }

    pub fn end_tvd(&self) -> f64 {
        -self.end_point[2]
    }

    pub fn length(&self) -> f64 {
        self.end_md - self.start_md
    }

    pub fn direction(&self) -> Option<Vec3> {
        normalize3(sub3(self.end_point, self.start_point))
    }
}

#[derive(Debug, Clone)]
struct Piece {
    cell: usize,
    start_md: f64,
    end_md: f64,
    start_point: Vec3,
    end_point: Vec3,
}

/// Intersections of the polyline `points`/`mds` with active cells, sorted by
/// entry MD. Refined cells are reported in their LGR.
pub fn find_cell_intersections(
    grid: &dyn GridProvider,
    points: &[Vec3],
    mds: &[f64],
) -> Vec<GridCellIntersection> {
    if points.len() < 2 || points.len() != mds.len() {
        return Vec::new();
    }

    let main_cells: Vec<(usize, HexCorners, BoundingBox)> = grid
        .cells_in_grid(0)
        .filter_map(|cell| {
            let corners = grid.cell_corners(cell)?;
            Some((cell, corners, hexahedron::bounding_box(&corners)))
        })
        .collect();

    let mut pieces = Vec::new();
    for index in 0..points.len() - 1 {
        let (start, end) = (points[index], points[index + 1]);
        let (md0, md1) = (mds[index], mds[index + 1]);
        if distance3(start, end) <= MIN_INTERSECTION_LENGTH {
            continue;
        }
        let Some(segment_box) = BoundingBox::from_points(&[start, end]) else {
            continue;
        };

        for (cell, corners, cell_box) in &main_cells {
            if !cell_box.overlaps(&segment_box, 1.0e-6) {
                continue;
            }
            for (t0, t1) in hexahedron::clip_segment(corners, start, end) {
                if grid.child_grid_of_cell(*cell).is_some() {
                    let (sub_start, sub_end) = (lerp3(start, end, t0), lerp3(start, end, t1));
                    let (sub_md0, sub_md1) = (md0 + (md1 - md0) * t0, md0 + (md1 - md0) * t1);
                    for child in grid.cells_refining(*cell) {
                        collect_pieces(
                            grid,
                            child,
                            (sub_start, sub_end),
                            (sub_md0, sub_md1),
                            &mut pieces,
                        );
                    }
                } else {
                    push_piece(grid, *cell, (start, end), (md0, md1), (t0, t1), &mut pieces);
                }
            }
        }
    }

    pieces.sort_by(|lhs, rhs| lhs.start_md.total_cmp(&rhs.start_md));
    merge_pieces(grid, pieces)
}

/// Intersections of the trajectory between two measured depths.
pub fn find_intersections_in_range(
    grid: &dyn GridProvider,
    geometry: &WellPathGeometry,
    start_md: f64,
    end_md: f64,
) -> Vec<GridCellIntersection> {
    let (points, mds) = geometry.clipped_point_subset(start_md, end_md);
    find_cell_intersections(grid, &points, &mds)
}

fn collect_pieces(
    grid: &dyn GridProvider,
    cell: usize,
    segment: (Vec3, Vec3),
    mds: (f64, f64),
    pieces: &mut Vec<Piece>,
) {
    let Some(corners) = grid.cell_corners(cell) else {
        return;
    };
    for interval in hexahedron::clip_segment(&corners, segment.0, segment.1) {
        push_piece(grid, cell, segment, mds, interval, pieces);
    }
}

fn push_piece(
    grid: &dyn GridProvider,
    cell: usize,
    segment: (Vec3, Vec3),
    mds: (f64, f64),
    interval: (f64, f64),
    pieces: &mut Vec<Piece>,
) {
    if !grid.is_active(cell) {
        return;
    }
    let (start, end) = segment;
    let (md0, md1) = mds;
    let (t0, t1) = interval;
    let start_md = md0 + (md1 - md0) * t0;
    let end_md = md0 + (md1 - md0) * t1;
    if end_md - start_md <= MIN_INTERSECTION_LENGTH {
        return;
    }
    pieces.push(Piece {
        cell,
        start_md,
        end_md,
        start_point: lerp3(start, end, t0),
        end_point: lerp3(start, end, t1),
    });
}

fn merge_pieces(grid: &dyn GridProvider, pieces: Vec<Piece>) -> Vec<GridCellIntersection> {
    let mut intersections: Vec<GridCellIntersection> = Vec::new();
    for piece in pieces {
        let Some(corners) = grid.cell_corners(piece.cell) else {
            continue;
        };
        let lengths = hexahedron::lengths_in_local_axes(
            &corners,
            sub3(piece.end_point, piece.start_point),
        );
        let continues_last = intersections.last().is_some_and(|last| {
            last.cell.global_cell_index == piece.cell
                && (last.end_md - piece.start_md).abs() <= MIN_INTERSECTION_LENGTH
        });
        if continues_last {
            if let Some(last) = intersections.last_mut() {
                last.end_md = piece.end_md;
                last.end_point = piece.end_point;
                last.lengths_in_cell = add3(last.lengths_in_cell, lengths);
            }
            continue;
        }
        let Some(cell) = grid.cell_address(piece.cell) else {
            continue;
        };
        intersections.push(GridCellIntersection {
            cell,
            start_md: piece.start_md,
            end_md: piece.end_md,
            start_point: piece.start_point,
            end_point: piece.end_point,
            lengths_in_cell: lengths,
        });
    }
    intersections
}

/// Splits every intersection into `trunc(length / max_length) + 1` equal parts.
pub fn split_to_max_length(
    intersections: &[GridCellIntersection],
    max_length: f64,
) -> Vec<GridCellIntersection> {
    if !(max_length > 0.0) {
        return intersections.to_vec();
    }
    let mut split = Vec::with_capacity(intersections.len());
    for intersection in intersections {
        let count = (intersection.length() / max_length).trunc() as usize + 1;
        for part in 0..count {
            let (f0, f1) = (part as f64 / count as f64, (part + 1) as f64 / count as f64);
            split.push(GridCellIntersection {
                cell: intersection.cell.clone(),
                start_md: intersection.start_md + intersection.length() * f0,
                end_md: intersection.start_md + intersection.length() * f1,
                start_point: lerp3(intersection.start_point, intersection.end_point, f0),
                end_point: lerp3(intersection.start_point, intersection.end_point, f1),
                lengths_in_cell: [
                    intersection.lengths_in_cell[0] / count as f64,
                    intersection.lengths_in_cell[1] / count as f64,
                    intersection.lengths_in_cell[2] / count as f64,
                ],
            });
        }
    }
    split
}

/// Active cell holding `point`, preferring the LGR cell when refined.
pub fn find_cell_containing_point(grid: &dyn GridProvider, point: Vec3) -> Option<usize> {
    let host = grid.cells_in_grid(0).find(|cell| {
        grid.cell_corners(*cell).is_some_and(|corners| {
            hexahedron::bounding_box(&corners).contains(point, 1.0e-9)
                && hexahedron::contains_point(&corners, point)
        })
    })?;
    let cell = if grid.child_grid_of_cell(host).is_some() {
        grid.cells_refining(host).into_iter().find(|child| {
            grid.cell_corners(*child)
                .is_some_and(|corners| hexahedron::contains_point(&corners, point))
        })?
    } else {
        host
    };
    grid.is_active(cell).then_some(cell)
}

#[cfg(test)]
mod tests {
    use super::{find_cell_containing_point, find_cell_intersections, split_to_max_length};
    use crate::domain::UnitSystem;
    use crate::model::grid::{CartesianGridSpec, GridCase, GridProvider, LgrSpec};

    fn column_case() -> GridCase {
        GridCase::cartesian(
            "CASE",
            UnitSystem::Metric,
            &CartesianGridSpec::uniform([1, 1, 3], [100.0, 100.0, 10.0], [0.0, 0.0], -1000.0),
        )
        .expect("grid")
    }

    #[test]
    fn vertical_well_crosses_each_layer_once() {
        let case = column_case();
        let points = [[50.0, 50.0, -990.0], [50.0, 50.0, -1040.0]];
        let intersections = find_cell_intersections(&case, &points, &[990.0, 1040.0]);

        assert_eq!(intersections.len(), 3);
        for (k, intersection) in intersections.iter().enumerate() {
            assert_eq!(intersection.cell.ijk, [0, 0, k]);
            assert!((intersection.length() - 10.0).abs() < 1.0e-9);
            assert!((intersection.lengths_in_cell[2] - 10.0).abs() < 1.0e-9);
            assert!(intersection.lengths_in_cell[0].abs() < 1.0e-9);
        }
        assert!((intersections[0].start_md - 1000.0).abs() < 1.0e-9);
        assert!((intersections[0].start_tvd() - 1000.0).abs() < 1.0e-9);
    }

    #[test]
    fn pieces_from_consecutive_polyline_segments_are_merged() {
        let case = column_case();
        let points = [
            [50.0, 50.0, -1001.0],
            [50.0, 50.0, -1005.0],
            [50.0, 50.0, -1009.0],
        ];
        let intersections = find_cell_intersections(&case, &points, &[1.0, 5.0, 9.0]);
        assert_eq!(intersections.len(), 1);
        assert!((intersections[0].length() - 8.0).abs() < 1.0e-9);
        assert!((intersections[0].lengths_in_cell[2] - 8.0).abs() < 1.0e-9);
    }

    #[test]
    fn inactive_cells_are_skipped() {
        let mut case = column_case();
        case.set_active_cells(&[true, false, true]).expect("actnum");
        let points = [[50.0, 50.0, -990.0], [50.0, 50.0, -1040.0]];
        let intersections = find_cell_intersections(&case, &points, &[0.0, 50.0]);
        let layers: Vec<usize> = intersections.iter().map(|hit| hit.cell.ijk[2]).collect();
        assert_eq!(layers, vec![0, 2]);
    }

    #[test]
    fn refined_cells_are_reported_in_their_lgr() {
        let mut case = column_case();
        case.add_lgr(&LgrSpec {
            name: "LGR1".to_string(),
            parent_min: [0, 0, 1],
            parent_max: [0, 0, 1],
            refinement: [1, 1, 2],
        })
        .expect("lgr");
        let points = [[50.0, 50.0, -990.0], [50.0, 50.0, -1040.0]];
        let intersections = find_cell_intersections(&case, &points, &[0.0, 50.0]);

        assert_eq!(intersections.len(), 4);
        assert_eq!(intersections[1].cell.grid_name.as_deref(), Some("LGR1"));
        assert_eq!(intersections[1].cell.ijk, [0, 0, 0]);
        assert_eq!(intersections[2].cell.ijk, [0, 0, 1]);
        assert!((intersections[2].length() - 5.0).abs() < 1.0e-9);
        assert!(intersections[3].cell.is_main_grid());
    }

    #[test]
    fn empty_input_yields_no_intersections() {
        let case = column_case();
        assert!(find_cell_intersections(&case, &[], &[]).is_empty());
        let outside = [[500.0, 500.0, 0.0], [500.0, 500.0, -10.0]];
        assert!(find_cell_intersections(&case, &outside, &[0.0, 10.0]).is_empty());
    }

    #[test]
    fn split_parts_share_length_evenly() {
        let case = column_case();
        let points = [[50.0, 50.0, -1000.0], [50.0, 50.0, -1010.0]];
        let intersections = find_cell_intersections(&case, &points, &[0.0, 10.0]);
        let split = split_to_max_length(&intersections, 4.0);
        assert_eq!(split.len(), 3);
        assert!((split[1].start_md - 10.0 / 3.0).abs() < 1.0e-9);
        assert!((split[2].end_md - 10.0).abs() < 1.0e-9);
    }

    #[test]
    fn point_lookup_prefers_lgr_cells() {
        let mut case = column_case();
        case.add_lgr(&LgrSpec {
            name: "LGR1".to_string(),
            parent_min: [0, 0, 0],
            parent_max: [0, 0, 0],
            refinement: [2, 1, 1],
        })
        .expect("lgr");
        let cell = find_cell_containing_point(&case, [75.0, 50.0, -1005.0]).expect("cell");
        let address = case.cell_address(cell).expect("address");
        assert_eq!(address.grid_index, 1);
        assert_eq!(address.ijk, [1, 0, 0]);
        assert!(find_cell_containing_point(&case, [75.0, 50.0, -900.0]).is_none());
    }
}
