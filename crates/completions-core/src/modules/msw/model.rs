use crate::domain::{CellAddress, CompletionError, ComputeResult};
use crate::model::completions::{LengthAndDepth, PressureDrop};
use crate::modules::export::ExportLog;
use crate::modules::intersection::GridCellIntersection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MswCompletionKind {
    FishbonesIcd,
    Fishbones,
    Fracture,
    PerforationIcd,
}

impl MswCompletionKind {
    pub const fn is_valve(self) -> bool {
        matches!(self, Self::FishbonesIcd | Self::PerforationIcd)
    }
}

/// Numbering progress. Transitions only go forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberingState {
    Unassigned,
    MainStemNumbered,
    LateralsNumbered,
    Finalized,
}

/// Part of a segment or sub-segment connected to one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct MswCellConnection {
    pub cell: CellAddress,
    pub start_md: f64,
    pub end_md: f64,
}

impl From<&GridCellIntersection> for MswCellConnection {
    fn from(intersection: &GridCellIntersection) -> Self {
        Self {
            cell: intersection.cell.clone(),
            start_md: intersection.start_md,
            end_md: intersection.end_md,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MswSubSegment {
    pub start_md: f64,
    pub end_md: f64,
    pub start_tvd: f64,
    pub end_tvd: f64,
    pub segment_number: Option<usize>,
    pub outlet_segment: Option<usize>,
    pub connections: Vec<MswCellConnection>,
}

impl MswSubSegment {
    pub fn new(start_md: f64, end_md: f64, start_tvd: f64, end_tvd: f64) -> Self {
        Self {
            start_md,
            end_md,
            start_tvd,
            end_tvd,
            segment_number: None,
            outlet_segment: None,
            connections: Vec::new(),
        }
    }

    pub fn length(&self) -> f64 {
        self.end_md - self.start_md
    }

    pub fn depth_change(&self) -> f64 {
        self.end_tvd - self.start_tvd
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValveParameters {
    pub flow_coefficient: f64,
    pub area: f64,
}

/// Lateral or valve hanging off one main-stem segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MswCompletion {
    pub kind: MswCompletionKind,
    pub label: String,
    pub diameter: f64,
    pub roughness: f64,
    pub branch_number: Option<usize>,
    pub sub_segments: Vec<MswSubSegment>,
    pub valve: Option<ValveParameters>,
}

impl MswCompletion {
    pub fn new(kind: MswCompletionKind, label: impl Into<String>, diameter: f64, roughness: f64) -> Self {
        Self {
            kind,
            label: label.into(),
            diameter,
            roughness,
            branch_number: None,
            sub_segments: Vec::new(),
            valve: None,
        }
    }
}

/// Main-stem segment, branch 1.
#[derive(Debug, Clone, PartialEq)]
pub struct MswSegment {
    pub label: String,
    pub start_md: f64,
    pub end_md: f64,
    pub start_tvd: f64,
    pub end_tvd: f64,
    pub segment_number: Option<usize>,
    pub outlet_segment: Option<usize>,
    pub completions: Vec<MswCompletion>,
    pub connections: Vec<MswCellConnection>,
}

impl MswSegment {
    pub fn new(label: impl Into<String>, start_md: f64, end_md: f64, start_tvd: f64, end_tvd: f64) -> Self {
        Self {
            label: label.into(),
            start_md,
            end_md,
            start_tvd,
            end_tvd,
            segment_number: None,
            outlet_segment: None,
            completions: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn length(&self) -> f64 {
        self.end_md - self.start_md
    }

    pub fn depth_change(&self) -> f64 {
        self.end_tvd - self.start_tvd
    }

    pub fn contains_md(&self, md: f64) -> bool {
        md >= self.start_md && md < self.end_md
    }
}

/// Segment tree of one multi-segment well. Segment 1 is the top record.
#[derive(Debug, Clone, PartialEq)]
pub struct MswExportInfo {
    pub well_name: String,
    pub top_md: f64,
    pub top_tvd: f64,
    pub top_well_bore_volume: Option<f64>,
    pub liner_diameter: f64,
    pub roughness_factor: f64,
    pub length_and_depth: LengthAndDepth,
    pub pressure_drop: PressureDrop,
    segments: Vec<MswSegment>,
    state: NumberingState,
    next_segment: usize,
    next_branch: usize,
}

pub const TOP_SEGMENT: usize = 1;
pub const MAIN_STEM_BRANCH: usize = 1;

impl MswExportInfo {
    pub fn new(well_name: impl Into<String>, top_md: f64, top_tvd: f64) -> Self {
        Self {
            well_name: well_name.into(),
            top_md,
            top_tvd,
            top_well_bore_volume: None,
            liner_diameter: 0.152,
            roughness_factor: 1.0e-5,
            length_and_depth: LengthAndDepth::Inc,
            pressure_drop: PressureDrop::HydrostaticFriction,
            segments: Vec::new(),
            state: NumberingState::Unassigned,
            next_segment: TOP_SEGMENT + 1,
            next_branch: MAIN_STEM_BRANCH + 1,
        }
    }

    pub fn state(&self) -> NumberingState {
        self.state
    }

    pub fn segments(&self) -> &[MswSegment] {
        &self.segments
    }

    pub fn add_segment(&mut self, segment: MswSegment) -> ComputeResult<()> {
        self.require(NumberingState::Unassigned, "add a segment")?;
        self.segments.push(segment);
        Ok(())
    }

    pub fn segments_mut(&mut self) -> ComputeResult<&mut [MswSegment]> {
        self.require(NumberingState::Unassigned, "edit segments")?;
        Ok(&mut self.segments)
    }

    /// Main stem in MD order, numbered from 2 with each outlet the previous.
    pub fn assign_main_stem_numbers(&mut self) -> ComputeResult<()> {
        self.require(NumberingState::Unassigned, "number the main stem")?;
        self.segments
            .sort_by(|lhs, rhs| lhs.start_md.total_cmp(&rhs.start_md));
        let mut outlet = TOP_SEGMENT;
        for segment in &mut self.segments {
            let number = self.next_segment;
            self.next_segment += 1;
            segment.segment_number = Some(number);
            segment.outlet_segment = Some(outlet);
            outlet = number;
        }
        self.state = NumberingState::MainStemNumbered;
        Ok(())
    }

    /// Valves and fishbone laterals first, then fracture laterals.
    pub fn assign_lateral_numbers(&mut self, log: &mut ExportLog) -> ComputeResult<()> {
        self.require(NumberingState::MainStemNumbered, "number laterals")?;
        let mut next_segment = self.next_segment;
        let mut next_branch = self.next_branch;
        let well_name = self.well_name.clone();

        for segment in &mut self.segments {
            let Some(main_number) = segment.segment_number else {
                continue;
            };
            let mut valve_segment = None;
            for completion in segment
                .completions
                .iter_mut()
                .filter(|completion| completion.kind.is_valve())
            {
                let first = number_lateral(
                    completion,
                    main_number,
                    &mut next_segment,
                    &mut next_branch,
                    &well_name,
                    log,
                );
                if completion.kind == MswCompletionKind::FishbonesIcd && valve_segment.is_none() {
                    valve_segment = first;
                }
            }
            let lateral_outlet = valve_segment.unwrap_or(main_number);
            for completion in segment
                .completions
                .iter_mut()
                .filter(|completion| completion.kind == MswCompletionKind::Fishbones)
            {
                number_lateral(
                    completion,
                    lateral_outlet,
                    &mut next_segment,
                    &mut next_branch,
                    &well_name,
                    log,
                );
            }
        }

        for segment in &mut self.segments {
            let Some(main_number) = segment.segment_number else {
                continue;
            };
            for completion in segment
                .completions
                .iter_mut()
                .filter(|completion| completion.kind == MswCompletionKind::Fracture)
            {
                number_lateral(
                    completion,
                    main_number,
                    &mut next_segment,
                    &mut next_branch,
                    &well_name,
                    log,
                );
            }
        }

        self.next_segment = next_segment;
        self.next_branch = next_branch;
        self.state = NumberingState::LateralsNumbered;
        Ok(())
    }

    pub fn finalize(&mut self) -> ComputeResult<()> {
        self.require(NumberingState::LateralsNumbered, "finalize")?;
        self.state = NumberingState::Finalized;
        Ok(())
    }

    pub fn number_segments(&mut self, log: &mut ExportLog) -> ComputeResult<()> {
        self.assign_main_stem_numbers()?;
        self.assign_lateral_numbers(log)?;
        self.finalize()
    }

    /// Every numbered segment as `(segment, outlet)`, top record first.
    pub fn segment_links(&self) -> Vec<(usize, Option<usize>)> {
        let mut links = vec![(TOP_SEGMENT, None)];
        for segment in &self.segments {
            if let Some(number) = segment.segment_number {
                links.push((number, segment.outlet_segment));
            }
        }
        for sub_segment in self
            .segments
            .iter()
            .flat_map(|segment| &segment.completions)
            .flat_map(|completion| &completion.sub_segments)
        {
            if let Some(number) = sub_segment.segment_number {
                links.push((number, sub_segment.outlet_segment));
            }
        }
        links.sort_by_key(|(number, _)| *number);
        links
    }

    fn require(&self, expected: NumberingState, action: &str) -> ComputeResult<()> {
        if self.state != expected {
            return Err(CompletionError::internal(
                "MSW.STATE",
                format!(
                    "cannot {action} for well '{}' in state {:?}",
                    self.well_name, self.state
                ),
            ));
        }
        Ok(())
    }
}

/// Gives the lateral a branch and numbers its chain; returns the first
/// segment number, or `None` when the lateral is empty and skipped.
fn number_lateral(
    completion: &mut MswCompletion,
    outlet: usize,
    next_segment: &mut usize,
    next_branch: &mut usize,
    well_name: &str,
    log: &mut ExportLog,
) -> Option<usize> {
    if completion.sub_segments.is_empty() {
        log.warning(
            "MSW.EMPTY_LATERAL",
            format!(
                "Lateral '{}' on well '{}' has no segments inside active cells and is not exported",
                completion.label, well_name
            ),
        );
        return None;
    }
    completion.branch_number = Some(*next_branch);
    *next_branch += 1;

    let mut previous = outlet;
    let mut first = None;
    for sub_segment in &mut completion.sub_segments {
        let number = *next_segment;
        *next_segment += 1;
        sub_segment.segment_number = Some(number);
        sub_segment.outlet_segment = Some(previous);
        first.get_or_insert(number);
        previous = number;
    }
    first
}
