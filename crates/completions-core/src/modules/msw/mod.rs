//! Multi-segment well topology: main stem, valves and laterals.

mod builder;
mod model;

pub use builder::{build_fishbones_msw, build_fractures_msw, build_perforations_msw};
pub use model::{
    MAIN_STEM_BRANCH, MswCellConnection, MswCompletion, MswCompletionKind, MswExportInfo,
    MswSegment, MswSubSegment, NumberingState, TOP_SEGMENT, ValveParameters,
};
