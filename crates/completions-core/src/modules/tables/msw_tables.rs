//! WELSEGS, COMPSEGS and WSEGVALV tables for one numbered MSW topology.

use super::compdat::lgr_keyword;
use super::formatter::{
    Column, ColumnFormat, KeywordTable, TableDocument, TableKind, TableSection, Value,
};
use crate::common::units::ExportUnits;
use crate::domain::{CompletionError, ComputeResult};
use crate::model::completions::LengthAndDepth;
use crate::modules::msw::{
    MAIN_STEM_BRANCH, MswCellConnection, MswCompletion, MswExportInfo, NumberingState,
};
use std::collections::HashSet;

fn require_finalized(info: &MswExportInfo) -> ComputeResult<()> {
    if info.state() != NumberingState::Finalized {
        return Err(CompletionError::internal(
            "MSW.NOT_FINALIZED",
            format!(
                "segments of well '{}' must be numbered before export, state is {:?}",
                info.well_name,
                info.state()
            ),
        ));
    }
    Ok(())
}

/// Length and depth columns of one segment row.
fn length_and_depth(
    info: &MswExportInfo,
    units: &ExportUnits,
    (start_md, end_md): (f64, f64),
    (start_tvd, end_tvd): (f64, f64),
) -> [Value; 2] {
    match info.length_and_depth {
        LengthAndDepth::Inc => [
            Value::Float(units.length(end_md - start_md)),
            Value::Float(units.length(end_tvd - start_tvd)),
        ],
        LengthAndDepth::Abs => [
            Value::Float(units.length(end_md)),
            Value::Float(units.length(end_tvd)),
        ],
    }
}

pub fn welsegs_table(info: &MswExportInfo, units: &ExportUnits) -> ComputeResult<KeywordTable> {
    require_finalized(info)?;

    let mut header = TableSection::new(vec![
        Column::text("Name"),
        Column::float("Dep 1"),
        Column::float("Tlen 1"),
        Column::float("Vol 1"),
        Column::text("Len&Dep"),
        Column::text("PresDrop"),
    ]);
    header.push_row(vec![
        Value::text(&info.well_name),
        Value::Float(units.length(info.top_tvd)),
        Value::Float(units.length(info.top_md)),
        Value::optional_float(
            info.top_well_bore_volume
                .map(|volume| units.length(units.area(volume))),
        ),
        Value::text(info.length_and_depth.as_str()),
        Value::text(info.pressure_drop.as_str()),
    ])?;

    let mut segments = TableSection::new(vec![
        Column::integer("First Seg"),
        Column::integer("Last Seg"),
        Column::integer("Branch Num"),
        Column::integer("Outlet Seg"),
        Column::float("Length"),
        Column::float("Depth Change"),
        Column::new("Diam", ColumnFormat::Float { decimals: 5 }),
        Column::new("Rough", ColumnFormat::Float { decimals: 7 }),
    ])
    .with_heading("Main stem segments");

    for segment in info.segments() {
        let (Some(number), Some(outlet)) = (segment.segment_number, segment.outlet_segment) else {
            continue;
        };
        let [length, depth] = length_and_depth(
            info,
            units,
            (segment.start_md, segment.end_md),
            (segment.start_tvd, segment.end_tvd),
        );
        segments.push_row(vec![
            Value::count(number),
            Value::count(number),
            Value::count(MAIN_STEM_BRANCH),
            Value::count(outlet),
            length,
            depth,
            Value::Float(units.length(info.liner_diameter)),
            Value::Float(units.length(info.roughness_factor)),
        ])?;
    }

    // Valves, fishbones and fractures are numbered in separate passes; rows
    // go out by segment number, not by attachment order.
    let mut laterals: Vec<(usize, &MswCompletion)> = info
        .segments()
        .iter()
        .flat_map(|segment| &segment.completions)
        .filter(|completion| completion.branch_number.is_some())
        .map(|completion| {
            let first = completion
                .sub_segments
                .iter()
                .filter_map(|sub_segment| sub_segment.segment_number)
                .min()
                .unwrap_or(usize::MAX);
            (first, completion)
        })
        .collect();
    laterals.sort_by_key(|(first, _)| *first);

    for (_, completion) in laterals {
        let Some(branch) = completion.branch_number else {
            continue;
        };
        segments.push_comment(completion.label.clone());
        for sub_segment in &completion.sub_segments {
            let (Some(number), Some(outlet)) =
                (sub_segment.segment_number, sub_segment.outlet_segment)
            else {
                continue;
            };
            let [length, depth] = length_and_depth(
                info,
                units,
                (sub_segment.start_md, sub_segment.end_md),
                (sub_segment.start_tvd, sub_segment.end_tvd),
            );
            segments.push_row(vec![
                Value::count(number),
                Value::count(number),
                Value::count(branch),
                Value::count(outlet),
                length,
                depth,
                Value::Float(units.length(completion.diameter)),
                Value::Float(units.length(completion.roughness)),
            ])?;
        }
    }

    Ok(KeywordTable::new("WELSEGS", TableKind::Welsegs)
        .with_section(header)
        .with_section(segments))
}

/// Cell connections of the main stem and every lateral, restricted to the
/// main grid or to LGR cells. Lengths are measured depths in the same frame
/// as the WELSEGS header, and each cell is listed once: the main stem claims
/// a cell before any lateral crossing it.
pub fn compsegs_table(
    info: &MswExportInfo,
    lgr: bool,
    units: &ExportUnits,
) -> ComputeResult<KeywordTable> {
    require_finalized(info)?;

    let mut header = TableSection::new(vec![Column::text("Name")]);
    header.push_row(vec![Value::text(&info.well_name)])?;

    let mut columns = Vec::new();
    if lgr {
        columns.push(Column::text("Grid"));
    }
    columns.extend([
        Column::integer("I"),
        Column::integer("J"),
        Column::integer("K"),
        Column::integer("Branch no"),
        Column::float("Start Length"),
        Column::float("End Length"),
        Column::text("Dir Pen"),
        Column::integer("End Range"),
        Column::float("Connection Depth"),
    ]);
    let mut connections = TableSection::new(columns);

    let mut listed_cells: HashSet<usize> = HashSet::new();
    let mut push = |connection: &MswCellConnection, branch: usize| -> ComputeResult<()> {
        if connection.cell.is_main_grid() == lgr
            || !listed_cells.insert(connection.cell.global_cell_index)
        {
            return Ok(());
        }
        let [i, j, k] = connection.cell.one_based_ijk();
        let mut row = Vec::with_capacity(10);
        if lgr {
            row.push(Value::text(connection.cell.grid_name.clone().unwrap_or_default()));
        }
        row.extend([
            Value::count(i),
            Value::count(j),
            Value::count(k),
            Value::count(branch),
            Value::Float(units.length(connection.start_md)),
            Value::Float(units.length(connection.end_md)),
            Value::Default,
            Value::Default,
            Value::Default,
        ]);
        connections.push_row(row)
    };

    for segment in info.segments() {
        for connection in &segment.connections {
            push(connection, MAIN_STEM_BRANCH)?;
        }
    }
    for completion in info.segments().iter().flat_map(|segment| &segment.completions) {
        let Some(branch) = completion.branch_number else {
            continue;
        };
        for connection in completion
            .sub_segments
            .iter()
            .flat_map(|sub_segment| &sub_segment.connections)
        {
            push(connection, branch)?;
        }
    }

    Ok(KeywordTable::new(lgr_keyword("COMPSEGS", lgr), TableKind::Compsegs)
        .with_section(header)
        .with_section(connections)
        .skip_when_empty())
}

pub fn wsegvalv_table(info: &MswExportInfo, units: &ExportUnits) -> ComputeResult<KeywordTable> {
    require_finalized(info)?;

    let mut section = TableSection::new(vec![
        Column::text("Well"),
        Column::integer("Seg No"),
        Column::new("Cv", ColumnFormat::Float { decimals: 4 }),
        Column::scientific("Ac"),
    ]);
    for completion in info
        .segments()
        .iter()
        .flat_map(|segment| &segment.completions)
        .filter(|completion| completion.kind.is_valve())
    {
        let Some(valve) = completion.valve else {
            continue;
        };
        for number in completion
            .sub_segments
            .iter()
            .filter_map(|sub_segment| sub_segment.segment_number)
        {
            section.push_row(vec![
                Value::text(&info.well_name),
                Value::count(number),
                Value::Float(valve.flow_coefficient),
                Value::Float(units.area(valve.area)),
            ])?;
        }
    }
    Ok(KeywordTable::new("WSEGVALV", TableKind::Wsegvalv)
        .with_section(section)
        .skip_when_empty())
}

/// Every MSW table of one well.
pub fn msw_document(info: &MswExportInfo, units: &ExportUnits) -> ComputeResult<TableDocument> {
    let mut document = TableDocument::default();
    document.push(welsegs_table(info, units)?);
    document.push(compsegs_table(info, false, units)?);
    document.push(compsegs_table(info, true, units)?);
    document.push(wsegvalv_table(info, units)?);
    Ok(document)
}
