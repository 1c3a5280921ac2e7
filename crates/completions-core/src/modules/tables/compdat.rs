//! WELSPECS, COMPDAT and WPIMULT tables, with their LGR variants.

use super::formatter::{Column, ColumnFormat, KeywordTable, TableKind, TableSection, Value};
use crate::domain::{CompdatExportType, CompletionData, CompletionType, ComputeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompdatOptions {
    pub export_type: CompdatExportType,
    /// Writes the completion type headings and the metadata of each record.
    pub data_source_comments: bool,
}

/// Well head row; `grid_name` is set for wells whose head cell is in an LGR.
#[derive(Debug, Clone, PartialEq)]
pub struct WellSpecEntry {
    pub well_name: String,
    pub group_name: String,
    pub grid_name: Option<String>,
    /// One-based.
    pub i: usize,
    pub j: usize,
    pub reference_depth: Option<f64>,
    pub phase: String,
    pub drainage_radius: Option<f64>,
}

/// `WELSPECS` becomes `WELSPECL`, `COMPDAT` becomes `COMPDATL`.
pub(crate) fn lgr_keyword(base: &str, lgr: bool) -> String {
    if lgr {
        format!("{}L", base.strip_suffix('S').unwrap_or(base))
    } else {
        base.to_string()
    }
}

pub fn welspecs_table(entries: &[WellSpecEntry], lgr: bool) -> ComputeResult<KeywordTable> {
    let mut columns = vec![Column::text("Well"), Column::text("Grp")];
    if lgr {
        columns.push(Column::text("LGR"));
    }
    columns.extend([
        Column::integer("I"),
        Column::integer("J"),
        Column::float("RefDepth"),
        Column::text("Type"),
        Column::float("DrainRad"),
    ]);
    let mut section = TableSection::new(columns);
    for entry in entries {
        let mut row = vec![Value::text(&entry.well_name), Value::text(&entry.group_name)];
        if lgr {
            row.push(Value::text(entry.grid_name.clone().unwrap_or_default()));
        }
        row.extend([
            Value::count(entry.i),
            Value::count(entry.j),
            Value::optional_float(entry.reference_depth),
            Value::text(&entry.phase),
            Value::optional_float(entry.drainage_radius),
        ]);
        section.push_row(row)?;
    }
    Ok(KeywordTable::new(lgr_keyword("WELSPECS", lgr), TableKind::Welspecs).with_section(section))
}

/// One row per record, in the given order. Records are expected to be in
/// the export unit system already.
pub fn compdat_table(
    completions: &[CompletionData],
    lgr: bool,
    options: CompdatOptions,
) -> ComputeResult<KeywordTable> {
    let wpimult_export =
        options.export_type == CompdatExportType::WpimultAndDefaultConnectionFactors;
    let mut columns = vec![Column::text("Well")];
    if lgr {
        columns.push(Column::text("LGR"));
    }
    columns.extend([
        Column::integer("I"),
        Column::integer("J"),
        Column::integer("K1"),
        Column::integer("K2"),
        Column::text("Status"),
        Column::text("SAT"),
        Column::scientific("TR"),
        Column::float("DIAM"),
        Column::scientific("KH"),
        Column::float("S"),
        Column::scientific("Df"),
        Column::text("DIR"),
    ]);
    let mut section = TableSection::new(columns);

    let mut current_type: Option<CompletionType> = None;
    for completion in completions {
        if options.data_source_comments {
            if current_type != Some(completion.completion_type) {
                section.push_comment(completion.completion_type.table_heading());
                current_type = Some(completion.completion_type);
            }
            for metadata in &completion.metadata {
                section.push_comment(format!("{} : {}", metadata.name, metadata.comment));
            }
        }

        let [i, j, k] = completion.cell.one_based_ijk();
        let mut row = vec![Value::text(&completion.well_name)];
        if lgr {
            row.push(Value::text(completion.cell.grid_name.clone().unwrap_or_default()));
        }
        let (transmissibility, kh) = if wpimult_export {
            (Value::Default, Value::Default)
        } else {
            let kh = if completion.kh > 0.0 {
                Value::Float(completion.kh)
            } else {
                Value::Default
            };
            (Value::Float(completion.transmissibility), kh)
        };
        row.extend([
            Value::count(i),
            Value::count(j),
            Value::count(k),
            Value::count(k),
            Value::text("OPEN"),
            Value::Default,
            transmissibility,
            Value::Float(completion.diameter),
            kh,
            Value::Float(completion.skin),
            Value::optional_float(completion.d_factor),
            Value::text(completion.direction.compdat_token()),
        ]);
        section.push_row(row)?;
    }
    Ok(KeywordTable::new(lgr_keyword("COMPDAT", lgr), TableKind::Compdat).with_section(section))
}

/// Multipliers for records carrying a WPIMULT value.
pub fn wpimult_table(completions: &[CompletionData], lgr: bool) -> ComputeResult<KeywordTable> {
    let mut columns = vec![
        Column::text("Well"),
        Column::new("Mult", ColumnFormat::Float { decimals: 6 }),
    ];
    if lgr {
        columns.push(Column::text("LGR"));
    }
    columns.extend([Column::integer("I"), Column::integer("J"), Column::integer("K")]);
    let mut section = TableSection::new(columns);
    for completion in completions {
        let Some(multiplier) = completion.wpimult else {
            continue;
        };
        let [i, j, k] = completion.cell.one_based_ijk();
        let mut row = vec![Value::text(&completion.well_name), Value::Float(multiplier)];
        if lgr {
            row.push(Value::text(completion.cell.grid_name.clone().unwrap_or_default()));
        }
        row.extend([Value::count(i), Value::count(j), Value::count(k)]);
        section.push_row(row)?;
    }
    Ok(KeywordTable::new(lgr_keyword("WPIMULT", lgr), TableKind::Wpimult).with_section(section))
}
