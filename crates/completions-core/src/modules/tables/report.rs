//! Fracture summary written as a comment block above the completion tables.

use super::formatter::{Column, ColumnFormat, TableSection, Value};
use crate::common::units::ExportUnits;
use crate::domain::{ComputeResult, UnitSystem};

pub use crate::modules::transmissibility::fracture::FractureReportItem;

pub fn fracture_report_section(
    items: &[FractureReportItem],
    units: &ExportUnits,
) -> ComputeResult<TableSection> {
    let length_unit = match units.unit_system {
        UnitSystem::Metric => "[m]",
        UnitSystem::Field => "[ft]",
    };
    let mut section = TableSection::new(vec![
        Column::text("Well"),
        Column::text("Fracture"),
        Column::text("Template"),
        Column::scientific("Tr"),
        Column::integer("#con"),
        Column::new("Fcd", ColumnFormat::Float { decimals: 2 }),
        Column::float("Area").with_sub_title(format!("{length_unit}2")),
        Column::float("KfWf").with_sub_title(format!("[mD{length_unit}]")),
        Column::float("Km").with_sub_title("[mD]"),
        Column::float("Xf").with_sub_title(length_unit),
        Column::float("H").with_sub_title(length_unit),
    ])
    .with_heading("Fracture Transmissibility Report");

    for item in items {
        section.push_row(vec![
            Value::text(&item.well_name),
            Value::text(&item.fracture_name),
            Value::text(&item.template_name),
            Value::Float(units.transmissibility(item.transmissibility)),
            Value::count(item.connection_count),
            Value::Float(item.dimensionless_conductivity()),
            Value::Float(units.area(item.area)),
            Value::Float(units.conductivity(item.conductivity)),
            Value::Float(item.matrix_permeability),
            Value::Float(units.length(item.half_length)),
            Value::Float(units.length(item.height)),
        ])?;
    }
    Ok(section)
}
