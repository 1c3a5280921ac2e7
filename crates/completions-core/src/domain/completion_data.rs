use super::{CellDirection, CompletionType};
use std::cmp::Ordering;

/// Location of a connection cell, with zero-based IJK inside its own grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub global_cell_index: usize,
    pub grid_index: usize,
    pub grid_name: Option<String>,
    pub ijk: [usize; 3],
}

impl CellAddress {
    pub fn is_main_grid(&self) -> bool {
        self.grid_index == 0
    }

    pub fn one_based_ijk(&self) -> [usize; 3] {
        [self.ijk[0] + 1, self.ijk[1] + 1, self.ijk[2] + 1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionMetadata {
    pub name: String,
    pub comment: String,
}

impl CompletionMetadata {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
        }
    }
}

/// One well connection to one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionData {
    pub well_name: String,
    pub cell: CellAddress,
    pub completion_type: CompletionType,
    pub transmissibility: f64,
    pub wpimult: Option<f64>,
    pub kh: f64,
    pub skin: f64,
    pub diameter: f64,
    pub d_factor: Option<f64>,
    pub direction: CellDirection,
    pub is_main_bore: bool,
    pub contribution_count: usize,
    pub ordering_md: f64,
    pub metadata: Vec<CompletionMetadata>,
}

impl CompletionData {
    pub fn new(
        well_name: impl Into<String>,
        cell: CellAddress,
        completion_type: CompletionType,
        ordering_md: f64,
    ) -> Self {
        Self {
            well_name: well_name.into(),
            cell,
            completion_type,
            transmissibility: 0.0,
            wpimult: None,
            kh: 0.0,
            skin: 0.0,
            diameter: 0.0,
            d_factor: None,
            direction: CellDirection::K,
            is_main_bore: false,
            contribution_count: 1,
            ordering_md,
            metadata: Vec::new(),
        }
    }

    pub fn set_transmissibility_data(
        &mut self,
        transmissibility: f64,
        kh: f64,
        skin: f64,
        diameter: f64,
        direction: CellDirection,
    ) {
        self.transmissibility = transmissibility;
        self.kh = kh;
        self.skin = skin;
        self.diameter = diameter;
        self.direction = direction;
    }

    pub fn add_metadata(&mut self, name: impl Into<String>, comment: impl Into<String>) {
        self.metadata.push(CompletionMetadata::new(name, comment));
    }

    pub fn global_cell_index(&self) -> usize {
        self.cell.global_cell_index
    }

    /// Ordering used before file emission: well, completion type, MD, cell.
    pub fn export_order(&self, other: &Self) -> Ordering {
        self.well_name
            .cmp(&other.well_name)
            .then_with(|| self.completion_type.cmp(&other.completion_type))
            .then_with(|| self.ordering_md.total_cmp(&other.ordering_md))
            .then_with(|| self.cell.grid_index.cmp(&other.cell.grid_index))
            .then_with(|| self.cell.global_cell_index.cmp(&other.cell.global_cell_index))
    }
}

#[cfg(test)]
mod tests {
    use super::{CellAddress, CompletionData};
    use crate::domain::CompletionType;

    fn cell(global: usize) -> CellAddress {
        CellAddress {
            global_cell_index: global,
            grid_index: 0,
            grid_name: None,
            ijk: [global, 0, 0],
        }
    }

    #[test]
    fn export_order_sorts_by_well_then_type_then_depth() {
        let mut completions = vec![
            CompletionData::new("B", cell(0), CompletionType::Perforation, 10.0),
            CompletionData::new("A", cell(3), CompletionType::Perforation, 20.0),
            CompletionData::new("A", cell(2), CompletionType::Fishbones, 30.0),
            CompletionData::new("A", cell(1), CompletionType::Perforation, 5.0),
        ];
        completions.sort_by(CompletionData::export_order);

        let order: Vec<(String, usize)> = completions
            .iter()
            .map(|completion| (completion.well_name.clone(), completion.global_cell_index()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A".to_string(), 2),
                ("A".to_string(), 1),
                ("A".to_string(), 3),
                ("B".to_string(), 0)
            ]
        );
    }

    #[test]
    fn one_based_indices_offset_every_axis() {
        assert_eq!(cell(4).one_based_ijk(), [5, 1, 1]);
    }
}
