use crate::domain::{CompletionData, CompletionType, ExportSettings, FileSplit};
use crate::modules::tables::WellSpecEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFileKind {
    Completions,
    FishbonesMsw,
    FracturesMsw,
    PerforationsMsw,
    FractureDebug,
}

/// Aggregated records of one well path or simulation well.
#[derive(Debug, Clone, PartialEq)]
pub struct WellCompletionSet {
    pub well_name: String,
    pub well_spec: Option<WellSpecEntry>,
    pub completions: Vec<CompletionData>,
}

/// Contents of one completion file before it is split into main grid and
/// LGR parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub name: String,
    pub kind: ExportFileKind,
    pub well_names: Vec<String>,
    pub completions: Vec<CompletionData>,
}

impl ExportFile {
    fn new(name: String) -> Self {
        Self {
            name,
            kind: ExportFileKind::Completions,
            well_names: Vec::new(),
            completions: Vec::new(),
        }
    }

    fn add(&mut self, well_name: &str, completions: impl IntoIterator<Item = CompletionData>) {
        let before = self.completions.len();
        self.completions.extend(completions);
        if self.completions.len() > before && !self.well_names.iter().any(|name| name == well_name) {
            self.well_names.push(well_name.to_string());
        }
    }
}

/// Groups the well sets into files according to the split mode. Wells
/// without records produce no file; files whose names collide are merged.
pub fn plan_completion_files(
    sets: &[WellCompletionSet],
    settings: &ExportSettings,
    case_name: &str,
) -> Vec<ExportFile> {
    let mut files: Vec<ExportFile> = Vec::new();
    let mut add = |name: String, well_name: &str, completions: Vec<CompletionData>| {
        if completions.is_empty() {
            return;
        }
        let position = match files.iter().position(|file| file.name == name) {
            Some(position) => position,
            None => {
                files.push(ExportFile::new(name));
                files.len() - 1
            }
        };
        files[position].add(well_name, completions);
    };

    match settings.file_split {
        FileSplit::UnifiedFile => {
            let name = settings
                .custom_file_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("UnifiedCompletions_{case_name}"));
            for set in sets {
                add(name.clone(), &set.well_name, set.completions.clone());
            }
        }
        FileSplit::SplitOnWell => {
            for set in sets {
                add(
                    format!("{}_{case_name}", set.well_name),
                    &set.well_name,
                    set.completions.clone(),
                );
            }
        }
        FileSplit::SplitOnWellAndCompletionType => {
            for completion_type in CompletionType::ALL {
                for set in sets {
                    let of_type: Vec<CompletionData> = set
                        .completions
                        .iter()
                        .filter(|completion| completion.completion_type == completion_type)
                        .cloned()
                        .collect();
                    add(
                        format!("{}_{}_{case_name}", set.well_name, completion_type.as_str()),
                        &set.well_name,
                        of_type,
                    );
                }
            }
        }
    }

    for file in &mut files {
        file.completions.sort_by(CompletionData::export_order);
    }
    files
}

#[cfg(test)]
mod tests {
    use super::{WellCompletionSet, plan_completion_files};
    use crate::domain::{CellAddress, CompletionData, CompletionType, ExportSettings, FileSplit};

    fn record(well: &str, cell: usize, completion_type: CompletionType) -> CompletionData {
        CompletionData::new(
            well,
            CellAddress {
                global_cell_index: cell,
                grid_index: 0,
                grid_name: None,
                ijk: [cell, 0, 0],
            },
            completion_type,
            cell as f64,
        )
    }

    fn sets() -> Vec<WellCompletionSet> {
        ["B", "A"]
            .iter()
            .map(|well| WellCompletionSet {
                well_name: well.to_string(),
                well_spec: None,
                completions: vec![
                    record(well, 2, CompletionType::Fracture),
                    record(well, 1, CompletionType::Fishbones),
                ],
            })
            .collect()
    }

    fn names(split: FileSplit, sets: &[WellCompletionSet]) -> Vec<String> {
        let settings = ExportSettings {
            file_split: split,
            ..ExportSettings::default()
        };
        plan_completion_files(sets, &settings, "CASE")
            .into_iter()
            .map(|file| file.name)
            .collect()
    }

    #[test]
    fn type_split_loops_types_outside_wells() {
        assert_eq!(
            names(FileSplit::SplitOnWellAndCompletionType, &sets()),
            vec![
                "B_Fishbones_CASE",
                "A_Fishbones_CASE",
                "B_Fracture_CASE",
                "A_Fracture_CASE"
            ]
        );
        assert_eq!(names(FileSplit::SplitOnWell, &sets()), vec!["B_CASE", "A_CASE"]);
    }

    #[test]
    fn unified_file_is_sorted_and_honours_custom_name() {
        let settings = ExportSettings {
            custom_file_name: Some("ALL_WELLS".to_string()),
            ..ExportSettings::default()
        };
        let files = plan_completion_files(&sets(), &settings, "CASE");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "ALL_WELLS");
        assert_eq!(files[0].well_names, vec!["B", "A"]);
        let order: Vec<(&str, CompletionType)> = files[0]
            .completions
            .iter()
            .map(|completion| (completion.well_name.as_str(), completion.completion_type))
            .collect();
        assert_eq!(
            order,
            vec![
                ("A", CompletionType::Fishbones),
                ("A", CompletionType::Fracture),
                ("B", CompletionType::Fishbones),
                ("B", CompletionType::Fracture)
            ]
        );
    }

    #[test]
    fn wells_without_records_and_colliding_names() {
        let mut sets = sets();
        sets[0].completions.clear();
        sets.push(WellCompletionSet {
            well_name: "A".to_string(),
            well_spec: None,
            completions: vec![record("A", 9, CompletionType::Perforation)],
        });
        let settings = ExportSettings {
            file_split: FileSplit::SplitOnWell,
            ..ExportSettings::default()
        };
        let files = plan_completion_files(&sets, &settings, "CASE");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "A_CASE");
        assert_eq!(files[0].completions.len(), 3);
    }
}
