//! Link table loading from a remote or local workbook

use std::io::Cursor;
use std::path::PathBuf;

use calamine::{Data, Range, Reader};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::table::{DistanceCell, LinkRecord, LinkTable};

pub const NODE_A: &str = "Node A";
pub const NODE_B: &str = "Node B";
pub const LINK_DISTANCE: &str = "Link Distance";

const DEFAULT_LOCATION: &str = "https://github.com/Sumidit/ThresholdMeter/blob/main/data.xlsx?raw=true";
const DEFAULT_SHEET: &str = "Sheet1";

/// Where the link table lives: an http(s) URL or a local path, plus the sheet name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub location: String,
    pub sheet: String,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            location: DEFAULT_LOCATION.to_owned(),
            sheet: DEFAULT_SHEET.to_owned(),
        }
    }
}

impl DataSource {
    pub fn is_remote(&self) -> bool {
        let location = self.location.trim_start();
        location.starts_with("http://") || location.starts_with("https://")
    }

    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        if self.is_remote() {
            let response = reqwest::blocking::get(self.location.trim())?.error_for_status()?;
            Ok(response.bytes()?.to_vec())
        } else {
            let path = PathBuf::from(self.location.trim());
            std::fs::read(&path).map_err(|source| LoadError::Read { path, source })
        }
    }

    /// Fetch the workbook and read the link table from the configured sheet.
    pub fn load(&self) -> Result<LinkTable, LoadError> {
        log::info!("Loading link table from {} (sheet {:?})", self.location, self.sheet);
        let bytes = self.fetch()?;
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook.worksheet_range(&self.sheet)?;
        let table = parse_sheet(&range)?;
        log::info!("Loaded {} link records", table.len());
        Ok(table)
    }
}

/// Read link records from a sheet whose first row holds the column headers.
pub fn parse_sheet(range: &Range<Data>) -> Result<LinkTable, LoadError> {
    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let column = |name: &'static str| {
        header
            .iter()
            .position(|cell| cell_text(cell).as_deref() == Some(name))
            .ok_or(LoadError::MissingColumn(name))
    };
    let node_a_col = column(NODE_A)?;
    let node_b_col = column(NODE_B)?;
    let distance_col = column(LINK_DISTANCE)?;

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        let node_a = row.get(node_a_col).and_then(cell_text);
        let node_b = row.get(node_b_col).and_then(cell_text);
        let link_distance = row.get(distance_col).and_then(distance_cell);
        match (node_a, node_b) {
            (Some(node_a), Some(node_b)) => records.push(LinkRecord {
                node_a,
                node_b,
                link_distance,
            }),
            (None, None) if link_distance.is_none() => {}
            _ => log::warn!("Skipping sheet row {}: missing node name", index + 2),
        }
    }
    Ok(LinkTable::new(records))
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        other => {
            let text = other.to_string();
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_owned())
        }
    }
}

fn distance_cell(cell: &Data) -> Option<DistanceCell> {
    match cell {
        Data::Float(km) => Some(DistanceCell::Number(*km)),
        Data::Int(km) => Some(DistanceCell::Number(*km as f64)),
        other => cell_text(other).map(DistanceCell::Text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn workbook_file(sheet_name: &str) -> NamedTempFile {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name).unwrap();
        for (col, title) in [NODE_A, NODE_B, LINK_DISTANCE].into_iter().enumerate() {
            worksheet.write_string(0, col as u16, title).unwrap();
        }
        worksheet.write_string(1, 0, "KOL").unwrap();
        worksheet.write_string(1, 1, "DEL").unwrap();
        worksheet.write_number(1, 2, 42.5).unwrap();
        worksheet.write_string(2, 0, "BOM").unwrap();
        worksheet.write_string(2, 1, "DEL").unwrap();
        worksheet.write_string(2, 2, "n/a").unwrap();
        worksheet.write_string(4, 0, "AMD").unwrap();
        worksheet.write_string(4, 1, "PUN").unwrap();
        worksheet.write_number(4, 2, 7).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file
    }

    fn sheet(rows: &[Vec<Data>]) -> Range<Data> {
        let width = rows.iter().map(Vec::len).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (rows.len() as u32 - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_owned())
    }

    #[test]
    fn parses_link_columns() {
        let range = sheet(&[
            vec![text("Node A"), text("Node B"), text("Link Distance")],
            vec![text("KOL"), text("DEL"), Data::Float(42.5)],
            vec![text("BOM"), text("DEL"), Data::Int(12)],
            vec![text("AMD"), text("PUN"), text("n/a")],
        ]);
        let table = parse_sheet(&range).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.records()[0],
            LinkRecord {
                node_a: "KOL".into(),
                node_b: "DEL".into(),
                link_distance: Some(DistanceCell::Number(42.5)),
            }
        );
        assert_eq!(table.records()[1].link_distance, Some(DistanceCell::Number(12.0)));
        assert_eq!(
            table.records()[2].link_distance,
            Some(DistanceCell::Text("n/a".into()))
        );
    }

    #[test]
    fn columns_found_by_header_in_any_order() {
        let range = sheet(&[
            vec![text("Link Distance"), text(" Node B "), text("Region"), text("Node A")],
            vec![Data::Float(7.0), text("DEL"), text("North"), text("KOL")],
        ]);
        let table = parse_sheet(&range).unwrap();
        assert_eq!(table.records()[0].node_a, "KOL");
        assert_eq!(table.records()[0].node_b, "DEL");
        assert_eq!(table.records()[0].link_distance, Some(DistanceCell::Number(7.0)));
    }

    #[test]
    fn missing_column() {
        let range = sheet(&[
            vec![text("Node A"), text("Node B")],
            vec![text("KOL"), text("DEL")],
        ]);
        assert!(matches!(
            parse_sheet(&range),
            Err(LoadError::MissingColumn(LINK_DISTANCE))
        ));
        assert!(matches!(
            parse_sheet(&Range::empty()),
            Err(LoadError::MissingColumn(NODE_A))
        ));
    }

    #[test]
    fn blank_and_incomplete_rows_skipped() {
        let range = sheet(&[
            vec![text("Node A"), text("Node B"), text("Link Distance")],
            vec![Data::Empty, Data::Empty, Data::Empty],
            vec![text("KOL"), Data::Empty, Data::Float(3.0)],
            vec![text("BOM"), text("MAA"), Data::Empty],
        ]);
        let table = parse_sheet(&range).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].link_distance, None);
        assert_eq!(table.node_b_options(), vec!["MAA"]);
        assert!(table.distance_options("MAA").is_empty());
    }

    #[test]
    fn numeric_node_names() {
        let range = sheet(&[
            vec![text("Node A"), text("Node B"), text("Link Distance")],
            vec![Data::Float(101.0), Data::Int(202), Data::Float(1.5)],
        ]);
        let table = parse_sheet(&range).unwrap();
        assert_eq!(table.records()[0].node_a, "101");
        assert_eq!(table.records()[0].node_b, "202");
    }

    #[test]
    fn default_source_is_remote() {
        let source = DataSource::default();
        assert!(source.is_remote());
        assert_eq!(source.sheet, "Sheet1");
        assert!(!DataSource {
            location: "/tmp/data.xlsx".into(),
            sheet: "Sheet1".into(),
        }
        .is_remote());
    }

    #[test]
    fn load_missing_file() {
        let source = DataSource {
            location: "/definitely/not/here/data.xlsx".into(),
            sheet: "Sheet1".into(),
        };
        assert!(matches!(source.load(), Err(LoadError::Read { .. })));
    }

    #[test]
    fn load_rejects_non_workbook() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"Node A,Node B,Link Distance\nKOL,DEL,4\n").unwrap();

        let source = DataSource {
            location: file.path().display().to_string(),
            sheet: "Sheet1".into(),
        };
        assert!(matches!(source.load(), Err(LoadError::Workbook(_))));
    }

    #[test]
    fn load_reads_workbook_sheet() {
        let file = workbook_file("Links");
        let source = DataSource {
            location: file.path().display().to_string(),
            sheet: "Links".into(),
        };

        let table = source.load().unwrap();
        assert_eq!(
            table.records(),
            &[
                LinkRecord {
                    node_a: "KOL".into(),
                    node_b: "DEL".into(),
                    link_distance: Some(DistanceCell::Number(42.5)),
                },
                LinkRecord {
                    node_a: "BOM".into(),
                    node_b: "DEL".into(),
                    link_distance: Some(DistanceCell::Text("n/a".into())),
                },
                LinkRecord {
                    node_a: "AMD".into(),
                    node_b: "PUN".into(),
                    link_distance: Some(DistanceCell::Number(7.0)),
                },
            ]
        );
        assert_eq!(table.node_a_options(), vec!["AMD", "BOM", "KOL"]);
    }

    #[test]
    fn load_missing_sheet() {
        let file = workbook_file("Links");
        let source = DataSource {
            location: file.path().display().to_string(),
            sheet: "Sheet1".into(),
        };
        assert!(matches!(source.load(), Err(LoadError::Workbook(_))));
    }
}
