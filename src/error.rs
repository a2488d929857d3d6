use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce the link table. Nothing can be calculated without it.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not fetch the spreadsheet: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Could not parse the spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("Column \"{0}\" is missing from the header row")]
    MissingColumn(&'static str),
}

/// Bad or incomplete form input. Shown next to the calculator that raised it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please select values for all fields.")]
    MissingSelection,
    #[error("Please fill in all required fields.")]
    MissingField,
    #[error("Invalid value for Link Distance \"{0}\". Please ensure it's a valid number.")]
    InvalidDistance(String),
    #[error("Invalid value for {field}. Please enter a non-negative number.")]
    InvalidNumber { field: &'static str },
}
