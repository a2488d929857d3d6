use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::error::ValidationError;

/// Raw content of a "Link Distance" cell.
///
/// Text cells are kept verbatim, so a malformed distance can still be picked
/// from the dropdown and is only rejected when a threshold is calculated.
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceCell {
    Number(f64),
    Text(String),
}

impl DistanceCell {
    /// Distance in km, or `InvalidDistance` for text that is not a finite number.
    pub fn km(&self) -> Result<f64, ValidationError> {
        match self {
            DistanceCell::Number(km) if km.is_finite() => Ok(*km),
            DistanceCell::Number(km) => Err(ValidationError::InvalidDistance(km.to_string())),
            DistanceCell::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite())
                .ok_or_else(|| ValidationError::InvalidDistance(text.clone())),
        }
    }
}

impl Display for DistanceCell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceCell::Number(km) => write!(f, "{km}"),
            DistanceCell::Text(text) => write!(f, "{text}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub node_a: String,
    pub node_b: String,
    pub link_distance: Option<DistanceCell>,
}

/// Site-pair to distance lookup, in sheet order. Duplicates are kept.
#[derive(Debug, Clone, Default)]
pub struct LinkTable {
    records: Vec<LinkRecord>,
}

impl LinkTable {
    pub fn new(records: Vec<LinkRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn node_a_options(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.node_a.as_str()))
    }

    pub fn node_b_options(&self) -> Vec<String> {
        sorted_distinct(self.records.iter().map(|r| r.node_b.as_str()))
    }

    /// Distinct distances recorded for `node_b`, first-seen order, blanks dropped.
    pub fn distance_options(&self, node_b: &str) -> Vec<DistanceCell> {
        let mut options: Vec<DistanceCell> = Vec::new();
        for distance in self
            .records
            .iter()
            .filter(|r| r.node_b == node_b)
            .filter_map(|r| r.link_distance.as_ref())
        {
            if !options.contains(distance) {
                options.push(distance.clone());
            }
        }
        options
    }
}

/// Distinct values, ordered numerically when every value is a number.
fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let distinct: Vec<&str> = values.collect::<BTreeSet<_>>().into_iter().collect();
    let numbers: Option<Vec<f64>> = distinct.iter().map(|v| v.trim().parse().ok()).collect();
    match numbers {
        Some(numbers) if !distinct.is_empty() => {
            let mut keyed: Vec<(f64, &str)> = numbers.into_iter().zip(distinct).collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            keyed.into_iter().map(|(_, v)| v.to_owned()).collect()
        }
        _ => distinct.into_iter().map(str::to_owned).collect(),
    }
}
