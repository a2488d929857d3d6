use crate::error::ValidationError;
use crate::table::DistanceCell;

pub const CONSTANT_A: f64 = 0.25; // dB/km
pub const CONSTANT_B: f64 = 0.05; // dB/km
pub const CONNECTOR_LOSS: f64 = 2.0; // dB

pub const FIBER_ATTENUATION: f64 = 0.3; // dB/km
pub const SPLICE_LOSS: f64 = 0.05; // dB per splice
pub const BUDGET_CONNECTOR_LOSS: f64 = 0.5; // dB per connector
pub const BUDGET_CONNECTOR_COUNT: u32 = 2;

/// The value shown by `{:.2}`, read back as a number.
///
/// Scaling by 100 first would round binary half-way values such as 2.675 a
/// second time, so the formatter does the only rounding.
pub fn round2(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

pub mod distance {
    use super::*;

    pub fn threshold(link_distance_km: f64) -> f64 {
        round2(CONSTANT_A * link_distance_km + CONSTANT_B * link_distance_km + CONNECTOR_LOSS)
    }

    /// Current dropdown selections of the distance-based threshold meter.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Request<'a> {
        pub node_a: Option<&'a str>,
        pub node_b: Option<&'a str>,
        pub link_distance: Option<&'a DistanceCell>,
    }

    impl Request<'_> {
        pub fn evaluate(&self) -> Result<f64, ValidationError> {
            let (Some(_), Some(_), Some(link_distance)) =
                (self.node_a, self.node_b, self.link_distance)
            else {
                return Err(ValidationError::MissingSelection);
            };
            Ok(threshold(link_distance.km()?))
        }
    }
}

pub mod fiber {
    use super::round2;

    /// Fiber loss seen at the near end. Negative values are legitimate.
    pub fn loss(tx_far_db: f64, rx_near_db: f64, vi_db: f64) -> f64 {
        round2(tx_far_db - rx_near_db - vi_db)
    }
}

pub mod budget {
    use std::fmt::{Display, Formatter};

    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub enum SafetyMargin {
        #[default]
        TenKmOrBelow,
        AboveTenKm,
    }

    impl SafetyMargin {
        pub const ALL: [SafetyMargin; 2] = [SafetyMargin::TenKmOrBelow, SafetyMargin::AboveTenKm];

        pub fn db(self) -> f64 {
            match self {
                SafetyMargin::TenKmOrBelow => 2.5,
                SafetyMargin::AboveTenKm => 3.0,
            }
        }
    }

    impl Display for SafetyMargin {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            match self {
                SafetyMargin::TenKmOrBelow => write!(f, "10KM or below"),
                SafetyMargin::AboveTenKm => write!(f, "Above 10 KM"),
            }
        }
    }

    pub fn threshold(fiber_length_km: f64, splices: u32, margin: SafetyMargin) -> f64 {
        round2(
            fiber_length_km * FIBER_ATTENUATION
                + SPLICE_LOSS * f64::from(splices)
                + BUDGET_CONNECTOR_LOSS * f64::from(BUDGET_CONNECTOR_COUNT)
                + margin.db(),
        )
    }

    /// Raw text of the link budget form. Blank fields count as missing, zero does not.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Request<'a> {
        pub fiber_length_km: Option<&'a str>,
        pub splices: Option<&'a str>,
        pub margin: SafetyMargin,
    }

    impl Request<'_> {
        pub fn evaluate(&self) -> Result<f64, ValidationError> {
            let (Some(length), Some(splices)) = (present(self.fiber_length_km), present(self.splices))
            else {
                return Err(ValidationError::MissingField);
            };
            let length = length
                .parse::<f64>()
                .ok()
                .filter(|km| km.is_finite() && *km >= 0.0)
                .ok_or(ValidationError::InvalidNumber { field: "Fiber Length" })?;
            let splices = splices
                .parse::<u32>()
                .map_err(|_| ValidationError::InvalidNumber { field: "Number Of Splices" })?;
            Ok(threshold(length, splices, self.margin))
        }
    }

    fn present(field: Option<&str>) -> Option<&str> {
        field.map(str::trim).filter(|text| !text.is_empty())
    }
}
