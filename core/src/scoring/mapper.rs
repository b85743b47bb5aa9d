use serde::{Deserialize, Serialize};

use crate::math::geometry::GeometryHelper;
use crate::scoring::calibration::Calibration;

/// Board numbers clockwise from the top wedge.
pub const BOARD_NUMBERS: [i32; 20] = [
    20, 1, 18, 4, 13, 6, 10, 15, 2, 17, 3, 19, 7, 16, 8, 11, 14, 9, 12, 5,
];

pub const WEDGE_DEGREES: f64 = 18.0;
pub const WEDGE_OFFSET_DEGREES: f64 = 9.0;

/// Outer edge of each radial band, normalized to the calibrated radius.
pub const BULLSEYE_EDGE: f64 = 0.03;
pub const OUTER_BULL_EDGE: f64 = 0.10;
pub const INNER_SINGLE_EDGE: f64 = 0.54;
pub const TRIPLE_EDGE: f64 = 0.63;
pub const OUTER_SINGLE_EDGE: f64 = 0.94;
pub const DOUBLE_EDGE: f64 = 1.0;

/// Scored area of the board a dart landed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSection {
    pub number: i32,
    pub multiplier: i32,
    pub label: String,
}

impl ScoringSection {
    pub fn bull() -> Self {
        Self {
            number: 50,
            multiplier: 1,
            label: "Bull".to_string(),
        }
    }

    pub fn outer_bull() -> Self {
        Self {
            number: 25,
            multiplier: 1,
            label: "25".to_string(),
        }
    }

    pub fn miss() -> Self {
        Self {
            number: 0,
            multiplier: 0,
            label: "Miss".to_string(),
        }
    }

    fn single(number: i32) -> Self {
        Self {
            number,
            multiplier: 1,
            label: number.to_string(),
        }
    }

    fn triple(number: i32) -> Self {
        Self {
            number,
            multiplier: 3,
            label: format!("T{}", number),
        }
    }

    fn double(number: i32) -> Self {
        Self {
            number,
            multiplier: 2,
            label: format!("D{}", number),
        }
    }

    pub fn points(&self) -> i32 {
        self.number * self.multiplier
    }
}

/// Board number of the wedge containing a clockwise angle. Wedges are
/// centred on their number by the `+9°` offset.
pub fn wedge_number(angle_deg: f64) -> i32 {
    let index = ((angle_deg + WEDGE_OFFSET_DEGREES).rem_euclid(360.0) / WEDGE_DEGREES) as usize;
    BOARD_NUMBERS[index % BOARD_NUMBERS.len()]
}

/// Maps a pixel position to its section under `calibration`.
///
/// The radius must be positive; `CalibrationStore` never holds anything else.
pub fn sector_of(x: f32, y: f32, calibration: &Calibration) -> ScoringSection {
    let dx = x as f64 - calibration.center_x as f64;
    let dy = y as f64 - calibration.center_y as f64;
    let distance = (dx * dx + dy * dy).sqrt() / calibration.radius as f64;

    let number = wedge_number(GeometryHelper::clockwise_angle_deg(dx, dy));

    if distance <= BULLSEYE_EDGE {
        ScoringSection::bull()
    } else if distance <= OUTER_BULL_EDGE {
        ScoringSection::outer_bull()
    } else if distance <= INNER_SINGLE_EDGE {
        ScoringSection::single(number)
    } else if distance <= TRIPLE_EDGE {
        ScoringSection::triple(number)
    } else if distance <= OUTER_SINGLE_EDGE {
        ScoringSection::single(number)
    } else if distance <= DOUBLE_EDGE {
        ScoringSection::double(number)
    } else {
        ScoringSection::miss()
    }
}
