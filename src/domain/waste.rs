use std::fmt;

use serde::{Deserialize, Serialize};

/// Waste counts are whole units of stock.
pub type Units = i64;

/// Category a unit of wasted stock is booked under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteType {
    Defective,
    Expired,
    Damaged,
    Returned,
}

impl WasteType {
    pub const ALL: [WasteType; 4] = [
        WasteType::Defective,
        WasteType::Expired,
        WasteType::Damaged,
        WasteType::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::Defective => "defective",
            WasteType::Expired => "expired",
            WasteType::Damaged => "damaged",
            WasteType::Returned => "returned",
        }
    }

    /// Case-insensitive parse of a waste category name.
    pub fn parse(s: &str) -> Result<Self, ParseWasteTypeError> {
        match s.trim().to_lowercase().as_str() {
            "defective" => Ok(WasteType::Defective),
            "expired" => Ok(WasteType::Expired),
            "damaged" => Ok(WasteType::Damaged),
            "returned" => Ok(WasteType::Returned),
            _ => Err(ParseWasteTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWasteTypeError(pub String);

impl fmt::Display for ParseWasteTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown waste type '{}' (expected defective, expired, damaged or returned)",
            self.0
        )
    }
}

impl std::error::Error for ParseWasteTypeError {}

/// Booking a quantity would push a counter past the integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WasteOverflow {
    pub waste_type: WasteType,
    pub quantity: Units,
}

impl fmt::Display for WasteOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "recording {} {} units would overflow the waste counters",
            self.quantity, self.waste_type
        )
    }
}

impl std::error::Error for WasteOverflow {}

/// Per-record waste counters ("foul water").
///
/// `total_waste` always equals the sum of the four category counters; every
/// mutation goes through [`WasteCounters::record`], which recomputes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WasteCounters {
    pub defective_count: Units,
    pub expired_count: Units,
    pub damage_count: Units,
    pub returned_count: Units,
    pub total_waste: Units,
}

impl WasteCounters {
    /// Build counters from category values, computing the total.
    pub fn new(defective: Units, expired: Units, damaged: Units, returned: Units) -> Self {
        let mut counters = Self {
            defective_count: defective,
            expired_count: expired,
            damage_count: damaged,
            returned_count: returned,
            total_waste: 0,
        };
        counters.recompute_total();
        counters
    }

    pub fn count(&self, waste_type: WasteType) -> Units {
        match waste_type {
            WasteType::Defective => self.defective_count,
            WasteType::Expired => self.expired_count,
            WasteType::Damaged => self.damage_count,
            WasteType::Returned => self.returned_count,
        }
    }

    /// Add `quantity` units to one category and recompute the total.
    ///
    /// On overflow nothing is changed.
    pub fn record(&mut self, waste_type: WasteType, quantity: Units) -> Result<(), WasteOverflow> {
        let mut next = *self;
        let counter = match waste_type {
            WasteType::Defective => &mut next.defective_count,
            WasteType::Expired => &mut next.expired_count,
            WasteType::Damaged => &mut next.damage_count,
            WasteType::Returned => &mut next.returned_count,
        };
        *counter = counter
            .checked_add(quantity)
            .ok_or(WasteOverflow { waste_type, quantity })?;
        // Full recompute, never incremental.
        next.total_waste = next
            .checked_category_sum()
            .ok_or(WasteOverflow { waste_type, quantity })?;
        *self = next;
        Ok(())
    }

    /// Sum of the four category counters, `None` on overflow.
    pub fn checked_category_sum(&self) -> Option<Units> {
        self.defective_count
            .checked_add(self.expired_count)?
            .checked_add(self.damage_count)?
            .checked_add(self.returned_count)
    }

    /// Sum of the four category counters, saturating at the integer bounds.
    pub fn category_sum(&self) -> Units {
        self.defective_count
            .saturating_add(self.expired_count)
            .saturating_add(self.damage_count)
            .saturating_add(self.returned_count)
    }

    fn recompute_total(&mut self) {
        self.total_waste = self.category_sum();
    }

    pub fn is_consistent(&self) -> bool {
        self.checked_category_sum() == Some(self.total_waste)
    }

    pub fn has_waste(&self) -> bool {
        self.total_waste > 0
    }
}

impl std::ops::Add for WasteCounters {
    type Output = WasteCounters;

    fn add(self, rhs: WasteCounters) -> WasteCounters {
        WasteCounters::new(
            self.defective_count.saturating_add(rhs.defective_count),
            self.expired_count.saturating_add(rhs.expired_count),
            self.damage_count.saturating_add(rhs.damage_count),
            self.returned_count.saturating_add(rhs.returned_count),
        )
    }
}

impl std::iter::Sum for WasteCounters {
    fn sum<I: Iterator<Item = WasteCounters>>(iter: I) -> Self {
        iter.fold(WasteCounters::default(), |acc, c| acc + c)
    }
}
