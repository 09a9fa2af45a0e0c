//! Static reference tables for ingredient and time units.
//!
//! Each table maps a label ("grams") to its abbreviation ("g"). Several labels
//! may share one abbreviation, so lookups by abbreviation return the last
//! label registered for it.

use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    pub label: &'static str,
    pub abbreviation: &'static str,
}

#[rustfmt::skip]
const INGREDIENT_UNITS: &[Unit] = &[
    Unit { label: "item", abbreviation: "i" },
    Unit { label: "items", abbreviation: "is" },
    Unit { label: "cup", abbreviation: "c" },
    Unit { label: "cups", abbreviation: "cs" },
    Unit { label: "tablespoon", abbreviation: "tbsp" },
    Unit { label: "teaspoon", abbreviation: "tsp" },
    Unit { label: "gram", abbreviation: "g" },
    Unit { label: "grams", abbreviation: "g" },
    Unit { label: "kilogram", abbreviation: "kg" },
    Unit { label: "kilograms", abbreviation: "kg" },
];

#[rustfmt::skip]
const TIME_UNITS: &[Unit] = &[
    Unit { label: "second", abbreviation: "s" },
    Unit { label: "seconds", abbreviation: "secs" },
    Unit { label: "minute", abbreviation: "min" },
    Unit { label: "minutes", abbreviation: "mins" },
    Unit { label: "hour", abbreviation: "h" },
    Unit { label: "hours", abbreviation: "hs" },
];

/// Units accepted on recipe timers.
pub const TIMER_UNITS: &[&str] = &["seconds", "minutes", "hours"];

struct UnitTable {
    by_label: HashMap<&'static str, Unit>,
    by_abbreviation: HashMap<&'static str, Unit>,
}

impl UnitTable {
    fn build(units: &[Unit]) -> Self {
        let mut by_label = HashMap::new();
        let mut by_abbreviation = HashMap::new();
        for unit in units {
            by_label.insert(unit.label, *unit);
            by_abbreviation.insert(unit.abbreviation, *unit);
        }
        Self {
            by_label,
            by_abbreviation,
        }
    }
}

static INGREDIENTS: LazyLock<UnitTable> = LazyLock::new(|| UnitTable::build(INGREDIENT_UNITS));
static TIMES: LazyLock<UnitTable> = LazyLock::new(|| UnitTable::build(TIME_UNITS));

pub fn ingredient_unit_by_label(label: &str) -> Option<Unit> {
    INGREDIENTS.by_label.get(label).copied()
}

pub fn ingredient_unit_by_abbreviation(abbreviation: &str) -> Option<Unit> {
    INGREDIENTS.by_abbreviation.get(abbreviation).copied()
}

pub fn time_unit_by_label(label: &str) -> Option<Unit> {
    TIMES.by_label.get(label).copied()
}

pub fn time_unit_by_abbreviation(abbreviation: &str) -> Option<Unit> {
    TIMES.by_abbreviation.get(abbreviation).copied()
}
