//! Semantic validation of bound request payloads.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{Dish, IngredientRef, Recipe, Timer};
use crate::units;

const MIN_INGREDIENT_QUANTITY: f64 = 0.1;

/// A single rule violation, addressed by its JSON path (`timers[1].units`).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("validation failed: {}", join(.violations))]
pub struct ValidationErrors {
    pub violations: Vec<FieldViolation>,
}

fn join(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "is required");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// `Ok(())` when no rule was violated.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Human-readable messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

/// Declared constraints of a payload type.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validate for () {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Validate for Recipe {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.id.is_some_and(|id| id.is_nil()) {
            errors.add("id", "must not be the nil UUID");
        }
        errors.require("name", &self.name);
        errors.require("author", &self.author);
        errors.require("description", &self.description);

        if self.dish == Dish::Unrecognized {
            errors.add("dish", "must be one of starter, main, dessert");
        }
        if self.servings < 1 {
            errors.add("servings", "must be at least 1");
        }

        if self.steps.is_empty() {
            errors.add("steps", "is required");
        }
        for (i, step) in self.steps.iter().enumerate() {
            errors.require(&format!("steps[{i}]"), step);
        }

        for (i, timer) in self.timers.iter().enumerate() {
            validate_timer(&mut errors, &format!("timers[{i}]"), timer);
        }
        for (i, ingredient) in self.ingredients.iter().enumerate() {
            validate_ingredient(&mut errors, &format!("ingredients[{i}]"), ingredient);
        }

        errors.into_result()
    }
}

fn validate_timer(errors: &mut ValidationErrors, path: &str, timer: &Timer) {
    errors.require(&format!("{path}.name"), &timer.name);
    if timer.quantity < 1 {
        errors.add(format!("{path}.quantity"), "must be at least 1");
    }
    if !units::TIMER_UNITS.contains(&timer.units.as_str()) {
        errors.add(
            format!("{path}.units"),
            format!("must be one of {}", units::TIMER_UNITS.join(", ")),
        );
    }
}

fn validate_ingredient(errors: &mut ValidationErrors, path: &str, ingredient: &IngredientRef) {
    if !ingredient.quantity.is_finite() || ingredient.quantity < MIN_INGREDIENT_QUANTITY {
        errors.add(
            format!("{path}.quantity"),
            format!("must be at least {MIN_INGREDIENT_QUANTITY}"),
        );
    }
    if units::ingredient_unit_by_abbreviation(&ingredient.units).is_none() {
        errors.add(
            format!("{path}.units"),
            format!("unknown unit '{}'", ingredient.units),
        );
    }
}
