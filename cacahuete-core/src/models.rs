use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Dish category of a recipe.
///
/// Unknown categories still deserialize (as `Unrecognized`) so that they are
/// reported by validation rather than rejected while binding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Dish {
    Starter,
    Main,
    Dessert,
    #[default]
    #[serde(other, skip_serializing)]
    Unrecognized,
}

impl Dish {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dish::Starter => "starter",
            Dish::Main => "main",
            Dish::Dessert => "dessert",
            Dish::Unrecognized => "unrecognized",
        }
    }
}

/// A named countdown attached to a recipe (e.g. "cooking time").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Timer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: i64,
    /// One of `seconds`, `minutes` or `hours`
    #[serde(default)]
    pub units: String,
}

/// Reference to an ingredient held by the ingredient catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IngredientRef {
    /// Catalog id of the ingredient; not owned by this service
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub quantity: f64,
    /// Abbreviation from the ingredient unit table (`g`, `kg`, `tbsp`, ...)
    #[serde(default)]
    pub units: String,
}

// Every field defaults so that a missing value is a validation failure
// (422) instead of a binding failure (400).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dish: Dish,
    #[serde(default)]
    pub servings: i64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub timers: Vec<Timer>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientRef>,
}

impl Recipe {
    /// Whether this recipe references the given catalog ingredient.
    pub fn uses_ingredient(&self, ingredient_id: &str) -> bool {
        self.ingredients.iter().any(|i| i.id == ingredient_id)
    }
}

/// Acknowledgement returned by a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedRecipe {
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_dish_deserializes_as_unrecognized() {
        let recipe: Recipe = serde_json::from_str(r#"{"dish": "brunch"}"#).unwrap();
        assert_eq!(recipe.dish, Dish::Unrecognized);
    }

    #[test]
    fn missing_fields_default() {
        let recipe: Recipe = serde_json::from_str("{}").unwrap();
        assert!(recipe.id.is_none());
        assert_eq!(recipe.servings, 0);
        assert!(recipe.steps.is_empty());
    }

    #[test]
    fn id_is_omitted_until_assigned() {
        let recipe = Recipe {
            name: "Pate".to_string(),
            dish: Dish::Main,
            ..Default::default()
        };
        let json = serde_json::to_value(&recipe).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["dish"], "main");
    }
}
