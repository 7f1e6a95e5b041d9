use serde::Deserialize;

use crate::models::{FoodRecord, Macros, normalize_serving_size};

pub const DEFAULT_BRAND: &str = "Generic";
pub const DEFAULT_DESCRIPTION: &str = "Unknown";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFood {
    pub fdc_id: Option<i64>,
    pub description: Option<String>,
    pub brand_owner: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<SearchNutrient>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNutrient {
    pub nutrient_name: Option<String>,
    pub unit_name: Option<String>,
    pub value: Option<f64>,
}

/// `GET /food/{fdcId}` shape; nutrient names are nested one level deeper.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodDetails {
    pub fdc_id: Option<i64>,
    pub description: Option<String>,
    pub brand_owner: Option<String>,
    pub serving_size: Option<f64>,
    pub serving_size_unit: Option<String>,
    #[serde(default)]
    pub food_nutrients: Vec<DetailNutrient>,
}

#[derive(Debug, Deserialize)]
pub struct DetailNutrient {
    pub nutrient: Option<NutrientInfo>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientInfo {
    pub name: Option<String>,
    pub unit_name: Option<String>,
}

#[derive(Clone, Copy)]
enum Field {
    Protein,
    Carbs,
    Fats,
    Calories,
}

/// Which nutrient names count for a field. Search results carry only the
/// headline nutrients, so loose substring matches are safe there; full
/// details list sub-totals ("Carbohydrate, by summation", "Fatty acids,
/// total saturated") that must not be taken for the headline value.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Matching {
    Loose,
    Strict,
}

fn classify(name: &str, unit: &str, matching: Matching) -> Option<Field> {
    let name = name.to_lowercase();
    let strict = matching == Matching::Strict;
    if name.contains("protein") {
        Some(Field::Protein)
    } else if name.contains("carbohydrate") {
        (!strict || name.contains("by difference")).then_some(Field::Carbs)
    } else if name.contains("total lipid") {
        Some(Field::Fats)
    } else if name.contains("fat") {
        let total_fat =
            name.contains("total") && !name.contains("fatty acid") && !name.contains("trans");
        (!strict || total_fat).then_some(Field::Fats)
    } else if name.contains("energy") && unit.eq_ignore_ascii_case("KCAL") {
        // kJ energy rows are skipped.
        Some(Field::Calories)
    } else {
        None
    }
}

/// Fold `(name, unit, value)` rows into macros. The first row matching each
/// field wins, so "Total lipid (fat)" is not overwritten by a later
/// "Fatty acids, total saturated". Missing fields are 0.
fn collect_macros<'a>(
    rows: impl Iterator<Item = (&'a str, &'a str, f64)>,
    matching: Matching,
) -> Macros {
    let mut protein = None;
    let mut carbs = None;
    let mut fats = None;
    let mut calories = None;

    for (name, unit, value) in rows {
        if !value.is_finite() {
            continue;
        }
        let slot = match classify(name, unit, matching) {
            Some(Field::Protein) => &mut protein,
            Some(Field::Carbs) => &mut carbs,
            Some(Field::Fats) => &mut fats,
            Some(Field::Calories) => &mut calories,
            None => continue,
        };
        slot.get_or_insert(value);
    }

    Macros {
        protein_g: protein.unwrap_or(0.0),
        carbs_g: carbs.unwrap_or(0.0),
        fats_g: fats.unwrap_or(0.0),
        calories: calories.unwrap_or(0.0),
    }
}

fn normalize_unit(unit: Option<String>) -> String {
    match unit.as_deref().map(str::trim) {
        None | Some("") => "g".to_string(),
        Some(u) if u.eq_ignore_ascii_case("GRM") => "g".to_string(),
        Some(u) if u.eq_ignore_ascii_case("MLT") => "ml".to_string(),
        Some(u) => u.to_lowercase(),
    }
}

fn non_empty(s: Option<String>, default: &str) -> String {
    s.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[must_use]
pub fn food_to_record(food: SearchFood) -> FoodRecord {
    let rows = food.food_nutrients.iter().map(|n| {
        (
            n.nutrient_name.as_deref().unwrap_or(""),
            n.unit_name.as_deref().unwrap_or(""),
            n.value.unwrap_or(0.0),
        )
    });
    let macros = collect_macros(rows, Matching::Loose);

    FoodRecord {
        source_id: food.fdc_id.map(|id| id.to_string()),
        description: non_empty(food.description, DEFAULT_DESCRIPTION),
        brand: non_empty(food.brand_owner, DEFAULT_BRAND),
        serving_size: normalize_serving_size(food.serving_size),
        serving_unit: normalize_unit(food.serving_size_unit),
        macros,
    }
}

#[must_use]
pub fn details_to_record(food: FoodDetails) -> FoodRecord {
    let rows = food.food_nutrients.iter().map(|n| {
        let info = n.nutrient.as_ref();
        (
            info.and_then(|i| i.name.as_deref()).unwrap_or(""),
            info.and_then(|i| i.unit_name.as_deref()).unwrap_or(""),
            n.amount.unwrap_or(0.0),
        )
    });
    let macros = collect_macros(rows, Matching::Strict);

    FoodRecord {
        source_id: food.fdc_id.map(|id| id.to_string()),
        description: non_empty(food.description, DEFAULT_DESCRIPTION),
        brand: non_empty(food.brand_owner, DEFAULT_BRAND),
        serving_size: normalize_serving_size(food.serving_size),
        serving_unit: normalize_unit(food.serving_size_unit),
        macros,
    }
}

#[must_use]
pub fn search_to_records(response: SearchResponse) -> Vec<FoodRecord> {
    response.foods.into_iter().map(food_to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_JSON: &str = r#"{
        "totalHits": 2,
        "foods": [
            {
                "fdcId": 171077,
                "description": "Chicken, broilers or fryers, breast, meat only, cooked, roasted",
                "foodNutrients": [
                    {"nutrientName": "Protein", "unitName": "G", "value": 31.0},
                    {"nutrientName": "Total lipid (fat)", "unitName": "G", "value": 3.57},
                    {"nutrientName": "Carbohydrate, by difference", "unitName": "G", "value": 0.0},
                    {"nutrientName": "Energy", "unitName": "KJ", "value": 690.0},
                    {"nutrientName": "Energy", "unitName": "KCAL", "value": 165.0},
                    {"nutrientName": "Fatty acids, total saturated", "unitName": "G", "value": 1.01}
                ]
            },
            {
                "fdcId": 2000001,
                "description": "GREEK YOGURT",
                "brandOwner": "Acme Dairy",
                "servingSize": 170.0,
                "servingSizeUnit": "GRM",
                "foodNutrients": [
                    {"nutrientName": "Protein", "unitName": "G", "value": 10.0}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_search_response() {
        let resp: SearchResponse = serde_json::from_str(SEARCH_JSON).unwrap();
        let records = search_to_records(resp);
        assert_eq!(records.len(), 2);

        let chicken = &records[0];
        assert_eq!(chicken.source_id.as_deref(), Some("171077"));
        assert_eq!(chicken.brand, "Generic");
        assert!((chicken.serving_size - 100.0).abs() < f64::EPSILON);
        assert_eq!(chicken.serving_unit, "g");
        assert!((chicken.macros.protein_g - 31.0).abs() < f64::EPSILON);
        assert!((chicken.macros.fats_g - 3.57).abs() < f64::EPSILON);
        assert!((chicken.macros.calories - 165.0).abs() < f64::EPSILON);

        let yogurt = &records[1];
        assert_eq!(yogurt.brand, "Acme Dairy");
        assert!((yogurt.serving_size - 170.0).abs() < f64::EPSILON);
        assert_eq!(yogurt.serving_unit, "g");
        assert!(yogurt.macros.calories.abs() < f64::EPSILON);
        assert!(yogurt.macros.carbs_g.abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let food: SearchFood = serde_json::from_str("{}").unwrap();
        let record = food_to_record(food);
        assert!(record.source_id.is_none());
        assert_eq!(record.description, "Unknown");
        assert_eq!(record.brand, "Generic");
        assert!((record.serving_size - 100.0).abs() < f64::EPSILON);
        assert_eq!(record.macros, Macros::default());
    }

    #[test]
    fn test_zero_serving_size_normalized() {
        let food: SearchFood =
            serde_json::from_str(r#"{"description": "Mystery", "servingSize": 0}"#).unwrap();
        assert!((food_to_record(food).serving_size - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_search_response() {
        let resp: SearchResponse = serde_json::from_str(r#"{"totalHits": 0}"#).unwrap();
        assert!(search_to_records(resp).is_empty());
    }

    #[test]
    fn test_parse_food_details() {
        let json = r#"{
            "fdcId": 173944,
            "description": "Oats",
            "foodNutrients": [
                {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 16.9},
                {"nutrient": {"name": "Carbohydrate, by difference", "unitName": "g"}, "amount": 66.3},
                {"nutrient": {"name": "Total lipid (fat)", "unitName": "g"}, "amount": 6.9},
                {"nutrient": {"name": "Energy", "unitName": "kcal"}, "amount": 389.0}
            ]
        }"#;
        let details: FoodDetails = serde_json::from_str(json).unwrap();
        let record = details_to_record(details);
        assert_eq!(record.description, "Oats");
        assert!((record.macros.carbs_g - 66.3).abs() < f64::EPSILON);
        assert!((record.macros.calories - 389.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_details_skip_subtotal_rows() {
        let json = r#"{
            "fdcId": 170567,
            "description": "Almonds",
            "foodNutrients": [
                {"nutrient": {"name": "Carbohydrate, by summation", "unitName": "g"}, "amount": 9.0},
                {"nutrient": {"name": "Fatty acids, total saturated", "unitName": "g"}, "amount": 3.8},
                {"nutrient": {"name": "Fatty acids, total trans", "unitName": "g"}, "amount": 0.0},
                {"nutrient": {"name": "Energy", "unitName": "kJ"}, "amount": 2423.0},
                {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 21.2},
                {"nutrient": {"name": "Carbohydrate, by difference", "unitName": "g"}, "amount": 21.6},
                {"nutrient": {"name": "Total lipid (fat)", "unitName": "g"}, "amount": 49.9},
                {"nutrient": {"name": "Energy", "unitName": "kcal"}, "amount": 579.0}
            ]
        }"#;
        let details: FoodDetails = serde_json::from_str(json).unwrap();
        let record = details_to_record(details);
        assert!((record.macros.protein_g - 21.2).abs() < f64::EPSILON);
        assert!((record.macros.carbs_g - 21.6).abs() < f64::EPSILON);
        assert!((record.macros.fats_g - 49.9).abs() < f64::EPSILON);
        assert!((record.macros.calories - 579.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_details_accept_fat_total_name() {
        let json = r#"{
            "foodNutrients": [
                {"nutrient": {"name": "Fatty acids, total monounsaturated", "unitName": "g"}, "amount": 31.0},
                {"nutrient": {"name": "Fat, total", "unitName": "g"}, "amount": 12.5}
            ]
        }"#;
        let details: FoodDetails = serde_json::from_str(json).unwrap();
        let record = details_to_record(details);
        assert!((record.macros.fats_g - 12.5).abs() < f64::EPSILON);
        assert!(record.macros.carbs_g.abs() < f64::EPSILON);
    }
}
