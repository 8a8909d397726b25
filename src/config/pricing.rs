//! Pricing plan table and class-label price resolution.
//!
//! The table is static configuration: loaded once, read-only. Resolution is
//! a deliberately brittle first-match policy - the label is lower-cased and
//! trimmed, then each plan's keywords are checked for a substring match in
//! table order, and the first hit wins. Keyword sets overlap (a bare "1"
//! matches both class and university-course plans), which is a pre-existing
//! ambiguity of the deployed table; callers must not assume keywords are
//! disjoint, and the enumeration order here is load-bearing.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Price applied by the admin cash flow when the student's class label
/// cannot be resolved. Cash payments are never blocked by unmapped classes.
pub const FALLBACK_PRICE: f64 = 5000.0;

/// Plan label recorded for fallback-priced cash payments
pub const FALLBACK_PLAN_NAME: &str = "стандартный тариф";

/// A single pricing plan
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PricingPlan {
    /// Stable plan key stored on intents and history records
    pub key: String,
    /// Display name shown in messages
    pub name: String,
    /// Monthly price in rubles
    pub price: f64,
    /// Human-readable schedule description
    pub description: String,
    /// Lower-case keywords matched as substrings against class labels
    pub keywords: Vec<String>,
}

/// Ordered pricing table
#[derive(Debug, Deserialize, Clone)]
pub struct PricingTable {
    /// Plans in match-priority order
    pub plans: Vec<PricingPlan>,
}

impl PricingTable {
    /// Resolves a free-text class/course label to a pricing plan.
    ///
    /// Returns `None` for empty or unmatched labels. Callers must treat
    /// `None` as a terminal "cannot determine price" condition - the only
    /// path allowed to substitute a fallback price is the admin cash flow.
    #[must_use]
    pub fn resolve(&self, class_label: &str) -> Option<&PricingPlan> {
        let label = class_label.trim().to_lowercase();
        if label.is_empty() {
            return None;
        }

        self.plans
            .iter()
            .find(|plan| plan.keywords.iter().any(|keyword| label.contains(keyword)))
    }

    /// Looks up a plan by its stable key.
    #[must_use]
    pub fn plan_by_key(&self, key: &str) -> Option<&PricingPlan> {
        self.plans.iter().find(|plan| plan.key == key)
    }
}

/// Loads a pricing table from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<PricingTable> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read pricing file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse pricing TOML: {e}"),
    })
}

fn plan(key: &str, name: &str, price: f64, description: &str, keywords: &[&str]) -> PricingPlan {
    PricingPlan {
        key: key.to_string(),
        name: name.to_string(),
        price,
        description: description.to_string(),
        keywords: keywords.iter().map(ToString::to_string).collect(),
    }
}

/// The deployed pricing table, in match-priority order.
///
/// University courses are kept at the symbolic 1-ruble price the deployment
/// uses for them.
#[must_use]
pub fn default_table() -> PricingTable {
    PricingTable {
        plans: vec![
            plan(
                "oge_9",
                "💯ОГЭ(9 класс)",
                5650.0,
                "2 часа / 1 раз в неделю",
                &["9", "oge", "огэ", "9 класс"],
            ),
            plan(
                "ege_base",
                "💯ЕГЭ База",
                5650.0,
                "2 часа / 1 раз в неделю",
                &["егэ база", "ege base", "база"],
            ),
            plan(
                "class_7",
                "💯7 класс",
                5650.0,
                "2 часа / 1 раз в неделю",
                &["7", "7 класс"],
            ),
            plan(
                "class_8",
                "💯8 класс (Алгебра + Геометрия)",
                5650.0,
                "2 часа / 1 раз в неделю",
                &["8", "8 класс"],
            ),
            plan(
                "ege_profile",
                "💯ЕГЭ Профиль 11 класс",
                7900.0,
                "4 часа в неделю + дом.задания + возможно Zoom онлайн занятие 1 раз/неделю",
                &["11", "11 класс", "егэ профиль", "ege profile", "профиль"],
            ),
            plan(
                "class_10",
                "💯10 класс",
                7000.0,
                "3 часа в неделю",
                &["10", "10 класс"],
            ),
            plan(
                "class_5_6",
                "💯5, 6 класс",
                3670.0,
                "1 час / 1 раз в неделю",
                &["5", "6", "5 класс", "6 класс"],
            ),
            plan(
                "university_course_1",
                "🎓1 курс ВУЗа",
                1.0,
                "Студент 1 курса ВУЗа",
                &["1 курс", "course_1", "1"],
            ),
            plan(
                "university_course_2",
                "🎓2 курс ВУЗа",
                1.0,
                "Студент 2 курса ВУЗа",
                &["2 курс", "course_2", "2"],
            ),
            plan(
                "university_course_3",
                "🎓3 курс ВУЗа",
                1.0,
                "Студент 3 курса ВУЗа",
                &["3 курс", "course_3", "3"],
            ),
            plan(
                "university_course_4",
                "🎓4 курс ВУЗа",
                1.0,
                "Студент 4 курса ВУЗа",
                &["4 курс", "course_4", "4"],
            ),
            plan(
                "university_course_5",
                "🎓5 курс ВУЗа",
                1.0,
                "Студент 5 курса ВУЗа",
                &["5 курс", "course_5", "5"],
            ),
            plan(
                "university_course_6",
                "🎓6 курс ВУЗа",
                1.0,
                "Студент 6 курса ВУЗа",
                &["6 курс", "course_6", "6"],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_resolve_known_class() {
        let table = default_table();
        let plan = table.resolve("9 класс").unwrap();
        assert_eq!(plan.key, "oge_9");
        assert_eq!(plan.price, 5650.0);
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_trims() {
        let table = default_table();
        let plan = table.resolve("  ОГЭ  ").unwrap();
        assert_eq!(plan.key, "oge_9");
    }

    #[test]
    fn test_first_match_wins_for_class_10() {
        // "10 класс" contains "1", which also triggers university_course_1.
        // Table order must resolve it to class_10 at 7000.
        let table = default_table();
        let plan = table.resolve("10 класс").unwrap();
        assert_eq!(plan.key, "class_10");
        assert_eq!(plan.price, 7000.0);
    }

    #[test]
    fn test_overlapping_keywords_resolve_by_table_order() {
        // A bare "1" falls through every class plan to university_course_1.
        let table = default_table();
        let plan = table.resolve("1").unwrap();
        assert_eq!(plan.key, "university_course_1");
        assert_eq!(plan.price, 1.0);
    }

    #[test]
    fn test_resolve_empty_and_unmatched() {
        let table = default_table();
        assert!(table.resolve("").is_none());
        assert!(table.resolve("   ").is_none());
        assert!(table.resolve("взрослая группа").is_none());
    }

    #[test]
    fn test_plan_by_key() {
        let table = default_table();
        assert_eq!(table.plan_by_key("ege_profile").unwrap().price, 7900.0);
        assert!(table.plan_by_key("missing").is_none());
    }

    #[test]
    fn test_parse_pricing_toml() {
        let toml_str = r#"
            [[plans]]
            key = "oge_9"
            name = "ОГЭ (9 класс)"
            price = 5650.0
            description = "2 часа / 1 раз в неделю"
            keywords = ["9", "огэ"]

            [[plans]]
            key = "class_10"
            name = "10 класс"
            price = 7000.0
            description = "3 часа в неделю"
            keywords = ["10"]
        "#;

        let table: PricingTable = toml::from_str(toml_str).unwrap();
        assert_eq!(table.plans.len(), 2);
        assert_eq!(table.plans[0].key, "oge_9");
        assert_eq!(table.plans[1].price, 7000.0);
    }
}
