//! Consolidated shopping list for the recipes in a user's cart.
//!
//! Rows are grouped by the exact `(name, measurement_unit)` pair, so the same
//! ingredient listed in grams and in teaspoons stays on two lines. Output is
//! ordered by name, then unit, using plain byte-wise string comparison so the
//! result does not depend on database collation or locale.

use std::collections::BTreeMap;

/// One ingredient row from a recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientAmount {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl IngredientAmount {
    pub fn new(name: impl Into<String>, measurement_unit: impl Into<String>, amount: i32) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

impl From<(String, String, i32)> for IngredientAmount {
    fn from((name, measurement_unit, amount): (String, String, i32)) -> Self {
        Self {
            name,
            measurement_unit,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

impl std::fmt::Display for ShoppingListLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) — {}", self.name, self.measurement_unit, self.total)
    }
}

/// Sum amounts per `(name, unit)` and return the lines in output order.
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListLine>
where
    I: IntoIterator,
    I::Item: Into<IngredientAmount>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        let row = row.into();
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListLine {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Render lines as the downloadable text document. No trailing newline.
pub fn render(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_shopping_list<I>(rows: I) -> String
where
    I: IntoIterator,
    I::Item: Into<IngredientAmount>,
{
    render(&aggregate(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> IngredientAmount {
        IngredientAmount::new(name, unit, amount)
    }

    #[test]
    fn test_empty_cart_renders_empty_document() {
        let rows: Vec<IngredientAmount> = Vec::new();
        assert_eq!(render_shopping_list(rows), "");
    }

    #[test]
    fn test_sums_same_name_and_unit() {
        let text = render_shopping_list(vec![row("Sugar", "g", 100), row("Sugar", "g", 50)]);
        assert_eq!(text, "Sugar (g) — 150");
    }

    #[test]
    fn test_keeps_units_apart() {
        let lines = aggregate(vec![row("Salt", "g", 5), row("Salt", "tsp", 2)]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "Salt (g) — 5");
        assert_eq!(lines[1].to_string(), "Salt (tsp) — 2");
    }

    #[test]
    fn test_orders_by_name_then_unit() {
        let text = render_shopping_list(vec![
            row("Milk", "ml", 200),
            row("Flour", "g", 300),
            row("Eggs", "pcs", 2),
            row("Flour", "cup", 1),
        ]);
        assert_eq!(
            text,
            "Eggs (pcs) — 2\nFlour (cup) — 1\nFlour (g) — 300\nMilk (ml) — 200"
        );
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let lines = aggregate(vec![row("apple", "g", 1), row("Banana", "g", 1)]);
        assert_eq!(lines[0].name, "Banana");
        assert_eq!(lines[1].name, "apple");
    }

    #[test]
    fn test_totals_do_not_overflow_i32() {
        let rows: Vec<_> = (0..100_000).map(|_| row("Rice", "g", 32_000)).collect();
        let lines = aggregate(rows);
        assert_eq!(lines[0].total, 3_200_000_000);
    }

    #[test]
    fn test_accepts_query_tuples() {
        let rows = vec![
            ("Butter".to_string(), "g".to_string(), 10),
            ("Butter".to_string(), "g".to_string(), 15),
        ];
        assert_eq!(render_shopping_list(rows), "Butter (g) — 25");
    }

    #[test]
    fn test_is_idempotent() {
        let rows = vec![row("Eggs", "pcs", 3), row("Cheese", "g", 80)];
        assert_eq!(
            render_shopping_list(rows.clone()),
            render_shopping_list(rows)
        );
    }
}
