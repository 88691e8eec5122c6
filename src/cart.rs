//! Shopping-list aggregation: every ingredient line of every recipe in a
//! user's cart, merged by (name, unit) with amounts summed.

use crate::database;
use crate::database::models::UserId;
use crate::query;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListLine {
    pub name: String,
    pub unit: String,
    pub total: i64,
}

/// Lines come back sorted by ingredient name, then unit. The cart rows are
/// unique per (user, recipe), so each recipe contributes each of its lines
/// exactly once.
pub fn shopping_list(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<ShoppingListLine>> {
    use database::schema::recipe_ingredients::dsl::*;

    let cart_recipes = query::cart_recipe_ids(conn, user)?;

    let lines: Vec<(String, String, i32)> = recipe_ingredients
        .inner_join(database::schema::ingredients::table)
        .select((
            database::schema::ingredients::dsl::name,
            database::schema::ingredients::dsl::measurement_unit,
            amount,
        ))
        .filter(recipe_id.eq_any(cart_recipes))
        .load(conn)?;

    let mut totals = BTreeMap::<(String, String), i64>::new();
    for (ingredient_name, unit, line_amount) in lines {
        *totals.entry((ingredient_name, unit)).or_insert(0) += i64::from(line_amount);
    }

    Ok(totals
        .into_iter()
        .map(|((name_key, unit_key), total)| ShoppingListLine {
            name: name_key,
            unit: unit_key,
            total,
        })
        .collect())
}

pub fn render(lines: &[ShoppingListLine]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&format!("{}({}) - {}\n", line.name, line.unit, line.total));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{IngredientId, RecipeId};
    use maplit::btreemap;

    fn user(conn: &mut database::Connection, tag: &str) -> UserId {
        query::insert_user(
            conn,
            &format!("{tag}@example.com"),
            tag,
            "Test",
            "User",
            "hash",
        )
        .unwrap()
        .id
    }

    fn recipe_with(
        conn: &mut database::Connection,
        author: UserId,
        name: &str,
        lines: &[(IngredientId, i32)],
    ) -> RecipeId {
        let recipe = query::insert_recipe(conn, author, name, "steps", 10).unwrap();
        query::replace_recipe_ingredients(conn, recipe.id, lines).unwrap();
        recipe.id
    }

    fn ingredient(conn: &mut database::Connection, name: &str, unit: &str) -> IngredientId {
        query::get_or_create_ingredient(conn, name, unit).unwrap().0.id
    }

    #[test]
    fn empty_cart_has_no_lines() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        assert_eq!(shopping_list(&mut conn, shopper).unwrap(), vec![]);
    }

    #[test]
    fn shared_ingredient_amounts_are_summed() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        let flour = ingredient(&mut conn, "flour", "g");
        let salt = ingredient(&mut conn, "salt", "g");

        let bread = recipe_with(&mut conn, shopper, "bread", &[(flour, 200)]);
        let crackers = recipe_with(&mut conn, shopper, "crackers", &[(flour, 300), (salt, 5)]);
        query::add_cart_entry(&mut conn, shopper, bread).unwrap();
        query::add_cart_entry(&mut conn, shopper, crackers).unwrap();

        let totals: std::collections::BTreeMap<_, _> = shopping_list(&mut conn, shopper)
            .unwrap()
            .into_iter()
            .map(|line| ((line.name, line.unit), line.total))
            .collect();
        assert_eq!(
            totals,
            btreemap! {
                ("flour".into(), "g".into()) => 500,
                ("salt".into(), "g".into()) => 5,
            }
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        let grams = ingredient(&mut conn, "butter", "g");
        let sticks = ingredient(&mut conn, "butter", "stick");

        let cake = recipe_with(&mut conn, shopper, "cake", &[(grams, 100), (sticks, 2)]);
        query::add_cart_entry(&mut conn, shopper, cake).unwrap();

        let lines = shopping_list(&mut conn, shopper).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].total, lines[1].total), (100, 2));
    }

    #[test]
    fn lines_are_sorted_by_name() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        let zucchini = ingredient(&mut conn, "zucchini", "pcs");
        let apple = ingredient(&mut conn, "apple", "pcs");
        let milk = ingredient(&mut conn, "milk", "ml");

        let dish = recipe_with(
            &mut conn,
            shopper,
            "dish",
            &[(zucchini, 1), (apple, 2), (milk, 250)],
        );
        query::add_cart_entry(&mut conn, shopper, dish).unwrap();

        let names: Vec<_> = shopping_list(&mut conn, shopper)
            .unwrap()
            .into_iter()
            .map(|line| line.name)
            .collect();
        assert_eq!(names, vec!["apple", "milk", "zucchini"]);
    }

    #[test]
    fn only_the_requesting_users_cart_counts() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        let other = user(&mut conn, "other");
        let flour = ingredient(&mut conn, "flour", "g");

        let bread = recipe_with(&mut conn, shopper, "bread", &[(flour, 200)]);
        query::add_cart_entry(&mut conn, other, bread).unwrap();

        assert_eq!(shopping_list(&mut conn, shopper).unwrap(), vec![]);
    }

    #[test]
    fn deleting_a_recipe_removes_its_contribution() {
        let mut conn = database::test_connection();
        let shopper = user(&mut conn, "shopper");
        let flour = ingredient(&mut conn, "flour", "g");

        let bread = recipe_with(&mut conn, shopper, "bread", &[(flour, 200)]);
        let buns = recipe_with(&mut conn, shopper, "buns", &[(flour, 300)]);
        query::add_cart_entry(&mut conn, shopper, bread).unwrap();
        query::add_cart_entry(&mut conn, shopper, buns).unwrap();

        query::delete_recipe(&mut conn, bread).unwrap();

        let lines = shopping_list(&mut conn, shopper).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total, 300);
    }

    #[test]
    fn render_format() {
        let lines = vec![
            ShoppingListLine {
                name: "flour".into(),
                unit: "g".into(),
                total: 500,
            },
            ShoppingListLine {
                name: "salt".into(),
                unit: "g".into(),
                total: 5,
            },
        ];
        assert_eq!(render(&lines), "flour(g) - 500\nsalt(g) - 5\n");
    }
}
