//! Wire representations and the pure mappers that build them from domain
//! rows plus the viewer's id-sets. No queries happen here.

use crate::database::models::{
    Ingredient, IngredientId, Recipe, RecipeHandle, RecipeId, Tag, TagId, User, UserId,
};
use crate::resolve::ViewerSets;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug, PartialEq)]
pub struct TagOut {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

pub fn tag_out(tag: Tag) -> TagOut {
    TagOut {
        id: tag.id,
        name: tag.name,
        color: tag.color,
        slug: tag.slug,
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct IngredientOut {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

pub fn ingredient_out(ingredient: Ingredient) -> IngredientOut {
    IngredientOut {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: ingredient.measurement_unit,
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct IngredientLineOut {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

pub fn ingredient_line_out(ingredient: Ingredient, amount: i32) -> IngredientLineOut {
    IngredientLineOut {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: ingredient.measurement_unit,
        amount,
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct UserOut {
    pub email: String,
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

pub fn user_out(user: &User, sets: &ViewerSets) -> UserOut {
    UserOut {
        email: user.email.clone(),
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed: sets.is_subscribed(user.id),
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct RecipeBrief {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

pub fn recipe_brief(handle: &RecipeHandle) -> RecipeBrief {
    RecipeBrief {
        id: handle.id,
        name: handle.name.clone(),
        image: handle.image_path.clone(),
        cooking_time: handle.cooking_time,
    }
}

#[derive(Serialize, Debug)]
pub struct RecipeOut {
    pub id: RecipeId,
    pub tags: Vec<TagOut>,
    pub author: UserOut,
    pub ingredients: Vec<IngredientLineOut>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn recipe_out(
    recipe: &Recipe,
    author: &User,
    tags: Vec<Tag>,
    lines: Vec<(Ingredient, i32)>,
    sets: &ViewerSets,
) -> RecipeOut {
    RecipeOut {
        id: recipe.id,
        tags: tags.into_iter().map(tag_out).collect(),
        author: user_out(author, sets),
        ingredients: lines
            .into_iter()
            .map(|(ingredient, amount)| ingredient_line_out(ingredient, amount))
            .collect(),
        is_favorited: sets.is_favorited(recipe.id),
        is_in_shopping_cart: sets.is_in_shopping_cart(recipe.id),
        name: recipe.name.clone(),
        image: recipe.image_path.clone(),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    }
}

#[derive(Serialize, Debug)]
pub struct SubscribedAuthorOut {
    #[serde(flatten)]
    pub user: UserOut,
    pub recipes: Vec<RecipeBrief>,
    pub recipes_count: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 6;

impl PageQuery {
    /// Returns (page, limit, offset), clamped to sane values. The offset
    /// saturates so an absurd `?page=` yields an empty page, not a panic.
    pub fn window(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
        (page, limit, (page - 1).saturating_mul(limit))
    }
}

/// Page envelope. `next` and `previous` are query strings to append to the
/// current endpoint rather than absolute URLs, since handlers never see the
/// public-facing host.
#[derive(Serialize, Debug)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(count: i64, page: i64, limit: i64, results: Vec<T>) -> Self {
        let next = (page.saturating_mul(limit) < count)
            .then(|| format!("?page={}&limit={limit}", page.saturating_add(1)));
        let previous = (page > 1).then(|| format!("?page={}&limit={limit}", page - 1));
        Self {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::query;
    use crate::resolve::Viewer;

    #[test]
    fn page_window_defaults() {
        assert_eq!(PageQuery::default().window(), (1, DEFAULT_PAGE_SIZE, 0));
        let query = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(query.window(), (3, 10, 20));
    }

    #[test]
    fn page_window_survives_huge_page_numbers() {
        let query = PageQuery {
            page: Some(i64::MAX),
            limit: Some(100),
        };
        let (page, limit, offset) = query.window();
        assert_eq!((page, limit, offset), (i64::MAX, 100, i64::MAX));

        let empty: Paginated<i32> = Paginated::new(5, page, limit, vec![]);
        assert_eq!(empty.next, None);
        assert_eq!(empty.previous.as_deref(), Some("?page=9223372036854775806&limit=100"));
    }

    #[test]
    fn pagination_links() {
        let first = Paginated::new(13, 1, 6, vec![0; 6]);
        assert_eq!(first.next.as_deref(), Some("?page=2&limit=6"));
        assert_eq!(first.previous, None);

        let last = Paginated::new(13, 3, 6, vec![0; 1]);
        assert_eq!(last.next, None);
        assert_eq!(last.previous.as_deref(), Some("?page=2&limit=6"));
    }

    #[test]
    fn recipe_out_reflects_viewer_sets() {
        let mut conn = database::test_connection();
        let author = query::insert_user(
            &mut conn,
            "author@example.com",
            "author",
            "Ann",
            "Author",
            "hash",
        )
        .unwrap();
        let fan = query::insert_user(&mut conn, "fan@example.com", "fan", "Fay", "Fan", "hash")
            .unwrap();
        let recipe = query::insert_recipe(&mut conn, author.id, "soup", "boil", 30).unwrap();
        query::add_favorite(&mut conn, fan.id, recipe.id).unwrap();
        query::add_subscription(&mut conn, fan.id, author.id).unwrap();

        let sets = crate::resolve::ViewerSets::load(&mut conn, Viewer::User(fan.id)).unwrap();
        let out = recipe_out(&recipe, &author, vec![], vec![], &sets);
        assert!(out.is_favorited);
        assert!(!out.is_in_shopping_cart);
        assert!(out.author.is_subscribed);

        let anon = crate::resolve::ViewerSets::load(&mut conn, Viewer::Anonymous).unwrap();
        let out = recipe_out(&recipe, &author, vec![], vec![], &anon);
        assert!(!out.is_favorited);
        assert!(!out.author.is_subscribed);
    }
}
