use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, Recipe, RecipeHandle, RecipeId, Tag, TagId, User, UserId,
};
use diesel::ExpressionMethods as _;
use diesel::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::QueryResult;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

pub fn insert_user(
    conn: &mut database::Connection,
    new_email: &str,
    new_username: &str,
    new_first_name: &str,
    new_last_name: &str,
    new_password_hash: &str,
) -> QueryResult<User> {
    use database::schema::users::dsl::*;
    use diesel::insert_into;

    insert_into(users)
        .values((
            email.eq(new_email),
            username.eq(new_username),
            first_name.eq(new_first_name),
            last_name.eq(new_last_name),
            password_hash.eq(new_password_hash),
        ))
        .returning(User::as_returning())
        .get_result(conn)
}

pub fn user_by_id(conn: &mut database::Connection, user_id: UserId) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(id.eq(user_id))
        .get_result(conn)
        .optional()
}

pub fn user_by_email(conn: &mut database::Connection, by: &str) -> QueryResult<Option<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(email.eq(by))
        .get_result(conn)
        .optional()
}

pub fn set_password_hash(
    conn: &mut database::Connection,
    user_id: UserId,
    new_hash: &str,
) -> QueryResult<()> {
    use database::schema::users::dsl::*;
    use diesel::update;

    update(users.filter(id.eq(user_id)))
        .set(password_hash.eq(new_hash))
        .execute(conn)?;
    Ok(())
}

pub fn insert_token(
    conn: &mut database::Connection,
    token_user_id: UserId,
    token_key: &str,
) -> QueryResult<()> {
    use database::schema::auth_tokens::dsl::*;
    use diesel::insert_into;

    insert_into(auth_tokens)
        .values((user_id.eq(token_user_id), key.eq(token_key)))
        .execute(conn)?;
    Ok(())
}

pub fn token_user(conn: &mut database::Connection, token_key: &str) -> QueryResult<Option<UserId>> {
    use database::schema::auth_tokens::dsl::*;

    auth_tokens
        .select(user_id)
        .filter(key.eq(token_key))
        .get_result(conn)
        .optional()
}

pub fn delete_token(conn: &mut database::Connection, token_key: &str) -> QueryResult<usize> {
    use database::schema::auth_tokens::dsl::*;
    use diesel::delete;

    delete(auth_tokens.filter(key.eq(token_key))).execute(conn)
}

pub fn insert_tag(
    conn: &mut database::Connection,
    new_name: &str,
    new_color: &str,
    new_slug: &str,
) -> QueryResult<Tag> {
    use database::schema::tags::dsl::*;
    use diesel::insert_into;

    insert_into(tags)
        .values((name.eq(new_name), color.eq(new_color), slug.eq(new_slug)))
        .returning(Tag::as_returning())
        .get_result(conn)
}

pub fn all_tags(conn: &mut database::Connection) -> QueryResult<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    tags.select(Tag::as_select()).order(name).load(conn)
}

pub fn tag_by_id(conn: &mut database::Connection, tag_id: TagId) -> QueryResult<Option<Tag>> {
    use database::schema::tags::dsl::*;

    tags.select(Tag::as_select())
        .filter(id.eq(tag_id))
        .get_result(conn)
        .optional()
}

pub fn tags_by_ids(conn: &mut database::Connection, ids: &[TagId]) -> QueryResult<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    tags.select(Tag::as_select())
        .filter(id.eq_any(ids.to_vec()))
        .load(conn)
}

pub fn search_ingredients(
    conn: &mut database::Connection,
    query: Option<&str>,
) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;
    use diesel::expression_methods::EscapeExpressionMethods as _;
    use diesel::expression_methods::TextExpressionMethods as _;

    let mut statement = ingredients.select(Ingredient::as_select()).into_boxed();
    if let Some(query) = query {
        // `%` and `_` in the search term are literal characters, not LIKE
        // metacharacters.
        let prefix = query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        statement = statement.filter(name.like(format!("{prefix}%")).escape('\\'));
    }
    statement.order(name).load(conn)
}

pub fn ingredient_by_id(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> QueryResult<Option<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .filter(id.eq(ingredient_id))
        .get_result(conn)
        .optional()
}

pub fn ingredients_by_ids(
    conn: &mut database::Connection,
    ids: &[IngredientId],
) -> QueryResult<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .filter(id.eq_any(ids.to_vec()))
        .load(conn)
}

/// Returns the ingredient and whether it was newly created.
pub fn get_or_create_ingredient(
    conn: &mut database::Connection,
    new_name: &str,
    new_unit: &str,
) -> QueryResult<(Ingredient, bool)> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    let existing = ingredients
        .select(Ingredient::as_select())
        .filter(name.eq(new_name))
        .filter(measurement_unit.eq(new_unit))
        .get_result(conn)
        .optional()?;
    if let Some(existing) = existing {
        return Ok((existing, false));
    }

    let created = insert_into(ingredients)
        .values((name.eq(new_name), measurement_unit.eq(new_unit)))
        .returning(Ingredient::as_returning())
        .get_result(conn)?;
    Ok((created, true))
}

pub fn insert_recipe(
    conn: &mut database::Connection,
    author: UserId,
    new_name: &str,
    new_text: &str,
    new_cooking_time: i32,
) -> QueryResult<Recipe> {
    use database::schema::recipes::dsl::*;
    use diesel::insert_into;

    insert_into(recipes)
        .values((
            author_id.eq(author),
            name.eq(new_name),
            text.eq(new_text),
            image_path.eq(""),
            cooking_time.eq(new_cooking_time),
        ))
        .returning(Recipe::as_returning())
        .get_result(conn)
}

pub fn update_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    new_name: &str,
    new_text: &str,
    new_cooking_time: i32,
) -> QueryResult<()> {
    use database::schema::recipes::dsl::*;
    use diesel::update;

    update(recipes.filter(id.eq(recipe_id)))
        .set((
            name.eq(new_name),
            text.eq(new_text),
            cooking_time.eq(new_cooking_time),
        ))
        .execute(conn)?;
    Ok(())
}

pub fn set_recipe_image(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    path: &str,
) -> QueryResult<()> {
    use database::schema::recipes::dsl::*;
    use diesel::update;

    update(recipes.filter(id.eq(recipe_id)))
        .set(image_path.eq(path))
        .execute(conn)?;
    Ok(())
}

pub fn delete_recipe(conn: &mut database::Connection, recipe_id: RecipeId) -> QueryResult<usize> {
    use database::schema::recipes::dsl::*;
    use diesel::delete;

    delete(recipes.filter(id.eq(recipe_id))).execute(conn)
}

pub fn recipe_by_id(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
) -> QueryResult<Option<Recipe>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)
        .optional()
}

pub fn recipe_handle_by_id(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
) -> QueryResult<Option<RecipeHandle>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(RecipeHandle::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)
        .optional()
}

pub fn recipe_handles_by_author(
    conn: &mut database::Connection,
    author: UserId,
) -> QueryResult<Vec<RecipeHandle>> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(RecipeHandle::as_select())
        .filter(author_id.eq(author))
        .order((pub_date.desc(), id.desc()))
        .load(conn)
}

pub fn recipes_count(conn: &mut database::Connection, author: UserId) -> QueryResult<i64> {
    use database::schema::recipes::dsl::*;

    recipes
        .filter(author_id.eq(author))
        .count()
        .get_result(conn)
}

/// Full-replace of a recipe's ingredient lines: stale rows are deleted, the
/// new set is inserted. Run inside the caller's transaction.
pub fn replace_recipe_ingredients(
    conn: &mut database::Connection,
    recipe: RecipeId,
    lines: &[(IngredientId, i32)],
) -> QueryResult<()> {
    use database::schema::recipe_ingredients::dsl::*;
    use diesel::{delete, insert_into};

    delete(recipe_ingredients.filter(recipe_id.eq(recipe))).execute(conn)?;
    for &(line_ingredient_id, line_amount) in lines {
        insert_into(recipe_ingredients)
            .values((
                recipe_id.eq(recipe),
                ingredient_id.eq(line_ingredient_id),
                amount.eq(line_amount),
            ))
            .execute(conn)?;
    }
    Ok(())
}

pub fn replace_recipe_tags(
    conn: &mut database::Connection,
    recipe: RecipeId,
    new_tags: &[TagId],
) -> QueryResult<()> {
    use database::schema::recipe_tags::dsl::*;
    use diesel::{delete, insert_into};

    delete(recipe_tags.filter(recipe_id.eq(recipe))).execute(conn)?;
    for &new_tag_id in new_tags {
        insert_into(recipe_tags)
            .values((recipe_id.eq(recipe), tag_id.eq(new_tag_id)))
            .execute(conn)?;
    }
    Ok(())
}

pub fn recipe_ingredient_lines(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> QueryResult<Vec<(Ingredient, i32)>> {
    use database::schema::recipe_ingredients::dsl::*;

    recipe_ingredients
        .inner_join(database::schema::ingredients::table)
        .select((Ingredient::as_select(), amount))
        .filter(recipe_id.eq(recipe))
        .order(id)
        .load(conn)
}

pub fn recipe_tag_list(conn: &mut database::Connection, recipe: RecipeId) -> QueryResult<Vec<Tag>> {
    use database::schema::recipe_tags::dsl::*;

    recipe_tags
        .inner_join(database::schema::tags::table)
        .select(Tag::as_select())
        .filter(recipe_id.eq(recipe))
        .order(id)
        .load(conn)
}

pub fn recipe_ids_with_tag_slugs(
    conn: &mut database::Connection,
    slugs: &[String],
) -> QueryResult<Vec<RecipeId>> {
    use database::schema::recipe_tags::dsl::*;

    recipe_tags
        .inner_join(database::schema::tags::table)
        .select(recipe_id)
        .filter(database::schema::tags::dsl::slug.eq_any(slugs.to_vec()))
        .distinct()
        .load(conn)
}

#[derive(Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    /// When present, only recipes whose id is in the set are returned.
    pub restrict_to: Option<Vec<RecipeId>>,
}

pub fn count_recipes(
    conn: &mut database::Connection,
    filter: &RecipeFilter,
) -> QueryResult<i64> {
    use database::schema::recipes::dsl::*;

    match (filter.author, &filter.restrict_to) {
        (Some(filter_author), Some(ids)) => recipes
            .filter(author_id.eq(filter_author))
            .filter(id.eq_any(ids.clone()))
            .count()
            .get_result(conn),
        (Some(filter_author), None) => recipes
            .filter(author_id.eq(filter_author))
            .count()
            .get_result(conn),
        (None, Some(ids)) => recipes
            .filter(id.eq_any(ids.clone()))
            .count()
            .get_result(conn),
        (None, None) => recipes.count().get_result(conn),
    }
}

pub fn list_recipes(
    conn: &mut database::Connection,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> QueryResult<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    let mut statement = recipes.select(Recipe::as_select()).into_boxed();
    if let Some(filter_author) = filter.author {
        statement = statement.filter(author_id.eq(filter_author));
    }
    if let Some(ids) = &filter.restrict_to {
        statement = statement.filter(id.eq_any(ids.clone()));
    }
    statement
        .order((pub_date.desc(), id.desc()))
        .limit(limit)
        .offset(offset)
        .load(conn)
}

pub fn add_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> QueryResult<usize> {
    use database::schema::favorites::dsl::*;
    use diesel::insert_into;

    insert_into(favorites)
        .values((user_id.eq(user), recipe_id.eq(recipe)))
        .execute(conn)
}

pub fn remove_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> QueryResult<usize> {
    use database::schema::favorites::dsl::*;
    use diesel::delete;

    delete(favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe))).execute(conn)
}

pub fn favorite_recipe_ids(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<RecipeId>> {
    use database::schema::favorites::dsl::*;

    favorites
        .select(recipe_id)
        .filter(user_id.eq(user))
        .load(conn)
}

pub fn add_cart_entry(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> QueryResult<usize> {
    use database::schema::shopping_cart::dsl::*;
    use diesel::insert_into;

    insert_into(shopping_cart)
        .values((user_id.eq(user), recipe_id.eq(recipe)))
        .execute(conn)
}

pub fn remove_cart_entry(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> QueryResult<usize> {
    use database::schema::shopping_cart::dsl::*;
    use diesel::delete;

    delete(
        shopping_cart
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)
}

pub fn cart_recipe_ids(
    conn: &mut database::Connection,
    user: UserId,
) -> QueryResult<Vec<RecipeId>> {
    use database::schema::shopping_cart::dsl::*;

    shopping_cart
        .select(recipe_id)
        .filter(user_id.eq(user))
        .order(id)
        .load(conn)
}

pub fn add_subscription(
    conn: &mut database::Connection,
    subscriber: UserId,
    author: UserId,
) -> QueryResult<usize> {
    use database::schema::subscriptions::dsl::*;
    use diesel::insert_into;

    insert_into(subscriptions)
        .values((subscriber_id.eq(subscriber), author_id.eq(author)))
        .execute(conn)
}

pub fn remove_subscription(
    conn: &mut database::Connection,
    subscriber: UserId,
    author: UserId,
) -> QueryResult<usize> {
    use database::schema::subscriptions::dsl::*;
    use diesel::delete;

    delete(
        subscriptions
            .filter(subscriber_id.eq(subscriber))
            .filter(author_id.eq(author)),
    )
    .execute(conn)
}

pub fn subscribed_author_ids(
    conn: &mut database::Connection,
    subscriber: UserId,
) -> QueryResult<Vec<UserId>> {
    use database::schema::subscriptions::dsl::*;

    subscriptions
        .select(author_id)
        .filter(subscriber_id.eq(subscriber))
        .order(id)
        .load(conn)
}

pub fn users_by_ids(conn: &mut database::Connection, ids: &[UserId]) -> QueryResult<Vec<User>> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(id.eq_any(ids.to_vec()))
        .order(id)
        .load(conn)
}
