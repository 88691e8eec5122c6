use derive_more::Display;
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};

#[derive(
    DieselNewType, Serialize, Deserialize, Display, Debug, Hash, PartialEq, Eq, Copy, Clone,
)]
pub struct UserId(pub i32);

#[derive(
    DieselNewType, Serialize, Deserialize, Display, Debug, Hash, PartialEq, Eq, Copy, Clone,
)]
pub struct RecipeId(pub i32);

#[derive(
    DieselNewType, Serialize, Deserialize, Display, Debug, Hash, PartialEq, Eq, Copy, Clone,
)]
pub struct IngredientId(pub i32);

#[derive(
    DieselNewType, Serialize, Deserialize, Display, Debug, Hash, PartialEq, Eq, Copy, Clone,
)]
pub struct TagId(pub i32);

#[derive(Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Associations, Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub image_path: String,
    pub cooking_time: i32,
    pub pub_date: chrono::NaiveDateTime,
}

/// The subset of recipe columns used by brief listings (favorites, carts,
/// subscription feeds).
#[derive(Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeHandle {
    pub id: RecipeId,
    pub name: String,
    pub image_path: String,
    pub cooking_time: i32,
}

