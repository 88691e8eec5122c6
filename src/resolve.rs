//! Viewer-relative fields. A [`Viewer`] is threaded through explicitly;
//! nothing here reads ambient request state.

use crate::database;
use crate::database::models::{RecipeId, UserId};
use crate::query;
use diesel::QueryResult;
use std::collections::HashSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(UserId),
}

impl Viewer {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }
}

/// The viewer's full favorite / cart / subscription id-sets, fetched once
/// per request so a page of results resolves with in-memory membership
/// tests instead of a query per row.
pub struct ViewerSets {
    favorites: HashSet<RecipeId>,
    cart: HashSet<RecipeId>,
    subscriptions: HashSet<UserId>,
}

impl ViewerSets {
    pub fn load(conn: &mut database::Connection, viewer: Viewer) -> QueryResult<Self> {
        let Some(user) = viewer.user_id() else {
            return Ok(Self {
                favorites: HashSet::new(),
                cart: HashSet::new(),
                subscriptions: HashSet::new(),
            });
        };
        Ok(Self {
            favorites: query::favorite_recipe_ids(conn, user)?.into_iter().collect(),
            cart: query::cart_recipe_ids(conn, user)?.into_iter().collect(),
            subscriptions: query::subscribed_author_ids(conn, user)?
                .into_iter()
                .collect(),
        })
    }

    pub fn is_favorited(&self, recipe: RecipeId) -> bool {
        self.favorites.contains(&recipe)
    }

    pub fn is_in_shopping_cart(&self, recipe: RecipeId) -> bool {
        self.cart.contains(&recipe)
    }

    pub fn is_subscribed(&self, author: UserId) -> bool {
        self.subscriptions.contains(&author)
    }
}

pub fn recipes_count(conn: &mut database::Connection, author: UserId) -> QueryResult<i64> {
    query::recipes_count(conn, author)
}
