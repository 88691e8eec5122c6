diesel::table! {
    auth_tokens (id) {
        id -> Integer,
        user_id -> Integer,
        key -> Text,
    }
}

diesel::table! {
    favorites (id) {
        id -> Integer,
        user_id -> Integer,
        recipe_id -> Integer,
    }
}

diesel::table! {
    ingredients (id) {
        id -> Integer,
        name -> Text,
        measurement_unit -> Text,
    }
}

diesel::table! {
    recipe_ingredients (id) {
        id -> Integer,
        recipe_id -> Integer,
        ingredient_id -> Integer,
        amount -> Integer,
    }
}

diesel::table! {
    recipe_tags (id) {
        id -> Integer,
        recipe_id -> Integer,
        tag_id -> Integer,
    }
}

diesel::table! {
    recipes (id) {
        id -> Integer,
        author_id -> Integer,
        name -> Text,
        text -> Text,
        image_path -> Text,
        cooking_time -> Integer,
        pub_date -> Timestamp,
    }
}

diesel::table! {
    shopping_cart (id) {
        id -> Integer,
        user_id -> Integer,
        recipe_id -> Integer,
    }
}

diesel::table! {
    subscriptions (id) {
        id -> Integer,
        subscriber_id -> Integer,
        author_id -> Integer,
    }
}

diesel::table! {
    tags (id) {
        id -> Integer,
        name -> Text,
        color -> Text,
        slug -> Text,
    }
}

diesel::table! {
    users (id) {
        id -> Integer,
        email -> Text,
        username -> Text,
        first_name -> Text,
        last_name -> Text,
        password_hash -> Text,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(favorites -> recipes (recipe_id));
diesel::joinable!(favorites -> users (user_id));
diesel::joinable!(recipe_ingredients -> ingredients (ingredient_id));
diesel::joinable!(recipe_ingredients -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipes -> users (author_id));
diesel::joinable!(shopping_cart -> recipes (recipe_id));
diesel::joinable!(shopping_cart -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    auth_tokens,
    favorites,
    ingredients,
    recipe_ingredients,
    recipe_tags,
    recipes,
    shopping_cart,
    subscriptions,
    tags,
    users,
);
