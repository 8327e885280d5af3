//! Query-string filters for recipe and ingredient listings.
//!
//! Recipe filters are parsed from raw query pairs because `tags` repeats
//! (`?tags=breakfast&tags=dinner`), which plain struct deserialization does
//! not handle.

use serde::Deserialize;

/// Filters accepted by `GET /api/recipes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Tag slugs; a recipe matches if it carries any of them.
    pub tags: Vec<String>,
    pub author: Option<i64>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

/// What the favorited / in-cart flags mean for a given viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// No constraint.
    Any,
    /// Only recipes the viewer has in the relation.
    Only,
    /// Only recipes the viewer does not have in the relation.
    Exclude,
    /// Nothing can match (anonymous viewer asking for their own favorites).
    Nothing,
}

impl RecipeFilter {
    pub fn from_query(query: Option<&str>) -> Self {
        match query {
            Some(q) => Self::from_pairs(url::form_urlencoded::parse(q.as_bytes())),
            None => Self::default(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            match key.as_ref() {
                "tags" => {
                    for slug in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                        if !filter.tags.iter().any(|t| t == slug) {
                            filter.tags.push(slug.to_string());
                        }
                    }
                }
                "author" => filter.author = value.parse().ok(),
                "is_favorited" => filter.is_favorited = parse_flag(value),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = parse_flag(value),
                _ => {}
            }
        }
        filter
    }

    pub fn favorited_for(&self, authenticated: bool) -> Membership {
        membership(self.is_favorited, authenticated)
    }

    pub fn in_shopping_cart_for(&self, authenticated: bool) -> Membership {
        membership(self.is_in_shopping_cart, authenticated)
    }
}

fn membership(flag: Option<bool>, authenticated: bool) -> Membership {
    match (flag, authenticated) {
        (None, _) => Membership::Any,
        (Some(true), true) => Membership::Only,
        (Some(false), true) => Membership::Exclude,
        (Some(true), false) => Membership::Nothing,
        (Some(false), false) => Membership::Any,
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Filters accepted by `GET /api/ingredients`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngredientFilter {
    /// Case-insensitive name prefix.
    pub name: Option<String>,
}

impl IngredientFilter {
    /// `LIKE` pattern for the prefix, with wildcards in the input escaped.
    pub fn prefix_pattern(&self) -> Option<String> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        let escaped = name
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("{escaped}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(RecipeFilter::from_query(None), RecipeFilter::default());
        assert_eq!(RecipeFilter::from_query(Some("")), RecipeFilter::default());
    }

    #[test]
    fn test_repeated_tags() {
        let f = RecipeFilter::from_query(Some("tags=breakfast&tags=dinner&tags=breakfast"));
        assert_eq!(f.tags, vec!["breakfast", "dinner"]);
    }

    #[test]
    fn test_comma_separated_tags_and_blanks() {
        let f = RecipeFilter::from_query(Some("tags=lunch,%20dinner,,&tags="));
        assert_eq!(f.tags, vec!["lunch", "dinner"]);
    }

    #[test]
    fn test_author_and_flags() {
        let f = RecipeFilter::from_query(Some(
            "author=12&is_favorited=1&is_in_shopping_cart=false&page=2&limit=3",
        ));
        assert_eq!(f.author, Some(12));
        assert_eq!(f.is_favorited, Some(true));
        assert_eq!(f.is_in_shopping_cart, Some(false));
    }

    #[test]
    fn test_garbage_values_are_ignored() {
        let f = RecipeFilter::from_query(Some("author=abc&is_favorited=maybe"));
        assert_eq!(f.author, None);
        assert_eq!(f.is_favorited, None);
    }

    #[test]
    fn test_membership_for_anonymous() {
        let f = RecipeFilter {
            is_favorited: Some(true),
            is_in_shopping_cart: Some(false),
            ..Default::default()
        };
        assert_eq!(f.favorited_for(false), Membership::Nothing);
        assert_eq!(f.in_shopping_cart_for(false), Membership::Any);
        assert_eq!(f.favorited_for(true), Membership::Only);
        assert_eq!(f.in_shopping_cart_for(true), Membership::Exclude);
    }

    #[test]
    fn test_ingredient_prefix_pattern() {
        let f = IngredientFilter {
            name: Some("  сах ".to_string()),
        };
        assert_eq!(f.prefix_pattern().as_deref(), Some("сах%"));

        let f = IngredientFilter {
            name: Some("50%_off".to_string()),
        };
        assert_eq!(f.prefix_pattern().as_deref(), Some("50\\%\\_off%"));

        assert_eq!(IngredientFilter::default().prefix_pattern(), None);
    }
}
