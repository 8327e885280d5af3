use std::collections::HashSet;

use crate::error::ValidationError;

pub const TAG_NAME_MAX_LENGTH: usize = 32;
pub const TAG_SLUG_MAX_LENGTH: usize = 32;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 128;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 64;
pub const RECIPE_NAME_MAX_LENGTH: usize = 256;
pub const USER_NAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32000;
pub const MIN_INGREDIENT_AMOUNT: i64 = 1;
pub const MAX_INGREDIENT_AMOUNT: i64 = 32000;

/// Usernames that would shadow fixed routes under /api/users.
const RESERVED_USERNAMES: &[&str] = &["me", "subscriptions", "set_password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientEntry {
    pub id: i64,
    pub amount: i64,
}

/// Recipe payload as received, before any database lookups.
#[derive(Debug, Clone, Copy)]
pub struct RecipeDraft<'a> {
    pub name: &'a str,
    pub text: &'a str,
    pub cooking_time: i64,
    pub ingredients: &'a [IngredientEntry],
    pub tags: &'a [i64],
}

pub fn validate_cooking_time(value: i64) -> Result<i16, ValidationError> {
    if value < MIN_COOKING_TIME {
        return Err(ValidationError::new(
            "cooking_time",
            format!("Cooking time must be at least {MIN_COOKING_TIME} minute."),
        ));
    }
    if value > MAX_COOKING_TIME {
        return Err(ValidationError::new(
            "cooking_time",
            format!("Cooking time cannot exceed {MAX_COOKING_TIME} minutes."),
        ));
    }
    Ok(value as i16)
}

pub fn validate_amount(value: i64) -> Result<i16, ValidationError> {
    if value < MIN_INGREDIENT_AMOUNT {
        return Err(ValidationError::new(
            "ingredients",
            format!("Ingredient amount must be at least {MIN_INGREDIENT_AMOUNT}."),
        ));
    }
    if value > MAX_INGREDIENT_AMOUNT {
        return Err(ValidationError::new(
            "ingredients",
            format!("Ingredient amount cannot exceed {MAX_INGREDIENT_AMOUNT}."),
        ));
    }
    Ok(value as i16)
}

pub fn validate_recipe(draft: &RecipeDraft<'_>) -> Result<(), ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name cannot be empty."));
    }
    if name.chars().count() > RECIPE_NAME_MAX_LENGTH {
        return Err(ValidationError::new(
            "name",
            format!("Name cannot be longer than {RECIPE_NAME_MAX_LENGTH} characters."),
        ));
    }
    if draft.text.trim().is_empty() {
        return Err(ValidationError::new("text", "Description cannot be empty."));
    }
    validate_cooking_time(draft.cooking_time)?;

    if draft.ingredients.is_empty() {
        return Err(ValidationError::new(
            "ingredients",
            "Add at least one ingredient.",
        ));
    }
    let mut seen = HashSet::with_capacity(draft.ingredients.len());
    for entry in draft.ingredients {
        if !seen.insert(entry.id) {
            return Err(ValidationError::new(
                "ingredients",
                "Ingredients must not repeat.",
            ));
        }
        validate_amount(entry.amount)?;
    }

    if draft.tags.is_empty() {
        return Err(ValidationError::new("tags", "Add at least one tag."));
    }
    let unique_tags: HashSet<_> = draft.tags.iter().collect();
    if unique_tags.len() != draft.tags.len() {
        return Err(ValidationError::new("tags", "Tags must not repeat."));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

pub fn validate_registration(reg: &Registration<'_>) -> Result<(), ValidationError> {
    validate_email(reg.email)?;
    validate_username(reg.username)?;
    validate_person_name("first_name", reg.first_name)?;
    validate_person_name("last_name", reg.last_name)?;
    validate_password(reg.password)?;
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::new("email", "Enter a valid email address.");
    if email.is_empty() || email.len() > EMAIL_MAX_LENGTH || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels_ok = domain.split('.').count() >= 2 && domain.split('.').all(|label| !label.is_empty());
    if !labels_ok {
        return Err(invalid());
    }
    Ok(())
}

/// Same character set Django allows for usernames: letters, digits and `.@+-_`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::new("username", "Username cannot be empty."));
    }
    if username.chars().count() > USER_NAME_MAX_LENGTH {
        return Err(ValidationError::new(
            "username",
            format!("Username cannot be longer than {USER_NAME_MAX_LENGTH} characters."),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !username.chars().all(allowed) {
        return Err(ValidationError::new(
            "username",
            "Username may contain only letters, digits and @/./+/-/_ characters.",
        ));
    }
    if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
        return Err(ValidationError::new(
            "username",
            format!("Username '{username}' is reserved."),
        ));
    }
    Ok(())
}

fn validate_person_name(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "This field cannot be empty."));
    }
    if value.chars().count() > USER_NAME_MAX_LENGTH {
        return Err(ValidationError::new(
            field,
            format!("Cannot be longer than {USER_NAME_MAX_LENGTH} characters."),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("password", "Password cannot be empty."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(i64, i64)]) -> Vec<IngredientEntry> {
        pairs
            .iter()
            .map(|&(id, amount)| IngredientEntry { id, amount })
            .collect()
    }

    fn draft<'a>(ingredients: &'a [IngredientEntry], tags: &'a [i64]) -> RecipeDraft<'a> {
        RecipeDraft {
            name: "Pancakes",
            text: "Mix and fry.",
            cooking_time: 20,
            ingredients,
            tags,
        }
    }

    #[test]
    fn test_valid_recipe() {
        let ingredients = entries(&[(1, 200), (2, 3)]);
        assert_eq!(validate_recipe(&draft(&ingredients, &[1, 2])), Ok(()));
    }

    #[test]
    fn test_cooking_time_bounds() {
        assert_eq!(validate_cooking_time(1), Ok(1));
        assert_eq!(validate_cooking_time(32000), Ok(32000));
        assert_eq!(validate_cooking_time(0).unwrap_err().field, "cooking_time");
        assert_eq!(validate_cooking_time(-5).unwrap_err().field, "cooking_time");
        assert_eq!(validate_cooking_time(32001).unwrap_err().field, "cooking_time");
    }

    #[test]
    fn test_amount_bounds() {
        assert_eq!(validate_amount(1), Ok(1));
        assert_eq!(validate_amount(32000), Ok(32000));
        assert!(validate_amount(0).is_err());
        assert!(validate_amount(32001).is_err());
    }

    #[test]
    fn test_recipe_requires_ingredients_and_tags() {
        let none: Vec<IngredientEntry> = Vec::new();
        assert_eq!(
            validate_recipe(&draft(&none, &[1])).unwrap_err().field,
            "ingredients"
        );

        let ingredients = entries(&[(1, 10)]);
        assert_eq!(
            validate_recipe(&draft(&ingredients, &[])).unwrap_err().field,
            "tags"
        );
    }

    #[test]
    fn test_recipe_rejects_duplicates() {
        let repeated = entries(&[(4, 10), (4, 20)]);
        let err = validate_recipe(&draft(&repeated, &[1])).unwrap_err();
        assert_eq!(err.field, "ingredients");
        assert!(err.message.contains("repeat"));

        let ingredients = entries(&[(1, 10)]);
        let err = validate_recipe(&draft(&ingredients, &[3, 3])).unwrap_err();
        assert_eq!(err.field, "tags");
    }

    #[test]
    fn test_recipe_rejects_bad_amount() {
        let ingredients = entries(&[(1, 0)]);
        assert_eq!(
            validate_recipe(&draft(&ingredients, &[1])).unwrap_err().field,
            "ingredients"
        );
    }

    #[test]
    fn test_recipe_name_and_text() {
        let ingredients = entries(&[(1, 10)]);
        let mut d = draft(&ingredients, &[1]);
        d.name = "   ";
        assert_eq!(validate_recipe(&d).unwrap_err().field, "name");

        let long_name = "x".repeat(RECIPE_NAME_MAX_LENGTH + 1);
        d.name = &long_name;
        assert_eq!(validate_recipe(&d).unwrap_err().field, "name");

        d.name = "Soup";
        d.text = "";
        assert_eq!(validate_recipe(&d).unwrap_err().field, "text");
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("cook@example.com").is_ok());
        assert!(validate_email("cook.name+tag@mail.example.org").is_ok());
        assert!(validate_email("cook@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("cook@@example.com").is_err());
        assert!(validate_email("cook example@example.com").is_err());
        assert!(validate_email("cook@example.").is_err());
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("chef_anna").is_ok());
        assert!(validate_username("a.b@c+d-e").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username("me").is_err());
        assert!(validate_username("Me").is_err());
        assert!(validate_username(&"u".repeat(USER_NAME_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_registration_reports_first_bad_field() {
        let reg = Registration {
            email: "cook@example.com",
            username: "cook",
            first_name: "",
            last_name: "Smith",
            password: "secret",
        };
        assert_eq!(validate_registration(&reg).unwrap_err().field, "first_name");
    }
}
