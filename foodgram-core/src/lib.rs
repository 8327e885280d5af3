pub mod error;
pub mod filters;
pub mod image;
pub mod ingredient_import;
pub mod pagination;
pub mod shopping_list;
pub mod short_code;
pub mod validation;

pub use error::{ImageError, ImportError, PaginationError, ShortCodeError, ValidationError};
pub use filters::{IngredientFilter, Membership, RecipeFilter};
pub use image::{decode_data_url, validate_image, MAX_FILE_SIZE};
pub use ingredient_import::{parse_ingredients_csv, IngredientRow};
pub use pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use shopping_list::{
    aggregate, render, render_shopping_list, IngredientAmount, ShoppingListLine,
};
pub use short_code::{
    claim_unique_short_code, generate_short_code, is_valid_short_code, Claim,
    MAX_SHORT_CODE_ATTEMPTS, SHORT_CODE_LENGTH,
};
pub use validation::{
    validate_amount, validate_cooking_time, validate_recipe, validate_registration,
    IngredientEntry, RecipeDraft, Registration,
};
