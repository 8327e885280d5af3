//! Operator subcommands that work on the database directly.

use std::path::Path;

use anyhow::{bail, Context, Result};
use diesel::prelude::*;
use foodgram_core::parse_ingredients_csv;
use foodgram_core::validation::{TAG_NAME_MAX_LENGTH, TAG_SLUG_MAX_LENGTH};

use crate::db::DbPool;
use crate::models::{NewIngredient, NewTag};
use crate::schema::{ingredients, tags};

/// Two bind parameters per row keeps each batch well under the Postgres limit.
const INSERT_BATCH_SIZE: usize = 1000;

/// Load an ingredient catalogue CSV. Rows already present (same name and
/// unit) are skipped, so the import can be re-run. Returns the number of
/// new rows.
pub fn load_ingredients(pool: &DbPool, path: &Path) -> Result<usize> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let rows = parse_ingredients_csv(&bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut conn = pool.get()?;
    let inserted = conn.transaction::<usize, diesel::result::Error, _>(|conn| {
        let mut inserted = 0;
        for batch in rows.chunks(INSERT_BATCH_SIZE) {
            let values: Vec<NewIngredient> = batch
                .iter()
                .map(|row| NewIngredient {
                    name: &row.name,
                    measurement_unit: &row.measurement_unit,
                })
                .collect();
            inserted += diesel::insert_into(ingredients::table)
                .values(&values)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        Ok(inserted)
    })?;

    tracing::info!(
        file = %path.display(),
        parsed = rows.len(),
        inserted,
        "loaded ingredients"
    );
    Ok(inserted)
}

/// Create a tag. Fails if the name or slug is already used.
pub fn create_tag(pool: &DbPool, name: &str, slug: Option<&str>) -> Result<i64> {
    let name = name.trim();
    let slug = slug.map(str::trim).filter(|s| !s.is_empty());

    if name.is_empty() {
        bail!("Tag name cannot be empty");
    }
    if name.chars().count() > TAG_NAME_MAX_LENGTH {
        bail!("Tag name cannot be longer than {TAG_NAME_MAX_LENGTH} characters");
    }
    if let Some(slug) = slug {
        if slug.len() > TAG_SLUG_MAX_LENGTH {
            bail!("Tag slug cannot be longer than {TAG_SLUG_MAX_LENGTH} characters");
        }
        if !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            bail!("Tag slug may only contain letters, digits, '-' and '_'");
        }
    }

    let mut conn = pool.get()?;
    let id: i64 = diesel::insert_into(tags::table)
        .values(&NewTag { name, slug })
        .returning(tags::id)
        .get_result(&mut conn)
        .with_context(|| format!("Failed to create tag {name:?}"))?;

    tracing::info!(tag_id = id, name, slug, "created tag");
    Ok(id)
}
