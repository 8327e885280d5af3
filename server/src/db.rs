use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Build the pool and run pending migrations.
pub fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().build(manager)?;

    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {e}"))?;

    Ok(pool)
}

/// A pool that does not connect until first use. Handlers that never touch
/// the database can be exercised against it without a running server.
#[cfg(test)]
pub fn lazy_pool(database_url: &str) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    r2d2::Pool::builder()
        .min_idle(Some(0))
        .connection_timeout(std::time::Duration::from_millis(200))
        .build_unchecked(manager)
}

/// Pool for tests that need a real database, or `None` when neither
/// `TEST_DATABASE_URL` nor `DATABASE_URL` is set. Migrations run once per
/// process. The pool holds a single connection inside a test transaction,
/// so handlers see the fixtures and nothing is ever committed.
#[cfg(test)]
pub fn test_pool() -> Option<DbPool> {
    static MIGRATED: std::sync::Once = std::sync::Once::new();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    MIGRATED.call_once(|| {
        let mut conn = PgConnection::establish(&url).expect("connect to test database");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("run migrations on test database");
    });

    let pool = r2d2::Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(r2d2::TestCustomizer))
        .build(ConnectionManager::<PgConnection>::new(url))
        .expect("build test pool");
    Some(pool)
}

/// Row builders for database-backed tests.
#[cfg(test)]
pub mod fixtures {
    use crate::models::{NewImage, NewIngredient, NewRecipe, NewUser, Recipe, User};
    use crate::schema::{images, ingredients, recipes, users};
    use diesel::prelude::*;
    use uuid::Uuid;

    pub fn user(conn: &mut PgConnection, username: &str) -> User {
        diesel::insert_into(users::table)
            .values(&NewUser {
                email: &format!("{username}@foodgram.test"),
                username,
                first_name: "Test",
                last_name: "Cook",
                password_hash: "unused",
            })
            .returning(User::as_returning())
            .get_result(conn)
            .unwrap()
    }

    pub fn image(conn: &mut PgConnection) -> Uuid {
        diesel::insert_into(images::table)
            .values(&NewImage {
                content_type: "image/gif",
                data: b"GIF89a",
            })
            .returning(images::id)
            .get_result(conn)
            .unwrap()
    }

    /// Id of the `(name, unit)` ingredient, creating it if the catalogue
    /// does not have it yet.
    pub fn ingredient(conn: &mut PgConnection, name: &str, measurement_unit: &str) -> i64 {
        diesel::insert_into(ingredients::table)
            .values(&NewIngredient {
                name,
                measurement_unit,
            })
            .on_conflict_do_nothing()
            .execute(conn)
            .unwrap();
        ingredients::table
            .filter(ingredients::name.eq(name))
            .filter(ingredients::measurement_unit.eq(measurement_unit))
            .select(ingredients::id)
            .first(conn)
            .unwrap()
    }

    pub fn recipe(conn: &mut PgConnection, author_id: i64, short_code: &str) -> Recipe {
        let image_id = image(conn);
        diesel::insert_into(recipes::table)
            .values(&NewRecipe {
                author_id,
                name: "Pancakes",
                text: "Mix and fry.",
                image_id,
                cooking_time: 20,
                short_code,
            })
            .returning(Recipe::as_returning())
            .get_result(conn)
            .unwrap()
    }
}
