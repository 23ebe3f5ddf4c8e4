use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::diet::model::{decode_column, encode_column, Calories, DietTable, FoodAdded};
use crate::users::repo_types::{User, UserRow};

/// Recommendation stored for new users.
pub const INITIAL_RECOMMENDATION: f64 = 0.0;

/// Access to the `users` rows.
///
/// Every method is one unit of work: it either completes or leaves the row
/// untouched. Methods addressing a user by name report a missing row through
/// their return value rather than an error.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>>;

    /// True when some row matches both `name` and `passwd` exactly.
    async fn credentials_match(&self, name: &str, passwd: &str) -> anyhow::Result<bool>;

    /// Inserts a user with the initial recommendation and an empty diet
    /// table. Returns `None` when the name is already taken.
    async fn create(&self, name: &str, passwd: &str) -> anyhow::Result<Option<User>>;

    /// Returns `false` when no user has this name.
    async fn set_recommendation(&self, name: &str, recommendation: f64) -> anyhow::Result<bool>;

    /// Read-modify-write of the diet table, see [`DietTable::add_food`].
    /// Returns `None` when no user has this name. A rejected addition fails
    /// with a [`DietError`](crate::diet::model::DietError) and writes nothing.
    async fn add_food(
        &self,
        name: &str,
        date: &str,
        food: &str,
        calorie: Calories,
    ) -> anyhow::Result<Option<FoodAdded>>;

    async fn close(&self) {}
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, passwd, recommendation, diet_table
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .context("find user by name")?;

        row.map(User::try_from)
            .transpose()
            .with_context(|| format!("decode diet table of {name:?}"))
    }

    async fn credentials_match(&self, name: &str, passwd: &str) -> anyhow::Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS (SELECT 1 FROM users WHERE name = $1 AND passwd = $2)"#,
        )
        .bind(name)
        .bind(passwd)
        .fetch_one(&self.db)
        .await
        .context("match credentials")?;
        Ok(found)
    }

    async fn create(&self, name: &str, passwd: &str) -> anyhow::Result<Option<User>> {
        let diet_table = encode_column(Some(&DietTable::new())).context("encode diet table")?;
        let inserted = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (name, passwd, recommendation, diet_table)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, passwd, recommendation, diet_table
            "#,
        )
        .bind(name)
        .bind(passwd)
        .bind(INITIAL_RECOMMENDATION)
        .bind(diet_table)
        .fetch_one(&self.db)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(name, "insert hit unique constraint");
                return Ok(None);
            }
            Err(e) => return Err(e).context("insert user"),
        };
        Ok(Some(User::try_from(row).context("decode diet table")?))
    }

    async fn set_recommendation(&self, name: &str, recommendation: f64) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE users SET recommendation = $2 WHERE name = $1"#)
            .bind(name)
            .bind(recommendation)
            .execute(&self.db)
            .await
            .context("update recommendation")?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_food(
        &self,
        name: &str,
        date: &str,
        food: &str,
        calorie: Calories,
    ) -> anyhow::Result<Option<FoodAdded>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // Row lock keeps concurrent additions for the same user serialized.
        let column = sqlx::query_scalar::<_, Option<String>>(
            r#"SELECT diet_table FROM users WHERE name = $1 FOR UPDATE"#,
        )
        .bind(name)
        .fetch_optional(&mut *tx)
        .await
        .context("lock diet table")?;

        let Some(column) = column else {
            return Ok(None);
        };

        let mut table = decode_column(column.as_deref())
            .with_context(|| format!("decode diet table of {name:?}"))?
            .unwrap_or_default();
        let added = table.add_food(date, food, calorie)?;
        let encoded = encode_column(Some(&table)).context("encode diet table")?;

        sqlx::query(r#"UPDATE users SET diet_table = $2 WHERE name = $1"#)
            .bind(name)
            .bind(encoded)
            .execute(&mut *tx)
            .await
            .context("update diet table")?;
        tx.commit().await.context("commit tx")?;

        Ok(Some(added))
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
