use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::diet::model::{decode_column, encode_column, Calories, DietTable, FoodAdded};
use crate::users::repo::{UserStore, INITIAL_RECOMMENDATION};
use crate::users::repo_types::{User, UserRow};

/// Process-local `users` table.
///
/// Rows are held in their stored shape, so reads and writes go through the
/// same diet table encoding as the Postgres store.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<Table>,
}

#[derive(Default)]
struct Table {
    rows: Vec<UserRow>,
    last_id: i32,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<User>> {
        let table = self.inner.lock().await;
        table
            .rows
            .iter()
            .find(|r| r.name == name)
            .cloned()
            .map(User::try_from)
            .transpose()
            .with_context(|| format!("decode diet table of {name:?}"))
    }

    async fn credentials_match(&self, name: &str, passwd: &str) -> anyhow::Result<bool> {
        let table = self.inner.lock().await;
        Ok(table
            .rows
            .iter()
            .any(|r| r.name == name && r.passwd == passwd))
    }

    async fn create(&self, name: &str, passwd: &str) -> anyhow::Result<Option<User>> {
        let mut table = self.inner.lock().await;
        if table.rows.iter().any(|r| r.name == name) {
            return Ok(None);
        }
        table.last_id += 1;
        let row = UserRow {
            id: table.last_id,
            name: name.to_owned(),
            passwd: passwd.to_owned(),
            recommendation: Some(INITIAL_RECOMMENDATION),
            diet_table: encode_column(Some(&DietTable::new())).context("encode diet table")?,
        };
        table.rows.push(row.clone());
        Ok(Some(User::try_from(row).context("decode diet table")?))
    }

    async fn set_recommendation(&self, name: &str, recommendation: f64) -> anyhow::Result<bool> {
        let mut table = self.inner.lock().await;
        match table.rows.iter_mut().find(|r| r.name == name) {
            Some(row) => {
                row.recommendation = Some(recommendation);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_food(
        &self,
        name: &str,
        date: &str,
        food: &str,
        calorie: Calories,
    ) -> anyhow::Result<Option<FoodAdded>> {
        let mut table = self.inner.lock().await;
        let Some(row) = table.rows.iter_mut().find(|r| r.name == name) else {
            return Ok(None);
        };

        let mut diet = decode_column(row.diet_table.as_deref())
            .with_context(|| format!("decode diet table of {name:?}"))?
            .unwrap_or_default();
        let added = diet.add_food(date, food, calorie)?;
        row.diet_table = encode_column(Some(&diet)).context("encode diet table")?;
        Ok(Some(added))
    }
}
