use sqlx::FromRow;

use crate::diet::model::{decode_column, DietTable};

/// Row of the `users` table as stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub name: String,
    pub passwd: String,
    pub recommendation: Option<f64>,
    pub diet_table: Option<String>, // encoded DietTable, see diet::model
}

/// User with its diet table decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub passwd: String,
    pub recommendation: Option<f64>,
    pub diet_table: Option<DietTable>,
}

impl TryFrom<UserRow> for User {
    type Error = serde_json::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            diet_table: decode_column(row.diet_table.as_deref())?,
            id: row.id,
            name: row.name,
            passwd: row.passwd,
            recommendation: row.recommendation,
        })
    }
}
