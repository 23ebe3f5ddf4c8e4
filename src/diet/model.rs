use std::collections::BTreeMap;
use std::ops::Add;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calorie amount as it appears on the wire and in the stored column.
///
/// Integers and floats are kept apart so `50` stays `50` and `50.5` stays
/// `50.5` after a trip through storage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Calories {
    Int(i64),
    Float(f64),
}

impl Calories {
    pub fn is_finite(self) -> bool {
        match self {
            Calories::Int(_) => true,
            Calories::Float(v) => v.is_finite(),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Calories::Int(v) => v as f64,
            Calories::Float(v) => v,
        }
    }
}

impl Add for Calories {
    type Output = Calories;

    fn add(self, rhs: Calories) -> Calories {
        match (self, rhs) {
            (Calories::Int(a), Calories::Int(b)) => match a.checked_add(b) {
                Some(sum) => Calories::Int(sum),
                None => Calories::Float(a as f64 + b as f64),
            },
            (a, b) => Calories::Float(a.as_f64() + b.as_f64()),
        }
    }
}

pub type Foods = BTreeMap<String, Calories>;

/// One day of the diet log, stored as `[date, foods, total_calories]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(String, Foods, Calories)",
    into = "(String, Foods, Calories)"
)]
pub struct DayRecord {
    pub date: String,
    pub foods: Foods,
    pub total_calories: Calories,
}

impl DayRecord {
    pub fn new(date: &str, food: &str, calorie: Calories) -> Self {
        let mut foods = Foods::new();
        foods.insert(food.to_owned(), calorie);
        Self {
            date: date.to_owned(),
            foods,
            total_calories: calorie,
        }
    }
}

impl From<(String, Foods, Calories)> for DayRecord {
    fn from((date, foods, total_calories): (String, Foods, Calories)) -> Self {
        Self {
            date,
            foods,
            total_calories,
        }
    }
}

impl From<DayRecord> for (String, Foods, Calories) {
    fn from(day: DayRecord) -> Self {
        (day.date, day.foods, day.total_calories)
    }
}

/// Rejected [`DietTable::add_food`] call; the table is left unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum DietError {
    #[error("calorie total for {date} is not a finite number")]
    NonFiniteTotal { date: String },
}

/// Outcome of [`DietTable::add_food`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodAdded {
    NewDay,
    ExistingDay,
}

/// A user's diet log: at most one [`DayRecord`] per date, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DietTable(Vec<DayRecord>);

impl DietTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn days(&self) -> &[DayRecord] {
        &self.0
    }

    pub fn day(&self, date: &str) -> Option<&DayRecord> {
        self.0.iter().find(|d| d.date == date)
    }

    /// Records `food` for `date`.
    ///
    /// On an existing day the food's amount is replaced and `calorie` is added
    /// to the running total. The total is never recomputed, so replacing a
    /// food that was already logged counts both amounts.
    ///
    /// A total that is not finite has no JSON encoding, so such a call fails
    /// before anything changes.
    pub fn add_food(
        &mut self,
        date: &str,
        food: &str,
        calorie: Calories,
    ) -> Result<FoodAdded, DietError> {
        let non_finite = || DietError::NonFiniteTotal {
            date: date.to_owned(),
        };

        if let Some(day) = self.0.iter_mut().find(|d| d.date == date) {
            let total = day.total_calories + calorie;
            if !calorie.is_finite() || !total.is_finite() {
                return Err(non_finite());
            }
            day.foods.insert(food.to_owned(), calorie);
            day.total_calories = total;
            return Ok(FoodAdded::ExistingDay);
        }

        if !calorie.is_finite() {
            return Err(non_finite());
        }
        self.0.push(DayRecord::new(date, food, calorie));
        Ok(FoodAdded::NewDay)
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Encodes a diet table for the `diet_table` column. `None` writes nothing.
pub fn encode_column(table: Option<&DietTable>) -> Result<Option<String>, serde_json::Error> {
    table.map(DietTable::encode).transpose()
}

/// Decodes the `diet_table` column. A NULL column stays `None`.
pub fn decode_column(column: Option<&str>) -> Result<Option<DietTable>, serde_json::Error> {
    column.map(DietTable::decode).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DietTable {
        let mut table = DietTable::new();
        table.add_food("2024-01-01", "apple", Calories::Int(50)).unwrap();
        table.add_food("2024-01-01", "banana", Calories::Int(100)).unwrap();
        table.add_food("2024-01-02", "soup", Calories::Float(210.5)).unwrap();
        table
    }

    #[test]
    fn column_roundtrip_preserves_structure() {
        let table = sample();
        let encoded = encode_column(Some(&table)).unwrap();
        let decoded = decode_column(encoded.as_deref()).unwrap();
        assert_eq!(decoded, Some(table));
    }

    #[test]
    fn null_column_is_absent_not_empty() {
        assert_eq!(decode_column(None).unwrap(), None);
        assert_eq!(encode_column(None).unwrap(), None);
        assert_eq!(decode_column(Some("[]")).unwrap(), Some(DietTable::new()));
    }

    #[test]
    fn encodes_days_as_triples() {
        let mut table = DietTable::new();
        table.add_food("2024-01-01", "apple", Calories::Int(50)).unwrap();
        assert_eq!(table.encode().unwrap(), r#"[["2024-01-01",{"apple":50},50]]"#);
    }

    #[test]
    fn decodes_integers_and_floats_separately() {
        let table = DietTable::decode(r#"[["d",{"a":1,"b":2.5},3.5]]"#).unwrap();
        let day = table.day("d").unwrap();
        assert_eq!(day.foods["a"], Calories::Int(1));
        assert_eq!(day.foods["b"], Calories::Float(2.5));
        assert_eq!(day.total_calories, Calories::Float(3.5));
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(DietTable::decode("not json").is_err());
        assert!(DietTable::decode(r#"[["d",{"a":1}]]"#).is_err());
    }

    #[test]
    fn same_date_accumulates_into_one_day() {
        let table = sample();
        assert_eq!(table.days().len(), 2);
        let day = table.day("2024-01-01").unwrap();
        assert_eq!(day.foods.len(), 2);
        assert_eq!(day.total_calories, Calories::Int(150));
    }

    #[test]
    fn overwriting_a_food_still_adds_to_total() {
        let mut table = DietTable::new();
        assert_eq!(table.add_food("d", "apple", Calories::Int(50)), Ok(FoodAdded::NewDay));
        assert_eq!(
            table.add_food("d", "apple", Calories::Int(80)),
            Ok(FoodAdded::ExistingDay)
        );
        let day = table.day("d").unwrap();
        assert_eq!(day.foods["apple"], Calories::Int(80));
        assert_eq!(day.total_calories, Calories::Int(130));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        assert_eq!(Calories::Int(1) + Calories::Int(2), Calories::Int(3));
        assert_eq!(Calories::Int(1) + Calories::Float(0.5), Calories::Float(1.5));
        assert_eq!(
            Calories::Int(i64::MAX) + Calories::Int(1),
            Calories::Float(i64::MAX as f64 + 1.0)
        );
    }

    #[test]
    fn overflowing_total_is_rejected_and_table_kept() {
        let mut table = DietTable::new();
        table.add_food("d", "a", Calories::Float(1e308)).unwrap();
        let before = table.clone();

        let err = table.add_food("d", "b", Calories::Float(1e308)).unwrap_err();
        assert_eq!(err, DietError::NonFiniteTotal { date: "d".into() });
        assert_eq!(table, before);

        let encoded = table.encode().unwrap();
        assert_eq!(DietTable::decode(&encoded).unwrap(), table);
    }

    #[test]
    fn non_finite_amount_is_rejected_for_new_day() {
        let mut table = DietTable::new();
        assert!(table.add_food("d", "a", Calories::Float(f64::INFINITY)).is_err());
        assert!(table.add_food("d", "a", Calories::Float(f64::NAN)).is_err());
        assert!(table.days().is_empty());
    }
}
