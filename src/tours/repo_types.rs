use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Tour record in the database.
///
/// `row_version` is internal bookkeeping; it never appears in responses and
/// the query features never project it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub price: f64,
    pub ratings_average: f64,
    pub ratings_quantity: i32,
    pub summary: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(skip_serializing)]
    pub row_version: i32,
}

pub const DIFFICULTIES: &[&str] = &["easy", "medium", "difficult"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_version_never_serializes() {
        let tour = Tour {
            id: Uuid::new_v4(),
            name: "The Forest Hiker".into(),
            duration: 5,
            max_group_size: 25,
            difficulty: "easy".into(),
            price: 397.0,
            ratings_average: 4.7,
            ratings_quantity: 37,
            summary: "Breathtaking hike through the Canadian Banff National Park".into(),
            description: None,
            created_at: OffsetDateTime::now_utc(),
            row_version: 3,
        };
        let json = serde_json::to_value(&tour).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("name"));
        assert!(obj.contains_key("price"));
        assert!(!obj.contains_key("row_version"));
    }
}
