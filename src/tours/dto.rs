use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::tours::repo_types::{Tour, DIFFICULTIES};

#[derive(Debug, Deserialize)]
pub struct CreateTourRequest {
    pub name: String,
    pub duration: i32,
    pub max_group_size: i32,
    pub difficulty: String,
    pub price: f64,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateTourRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("a tour must have a name".into()));
        }
        if !DIFFICULTIES.contains(&self.difficulty.as_str()) {
            return Err(ApiError::Validation(
                "difficulty must be easy, medium or difficult".into(),
            ));
        }
        if self.duration <= 0 {
            return Err(ApiError::Validation("duration must be positive".into()));
        }
        if self.max_group_size <= 0 {
            return Err(ApiError::Validation("group size must be positive".into()));
        }
        if self.price <= 0.0 {
            return Err(ApiError::Validation("price must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTourRequest {
    pub name: Option<String>,
    pub duration: Option<i32>,
    pub max_group_size: Option<i32>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl UpdateTourRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ApiError::Validation("a tour must have a name".into()));
            }
        }
        if let Some(difficulty) = &self.difficulty {
            if !DIFFICULTIES.contains(&difficulty.as_str()) {
                return Err(ApiError::Validation(
                    "difficulty must be easy, medium or difficult".into(),
                ));
            }
        }
        if matches!(self.duration, Some(d) if d <= 0) {
            return Err(ApiError::Validation("duration must be positive".into()));
        }
        if matches!(self.max_group_size, Some(s) if s <= 0) {
            return Err(ApiError::Validation("group size must be positive".into()));
        }
        if matches!(self.price, Some(p) if p <= 0.0) {
            return Err(ApiError::Validation("price must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ToursData {
    pub tours: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TourListResponse {
    pub status: &'static str,
    pub results: usize,
    pub data: ToursData,
}

#[derive(Debug, Serialize)]
pub struct TourData {
    pub tour: Tour,
}

#[derive(Debug, Serialize)]
pub struct TourResponse {
    pub status: &'static str,
    pub data: TourData,
}

impl TourResponse {
    pub fn new(tour: Tour) -> Self {
        Self {
            status: "success",
            data: TourData { tour },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request() -> CreateTourRequest {
        CreateTourRequest {
            name: "The Forest Hiker".into(),
            duration: 5,
            max_group_size: 25,
            difficulty: "easy".into(),
            price: 397.0,
            summary: "Breathtaking hike".into(),
            description: None,
        }
    }

    #[test]
    fn accepts_a_valid_tour() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn rejects_unknown_difficulty() {
        let mut req = create_request();
        req.difficulty = "impossible".into();
        assert!(matches!(
            req.validate().unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn rejects_non_positive_numbers() {
        let mut req = create_request();
        req.price = 0.0;
        assert!(req.validate().is_err());

        let mut req = create_request();
        req.duration = -1;
        assert!(req.validate().is_err());
    }

    #[test]
    fn partial_update_validates_only_present_fields() {
        let req = UpdateTourRequest {
            name: None,
            duration: None,
            max_group_size: None,
            difficulty: None,
            price: Some(450.0),
            summary: None,
            description: None,
        };
        assert!(req.validate().is_ok());

        let req = UpdateTourRequest {
            name: None,
            duration: None,
            max_group_size: None,
            difficulty: Some("brutal".into()),
            price: None,
            summary: None,
            description: None,
        };
        assert!(req.validate().is_err());
    }
}
