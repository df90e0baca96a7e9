use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::{restrict_to, CurrentUser},
    auth::UserRole,
    error::{is_unique_violation, ApiError},
    state::AppState,
    tours::{
        dto::{CreateTourRequest, TourListResponse, TourResponse, ToursData, UpdateTourRequest},
        query::QueryFeatures,
        repo_types::Tour,
    },
};

pub fn tour_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/tours", get(list_tours).post(create_tour))
        .route(
            "/api/v1/tours/:id",
            get(get_tour).patch(update_tour).delete(delete_tour),
        )
}

#[instrument(skip(state))]
pub async fn list_tours(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TourListResponse>, ApiError> {
    let features = QueryFeatures::parse(&params);
    let tours = Tour::list(&state.db, &features).await?;

    let tours = tours
        .iter()
        .map(|tour| features.project(tour))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError::Internal(e.into()))?;

    Ok(Json(TourListResponse {
        status: "success",
        results: tours.len(),
        data: ToursData { tours },
    }))
}

#[instrument(skip(state))]
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TourResponse>, ApiError> {
    let tour = Tour::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no tour found with that id".into()))?;
    Ok(Json(TourResponse::new(tour)))
}

#[instrument(skip(state, payload, user))]
pub async fn create_tour(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTourRequest>,
) -> Result<(StatusCode, Json<TourResponse>), ApiError> {
    payload.validate()?;

    let tour = Tour::create(&state.db, &payload).await.map_err(|e| {
        if is_unique_violation(&e) {
            warn!(name = %payload.name, "duplicate tour name");
            ApiError::Validation("a tour with that name already exists".into())
        } else {
            e.into()
        }
    })?;

    info!(tour_id = %tour.id, user_id = %user.id, "tour created");
    Ok((StatusCode::CREATED, Json(TourResponse::new(tour))))
}

#[instrument(skip(state, payload, user))]
pub async fn update_tour(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTourRequest>,
) -> Result<Json<TourResponse>, ApiError> {
    payload.validate()?;

    let tour = Tour::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound("no tour found with that id".into()))?;

    info!(tour_id = %tour.id, user_id = %user.id, "tour updated");
    Ok(Json(TourResponse::new(tour)))
}

#[instrument(skip(state, current))]
pub async fn delete_tour(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let CurrentUser(user) = &current;
    restrict_to(user, &[UserRole::Admin, UserRole::LeadGuide])?;

    if !Tour::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("no tour found with that id".into()));
    }

    info!(tour_id = %id, user_id = %user.id, "tour deleted");
    Ok(StatusCode::NO_CONTENT)
}
