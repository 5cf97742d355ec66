//! Handlers for the tour endpoints.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::envelope::Envelope;
use crate::api::dto::tour::{
    CreateTourRequest, PlanData, StatsData, TourData, ToursData, UpdateTourRequest,
};
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::request_time::RequestTime;
use crate::domain::query::QueryString;
use crate::error::ApiError;
use crate::state::AppState;

/// Parameters the top-5-cheap alias forces onto the list query.
const TOP_CHEAP_PARAMS: [(&str, &str); 3] = [
    ("limit", "5"),
    ("sort", "-ratingsAverage,price"),
    ("fields", "name,price,summary,ratingsAverage,difficulty"),
];

/// Lists tours with filtering, sorting, field selection and pagination.
///
/// # Endpoint
///
/// `GET /api/v1/tours`
///
/// # Query Parameters
///
/// - `<field>=value` - exact match, repeat the key to match any of several values
/// - `<field>[gte|gt|lte|lt]=value` - comparison
/// - `sort=-price,name` - `-` for descending, default `-createdAt`
/// - `fields=name,price` - projection, `id` is always included
/// - `page` (default 1), `limit` (default 100)
///
/// # Errors
///
/// Returns 400 in production if a filter value does not fit its field.
pub async fn list_tours_handler(
    State(state): State<AppState>,
    time: RequestTime,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> Result<Json<Envelope<ToursData>>, ApiError> {
    list(&state, &time, QueryString::parse(pairs)).await
}

/// Five best-rated, cheapest tours.
///
/// # Endpoint
///
/// `GET /api/v1/tours/top-5-cheap`
///
/// Client filters still apply; `limit`, `sort` and `fields` are overridden.
pub async fn top_cheap_tours_handler(
    State(state): State<AppState>,
    time: RequestTime,
    ApiQuery(pairs): ApiQuery<Vec<(String, String)>>,
) -> Result<Json<Envelope<ToursData>>, ApiError> {
    let mut query_string = QueryString::parse(pairs);
    for (key, value) in TOP_CHEAP_PARAMS {
        query_string.set(key, value);
    }

    list(&state, &time, query_string).await
}

async fn list(
    state: &AppState,
    time: &RequestTime,
    query_string: QueryString,
) -> Result<Json<Envelope<ToursData>>, ApiError> {
    let tours = state.tour_service.list_tours(query_string).await?;

    let results = tours.len();

    Ok(Json(
        Envelope::success(ToursData { tours })
            .with_results(results)
            .with_request_time(time)
            .with_response_time(time),
    ))
}

/// Returns one tour.
///
/// # Endpoint
///
/// `GET /api/v1/tours/{id}`
///
/// # Errors
///
/// - 404 if no tour has the id
/// - 400 in production if the id is not a number
pub async fn get_tour_handler(
    State(state): State<AppState>,
    time: RequestTime,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Envelope<TourData>>, ApiError> {
    let tour = state.tour_service.get_tour(&id).await?;

    Ok(Json(
        Envelope::success(TourData { tour }).with_response_time(&time),
    ))
}

/// Creates a tour.
///
/// # Endpoint
///
/// `POST /api/v1/tours`
///
/// # Errors
///
/// - 400 if a field rule is violated (all violations are reported)
/// - 400 if the name is already taken
pub async fn create_tour_handler(
    State(state): State<AppState>,
    time: RequestTime,
    ApiJson(payload): ApiJson<CreateTourRequest>,
) -> Result<(StatusCode, Json<Envelope<TourData>>), ApiError> {
    let new_tour = payload.into_new_tour()?;
    let tour = state.tour_service.create_tour(new_tour).await?;

    Ok((
        StatusCode::CREATED,
        Json(
            Envelope::success(TourData { tour })
                .with_results(1)
                .with_response_time(&time),
        ),
    ))
}

/// Partially updates a tour. Field rules apply to the provided fields.
///
/// # Endpoint
///
/// `PATCH /api/v1/tours/{id}`
///
/// # Errors
///
/// Same as [`get_tour_handler`] and [`create_tour_handler`].
pub async fn update_tour_handler(
    State(state): State<AppState>,
    time: RequestTime,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateTourRequest>,
) -> Result<Json<Envelope<TourData>>, ApiError> {
    let patch = payload.into_patch()?;
    let tour = state.tour_service.update_tour(&id, patch).await?;

    Ok(Json(
        Envelope::success(TourData { tour })
            .with_results(1)
            .with_response_time(&time),
    ))
}

/// Deletes a tour.
///
/// # Endpoint
///
/// `DELETE /api/v1/tours/{id}`
///
/// Returns `204 No Content` on success.
pub async fn delete_tour_handler(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, ApiError> {
    state.tour_service.delete_tour(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Per-difficulty statistics over tours rated 4.5 and above.
///
/// # Endpoint
///
/// `GET /api/v1/tours/stats`
///
/// # Response
///
/// ```json
/// {
///   "status": "success",
///   "data": {
///     "stats": [
///       { "difficulty": "EASY", "numTours": 4, "numRatings": 159, "avgRating": 4.7,
///         "avgPrice": 1272, "minPrice": 397, "maxPrice": 1997 }
///     ]
///   }
/// }
/// ```
pub async fn tour_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<StatsData>>, ApiError> {
    let stats = state.tour_service.tour_stats().await?;
    Ok(Json(Envelope::success(StatsData { stats })))
}

/// Busiest months of a year, by number of tour starts.
///
/// # Endpoint
///
/// `GET /api/v1/tours/monthly-plan/{year}`
///
/// # Errors
///
/// Returns 400 in production if `year` is not a number.
pub async fn monthly_plan_handler(
    State(state): State<AppState>,
    ApiPath(year): ApiPath<String>,
) -> Result<Json<Envelope<PlanData>>, ApiError> {
    let plan = state.tour_service.monthly_plan(&year).await?;
    Ok(Json(Envelope::success(PlanData { plan })))
}
