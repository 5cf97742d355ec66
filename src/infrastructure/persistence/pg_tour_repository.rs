//! PostgreSQL implementation of the tour repository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::{NewTour, Tour, TourPatch};
use crate::domain::query::{Comparison, Condition, FieldKind, FilterValue, TourField, TourQuery};
use crate::domain::repositories::{DifficultyStats, MonthlyPlanEntry, TourRepository};
use crate::error::StoreError;

const TOUR_COLUMNS: &str = "id, name, duration, max_group_size, difficulty, ratings_average, \
     ratings_quantity, price, price_discount, summary, description, image_cover, images, \
     start_dates, created_at, version";

/// PostgreSQL repository for tours.
///
/// List queries are assembled with [`QueryBuilder`] from a [`TourQuery`].
/// Column names come from [`TourField`], client values are always bound.
pub struct PgTourRepository {
    pool: Arc<PgPool>,
}

impl PgTourRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TourRepository for PgTourRepository {
    async fn find(&self, query: TourQuery) -> Result<Vec<Value>, StoreError> {
        let documents = build_find_query(&query)
            .build_query_scalar::<Value>()
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(documents
            .into_iter()
            .map(|document| normalize_timestamps(document, &query.projection))
            .collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Tour>, StoreError> {
        let sql = format!("SELECT {TOUR_COLUMNS} FROM tours WHERE id = $1");

        let tour = sqlx::query_as::<_, Tour>(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(tour)
    }

    async fn create(&self, new_tour: NewTour) -> Result<Tour, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO tours (
                name, duration, max_group_size, difficulty, ratings_average,
                ratings_quantity, price, price_discount, summary, description,
                image_cover, images, start_dates
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {TOUR_COLUMNS}
            "#
        );

        let tour = sqlx::query_as::<_, Tour>(&sql)
            .bind(new_tour.name)
            .bind(new_tour.duration)
            .bind(new_tour.max_group_size)
            .bind(new_tour.difficulty)
            .bind(new_tour.ratings_average)
            .bind(new_tour.ratings_quantity)
            .bind(new_tour.price)
            .bind(new_tour.price_discount)
            .bind(new_tour.summary)
            .bind(new_tour.description)
            .bind(new_tour.image_cover)
            .bind(new_tour.images)
            .bind(new_tour.start_dates)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(tour)
    }

    async fn update(&self, id: i64, patch: TourPatch) -> Result<Option<Tour>, StoreError> {
        let tour = build_update_query(id, patch)
            .build_query_as::<Tour>()
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(tour)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tours WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self, min_rating: f64) -> Result<Vec<DifficultyStats>, StoreError> {
        let stats = sqlx::query_as::<_, DifficultyStats>(
            r#"
            SELECT
                UPPER(difficulty) AS difficulty,
                COUNT(*) AS num_tours,
                COALESCE(SUM(ratings_quantity), 0)::BIGINT AS num_ratings,
                AVG(ratings_average) AS avg_rating,
                AVG(price) AS avg_price,
                MIN(price) AS min_price,
                MAX(price) AS max_price
            FROM tours
            WHERE ratings_average >= $1
            GROUP BY UPPER(difficulty)
            ORDER BY avg_price ASC
            "#,
        )
        .bind(min_rating)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(stats)
    }

    async fn monthly_plan(&self, year: i32) -> Result<Vec<MonthlyPlanEntry>, StoreError> {
        let (from, until) = year_bounds(year)?;

        let plan = sqlx::query_as::<_, MonthlyPlanEntry>(
            r#"
            SELECT
                EXTRACT(MONTH FROM start_date AT TIME ZONE 'UTC')::INTEGER AS month,
                COUNT(*) AS num_tours_start,
                ARRAY_AGG(name ORDER BY name) AS tours
            FROM tours, UNNEST(start_dates) AS start_date
            WHERE start_date >= $1 AND start_date < $2
            GROUP BY 1
            ORDER BY num_tours_start DESC, month ASC
            LIMIT 12
            "#,
        )
        .bind(from)
        .bind(until)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(plan)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// Half-open UTC range `[Jan 1 year, Jan 1 year + 1)`.
fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    let start_of = |year: i32| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .map(|date| date.and_time(NaiveTime::MIN).and_utc())
            .ok_or_else(|| StoreError::cast("year", year.to_string(), "Number"))
    };

    Ok((start_of(year)?, start_of(year + 1)?))
}

/// Re-renders timestamp members the way [`Tour`] serializes them.
///
/// `jsonb` writes `2021-04-25T09:00:00+00:00`; chrono writes `2021-04-25T09:00:00Z`.
fn normalize_timestamps(mut document: Value, projection: &[TourField]) -> Value {
    for field in projection
        .iter()
        .filter(|field| field.kind() == FieldKind::Timestamp)
    {
        match document.get_mut(field.api_name()) {
            Some(Value::Array(items)) => items.iter_mut().for_each(rerender_timestamp),
            Some(member) => rerender_timestamp(member),
            None => {}
        }
    }

    document
}

fn rerender_timestamp(value: &mut Value) {
    let Some(timestamp) = value
        .as_str()
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
    else {
        return;
    };

    if let Ok(rendered) = serde_json::to_value(timestamp.with_timezone(&Utc)) {
        *value = rendered;
    }
}

/// Builds the list query: projection, filters, ordering and page window.
pub(crate) fn build_find_query(query: &TourQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT jsonb_build_object(");

    for (index, field) in query.projection.iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder
            .push("'")
            .push(field.api_name())
            .push("', ")
            .push(field.column());
    }
    builder.push(") AS document FROM tours");

    for (index, condition) in query.conditions.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        push_condition(&mut builder, condition);
    }

    if !query.sort.is_empty() {
        builder.push(" ORDER BY ");
        for (index, key) in query.sort.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder
                .push(key.field.column())
                .push(if key.descending { " DESC" } else { " ASC" });
        }
    }

    builder
        .push(" LIMIT ")
        .push_bind(query.limit)
        .push(" OFFSET ")
        .push_bind(query.skip);

    builder
}

fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, condition: &Condition) {
    match condition {
        Condition::Compare {
            field,
            comparison: Comparison::Eq,
            value,
        } if field.is_array() => {
            push_value(builder, value);
            builder.push(" = ANY(").push(field.column()).push(")");
        }
        Condition::Compare {
            field,
            comparison,
            value,
        } if field.is_array() => {
            builder
                .push("EXISTS (SELECT 1 FROM unnest(")
                .push(field.column())
                .push(") AS element WHERE element ")
                .push(comparison.sql())
                .push(" ");
            push_value(builder, value);
            builder.push(")");
        }
        Condition::Compare {
            field,
            comparison,
            value,
        } => {
            builder
                .push(field.column())
                .push(" ")
                .push(comparison.sql())
                .push(" ");
            push_value(builder, value);
        }
        Condition::AnyOf { field, values } if field.is_array() => {
            builder.push(field.column()).push(" && ");
            push_values(builder, field.kind(), values);
        }
        Condition::AnyOf { field, values } => {
            builder.push(field.column()).push(" = ANY(");
            push_values(builder, field.kind(), values);
            builder.push(")");
        }
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Integer(v) => builder.push_bind(*v),
        FilterValue::Float(v) => builder.push_bind(*v),
        FilterValue::Text(v) => builder.push_bind(v.clone()),
        FilterValue::Timestamp(v) => builder.push_bind(*v),
    };
}

/// Binds `values` as one typed array parameter.
fn push_values(builder: &mut QueryBuilder<'static, Postgres>, kind: FieldKind, values: &[FilterValue]) {
    match kind {
        FieldKind::Integer => builder.push_bind(
            values
                .iter()
                .filter_map(|value| match value {
                    FilterValue::Integer(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<i64>>(),
        ),
        FieldKind::Float => builder.push_bind(
            values
                .iter()
                .filter_map(|value| match value {
                    FilterValue::Float(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<f64>>(),
        ),
        FieldKind::Text => builder.push_bind(
            values
                .iter()
                .filter_map(|value| match value {
                    FilterValue::Text(v) => Some(v.clone()),
                    _ => None,
                })
                .collect::<Vec<String>>(),
        ),
        FieldKind::Timestamp => builder.push_bind(
            values
                .iter()
                .filter_map(|value| match value {
                    FilterValue::Timestamp(v) => Some(*v),
                    _ => None,
                })
                .collect::<Vec<DateTime<Utc>>>(),
        ),
    };
}

/// Builds the partial update. Every update bumps `version`.
pub(crate) fn build_update_query(id: i64, patch: TourPatch) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE tours SET version = version + 1");

    if let Some(name) = patch.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(duration) = patch.duration {
        builder.push(", duration = ").push_bind(duration);
    }
    if let Some(max_group_size) = patch.max_group_size {
        builder.push(", max_group_size = ").push_bind(max_group_size);
    }
    if let Some(difficulty) = patch.difficulty {
        builder.push(", difficulty = ").push_bind(difficulty);
    }
    if let Some(ratings_average) = patch.ratings_average {
        builder.push(", ratings_average = ").push_bind(ratings_average);
    }
    if let Some(ratings_quantity) = patch.ratings_quantity {
        builder.push(", ratings_quantity = ").push_bind(ratings_quantity);
    }
    if let Some(price) = patch.price {
        builder.push(", price = ").push_bind(price);
    }
    if let Some(price_discount) = patch.price_discount {
        builder.push(", price_discount = ").push_bind(price_discount);
    }
    if let Some(summary) = patch.summary {
        builder.push(", summary = ").push_bind(summary);
    }
    if let Some(description) = patch.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(image_cover) = patch.image_cover {
        builder.push(", image_cover = ").push_bind(image_cover);
    }
    if let Some(images) = patch.images {
        builder.push(", images = ").push_bind(images);
    }
    if let Some(start_dates) = patch.start_dates {
        builder.push(", start_dates = ").push_bind(start_dates);
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(TOUR_COLUMNS);

    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{QueryFeatures, QueryString, SortKey};
    use chrono::TimeZone;
    use serde_json::json;

    fn compile(pairs: &[(&str, &str)]) -> String {
        let query = QueryFeatures::new(TourQuery::default(), QueryString::parse(pairs.iter().copied()))
            .apply_all()
            .unwrap();
        build_find_query(&query).sql().to_string()
    }

    #[test]
    fn test_default_query() {
        let sql = compile(&[]);

        assert!(sql.starts_with("SELECT jsonb_build_object('id', id, 'name', name"));
        assert!(sql.contains("'maxGroupSize', max_group_size"));
        assert!(!sql.contains("'version'"));
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn test_filters_are_bound() {
        let sql = compile(&[("price[gte]", "500"), ("difficulty", "easy")]);

        assert!(sql.contains(" WHERE difficulty = $1 AND price >= $2"), "{sql}");
        assert!(!sql.contains("easy"));
        assert!(!sql.contains("500"));
    }

    #[test]
    fn test_sort_and_projection() {
        let sql = compile(&[("sort", "-price,name"), ("fields", "name,price")]);

        assert!(sql.starts_with("SELECT jsonb_build_object('id', id, 'name', name, 'price', price)"));
        assert!(sql.contains("ORDER BY price DESC, name ASC, id ASC"), "{sql}");
    }

    #[test]
    fn test_array_conditions() {
        let query = TourQuery {
            conditions: vec![
                Condition::Compare {
                    field: TourField::Images,
                    comparison: Comparison::Eq,
                    value: FilterValue::Text("a.jpg".to_string()),
                },
                Condition::Compare {
                    field: TourField::StartDates,
                    comparison: Comparison::Gte,
                    value: FilterValue::Timestamp(Utc::now()),
                },
                Condition::AnyOf {
                    field: TourField::Images,
                    values: vec![FilterValue::Text("b.jpg".to_string())],
                },
            ],
            sort: vec![SortKey::asc(TourField::Id)],
            ..TourQuery::default()
        };

        let sql = build_find_query(&query).sql().to_string();

        assert!(sql.contains("WHERE $1 = ANY(images)"), "{sql}");
        assert!(
            sql.contains(
                "AND EXISTS (SELECT 1 FROM unnest(start_dates) AS element WHERE element >= $2)"
            ),
            "{sql}"
        );
        assert!(sql.contains("AND images && $3"), "{sql}");
    }

    #[test]
    fn test_scalar_any_of() {
        let sql = compile(&[("difficulty", "easy"), ("difficulty", "medium")]);
        assert!(sql.contains("WHERE difficulty = ANY($1)"), "{sql}");
    }

    #[test]
    fn test_update_query() {
        let patch = TourPatch {
            price: Some(450.0),
            price_discount: Some(None),
            ..TourPatch::default()
        };

        let sql = build_update_query(3, patch).sql().to_string();

        assert!(sql.starts_with(
            "UPDATE tours SET version = version + 1, price = $1, price_discount = $2 WHERE id = $3"
        ));
        assert!(sql.contains("RETURNING id, name"));
    }

    #[test]
    fn test_list_timestamps_match_entity_format() {
        let document = json!({
            "id": 1,
            "name": "The Forest Hiker",
            "createdAt": "2021-03-01T10:30:00.123456+00:00",
            "startDates": ["2021-04-25T09:00:00+00:00", "2021-07-20T11:00:00+02:00"],
        });

        let normalized = normalize_timestamps(
            document,
            &[TourField::Id, TourField::Name, TourField::StartDates, TourField::CreatedAt],
        );

        assert_eq!(normalized["createdAt"], "2021-03-01T10:30:00.123456Z");
        assert_eq!(
            normalized["startDates"],
            json!(["2021-04-25T09:00:00Z", "2021-07-20T09:00:00Z"])
        );
        assert_eq!(normalized["name"], "The Forest Hiker");

        let created_at = Utc.with_ymd_and_hms(2021, 3, 1, 10, 30, 0).unwrap();
        let document = json!({ "createdAt": "2021-03-01T10:30:00+00:00" });
        let normalized = normalize_timestamps(document, &[TourField::CreatedAt]);
        assert_eq!(normalized["createdAt"], json!(created_at));
    }

    #[test]
    fn test_year_bounds() {
        let (from, until) = year_bounds(2021).unwrap();
        assert_eq!(from.to_rfc3339(), "2021-01-01T00:00:00+00:00");
        assert_eq!(until.to_rfc3339(), "2022-01-01T00:00:00+00:00");
    }
}
