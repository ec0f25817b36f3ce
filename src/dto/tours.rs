//! Payloads of the tour routes and the field projection applied to them.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::query::{Projection, TourField};
use crate::domain::tour::{DifficultyStats, MonthlyPlan, Tour};

#[derive(Debug, Serialize)]
pub struct ToursData {
    pub tours: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct TourData {
    pub tour: Value,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub stats: Vec<DifficultyStats>,
}

#[derive(Debug, Serialize)]
pub struct PlanData {
    pub plan: Vec<MonthlyPlan>,
}

/// Serializes `tour` keeping only the keys `projection` selects.
pub fn project_tour(tour: &Tour, projection: &Projection) -> Result<Value, serde_json::Error> {
    let Value::Object(fields) = serde_json::to_value(tour)? else {
        return Ok(Value::Null);
    };

    let kept: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, _)| TourField::from_key(key).is_none_or(|field| projection.keeps(field)))
        .collect();

    Ok(Value::Object(kept))
}

pub fn project_tours(
    tours: &[Tour],
    projection: &Projection,
) -> Result<Vec<Value>, serde_json::Error> {
    tours
        .iter()
        .map(|tour| project_tour(tour, projection))
        .collect()
}
