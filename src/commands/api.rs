//! HTTP-style entry points.
//!
//! Each handler takes the request's query parameters and returns a status
//! code with a JSON body, so any server front end can mount them unchanged.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::error;

use crate::{
    cli::types::{RankDate, TableName},
    scrape::Extractor,
    storage::SqliteRankingStore,
    OutrankError,
};

pub type QueryParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::internal_error(&OutrankError::from(e)),
        }
    }

    pub fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "message": message }),
        }
    }

    fn internal_error(err: &OutrankError) -> Self {
        error!(error = %err, "Request failed");
        Self::message(500, "Internal server error")
    }
}

/// A non-blank query parameter.
fn param<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// `?stat=..&date=..` scrape one statistic and store it.
pub async fn handle_scrape_request(extractor: &Extractor, params: &QueryParams) -> ApiResponse {
    let Some(stat) = param(params, "stat") else {
        let missing = OutrankError::MissingParameter {
            name: "stat".to_string(),
        };
        return ApiResponse::message(400, &missing.to_string());
    };
    let date = match param(params, "date") {
        Some(raw) => match raw.parse::<RankDate>() {
            Ok(date) => date,
            Err(e) => return ApiResponse::message(400, &e.to_string()),
        },
        None => RankDate::now(),
    };

    match extractor.extract_and_store(stat, &date).await {
        Ok(teams) => ApiResponse {
            status: 200,
            body: json!({ "stat": stat, "date": date, "teamsProcessed": teams }),
        },
        Err(e) => {
            error!(stat, error = %e, "Error scraping stat");
            ApiResponse {
                status: 500,
                body: json!({ "message": "Error scraping stat", "error": e.to_string() }),
            }
        }
    }
}

/// `?team=..` latest statistics for one team.
pub async fn handle_team_stats_request(
    store: &SqliteRankingStore,
    table: &TableName,
    params: &QueryParams,
) -> ApiResponse {
    let Some(team) = param(params, "team") else {
        return ApiResponse::message(400, "Team name is required");
    };
    match store.latest_for_team(table, team).await {
        Ok(Some(snapshot)) => ApiResponse::ok(&snapshot),
        Ok(None) => ApiResponse::message(404, "Team data not found"),
        Err(e) => ApiResponse::internal_error(&e),
    }
}

/// `?team=..&startDate=..&endDate=..` one team's statistics over a date range.
pub async fn handle_team_history_request(
    store: &SqliteRankingStore,
    table: &TableName,
    params: &QueryParams,
) -> ApiResponse {
    let Some(team) = param(params, "team") else {
        return ApiResponse::message(400, "Team name is required");
    };
    let (Some(start), Some(end)) = (param(params, "startDate"), param(params, "endDate")) else {
        return ApiResponse::message(400, "Start date and end date are required");
    };
    match store.team_history(table, team, start, end).await {
        Ok(history) if history.stats_by_date.is_empty() => ApiResponse::message(
            404,
            "No historical data found for the specified date range",
        ),
        Ok(history) => ApiResponse::ok(&history),
        Err(e) => ApiResponse::internal_error(&e),
    }
}

/// `?stat=..` every team's latest value for one statistic.
pub async fn handle_stat_request(
    store: &SqliteRankingStore,
    table: &TableName,
    params: &QueryParams,
) -> ApiResponse {
    let Some(stat) = param(params, "stat") else {
        return ApiResponse::message(400, "Stat name is required");
    };
    match store.latest_by_statistic(table, stat).await {
        Ok(standings) if standings.is_empty() => ApiResponse::message(404, "Stat data not found"),
        Ok(standings) => ApiResponse::ok(&standings),
        Err(e) => ApiResponse::internal_error(&e),
    }
}
