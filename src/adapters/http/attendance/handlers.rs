//! HTTP handlers for attendance endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::response::IntoResponse;
use chrono::NaiveDate;

use crate::adapters::http::error::{parse_id, ApiError};
use crate::adapters::http::state::AppState;
use crate::application::handlers::attendance::{ClockInCommand, ClockOutCommand, ListClockedInQuery};
use crate::domain::foundation::Timestamp;
use crate::domain::membership::MembershipError;

use super::dto::{AttendanceRangeParams, ClockResponse, ClockedInReportResponse};

/// POST /api/attendance/in/:account_id
pub async fn clock_in(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ClockInCommand {
        account_id: parse_id("account_id", &account_id)?,
        at: Timestamp::now(),
    };
    let record = state.clock_in_handler().handle(cmd).await?;
    Ok(Json(ClockResponse::new("Clock-in successful", &record)))
}

/// POST /api/attendance/out/:account_id
pub async fn clock_out(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = ClockOutCommand {
        account_id: parse_id("account_id", &account_id)?,
        at: Timestamp::now(),
    };
    let record = state.clock_out_handler().handle(cmd).await?;
    Ok(Json(ClockResponse::new("Clock-out successful", &record)))
}

/// GET /api/attendance?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
pub async fn clocked_in_report(
    State(state): State<AppState>,
    Query(params): Query<AttendanceRangeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ListClockedInQuery {
        from: parse_date("start_date", params.start_date.as_deref())?,
        to: parse_date("end_date", params.end_date.as_deref())?,
    };
    let members = state.clocked_in_report_handler().handle(query).await?;
    Ok(Json(ClockedInReportResponse::from(members)))
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<NaiveDate, MembershipError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| MembershipError::validation(field, "is required"))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| MembershipError::validation(field, format!("'{}' is not a YYYY-MM-DD date", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(
            parse_date("start_date", Some("2024-02-29")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn parse_date_rejects_missing_and_malformed() {
        assert!(parse_date("start_date", None).is_err());
        assert!(parse_date("start_date", Some("  ")).is_err());
        assert!(parse_date("end_date", Some("29/02/2024")).is_err());
    }
}
