//! HTTP DTOs for attendance endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::attendance::ClockedInMember;
use crate::domain::membership::AttendanceRecord;

/// Query string for the clocked-in report. Both bounds are `YYYY-MM-DD`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceRangeParams {
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecordResponse {
    pub date: String,
    pub clock_in: String,
    pub clock_out: Option<String>,
}

impl From<&AttendanceRecord> for AttendanceRecordResponse {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            date: record.date.to_string(),
            clock_in: record.clock_in.as_datetime().to_rfc3339(),
            clock_out: record.clock_out.map(|t| t.as_datetime().to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockResponse {
    pub success: bool,
    pub message: String,
    pub attendance: AttendanceRecordResponse,
}

impl ClockResponse {
    pub fn new(message: &str, record: &AttendanceRecord) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            attendance: record.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockedInMemberResponse {
    pub account_id: String,
    pub username: String,
    pub full_name: String,
    pub attendance: Vec<AttendanceRecordResponse>,
}

impl From<ClockedInMember> for ClockedInMemberResponse {
    fn from(member: ClockedInMember) -> Self {
        Self {
            account_id: member.account_id.to_string(),
            username: member.username,
            full_name: member.full_name,
            attendance: member.attendance.iter().map(AttendanceRecordResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockedInReportResponse {
    pub success: bool,
    pub users: Vec<ClockedInMemberResponse>,
}

impl From<Vec<ClockedInMember>> for ClockedInReportResponse {
    fn from(members: Vec<ClockedInMember>) -> Self {
        Self {
            success: true,
            users: members.into_iter().map(ClockedInMemberResponse::from).collect(),
        }
    }
}
