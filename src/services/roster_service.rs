use chrono::Utc;
use sea_orm::{EntityTrait, QueryOrder};

use crate::{
    entity::students::{Column as StudentCol, Entity as Students},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    roster::{RosterReport, build_roster},
    services::student_service::student_from_entity,
    state::AppState,
};

/// Assemble the class roster report. The data structure is the deliverable;
/// turning it into a printable document is the client's job.
pub async fn generate_roster(state: &AppState) -> AppResult<ApiResponse<RosterReport>> {
    let students: Vec<_> = Students::find()
        .order_by_asc(StudentCol::GradeNumber)
        .order_by_asc(StudentCol::GradeType)
        .order_by_asc(StudentCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(student_from_entity)
        .collect();

    if students.is_empty() {
        return Err(AppError::NotFound);
    }

    let report = build_roster(&students, Utc::now().date_naive());

    Ok(ApiResponse::success(
        "Student roster",
        report,
        Some(Meta::empty()),
    ))
}
