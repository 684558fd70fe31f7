use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};

use crate::{
    dto::students::{
        CreateStudentRequest, GradeMoveResult, StudentList, UpdateStudentRequest,
    },
    error::AppResult,
    grades::Direction,
    middleware::auth::AuthUser,
    models::Student,
    response::ApiResponse,
    roster::RosterReport,
    routes::params::StudentQuery,
    services::{roster_service, student_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", axum::routing::post(create_student).get(list_students))
        .route("/report", get(roster_report))
        .route("/promote-class/{grade}/{grade_type}", put(promote_class))
        .route(
            "/move-class/{grade}/{grade_type}/{direction}",
            put(move_class),
        )
        .route(
            "/{student_id}",
            get(get_student).put(update_student).delete(delete_student),
        )
}

#[utoipa::path(
    post,
    path = "/api/students",
    request_body = CreateStudentRequest,
    responses(
        (status = 200, description = "Student created (admin only)", body = ApiResponse<Student>),
        (status = 400, description = "Invalid gender, grade or section"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Duplicate student id"),
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn create_student(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStudentRequest>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::create_student(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/students",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("limit" = Option<i64>, Query, description = "Items per page, default 10"),
        ("q" = Option<String>, Query, description = "Name substring filter"),
        ("grade" = Option<i32>, Query, description = "Filter by grade number"),
        ("grade_type" = Option<String>, Query, description = "Filter by section"),
        ("active" = Option<bool>, Query, description = "Filter by active flag"),
    ),
    responses(
        (status = 200, description = "List students", body = ApiResponse<StudentList>),
    ),
    tag = "Students"
)]
pub async fn list_students(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<ApiResponse<StudentList>>> {
    let resp = student_service::list_students(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/students/{student_id}", tag = "Students")]
pub async fn get_student(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::get_student(&state, &student_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/students/{student_id}",
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated (admin only)", body = ApiResponse<Student>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn update_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
    Json(payload): Json<UpdateStudentRequest>,
) -> AppResult<Json<ApiResponse<Student>>> {
    let resp = student_service::update_student(&state, &user, &student_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/students/{student_id}", security(("bearer_auth" = [])), tag = "Students")]
pub async fn delete_student(
    State(state): State<AppState>,
    user: AuthUser,
    Path(student_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = student_service::delete_student(&state, &user, &student_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/students/promote-class/{grade}/{grade_type}",
    params(
        ("grade" = i32, Path, description = "Grade number to promote"),
        ("grade_type" = String, Path, description = "Section label"),
    ),
    responses(
        (status = 200, description = "Class promoted, or graduated at the top grade", body = ApiResponse<GradeMoveResult>),
        (status = 400, description = "Invalid grade or section"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn promote_class(
    State(state): State<AppState>,
    user: AuthUser,
    Path((grade, grade_type)): Path<(i32, String)>,
) -> AppResult<Json<ApiResponse<GradeMoveResult>>> {
    let resp =
        student_service::move_grade(&state, &user, grade, &grade_type, Direction::Up).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/students/move-class/{grade}/{grade_type}/{direction}",
    params(
        ("grade" = i32, Path, description = "Grade number to move"),
        ("grade_type" = String, Path, description = "Section label"),
        ("direction" = String, Path, description = "up or down"),
    ),
    responses(
        (status = 200, description = "Class moved one grade", body = ApiResponse<GradeMoveResult>),
        (status = 400, description = "Invalid input or boundary violation"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Students"
)]
pub async fn move_class(
    State(state): State<AppState>,
    user: AuthUser,
    Path((grade, grade_type, direction)): Path<(i32, String, String)>,
) -> AppResult<Json<ApiResponse<GradeMoveResult>>> {
    let direction: Direction = direction.parse()?;
    let resp = student_service::move_grade(&state, &user, grade, &grade_type, direction).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/students/report",
    responses(
        (status = 200, description = "Roster grouped by class and gender with computed ages", body = ApiResponse<RosterReport>),
        (status = 404, description = "No students found"),
    ),
    tag = "Students"
)]
pub async fn roster_report(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RosterReport>>> {
    let resp = roster_service::generate_roster(&state).await?;
    Ok(Json(resp))
}
