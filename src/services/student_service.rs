use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, extension::postgres::PgExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};

use crate::{
    audit::log_audit,
    dto::students::{CreateStudentRequest, GradeMoveResult, StudentList, UpdateStudentRequest},
    entity::students::{
        ActiveModel as StudentActive, Column as StudentCol, Entity as Students,
        Model as StudentModel,
    },
    error::{AppError, AppResult},
    grades::{Direction, GRADE_RANGE, GradeMove, validate_grade_type},
    middleware::auth::{AuthUser, ensure_admin},
    models::Student,
    response::{ApiResponse, Meta},
    routes::params::StudentQuery,
    state::AppState,
};

const VALID_GENDERS: [&str; 2] = ["Male", "Female"];

fn validate_gender(gender: &str) -> Result<(), AppError> {
    if VALID_GENDERS.contains(&gender) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid gender {gender:?}")))
    }
}

fn validate_grade_number(grade: i32) -> Result<(), AppError> {
    if grade < GRADE_RANGE.min || grade > GRADE_RANGE.max {
        return Err(AppError::BadRequest(format!(
            "Grade must be between {} and {}, got {grade}",
            GRADE_RANGE.min, GRADE_RANGE.max
        )));
    }
    Ok(())
}

pub async fn create_student(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStudentRequest,
) -> AppResult<ApiResponse<Student>> {
    ensure_admin(user)?;

    if payload.student_id.trim().is_empty() {
        return Err(AppError::BadRequest("Student id must not be empty".into()));
    }
    validate_gender(&payload.gender)?;
    let grade_number = payload.grade_number.unwrap_or(GRADE_RANGE.min);
    validate_grade_number(grade_number)?;
    let grade_type = payload.grade_type.unwrap_or_else(|| "A".to_string());
    validate_grade_type(&grade_type)?;

    let active = StudentActive {
        id: Set(uuid::Uuid::new_v4()),
        student_id: Set(payload.student_id),
        name: Set(payload.name),
        date_of_birth: Set(payload.date_of_birth),
        gender: Set(payload.gender),
        grade_level: Set(payload.grade_level.unwrap_or_else(|| "Primary".to_string())),
        grade_number: Set(grade_number),
        grade_type: Set(grade_type),
        parent: Set(payload.parent),
        address: Set(payload.address.unwrap_or_default()),
        phone_number: Set(payload.phone_number.unwrap_or_default()),
        is_active: Set(true),
        enrollment_date: NotSet,
    };

    let student = match active.insert(&state.orm).await {
        Ok(student) => student,
        Err(err) if is_unique_violation(&err) => {
            return Err(AppError::Conflict("Student id already exists".into()));
        }
        Err(err) => return Err(err.into()),
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "student_create",
        Some("students"),
        Some(serde_json::json!({ "student_id": student.student_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Student created successfully",
        student_from_entity(student),
        Some(Meta::empty()),
    ))
}

/// One filterable listing covers both "all students" and search.
pub async fn list_students(
    state: &AppState,
    query: StudentQuery,
) -> AppResult<ApiResponse<StudentList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(name) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", name);
        condition = condition.add(Expr::col(StudentCol::Name).ilike(pattern));
    }
    if let Some(grade) = query.grade {
        condition = condition.add(StudentCol::GradeNumber.eq(grade));
    }
    if let Some(grade_type) = query.grade_type.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(StudentCol::GradeType.eq(grade_type.clone()));
    }
    if let Some(active) = query.active {
        condition = condition.add(StudentCol::IsActive.eq(active));
    }

    let finder = Students::find()
        .filter(condition)
        .order_by_asc(StudentCol::GradeNumber)
        .order_by_asc(StudentCol::GradeType)
        .order_by_asc(StudentCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(student_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Students",
        StudentList { items },
        Some(meta),
    ))
}

pub async fn get_student(state: &AppState, student_id: &str) -> AppResult<ApiResponse<Student>> {
    let student = find_by_student_id(state, student_id).await?;
    Ok(ApiResponse::success(
        "Student",
        student_from_entity(student),
        None,
    ))
}

pub async fn update_student(
    state: &AppState,
    user: &AuthUser,
    student_id: &str,
    payload: UpdateStudentRequest,
) -> AppResult<ApiResponse<Student>> {
    ensure_admin(user)?;

    if let Some(gender) = payload.gender.as_deref() {
        validate_gender(gender)?;
    }
    if let Some(grade) = payload.grade_number {
        validate_grade_number(grade)?;
    }
    if let Some(grade_type) = payload.grade_type.as_deref() {
        validate_grade_type(grade_type)?;
    }

    let existing = find_by_student_id(state, student_id).await?;

    let mut active: StudentActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(date_of_birth) = payload.date_of_birth {
        active.date_of_birth = Set(date_of_birth);
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(gender);
    }
    if let Some(grade_level) = payload.grade_level {
        active.grade_level = Set(grade_level);
    }
    if let Some(grade_number) = payload.grade_number {
        active.grade_number = Set(grade_number);
    }
    if let Some(grade_type) = payload.grade_type {
        active.grade_type = Set(grade_type);
    }
    if let Some(parent) = payload.parent {
        active.parent = Set(parent);
    }
    if let Some(address) = payload.address {
        active.address = Set(address);
    }
    if let Some(phone_number) = payload.phone_number {
        active.phone_number = Set(phone_number);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let student = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "student_update",
        Some("students"),
        Some(serde_json::json!({ "student_id": student.student_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Student updated successfully",
        student_from_entity(student),
        Some(Meta::empty()),
    ))
}

pub async fn delete_student(
    state: &AppState,
    user: &AuthUser,
    student_id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = Students::delete_many()
        .filter(StudentCol::StudentId.eq(student_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "student_delete",
        Some("students"),
        Some(serde_json::json!({ "student_id": student_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Student deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Bulk grade transition for every active student in `(grade, grade_type)`.
/// Promotion is the same operation with the direction fixed to up.
pub async fn move_grade(
    state: &AppState,
    user: &AuthUser,
    grade: i32,
    grade_type: &str,
    direction: Direction,
) -> AppResult<ApiResponse<GradeMoveResult>> {
    ensure_admin(user)?;
    validate_grade_type(grade_type)?;
    let plan = GRADE_RANGE.plan(grade, direction)?;

    let filter = Condition::all()
        .add(StudentCol::GradeNumber.eq(grade))
        .add(StudentCol::GradeType.eq(grade_type))
        .add(StudentCol::IsActive.eq(true));

    // rows_affected alone cannot distinguish matched from modified, so the
    // match count is taken just before the update.
    let matched = Students::find()
        .filter(filter.clone())
        .count(&state.orm)
        .await?;

    let (result, new_grade, graduated, message) = match plan {
        GradeMove::Graduate => {
            let result = Students::update_many()
                .col_expr(StudentCol::IsActive, Expr::value(false))
                .filter(filter)
                .exec(&state.orm)
                .await?;
            (
                result,
                grade,
                true,
                format!("Grade {grade} {grade_type} students graduated"),
            )
        }
        GradeMove::Shift { to } => {
            let delta = to - grade;
            let result = Students::update_many()
                .col_expr(
                    StudentCol::GradeNumber,
                    Expr::col(StudentCol::GradeNumber).add(delta),
                )
                .filter(filter)
                .exec(&state.orm)
                .await?;
            (
                result,
                to,
                false,
                format!("Grade {grade} {grade_type} moved to Grade {to}"),
            )
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "grade_move",
        Some("students"),
        Some(serde_json::json!({
            "grade": grade,
            "grade_type": grade_type,
            "new_grade": new_grade,
            "graduated": graduated,
            "modified": result.rows_affected,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message,
        GradeMoveResult {
            matched_count: matched,
            modified_count: result.rows_affected,
            new_grade,
            graduated,
        },
        Some(Meta::empty()),
    ))
}

async fn find_by_student_id(state: &AppState, student_id: &str) -> AppResult<StudentModel> {
    Students::find()
        .filter(StudentCol::StudentId.eq(student_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

pub(crate) fn student_from_entity(model: StudentModel) -> Student {
    Student {
        id: model.id,
        student_id: model.student_id,
        name: model.name,
        date_of_birth: model.date_of_birth,
        gender: model.gender,
        grade_level: model.grade_level,
        grade_number: model.grade_number,
        grade_type: model.grade_type,
        parent: model.parent,
        address: model.address,
        phone_number: model.phone_number,
        is_active: model.is_active,
        enrollment_date: model.enrollment_date.with_timezone(&Utc),
    }
}
