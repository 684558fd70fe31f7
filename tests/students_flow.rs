use axum_school_admin_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::students::{CreateStudentRequest, UpdateStudentRequest},
    entity::students::{Column as StudentCol, Entity as Students},
    error::AppError,
    grades::Direction,
    middleware::auth::AuthUser,
    services::{roster_service, student_service},
    state::AppState,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Statement};
use uuid::Uuid;

fn dob(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        email: "admin@example.com".into(),
        name: "Admin".into(),
        role: "admin".into(),
    }
}

fn new_student(student_id: &str, grade: i32, grade_type: &str, gender: &str) -> CreateStudentRequest {
    CreateStudentRequest {
        student_id: student_id.to_string(),
        name: format!("Student {student_id}"),
        date_of_birth: dob(2012, 6, 15),
        gender: gender.to_string(),
        grade_level: Some("Primary".into()),
        grade_number: Some(grade),
        grade_type: Some(grade_type.to_string()),
        parent: "A Parent".into(),
        address: None,
        phone_number: Some("0712345678".into()),
    }
}

#[tokio::test]
async fn grade_moves_graduation_and_roster() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(());
        }
    };

    let state = setup_state(&database_url).await?;
    let admin = admin();

    // Audit rows reference users.id, so the acting admin needs a real row.
    sqlx::query("INSERT INTO users (id, email, name, password_hash, role) VALUES ($1, $2, $3, $4, $5)")
        .bind(admin.user_id)
        .bind(&admin.email)
        .bind(&admin.name)
        .bind("dummy")
        .bind(&admin.role)
        .execute(&state.pool)
        .await?;

    for (sid, grade, grade_type, gender) in [
        ("S1", 12, "A", "Male"),
        ("S2", 12, "B", "Female"),
        ("S3", 13, "A", "Male"),
        ("S4", 1, "A", "Female"),
    ] {
        student_service::create_student(&state, &admin, new_student(sid, grade, grade_type, gender))
            .await?;
    }

    // Duplicate student id is a conflict, not a 500.
    let err = student_service::create_student(&state, &admin, new_student("S1", 5, "A", "Male"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Moving 12/A up touches S1 only; 12/B is a different section.
    let moved = student_service::move_grade(&state, &admin, 12, "A", Direction::Up)
        .await?
        .data
        .unwrap();
    assert_eq!(moved.matched_count, 1);
    assert_eq!(moved.modified_count, 1);
    assert_eq!(moved.new_grade, 13);
    assert!(!moved.graduated);
    assert_eq!(grade_of(&state, "S1").await?, 13);
    assert_eq!(grade_of(&state, "S2").await?, 12);

    // Up then down restores the original grade.
    student_service::move_grade(&state, &admin, 12, "B", Direction::Up).await?;
    student_service::move_grade(&state, &admin, 13, "B", Direction::Down).await?;
    assert_eq!(grade_of(&state, "S2").await?, 12);

    // Top grade up graduates: inactive, grade number untouched.
    let graduated = student_service::move_grade(&state, &admin, 13, "A", Direction::Up)
        .await?
        .data
        .unwrap();
    assert!(graduated.graduated);
    assert_eq!(graduated.new_grade, 13);
    assert_eq!(graduated.modified_count, 2, "S1 and S3 both sat in 13/A");
    let s3 = student_service::get_student(&state, "S3").await?.data.unwrap();
    assert!(!s3.is_active);
    assert_eq!(s3.grade_number, 13);

    // Graduated students are out of reach of further moves.
    let again = student_service::move_grade(&state, &admin, 13, "A", Direction::Up)
        .await?
        .data
        .unwrap();
    assert_eq!(again.matched_count, 0);
    assert_eq!(again.modified_count, 0);

    // Bottom grade down is rejected and modifies nothing.
    let err = student_service::move_grade(&state, &admin, 1, "A", Direction::Down)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BoundaryViolation(_)));
    assert_eq!(grade_of(&state, "S4").await?, 1);

    // Out-of-range grade never reaches the store.
    let err = student_service::move_grade(&state, &admin, 14, "A", Direction::Up)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Update then fetch round trip.
    let updated = student_service::update_student(
        &state,
        &admin,
        "S4",
        UpdateStudentRequest {
            name: Some("Renamed Student".into()),
            date_of_birth: None,
            gender: None,
            grade_level: None,
            grade_number: Some(2),
            grade_type: None,
            parent: None,
            address: Some("5 Temple Lane".into()),
            phone_number: None,
            is_active: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(updated.name, "Renamed Student");
    assert_eq!(updated.grade_number, 2);

    // Roster covers actives and graduates, grouped by class then gender.
    let roster = roster_service::generate_roster(&state).await?.data.unwrap();
    assert!(!roster.classes.is_empty());
    let grade13 = roster
        .classes
        .iter()
        .find(|c| c.grade_number == 13 && c.grade_type == "A")
        .expect("graduated class still on the roster");
    assert_eq!(grade13.total, 2);
    let male = &grade13.sections[0];
    assert_eq!(male.gender, "Male");
    assert!(male.rows.iter().all(|r| r.status == "Inactive"));
    assert!(male.rows.iter().all(|r| r.age > 0));

    // Delete and confirm 404.
    student_service::delete_student(&state, &admin, "S4").await?;
    let err = student_service::get_student(&state, "S4").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

async fn grade_of(state: &AppState, student_id: &str) -> anyhow::Result<i32> {
    let student = Students::find()
        .filter(StudentCol::StudentId.eq(student_id))
        .one(&state.orm)
        .await?
        .expect("student exists");
    Ok(student.grade_number)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE order_items, orders, students, audit_logs, products, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    Ok(AppState { pool, orm })
}
