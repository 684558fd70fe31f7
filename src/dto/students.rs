use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Student;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStudentRequest {
    pub student_id: String,
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub grade_level: Option<String>,
    pub grade_number: Option<i32>,
    pub grade_type: Option<String>,
    pub parent: String,
    pub address: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub grade_level: Option<String>,
    pub grade_number: Option<i32>,
    pub grade_type: Option<String>,
    pub parent: Option<String>,
    pub address: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StudentList {
    pub items: Vec<Student>,
}

/// Result of a bulk grade move: how many students the filter matched, how
/// many rows the store reported changed, and where the group ended up.
#[derive(Debug, Serialize, ToSchema)]
pub struct GradeMoveResult {
    pub matched_count: u64,
    pub modified_count: u64,
    pub new_grade: i32,
    pub graduated: bool,
}
