use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub student_id: String,
    pub name: String,
    pub date_of_birth: Date,
    pub gender: String,
    pub grade_level: String,
    pub grade_number: i32,
    pub grade_type: String,
    pub parent: String,
    pub address: String,
    pub phone_number: String,
    pub is_active: bool,
    pub enrollment_date: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
