use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::Student;

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterReport {
    pub generated_on: NaiveDate,
    pub classes: Vec<RosterClass>,
}

/// One class group, keyed by (grade_level, grade_number, grade_type).
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterClass {
    pub label: String,
    pub grade_level: String,
    pub grade_number: i32,
    pub grade_type: String,
    pub total: usize,
    pub sections: Vec<RosterSection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterSection {
    pub gender: String,
    pub count: usize,
    pub rows: Vec<RosterRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterRow {
    pub student_id: String,
    pub name: String,
    pub age: i32,
    pub parent: String,
    pub phone_number: String,
    pub status: String,
}

/// Whole years between `dob` and `today`, minus one when the birthday has not
/// come around yet this year.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Build the report from students already sorted by
/// (grade_number, grade_type, name). Ages are computed against `today`,
/// never stored.
pub fn build_roster(students: &[Student], today: NaiveDate) -> RosterReport {
    let mut classes: Vec<RosterClass> = Vec::new();

    for student in students {
        let matches_last = classes.last().is_some_and(|c| {
            c.grade_level == student.grade_level
                && c.grade_number == student.grade_number
                && c.grade_type == student.grade_type
        });
        if !matches_last {
            classes.push(RosterClass {
                label: format!(
                    "{}-{}{}",
                    student.grade_level, student.grade_number, student.grade_type
                ),
                grade_level: student.grade_level.clone(),
                grade_number: student.grade_number,
                grade_type: student.grade_type.clone(),
                total: 0,
                sections: Vec::new(),
            });
        }

        let class = classes.last_mut().unwrap();
        class.total += 1;

        let section = match class
            .sections
            .iter_mut()
            .find(|s| s.gender == student.gender)
        {
            Some(section) => section,
            None => {
                class.sections.push(RosterSection {
                    gender: student.gender.clone(),
                    count: 0,
                    rows: Vec::new(),
                });
                class.sections.last_mut().unwrap()
            }
        };

        section.count += 1;
        section.rows.push(RosterRow {
            student_id: student.student_id.clone(),
            name: student.name.clone(),
            age: age_on(student.date_of_birth, today),
            parent: student.parent.clone(),
            phone_number: student.phone_number.clone(),
            status: if student.is_active {
                "Active".to_string()
            } else {
                "Inactive".to_string()
            },
        });
    }

    for class in &mut classes {
        // Male section first, then Female, regardless of row order.
        class.sections.sort_by_key(|s| match s.gender.as_str() {
            "Male" => 0,
            "Female" => 1,
            _ => 2,
        });
    }

    RosterReport {
        generated_on: today,
        classes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn student(
        student_id: &str,
        name: &str,
        gender: &str,
        grade_number: i32,
        grade_type: &str,
        dob: NaiveDate,
    ) -> Student {
        Student {
            id: Uuid::new_v4(),
            student_id: student_id.to_string(),
            name: name.to_string(),
            date_of_birth: dob,
            gender: gender.to_string(),
            grade_level: "Primary".to_string(),
            grade_number,
            grade_type: grade_type.to_string(),
            parent: "Parent".to_string(),
            address: String::new(),
            phone_number: "071".to_string(),
            is_active: true,
            enrollment_date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_corrects_for_pending_birthday() {
        let dob = date(2012, 6, 15);
        assert_eq!(age_on(dob, date(2026, 6, 14)), 13);
        assert_eq!(age_on(dob, date(2026, 6, 15)), 14);
        assert_eq!(age_on(dob, date(2026, 6, 16)), 14);
        assert_eq!(age_on(dob, date(2026, 1, 1)), 13);
        assert_eq!(age_on(dob, date(2026, 12, 31)), 14);
    }

    #[test]
    fn groups_by_class_and_gender_in_order() {
        let students = vec![
            student("S1", "Amal", "Male", 5, "A", date(2014, 3, 1)),
            student("S2", "Bimal", "Female", 5, "A", date(2014, 8, 20)),
            student("S3", "Chamod", "Male", 5, "B", date(2014, 5, 5)),
            student("S4", "Dilki", "Female", 6, "A", date(2013, 2, 2)),
        ];

        let report = build_roster(&students, date(2026, 8, 6));

        let labels: Vec<&str> = report.classes.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, ["Primary-5A", "Primary-5B", "Primary-6A"]);

        let first = &report.classes[0];
        assert_eq!(first.total, 2);
        assert_eq!(first.sections.len(), 2);
        assert_eq!(first.sections[0].gender, "Male");
        assert_eq!(first.sections[0].rows[0].student_id, "S1");
        assert_eq!(first.sections[1].gender, "Female");
        assert_eq!(first.sections[1].count, 1);

        // Single-gender classes carry a single section.
        assert_eq!(report.classes[1].sections.len(), 1);
        assert_eq!(report.classes[2].sections[0].gender, "Female");
    }

    #[test]
    fn rows_carry_computed_age_and_status() {
        let mut s = student("S9", "Nadee", "Female", 13, "A", date(2008, 9, 1));
        s.is_active = false;
        let report = build_roster(std::slice::from_ref(&s), date(2026, 8, 6));

        let row = &report.classes[0].sections[0].rows[0];
        assert_eq!(row.age, 17);
        assert_eq!(row.status, "Inactive");
    }

    #[test]
    fn empty_input_builds_empty_report() {
        let report = build_roster(&[], date(2026, 8, 6));
        assert!(report.classes.is_empty());
    }
}
