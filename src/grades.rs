use std::str::FromStr;

use crate::error::AppError;

/// Inclusive range of academic years a student can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeRange {
    pub min: i32,
    pub max: i32,
}

pub const GRADE_RANGE: GradeRange = GradeRange { min: 1, max: 13 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(AppError::BadRequest(format!(
                "Direction must be 'up' or 'down', got {other:?}"
            ))),
        }
    }
}

/// Outcome of planning a bulk transition for one `(grade, type)` group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeMove {
    /// Top grade moving up: deactivate the group, grade number unchanged.
    Graduate,
    /// Ordinary one-step promotion or demotion.
    Shift { to: i32 },
}

impl GradeRange {
    /// Decide what a move does before touching the store. Out-of-range
    /// grades fail here rather than matching zero documents downstream.
    pub fn plan(&self, grade: i32, direction: Direction) -> Result<GradeMove, AppError> {
        if grade < self.min || grade > self.max {
            return Err(AppError::BadRequest(format!(
                "Grade must be between {} and {}, got {grade}",
                self.min, self.max
            )));
        }
        match direction {
            Direction::Up if grade == self.max => Ok(GradeMove::Graduate),
            Direction::Up => Ok(GradeMove::Shift { to: grade + 1 }),
            Direction::Down if grade == self.min => Err(AppError::BoundaryViolation(format!(
                "Grade {} cannot be lowered further",
                self.min
            ))),
            Direction::Down => Ok(GradeMove::Shift { to: grade - 1 }),
        }
    }
}

/// Section labels are short alphanumeric tags ("A", "B", ...).
pub fn validate_grade_type(grade_type: &str) -> Result<(), AppError> {
    if grade_type.is_empty()
        || grade_type.len() > 8
        || !grade_type.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(AppError::BadRequest(format!(
            "Invalid grade type {grade_type:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_grade_up_graduates() {
        assert_eq!(GRADE_RANGE.plan(13, Direction::Up).unwrap(), GradeMove::Graduate);
    }

    #[test]
    fn bottom_grade_down_is_a_boundary_violation() {
        let err = GRADE_RANGE.plan(1, Direction::Down).unwrap_err();
        assert!(matches!(err, AppError::BoundaryViolation(_)));
    }

    #[test]
    fn interior_grades_step_by_one() {
        assert_eq!(
            GRADE_RANGE.plan(5, Direction::Up).unwrap(),
            GradeMove::Shift { to: 6 }
        );
        assert_eq!(
            GRADE_RANGE.plan(5, Direction::Down).unwrap(),
            GradeMove::Shift { to: 4 }
        );
        assert_eq!(
            GRADE_RANGE.plan(12, Direction::Up).unwrap(),
            GradeMove::Shift { to: 13 }
        );
        assert_eq!(
            GRADE_RANGE.plan(2, Direction::Down).unwrap(),
            GradeMove::Shift { to: 1 }
        );
    }

    #[test]
    fn up_then_down_round_trips() {
        for grade in 1..12 {
            let GradeMove::Shift { to } = GRADE_RANGE.plan(grade, Direction::Up).unwrap() else {
                panic!("grade {grade} should not graduate");
            };
            assert_eq!(
                GRADE_RANGE.plan(to, Direction::Down).unwrap(),
                GradeMove::Shift { to: grade }
            );
        }
    }

    #[test]
    fn out_of_range_grades_are_rejected_before_any_store_call() {
        for grade in [0, -3, 14, 99] {
            let err = GRADE_RANGE.plan(grade, Direction::Up).unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "grade {grade}");
        }
    }

    #[test]
    fn direction_parses_route_segments() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
        assert!("Up".parse::<Direction>().is_err());
    }

    #[test]
    fn grade_type_validation() {
        assert!(validate_grade_type("A").is_ok());
        assert!(validate_grade_type("B2").is_ok());
        assert!(validate_grade_type("").is_err());
        assert!(validate_grade_type("A-1").is_err());
        assert!(validate_grade_type("LONGSECTION").is_err());
    }
}
