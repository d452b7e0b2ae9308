//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::round::SUPPORTED_HOLE_COUNTS;

/// Longest course name accepted when starting a round.
pub const MAX_COURSE_NAME_LEN: usize = 120;

/// Validates that a round is started with 9 or 18 holes.
pub fn validate_holes_count(holes_count: u32) -> Result<(), ValidationError> {
    if SUPPORTED_HOLE_COUNTS.contains(&holes_count) {
        return Ok(());
    }
    let mut err = ValidationError::new("holes_count");
    err.message = Some(format!("a round has 9 or 18 holes (got {holes_count})").into());
    Err(err)
}

/// Validates an optional course name: not blank and not overly long.
///
/// # Examples
///
/// ```ignore
/// validate_course_name("Royal Troon") // Ok
/// validate_course_name("   ")         // Err - blank
/// ```
pub fn validate_course_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("course_blank");
        err.message = Some("course name must not be blank".into());
        return Err(err);
    }

    let len = name.chars().count();
    if len > MAX_COURSE_NAME_LEN {
        let mut err = ValidationError::new("course_length");
        err.message = Some(
            format!("course name must be at most {MAX_COURSE_NAME_LEN} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
