use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{ApiError, FieldError};

const MAX_TEXT_LEN: usize = 100;
const MIN_YEAR: i32 = 1000;

fn max_year() -> i32 {
    OffsetDateTime::now_utc().year() + 5
}

fn check_text(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{field} is required")));
    } else if value.len() > MAX_TEXT_LEN {
        errors.push(FieldError::new(
            field,
            format!("{field} must be between 1 and {MAX_TEXT_LEN} characters"),
        ));
    }
}

fn check_year(errors: &mut Vec<FieldError>, year: i32) {
    let max = max_year();
    if year < MIN_YEAR || year > max {
        errors.push(FieldError::new(
            "year",
            format!("Year must be a valid year between {MIN_YEAR} and {max}"),
        ));
    }
}

/// Optional filters for the book list. Title and author match by substring,
/// year exactly.
#[derive(Debug, Default, Deserialize)]
pub struct BookFilter {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub year: Option<i32>,
}

impl CreateBookRequest {
    /// Checks every field and yields the year, so callers get the checked
    /// value rather than re-unwrapping the option.
    pub fn validate(&self) -> Result<i32, ApiError> {
        let mut errors = Vec::new();
        check_text(&mut errors, "title", &self.title);
        check_text(&mut errors, "author", &self.author);
        match self.year {
            Some(year) => {
                check_year(&mut errors, year);
                if errors.is_empty() {
                    return Ok(year);
                }
            }
            None => errors.push(FieldError::new("year", "Year is required")),
        }
        Err(ApiError::Validation(errors))
    }
}

/// Partial update: absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
}

impl UpdateBookRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if let Some(title) = &self.title {
            check_text(&mut errors, "title", title);
        }
        if let Some(author) = &self.author {
            check_text(&mut errors, "author", author);
        }
        if let Some(year) = self.year {
            check_year(&mut errors, year);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_all_fields() {
        let req = CreateBookRequest {
            title: "".into(),
            author: "".into(),
            year: None,
        };
        match req.validate().unwrap_err() {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_rejects_year_out_of_range() {
        let req = CreateBookRequest {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: Some(999),
        };
        assert!(matches!(
            req.validate().unwrap_err(),
            ApiError::Validation(_)
        ));

        let req = CreateBookRequest {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: Some(max_year() + 1),
        };
        assert!(matches!(
            req.validate().unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn create_accepts_valid_book_and_returns_year() {
        let req = CreateBookRequest {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: Some(1965),
        };
        assert_eq!(req.validate().unwrap(), 1965);
    }

    #[test]
    fn create_rejects_overlong_title() {
        let req = CreateBookRequest {
            title: "x".repeat(101),
            author: "Someone".into(),
            year: Some(2000),
        };
        assert!(matches!(
            req.validate().unwrap_err(),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn update_allows_partial_bodies() {
        let req = UpdateBookRequest {
            title: Some("New title".into()),
            author: None,
            year: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_still_checks_present_fields() {
        let req = UpdateBookRequest {
            title: Some("".into()),
            author: None,
            year: Some(10),
        };
        match req.validate().unwrap_err() {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
