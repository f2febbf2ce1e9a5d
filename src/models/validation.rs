use chrono::Datelike;
use thiserror::Error;

/// 验证错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title is too long (max 500 characters)")]
    TitleTooLong,

    #[error("Invalid year: {0} (must be between 1900 and {1})")]
    InvalidYear(i32, i32),

    #[error("Invalid rating: {0} (must be between 0.0 and 10.0)")]
    InvalidRating(f64),

    #[error("Synopsis is too long (max 5000 characters)")]
    SynopsisTooLong,

    #[error("Invalid season count: {0} (must be between 1 and {1})")]
    InvalidSeasonCount(u32, u32),

    #[error("Season count {requested} is below the {existing} seasons already stored")]
    SeasonCountBelowExisting { requested: u32, existing: u32 },

    #[error("Arc name is too long (max 200 characters)")]
    ArcNameTooLong,

    #[error("Page {0} is out of range")]
    PageOutOfRange(u64),
}

/// 验证器trait
pub trait Validator {
    type Error;

    fn validate(&self) -> Result<(), Self::Error>;
}

/// 最早允许的上映年份
pub const MIN_RELEASE_YEAR: i32 = 1900;

/// 季/篇章数量上限（与选择框一致）
pub const MAX_SEASONS: u32 = 36;

/// 字符串验证工具
pub struct StringValidator;

impl StringValidator {
    pub fn validate_title(title: &str) -> Result<(), ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        if title.chars().count() > 500 {
            return Err(ValidationError::TitleTooLong);
        }

        Ok(())
    }

    pub fn validate_synopsis(synopsis: &str) -> Result<(), ValidationError> {
        if synopsis.chars().count() > 5000 {
            return Err(ValidationError::SynopsisTooLong);
        }
        Ok(())
    }

    pub fn validate_arc_name(arc_name: &Option<String>) -> Result<(), ValidationError> {
        if let Some(name) = arc_name {
            if name.chars().count() > 200 {
                return Err(ValidationError::ArcNameTooLong);
            }
        }
        Ok(())
    }
}

/// 数值验证工具
pub struct NumberValidator;

impl NumberValidator {
    /// Next year is accepted so announced titles can be catalogued.
    pub fn max_release_year() -> i32 {
        chrono::Utc::now().year() + 1
    }

    pub fn validate_year(year: i32) -> Result<(), ValidationError> {
        let max = Self::max_release_year();
        if !(MIN_RELEASE_YEAR..=max).contains(&year) {
            return Err(ValidationError::InvalidYear(year, max));
        }
        Ok(())
    }

    pub fn validate_rating(rating: f64) -> Result<(), ValidationError> {
        if !rating.is_finite() || !(0.0..=10.0).contains(&rating) {
            return Err(ValidationError::InvalidRating(rating));
        }
        Ok(())
    }

    pub fn validate_season_count(count: u32) -> Result<(), ValidationError> {
        if !(1..=MAX_SEASONS).contains(&count) {
            return Err(ValidationError::InvalidSeasonCount(count, MAX_SEASONS));
        }
        Ok(())
    }
}
