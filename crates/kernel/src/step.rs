use std::fmt;

/// A navigation target as the caller supplied it.
///
/// Dynamically-typed front ends (scripts, JSON) can hand over anything, so the
/// validator accepts floats and opaque garbage and rejects them itself instead
/// of forcing every caller to pre-convert.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    Int(i64),
    Float(f64),
    /// Something that is not a number at all; carries a description for logs.
    Invalid(String),
}

impl fmt::Display for StepInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Invalid(desc) => f.write_str(desc),
        }
    }
}

impl From<i64> for StepInput {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for StepInput {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<usize> for StepInput {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(n) => Self::Int(n),
            Err(_) => Self::Invalid(format!("{n} (exceeds i64)")),
        }
    }
}

impl From<f64> for StepInput {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

/// Why a step was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error("step must be an integer, received '{0}'")]
    NotAnInteger(String),
    #[error("step index {step} below bounds")]
    BelowBounds { step: i64 },
    #[error("step index {step} above bounds, history length is {history_len}")]
    AboveBounds { step: i64, history_len: usize },
}

/// Check a step against the history bounds, returning the usable index.
pub fn validate_step(step: &StepInput, history_len: usize) -> Result<usize, StepError> {
    let step = match *step {
        StepInput::Int(n) => n,
        // Whole floats are fine; anything fractional or non-finite is not.
        StepInput::Float(x) if x.is_finite() && x.fract() == 0.0 => x as i64,
        StepInput::Float(x) => return Err(StepError::NotAnInteger(x.to_string())),
        StepInput::Invalid(ref desc) => return Err(StepError::NotAnInteger(desc.clone())),
    };
    if step < 0 {
        return Err(StepError::BelowBounds { step });
    }
    match usize::try_from(step) {
        Ok(index) if index < history_len => Ok(index),
        _ => Err(StepError::AboveBounds { step, history_len }),
    }
}

/// Boolean form of [`validate_step`] that reports rejections to the log.
pub fn is_step_valid(step: &StepInput, history_len: usize) -> bool {
    checked_step(step, history_len).is_some()
}

/// The index behind `step` if it is valid, logging the rejection otherwise.
///
/// Every navigation command goes through this check.
pub fn checked_step(step: &StepInput, history_len: usize) -> Option<usize> {
    match validate_step(step, history_len) {
        Ok(index) => Some(index),
        Err(err) => {
            tracing::warn!(%step, history_len, "{err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_in_bounds() {
        assert_eq!(validate_step(&StepInput::Int(0), 1), Ok(0));
        assert_eq!(validate_step(&StepInput::Int(4), 5), Ok(4));
        assert!(is_step_valid(&StepInput::Int(2), 3));
    }

    #[test]
    fn rejects_below_bounds() {
        assert_eq!(
            validate_step(&StepInput::Int(-1), 3),
            Err(StepError::BelowBounds { step: -1 })
        );
        assert!(!is_step_valid(&StepInput::Int(-1), 3));
    }

    #[test]
    fn rejects_history_length_itself() {
        assert_eq!(
            validate_step(&StepInput::Int(3), 3),
            Err(StepError::AboveBounds {
                step: 3,
                history_len: 3
            })
        );
    }

    #[test]
    fn whole_floats_are_integers() {
        assert_eq!(validate_step(&StepInput::Float(2.0), 3), Ok(2));
    }

    #[test]
    fn fractional_and_non_finite_floats_are_wrong_type() {
        assert!(matches!(
            validate_step(&StepInput::Float(1.5), 3),
            Err(StepError::NotAnInteger(_))
        ));
        assert!(matches!(
            validate_step(&StepInput::Float(f64::NAN), 3),
            Err(StepError::NotAnInteger(_))
        ));
        assert!(matches!(
            validate_step(&StepInput::Float(f64::INFINITY), 3),
            Err(StepError::NotAnInteger(_))
        ));
    }

    #[test]
    fn non_numbers_are_wrong_type() {
        let input = StepInput::Invalid("\"two\"".into());
        assert_eq!(
            validate_step(&input, 3),
            Err(StepError::NotAnInteger("\"two\"".into()))
        );
        assert!(!is_step_valid(&input, 3));
    }

    #[test]
    fn conversions() {
        assert_eq!(StepInput::from(3usize), StepInput::Int(3));
        assert_eq!(StepInput::from(-2i32), StepInput::Int(-2));
        assert_eq!(StepInput::from(0.5), StepInput::Float(0.5));
    }
}
