use std::fmt;

/// Terminal status reported by the optimization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// Found a provably optimal solution
    Optimal,
    /// No solution satisfies all constraints
    Infeasible,
    /// The objective can be improved indefinitely
    Unbounded,
    /// The engine terminated abnormally
    SolverError,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "Optimal"),
            SolutionStatus::Infeasible => write!(f, "Infeasible"),
            SolutionStatus::Unbounded => write!(f, "Unbounded"),
            SolutionStatus::SolverError => write!(f, "Solver Error"),
        }
    }
}

/// Typed errors of the sizing pipeline.
///
/// Every failure is surfaced as one of these variants; the HTTP layer owns
/// the translation to status codes and user-facing messages. No variant ever
/// carries a partial result.
#[derive(Debug, thiserror::Error)]
pub enum SizingError {
    #[error("'{series}' has {actual} entries but the horizon K is {expected}")]
    DimensionMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("no optimal solution found (engine status: {0})")]
    NoOptimalSolution(SolutionStatus),

    #[error("optimization engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl SizingError {
    pub fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        SizingError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offending_input() {
        let err = SizingError::DimensionMismatch {
            series: "generacion_solar",
            expected: 5,
            actual: 3,
        };
        let message = err.to_string();
        assert!(message.contains("generacion_solar"));
        assert!(message.contains('5'));
        assert!(message.contains('3'));

        let err = SizingError::NoOptimalSolution(SolutionStatus::Infeasible);
        assert!(err.to_string().contains("Infeasible"));
    }
}
