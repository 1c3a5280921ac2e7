use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CompletionResult<T> = Result<T, CompletionError>;
pub type ComputeResult<T> = CompletionResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InputValidationError,
    IoSystemError,
    ComputationError,
    InternalError,
    Cancelled,
}

impl ErrorCategory {
    pub const fn exit_placeholder(self) -> ExitPlaceholder {
        match self {
            Self::InputValidationError => ExitPlaceholder {
                exit_code: 2,
                category_name: "InputValidationError",
                log_class: "INPUT_FATAL",
            },
            Self::IoSystemError => ExitPlaceholder {
                exit_code: 3,
                category_name: "IoSystemError",
                log_class: "IO_FATAL",
            },
            Self::ComputationError => ExitPlaceholder {
                exit_code: 4,
                category_name: "ComputationError",
                log_class: "RUN_FATAL",
            },
            Self::InternalError => ExitPlaceholder {
                exit_code: 5,
                category_name: "InternalError",
                log_class: "SYS_FATAL",
            },
            Self::Cancelled => ExitPlaceholder {
                exit_code: 130,
                category_name: "Cancelled",
                log_class: "CANCELLED",
            },
        }
    }

    pub const fn exit_code(self) -> i32 {
        self.exit_placeholder().exit_code
    }

    pub const fn category_name(self) -> &'static str {
        self.exit_placeholder().category_name
    }

    pub const fn log_class(self) -> &'static str {
        self.exit_placeholder().log_class
    }

    pub const fn is_fatal(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPlaceholder {
    pub exit_code: i32,
    pub category_name: &'static str,
    pub log_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionError {
    category: ErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl CompletionError {
    pub fn new(
        category: ErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn input_validation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InputValidationError, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::IoSystemError, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::ComputationError, placeholder, message)
    }

    pub fn internal(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::InternalError, placeholder, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Cancelled, "EXPORT.CANCELLED", message)
    }

    pub const fn category(&self) -> ErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        let severity = if self.category.is_fatal() {
            "ERROR"
        } else {
            "WARNING"
        };
        format!("{}: [{}] {}", severity, self.placeholder, self.message)
    }

    pub fn fatal_exit_line(&self) -> Option<String> {
        self.category
            .is_fatal()
            .then(|| format!("FATAL EXIT CODE: {}", self.exit_code()))
    }
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.category_name(),
            self.placeholder,
            self.message
        )
    }
}

impl Error for CompletionError {}

#[cfg(test)]
mod tests {
    use super::{CompletionError, ErrorCategory};

    #[test]
    fn exit_mapping_is_stable() {
        let cases = [
            (
                ErrorCategory::InputValidationError,
                2,
                "InputValidationError",
                "INPUT_FATAL",
            ),
            (ErrorCategory::IoSystemError, 3, "IoSystemError", "IO_FATAL"),
            (
                ErrorCategory::ComputationError,
                4,
                "ComputationError",
                "RUN_FATAL",
            ),
            (ErrorCategory::InternalError, 5, "InternalError", "SYS_FATAL"),
            (ErrorCategory::Cancelled, 130, "Cancelled", "CANCELLED"),
        ];

        for (category, exit_code, category_name, log_class) in cases {
            let placeholder = category.exit_placeholder();
            assert_eq!(placeholder.exit_code, exit_code);
            assert_eq!(placeholder.category_name, category_name);
            assert_eq!(placeholder.log_class, log_class);
        }
    }

    #[test]
    fn missing_case_error_renders_diagnostic_lines() {
        let error = CompletionError::input_validation(
            "EXPORT.MISSING_CASE",
            "Cannot export completions data without specified eclipse case",
        );

        assert_eq!(error.exit_code(), 2);
        assert_eq!(
            error.diagnostic_line(),
            "ERROR: [EXPORT.MISSING_CASE] Cannot export completions data without specified eclipse case"
        );
        assert_eq!(
            error.fatal_exit_line().as_deref(),
            Some("FATAL EXIT CODE: 2")
        );
    }

    #[test]
    fn cancellation_is_not_reported_as_fatal() {
        let error = CompletionError::cancelled("export cancelled before well 'P2'");
        assert_eq!(error.category(), ErrorCategory::Cancelled);
        assert!(error.diagnostic_line().starts_with("WARNING:"));
        assert!(error.fatal_exit_line().is_none());
    }
}
