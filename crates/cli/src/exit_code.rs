//! Process exit codes for the ferry CLI

use ferry_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    GeneralError,
    UsageError,
    NotFound,
    NetworkError,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Success => 0,
            ExitCode::GeneralError => 1,
            ExitCode::UsageError => 2,
            ExitCode::NotFound => 3,
            ExitCode::NetworkError => 4,
        }
    }

    pub fn from_error(error: &Error) -> Self {
        match error {
            Error::Usage(_) | Error::InvalidPath(_) => ExitCode::UsageError,
            Error::Connect(_) | Error::Network(_) => ExitCode::NetworkError,
            Error::NotFound(_) => ExitCode::NotFound,
            Error::List(_)
            | Error::Transfer { .. }
            | Error::Command(_)
            | Error::Invariant(_)
            | Error::Io(_) => ExitCode::GeneralError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::Direction;

    #[test]
    fn test_success_is_zero() {
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn test_every_failure_is_nonzero() {
        for code in [
            ExitCode::GeneralError,
            ExitCode::UsageError,
            ExitCode::NotFound,
            ExitCode::NetworkError,
        ] {
            assert_ne!(code.code(), 0);
        }
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::Usage("bad uri".into())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Connect("no credentials".into())),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Transfer {
                direction: Direction::Src,
                path: "bkt/f".into(),
                message: "boom".into(),
            }),
            ExitCode::GeneralError
        );
    }
}
