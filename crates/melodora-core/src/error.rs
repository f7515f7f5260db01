//! Error kinds surfaced by a comparison request

use thiserror::Error;

/// Coarse outcome class used to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    ClientError,
    NotFound,
    ServerError,
}

/// Why a comparison or history request failed
#[derive(Debug, Error)]
pub enum CompareError {
    /// Missing or empty input
    #[error("{0}")]
    InvalidRequest(String),

    /// The catalog holds no songs
    #[error("{0}")]
    NoData(String),

    /// No candidate could be scored
    #[error("{0}")]
    NoMatch(String),

    /// Acquisition, analysis, candidate loading or record assembly failed
    #[error("{0}")]
    Processing(String),

    /// Both write attempts failed, or no row came back
    #[error("{0}")]
    Persistence(String),
}

impl CompareError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            CompareError::InvalidRequest(_) => StatusClass::ClientError,
            CompareError::NoData(_) | CompareError::NoMatch(_) => StatusClass::NotFound,
            CompareError::Processing(_) | CompareError::Persistence(_) => StatusClass::ServerError,
        }
    }

    /// Processing error carrying the full cause chain
    pub(crate) fn processing(context: &str, err: anyhow::Error) -> Self {
        CompareError::Processing(format!("{}: {:#}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(
            CompareError::InvalidRequest("x".into()).status_class(),
            StatusClass::ClientError
        );
        assert_eq!(CompareError::NoData("x".into()).status_class(), StatusClass::NotFound);
        assert_eq!(CompareError::NoMatch("x".into()).status_class(), StatusClass::NotFound);
        assert_eq!(
            CompareError::Processing("x".into()).status_class(),
            StatusClass::ServerError
        );
        assert_eq!(
            CompareError::Persistence("x".into()).status_class(),
            StatusClass::ServerError
        );
    }

    #[test]
    fn test_processing_keeps_cause_chain() {
        let cause = anyhow::anyhow!("disk full").context("write failed");
        let err = CompareError::processing("audio acquisition failed", cause);
        let text = err.to_string();
        assert!(text.starts_with("audio acquisition failed: "));
        assert!(text.contains("write failed"));
        assert!(text.contains("disk full"));
    }
}
