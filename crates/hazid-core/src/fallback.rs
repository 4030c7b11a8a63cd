use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::HazidError;
use crate::model::DataSource;

/// A dataset together with where it was loaded from.
#[derive(Debug, Clone, Serialize)]
pub struct Loaded<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Loaded<T> {
    pub fn is_fallback(&self) -> bool {
        self.source.is_builtin()
    }
}

/// Try each candidate path in order and return the first successful read.
///
/// The error of the last failed attempt is logged; if nothing succeeds the
/// result is `SourceNotFound`.
pub fn first_success<T>(
    paths: &[PathBuf],
    what: &str,
    mut attempt: impl FnMut(&Path) -> Result<T, HazidError>,
) -> Result<(PathBuf, T), HazidError> {
    for path in paths {
        match attempt(path) {
            Ok(value) => return Ok((path.clone(), value)),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "{what}: candidate rejected");
            }
        }
    }
    Err(HazidError::SourceNotFound {
        what: what.to_string(),
        tried: paths.len(),
    })
}

/// Run `primary`; on any error log it and use `fallback` instead.
pub fn load_with_fallback<T>(
    what: &str,
    primary: impl FnOnce() -> Result<(PathBuf, T), HazidError>,
    fallback: impl FnOnce() -> T,
) -> Loaded<T> {
    match primary() {
        Ok((path, value)) => {
            tracing::info!(path = %path.display(), "{what} loaded");
            Loaded {
                value,
                source: DataSource::Workbook(path),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "{what} unavailable, using built-in fallback");
            Loaded {
                value: fallback(),
                source: DataSource::Builtin,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_success_stops_at_first_ok() {
        let paths = vec![PathBuf::from("a"), PathBuf::from("b"), PathBuf::from("c")];
        let mut tried = Vec::new();
        let (path, value) = first_success(&paths, "test", |p| {
            tried.push(p.to_path_buf());
            if p == Path::new("b") {
                Ok(2)
            } else {
                Err(HazidError::Document("nope".into()))
            }
        })
        .unwrap();
        assert_eq!(path, PathBuf::from("b"));
        assert_eq!(value, 2);
        assert_eq!(tried.len(), 2);
    }

    #[test]
    fn first_success_reports_candidates_tried() {
        let paths = vec![PathBuf::from("a"), PathBuf::from("b")];
        let err = first_success::<()>(&paths, "hazards", |_| {
            Err(HazidError::Document("nope".into()))
        })
        .unwrap_err();
        assert!(matches!(err, HazidError::SourceNotFound { tried: 2, .. }));
    }

    #[test]
    fn fallback_marks_builtin_source() {
        let loaded = load_with_fallback(
            "test",
            || Err(HazidError::Document("broken".into())),
            || vec![1, 2, 3],
        );
        assert!(loaded.is_fallback());
        assert_eq!(loaded.value, vec![1, 2, 3]);
    }

    #[test]
    fn primary_success_keeps_path() {
        let loaded = load_with_fallback("test", || Ok((PathBuf::from("x.xlsx"), 7)), || 0);
        assert!(!loaded.is_fallback());
        assert_eq!(loaded.source, DataSource::Workbook(PathBuf::from("x.xlsx")));
    }
}
