//! Parse a loader argument of the form `path/to/file.pdf?dpi=150&format=png`.
//!
//! The part before the first `?` is the document path; the rest is a
//! URL-encoded query string. Recognised keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `dpi` | positive integer |
//! | `format` | `jpg`, `jpeg` or `png` |
//! | `quality` | integer, clamped to 1–100 |
//! | `pages` | `1,3-5` style selection |
//! | `image_count_constraint` | integer; ≤ 0 means no ceiling |
//!
//! Anything else is ignored.

use crate::config::{ConversionConfig, OutputFormat, PageSelection};
use crate::error::Pdf2ImgError;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;
use url::form_urlencoded;

/// A document path plus the configuration parsed from its query string.
#[derive(Debug, Clone)]
pub struct LoaderArgument {
    pub path: PathBuf,
    pub config: ConversionConfig,
}

/// Split `argument` into a path and a validated [`ConversionConfig`].
///
/// # Errors
/// - [`Pdf2ImgError::InvalidArgument`] for a malformed integer or an empty path
/// - [`Pdf2ImgError::UnsupportedFormat`] for an unknown `format`
/// - [`Pdf2ImgError::InvalidPageSelection`] for a malformed `pages`
/// - [`Pdf2ImgError::InvalidConfig`] when the parsed values fail validation
pub fn parse_argument(argument: &str) -> Result<LoaderArgument, Pdf2ImgError> {
    let (path, query) = match argument.split_once('?') {
        Some((path, query)) => (path, query),
        None => (argument, ""),
    };
    if path.is_empty() {
        return Err(Pdf2ImgError::InvalidArgument {
            key: "path".into(),
            value: argument.into(),
        });
    }

    let mut builder = ConversionConfig::builder();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.trim();
        match key.as_ref() {
            "dpi" => builder = builder.dpi(parse_int(&key, value)?),
            "format" => builder = builder.format(OutputFormat::from_str(value)?),
            "quality" => {
                let q: i64 = parse_int(&key, value)?;
                builder = builder.quality(q.clamp(1, 100) as u8);
            }
            "pages" => builder = builder.pages(PageSelection::from_str(value)?),
            "image_count_constraint" => {
                let n: i64 = parse_int(&key, value)?;
                builder = builder.image_count_constraint(usize::try_from(n).unwrap_or(0));
            }
            other => debug!("Ignoring unknown loader option '{}'", other),
        }
    }

    Ok(LoaderArgument {
        path: PathBuf::from(path),
        config: builder.build()?,
    })
}

fn parse_int<T: FromStr>(key: &str, value: &str) -> Result<T, Pdf2ImgError> {
    value.parse().map_err(|_| Pdf2ImgError::InvalidArgument {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_path_gets_defaults() {
        let arg = parse_argument("docs/report.pdf").unwrap();
        assert_eq!(arg.path, PathBuf::from("docs/report.pdf"));
        assert_eq!(arg.config.dpi, 300);
        assert_eq!(arg.config.format, OutputFormat::Jpeg);
        assert_eq!(arg.config.quality, 30);
        assert!(arg.config.pages.is_none());
        assert!(arg.config.image_count_constraint.is_none());
    }

    #[test]
    fn all_known_keys() {
        let arg = parse_argument(
            "a.pdf?dpi=150&format=PNG&quality=80&pages=1%2C3-4&image_count_constraint=5",
        )
        .unwrap();
        assert_eq!(arg.config.dpi, 150);
        assert_eq!(arg.config.format, OutputFormat::Png);
        assert_eq!(arg.config.quality, 80);
        assert_eq!(arg.config.pages.unwrap().to_indices(10), vec![0, 2, 3]);
        assert_eq!(arg.config.image_count_constraint, Some(5));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let arg = parse_argument("a.pdf?colour=blue&dpi=96").unwrap();
        assert_eq!(arg.config.dpi, 96);
    }

    #[test]
    fn jpeg_alias() {
        let arg = parse_argument("a.pdf?format=jpeg").unwrap();
        assert_eq!(arg.config.format, OutputFormat::Jpeg);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = parse_argument("a.pdf?format=gif").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::UnsupportedFormat { ref format } if format == "gif"));
    }

    #[test]
    fn malformed_integer_is_invalid_argument() {
        let err = parse_argument("a.pdf?dpi=high").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidArgument { ref key, .. } if key == "dpi"));
    }

    #[test]
    fn bad_pages_is_invalid_selection() {
        let err = parse_argument("a.pdf?pages=1,x").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidPageSelection { .. }));
    }

    #[test]
    fn non_positive_ceiling_is_unset() {
        for raw in ["0", "-3"] {
            let arg = parse_argument(&format!("a.pdf?image_count_constraint={raw}")).unwrap();
            assert!(arg.config.image_count_constraint.is_none(), "{raw}");
        }
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(parse_argument("a.pdf?quality=250").unwrap().config.quality, 100);
        assert_eq!(parse_argument("a.pdf?quality=0").unwrap().config.quality, 1);
    }

    #[test]
    fn zero_dpi_fails_validation() {
        let err = parse_argument("a.pdf?dpi=0").unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidConfig(_)));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(
            parse_argument("?dpi=72").unwrap_err(),
            Pdf2ImgError::InvalidArgument { .. }
        ));
    }
}
