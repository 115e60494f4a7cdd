use crate::ignition::HttpHeader;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeaderError {
    #[error("http header name is empty")]
    EmptyName,

    #[error("http header {name} has no value")]
    MissingValue { name: String },

    #[error("invalid http header name: {name}")]
    InvalidName { name: String },

    #[error("invalid value for http header {name}")]
    InvalidValue { name: String },

    #[error("duplicate http header: {name}")]
    Duplicate { name: String },
}

/// Turn declared headers into wire headers, keeping declaration order.
///
/// Names compare case-insensitively when checking for duplicates.
pub fn parse_headers(
    declared: &[HttpHeader],
) -> Result<Vec<(HeaderName, HeaderValue)>, HeaderError> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(declared.len());

    for header in declared {
        if header.name.trim().is_empty() {
            return Err(HeaderError::EmptyName);
        }

        let value = match header.value.as_deref() {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(HeaderError::MissingValue {
                    name: header.name.clone(),
                })
            }
        };

        let name =
            HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| HeaderError::InvalidName {
                name: header.name.clone(),
            })?;

        if !seen.insert(name.clone()) {
            return Err(HeaderError::Duplicate {
                name: header.name.clone(),
            });
        }

        let value = HeaderValue::from_str(value).map_err(|_| HeaderError::InvalidValue {
            name: header.name.clone(),
        })?;

        headers.push((name, value));
    }

    Ok(headers)
}
