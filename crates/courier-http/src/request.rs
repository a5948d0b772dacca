//! Wire request construction from contracts and endpoint declarations.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use courier_config::{EndpointConfig, RequestMethod};
use courier_contracts::Contract;

/// Fully resolved request ready for one transport attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    /// Request method, selecting the payload serialization.
    pub method: RequestMethod,
    /// Target URL with path parameters substituted.
    pub url: Url,
    /// Bearer token; empty when no auth applies.
    pub token: String,
    /// Flat query map for GET requests.
    pub query: Vec<(String, String)>,
    /// JSON body for POST/PATCH requests.
    pub body: Option<Value>,
}

/// Errors raised while turning a contract into a wire request.
#[derive(Debug, Error)]
pub enum RequestBuildError {
    /// Neither the endpoint, the contract, nor the provider supplies a base
    /// URL.
    #[error("no base URL configured for endpoint '{endpoint}'")]
    MissingBaseUrl {
        /// Method name of the affected endpoint.
        endpoint: String,
    },
    /// Joining the path onto the base URL produced an invalid URL.
    #[error("invalid target URL '{target}': {source}")]
    InvalidUrl {
        /// The rejected URL text.
        target: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Builds the wire request for a contract against its endpoint declaration.
///
/// Base URL precedence: per-call contract override, then the endpoint's own
/// URL, then the provider default. The token follows the same per-call
/// override rule. `{field}` placeholders in the path are substituted from
/// the contract payload before joining.
///
/// # Errors
///
/// Returns a [`RequestBuildError`] when no base URL is available or the
/// joined URL does not parse.
pub fn build_request(
    contract: &Contract,
    endpoint: &EndpointConfig,
    default_url: Option<&Url>,
    default_token: &str,
) -> Result<PreparedRequest, RequestBuildError> {
    let base = contract
        .url()
        .or(endpoint.url.as_ref())
        .or(default_url)
        .ok_or_else(|| RequestBuildError::MissingBaseUrl {
            endpoint: endpoint.contract.clone(),
        })?;

    let token = contract
        .token()
        .filter(|token| !token.is_empty())
        .unwrap_or(default_token)
        .to_owned();

    let path = substitute_path(&endpoint.path, contract.payload());
    let url = join_url(base, &path)?;

    let (query, body) = match endpoint.method {
        RequestMethod::Get => (flatten_query(contract.payload()), None),
        RequestMethod::Post | RequestMethod::Patch => {
            let body = match contract.payload() {
                Value::Null => None,
                payload => Some(payload.clone()),
            };
            (Vec::new(), body)
        }
    };

    Ok(PreparedRequest {
        method: endpoint.method,
        url,
        token,
        query,
        body,
    })
}

/// Substitutes `{field}` placeholders from the payload's top-level fields.
fn substitute_path(template: &str, payload: &Value) -> String {
    let Value::Object(fields) = payload else {
        return template.to_owned();
    };
    let mut path = template.to_owned();
    for (key, value) in fields {
        let placeholder = format!("{{{key}}}");
        if path.contains(&placeholder) {
            path = path.replace(&placeholder, &scalar_text(value));
        }
    }
    path
}

fn join_url(base: &Url, path: &str) -> Result<Url, RequestBuildError> {
    if path.is_empty() {
        return Ok(base.clone());
    }
    let target = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&target).map_err(|source| RequestBuildError::InvalidUrl { target, source })
}

/// Flattens an object payload into a string-keyed query map.
///
/// Null fields are skipped; nested values are serialized as compact JSON.
/// Non-object payloads produce an empty map. A `BTreeMap` keeps parameter
/// order deterministic.
fn flatten_query(payload: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = payload else {
        return Vec::new();
    };
    fields
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), scalar_text(value)))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}
