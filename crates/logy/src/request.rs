//! Request, response and endpoint types consumed from the routing framework.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Path separator used by endpoint namespaces and paths.
pub const PATH_SEPARATOR: &str = "/";

/// Request parameters keyed by name.
pub type Params = serde_json::Map<String, Value>;

/// Request headers keyed by name. Names keep the casing the client sent.
pub type Headers = BTreeMap<String, String>;

/// Metadata about the endpoint that handles a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Namespace the endpoint is mounted under (`"/"` for the root)
    pub namespace: String,
    /// Path segments declared for the endpoint
    pub paths: Vec<String>,
    /// Name of the API that declared the endpoint
    pub owner: String,
}

impl Endpoint {
    /// Creates endpoint metadata.
    pub fn new(
        owner: impl Into<String>,
        namespace: impl Into<String>,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            paths: paths.into_iter().map(Into::into).collect(),
            owner: owner.into(),
        }
    }

    /// Human-readable handler identity, e.g. `Api/v1/widgets`.
    ///
    /// The root namespace contributes nothing. Each path segment loses one
    /// leading separator and is kept even when that leaves it empty, so a
    /// `"/"` path under `"/v1"` gives `Api/v1/`.
    pub fn processed_by(&self) -> String {
        let namespace = (self.namespace != PATH_SEPARATOR).then_some(self.namespace.as_str());
        let segments: Vec<&str> = namespace
            .into_iter()
            .chain(self.paths.iter().map(|path| {
                path.strip_prefix(PATH_SEPARATOR).unwrap_or(path.as_str())
            }))
            .collect();

        format!("{}{}", self.owner, segments.join(PATH_SEPARATOR))
    }
}

/// Inbound request as seen by middleware.
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// HTTP method, e.g. `GET`
    pub method: String,
    /// Request path, e.g. `/widgets/1`
    pub path: String,
    /// Parameters parsed from the query string and route
    pub query_params: Params,
    /// Parameters parsed from a form body
    pub form_params: Option<Params>,
    /// Parameters parsed from a structured body by the framework
    pub body_params: Option<Params>,
    /// Request headers
    pub headers: Headers,
    /// Endpoint handling the request
    pub endpoint: Endpoint,
}

impl Request {
    /// Creates a request with no parameters or headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Adds a query parameter.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    /// Sets the form body parameters.
    pub fn with_form_params(mut self, params: Params) -> Self {
        self.form_params = Some(params);
        self
    }

    /// Sets the parsed body parameters.
    pub fn with_body_params(mut self, params: Params) -> Self {
        self.body_params = Some(params);
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the endpoint metadata.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// All parameters; later sources override earlier ones on collision.
    pub fn merged_params(&self) -> Params {
        let mut merged = self.query_params.clone();
        for source in [&self.form_params, &self.body_params].into_iter().flatten() {
            for (key, value) in source {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

/// Response produced by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status
    pub status: u16,
    /// Response headers
    #[serde(default)]
    pub headers: Headers,
    /// Response body
    #[serde(default)]
    pub body: Value,
}

impl Response {
    /// Creates a response with an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Value::Null,
        }
    }

    /// 200 with a JSON body.
    pub fn ok(body: Value) -> Self {
        Self::new(200).with_body(body)
    }

    /// Sets the body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_processed_by_root_namespace() {
        let endpoint = Endpoint::new("Api", "/", ["/widgets"]);
        assert_eq!(endpoint.processed_by(), "Apiwidgets");
    }

    #[test]
    fn test_processed_by_nested_namespace() {
        let endpoint = Endpoint::new("Api", "/v1", ["/widgets", ":id"]);
        assert_eq!(endpoint.processed_by(), "Api/v1/widgets/:id");
    }

    #[test]
    fn test_processed_by_keeps_empty_segments() {
        let endpoint = Endpoint::new("Api", "/v1", ["/"]);
        assert_eq!(endpoint.processed_by(), "Api/v1/");

        let endpoint = Endpoint::new("Api", "/v1", ["/widgets", "/", ":id"]);
        assert_eq!(endpoint.processed_by(), "Api/v1/widgets//:id");

        let endpoint = Endpoint::new("Api", "/", ["/"]);
        assert_eq!(endpoint.processed_by(), "Api");
    }

    #[test]
    fn test_processed_by_without_paths() {
        let endpoint = Endpoint::new("Api", "/", Vec::<String>::new());
        assert_eq!(endpoint.processed_by(), "Api");
    }

    #[test]
    fn test_merged_params_precedence() {
        let mut form = Params::new();
        form.insert("name".into(), json!("form"));
        form.insert("color".into(), json!("red"));
        let mut body = Params::new();
        body.insert("name".into(), json!("body"));

        let request = Request::new("POST", "/widgets")
            .with_query_param("name", "query")
            .with_query_param("page", 2)
            .with_form_params(form)
            .with_body_params(body);

        let merged = request.merged_params();
        assert_eq!(merged["name"], "body");
        assert_eq!(merged["color"], "red");
        assert_eq!(merged["page"], 2);
    }
}
