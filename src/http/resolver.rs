//! Mapping of parsed requests to responses.

use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

/// Produces a response for a complete request.
///
/// Called synchronously by the connection driver while the connection is in
/// the `Processing` state. The driver sets the `Connection` header afterwards.
pub trait Resolver: Send + Sync + 'static {
    fn resolve(&self, request: &Request) -> Response;
}

/// Serves one HTML index page at `/` and `/index.html`.
#[derive(Debug, Clone)]
pub struct StaticSite {
    index: String,
}

impl StaticSite {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
        }
    }

    fn is_index(path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path == "/" || path == "/index.html"
    }
}

impl Resolver for StaticSite {
    fn resolve(&self, request: &Request) -> Response {
        match request.method {
            Method::GET | Method::HEAD => {}
            _ => {
                let mut response = Response::error(StatusCode::MethodNotAllowed);
                response.headers.remove("Connection");
                response.headers.insert("Allow".to_string(), "GET, HEAD".to_string());
                return response;
            }
        }

        let mut response = if Self::is_index(&request.path) {
            ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "text/html")
                .body(self.index.clone().into_bytes())
                .build()
        } else {
            Response::not_found()
        };

        // HEAD keeps Content-Length of the would-be body.
        if request.method == Method::HEAD {
            response.body.clear();
        }
        response
    }
}
