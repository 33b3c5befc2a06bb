//! OpenAPI documentation configuration

use utoipa::{Modify, OpenApi};

use crate::api::root::WelcomeResponse;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users MongoDB API",
        version = "0.1.0",
        description = "MongoDB-backed REST API for managing users",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(crate::api::root::welcome_handler),
    components(schemas(WelcomeResponse)),
    modifiers(&UsersApi),
    tags(
        (name = "Root", description = "Service entry point")
    )
)]
pub struct ApiDoc;

/// Users routes are mounted at the root, so their document is merged rather than nested.
struct UsersApi;

impl Modify for UsersApi {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.merge(domain_users::ApiDoc::openapi());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_users_and_root_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/"));
        assert!(doc.paths.paths.contains_key("/users/"));
        assert!(doc.paths.paths.contains_key("/users/{user_id}"));
    }
}
