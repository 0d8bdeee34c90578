use super::handlers::{
    flash::PageMessage, health, home, login, logout, register, root, session::SESSION_COOKIE_NAME,
    CredentialsForm, ErrorBody,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::root,
        register::register_page,
        register::register,
        login::login_page,
        login::login,
        logout::logout,
        home::home,
        health::health,
    ),
    components(schemas(
        CredentialsForm,
        ErrorBody,
        PageMessage,
        home::HomeResponse,
        health::Health
    )),
    modifiers(&SessionCookie),
    tags(
        (name = "auth", description = "Registration, login and session-protected routes"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE_NAME))),
        );
    }
}

/// `OpenAPI` document for every served route.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = env!("CARGO_PKG_NAME").to_string();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.info.description = Some(env!("CARGO_PKG_DESCRIPTION").to_string());
    doc
}
