//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::test::TestRequest;

use crate::domain::Role;
use crate::inbound::http::auth::{DEV_CODE_HEADER, DEV_ROLE_HEADER};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Fixture-backed state with development identity headers enabled.
pub fn dev_state(configure: impl FnOnce(&mut HttpStatePorts)) -> HttpState {
    let mut ports = HttpStatePorts::default();
    configure(&mut ports);
    HttpState::new(ports).with_dev_mock_auth(true)
}

/// Attach development identity headers to a test request.
pub fn as_role(request: TestRequest, role: Role, code: Option<&str>) -> TestRequest {
    let request = request.insert_header((DEV_ROLE_HEADER, role.as_str()));
    match code {
        Some(code) => request.insert_header((DEV_CODE_HEADER, code)),
        None => request,
    }
}
