//! Request authentication for HTTP handlers.
//!
//! [`AuthContext`] resolves the caller in a fixed order:
//!
//! 1. development identity headers, when the server runs with
//!    `DEV_MOCK_AUTH`;
//! 2. an `Authorization: Bearer` token, verified through the
//!    [`Authenticator`](crate::domain::ports::Authenticator) port;
//! 3. the principal cached in the signed session cookie, re-read through
//!    [`Authenticator::revalidate`](crate::domain::ports::Authenticator::revalidate)
//!    so archived or disabled accounts lose access and their session.
//!
//! Requests matching none of these are rejected with 401.

use std::str::FromStr;

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{
    BearerToken, Capability, Error, ErrorCode, Principal, Role, normalize_identity, require_any_cap,
    require_caps, role_for_code,
};

use super::session::SessionContext;
use super::state::HttpState;

/// Header naming the development role override.
pub const DEV_ROLE_HEADER: &str = "x-cks-dev-role";
/// Header carrying the development CKS code override.
pub const DEV_CODE_HEADER: &str = "x-cks-dev-code";

/// Authenticated caller extracted from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext(Principal);

impl AuthContext {
    /// The resolved principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    /// Fail with 403 unless every capability in `caps` is held.
    pub fn require(&self, caps: &[Capability]) -> Result<&Principal, Error> {
        require_caps(Some(&self.0), caps)
    }

    /// Fail with 403 unless at least one capability in `caps` is held.
    pub fn require_any(&self, caps: &[Capability]) -> Result<&Principal, Error> {
        require_any_cap(Some(&self.0), caps)
    }
}

/// Principal described by the development override headers.
///
/// Returns `Ok(None)` when no role header is present.
pub(crate) fn dev_principal(
    role: Option<&str>,
    code: Option<&str>,
) -> Result<Option<Principal>, Error> {
    let Some(raw_role) = role.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    let role = Role::from_str(raw_role)
        .map_err(|_| Error::invalid_request("Invalid dev role override"))?;
    let code = normalize_identity(code);
    if role == Role::Admin {
        return Ok(Some(Principal::admin(code.as_deref())));
    }
    match code {
        Some(code) if role_for_code(&code) == Some(role) => Ok(Some(Principal::hub(role, &code))),
        _ => Err(Error::invalid_request(
            "Dev override requires a valid CKS code",
        )),
    }
}

struct Credentials {
    dev_role: Option<String>,
    dev_code: Option<String>,
    authorization: Option<String>,
}

impl Credentials {
    fn from_request(req: &HttpRequest) -> Self {
        let read = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        Self {
            dev_role: read(DEV_ROLE_HEADER),
            dev_code: read(DEV_CODE_HEADER),
            authorization: read(header::AUTHORIZATION.as_str()),
        }
    }
}

async fn resolve_principal(
    state: &HttpState,
    credentials: Credentials,
    session: &SessionContext,
) -> Result<Principal, Error> {
    if state.dev_mock_auth
        && let Some(principal) =
            dev_principal(credentials.dev_role.as_deref(), credentials.dev_code.as_deref())?
    {
        debug!(role = %principal.role(), "development identity override");
        return Ok(principal);
    }

    if let Some(raw) = credentials.authorization {
        let token = BearerToken::from_header(&raw)
            .map_err(|_| Error::unauthorized("Invalid authorization header"))?;
        return state.auth.authenticate(&token).await;
    }

    let cached = session
        .principal()?
        .ok_or_else(|| Error::unauthorized("Authentication required"))?;
    match state.auth.revalidate(&cached).await {
        Ok(principal) => Ok(principal),
        Err(error) => {
            if matches!(error.code(), ErrorCode::Unauthorized | ErrorCode::Forbidden) {
                debug!(role = %cached.role(), "dropping stale session");
                session.clear();
            }
            Err(error)
        }
    }
}

impl FromRequest for AuthContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let credentials = Credentials::from_request(req);
        let session = SessionContext::from_request(req, payload);
        Box::pin(async move {
            let state = state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let session = session.await?;
            let principal = resolve_principal(&state, credentials, &session).await?;
            Ok(Self(principal))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockAuthenticator;
    use crate::inbound::http::test_utils::{dev_state, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse};
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(Some("center"), Some(" cen-010 "), Role::Center, Some("CEN-010"))]
    #[case(Some("Admin"), None, Role::Admin, None)]
    #[case(Some("admin"), Some("adm-001"), Role::Admin, Some("ADM-001"))]
    #[case(Some("warehouse"), Some("WHS-001"), Role::Warehouse, Some("WHS-001"))]
    fn dev_headers_build_principals(
        #[case] role: Option<&str>,
        #[case] code: Option<&str>,
        #[case] expected_role: Role,
        #[case] expected_code: Option<&str>,
    ) {
        let principal = dev_principal(role, code)
            .expect("valid override")
            .expect("principal present");
        assert_eq!(principal.role(), expected_role);
        assert_eq!(principal.code(), expected_code);
    }

    #[rstest]
    #[case(Some("janitor"), Some("CEN-010"), "Invalid dev role override")]
    #[case(Some("crew"), None, "Dev override requires a valid CKS code")]
    #[case(Some("crew"), Some("CEN-010"), "Dev override requires a valid CKS code")]
    fn invalid_dev_headers_are_rejected(
        #[case] role: Option<&str>,
        #[case] code: Option<&str>,
        #[case] message: &str,
    ) {
        let error = dev_principal(role, code).expect_err("override rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        assert_eq!(error.message(), message);
    }

    #[rstest]
    fn missing_role_header_means_no_override() {
        assert_eq!(dev_principal(None, Some("CEN-010")).expect("no error"), None);
    }

    async fn whoami(auth: AuthContext) -> HttpResponse {
        HttpResponse::Ok().body(auth.principal().actor_id())
    }

    async fn call(state: HttpState, request: actix_test::TestRequest) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(test_session_middleware())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        actix_test::call_service(&app, request.uri("/whoami").to_request()).await
    }

    #[actix_web::test]
    async fn dev_headers_win_when_enabled() {
        let state = dev_state(|_| {});
        let response = call(
            state,
            actix_test::TestRequest::get()
                .insert_header((DEV_ROLE_HEADER, "crew"))
                .insert_header((DEV_CODE_HEADER, "crw-004")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(response).await, "CRW-004");
    }

    #[actix_web::test]
    async fn dev_headers_are_ignored_when_disabled() {
        let state = dev_state(|_| {}).with_dev_mock_auth(false);
        let response = call(
            state,
            actix_test::TestRequest::get().insert_header((DEV_ROLE_HEADER, "admin")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn bearer_tokens_go_through_the_authenticator() {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .withf(|token| token.expose() == "tok_live")
            .times(1)
            .return_once(|_| Ok(Principal::hub(Role::Manager, "MGR-012")));
        let state = dev_state(|ports| ports.auth = Arc::new(auth));
        let response = call(
            state,
            actix_test::TestRequest::get().insert_header(("Authorization", "Bearer tok_live")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(actix_test::read_body(response).await, "MGR-012");
    }

    #[actix_web::test]
    async fn authenticator_failures_propagate() {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate()
            .return_once(|_| Err(Error::forbidden("No account for this identity")));
        let state = dev_state(|ports| ports.auth = Arc::new(auth));
        let response = call(
            state,
            actix_test::TestRequest::get().insert_header(("Authorization", "Bearer tok_orphan")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[rstest]
    #[case("Basic dXNlcjpwYXNz")]
    #[case("Bearer ")]
    #[actix_web::test]
    async fn malformed_authorization_is_unauthorised(#[case] header_value: &str) {
        let mut auth = MockAuthenticator::new();
        auth.expect_authenticate().never();
        let state = dev_state(|ports| ports.auth = Arc::new(auth));
        let response = call(
            state,
            actix_test::TestRequest::get().insert_header(("Authorization", header_value)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn anonymous_requests_are_unauthorised() {
        let response = call(dev_state(|_| {}), actix_test::TestRequest::get()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
