//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

use crate::domain::Error;

pub mod activity;
pub mod archive;
pub mod assignments;
pub mod auth;
pub mod cache_control;
pub mod envelope;
pub mod error;
pub mod health;
pub mod hub;
pub mod identity;
pub mod inventory;
pub mod orders;
pub mod reports;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// JSON extractor settings that report malformed bodies inside the error
/// envelope.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| Error::invalid_request(format!("Invalid JSON body: {err}")).into())
}

/// Query-string extractor settings matching [`json_config`].
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("Invalid query string: {err}")).into()
    })
}

/// Register every `/api/v1` route on `cfg`.
///
/// The caller supplies the scope and any session middleware:
///
/// ```
/// use actix_web::{App, web};
/// use cks_backend::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .service(identity::create_session)
        .service(identity::delete_session)
        .service(identity::me)
        .service(orders::create_order)
        .service(orders::get_order)
        .service(orders::apply_order_action)
        .service(inventory::item_availability)
        .service(inventory::list_catalog)
        .service(reports::create_report)
        .service(reports::create_feedback)
        .service(reports::update_report_status)
        .service(reports::resolve_report)
        .service(reports::acknowledge_report)
        .service(reports::acknowledge_feedback)
        .service(activity::list_activity)
        .service(activity::activity_statistics)
        .service(activity::entity_history)
        .service(activity::entity_tombstone)
        .service(activity::log_activity)
        .service(activity::cleanup_activity)
        .service(activity::detect_suspicious)
        .service(archive::list_archived)
        .service(archive::purge_expired)
        .service(archive::archive_entity)
        .service(archive::restore_entity)
        .service(archive::archive_relationships)
        .service(archive::hard_delete_entity)
        .service(assignments::assign_entity);
    for scope in hub::all_role_scopes() {
        cfg.service(scope);
    }
}
