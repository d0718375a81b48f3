//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the transport-agnostic model of the CKS portal. Types here
//! know nothing about HTTP or SQL; adapters reach them through [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Principal, Role: the authenticated caller.
//! - Capability: permission tokens gating every route.
//! - Order, Report, Feedback, Activity: the workflow aggregates.
//! - AssignmentRequest: moving accounts between parents in the hierarchy.
//! - `*Service`: implementations of the driving ports.

pub mod activity;
pub mod archive;
pub mod assignment;
pub mod auth;
pub mod auth_service;
pub mod capability;
pub mod dashboard;
pub mod ecosystem;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod order;
pub mod ports;
pub mod report;
pub mod trace_id;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::activity::{
    Activity, ActivityDraft, ActivityFilter, ActivityReceipt, ActivityScope, ActivityService,
    ActivityStatistics, ActivityTallies, ActivityTypeMatch, ActorCount, BULK_DELETE_THRESHOLD,
    CleanupReport, CountBucket, DEFAULT_RETENTION_DAYS, DEFAULT_STATISTICS_DAYS, DailyCount,
    FAILED_LOGIN_THRESHOLD, MAX_WINDOW_DAYS, OFF_HOURS_TYPES, SYSTEM_ACTOR, SuspiciousActivity,
    SuspiciousKind, SuspiciousReport, TOP_ACTOR_LIMIT, Tombstone, deletion_activity_type,
    is_off_hours,
};
pub use self::archive::{
    ArchiveEntity, ArchiveOutcome, ArchiveReceipt, ArchiveRecord, ArchiveRelationship,
    ArchiveService, ArchivedEntity, DEFAULT_ARCHIVE_REASON, HardDeleteOutcome, HardDeleteRequest,
    PurgeReport, RETENTION_DAYS, RestoreOutcome, UnknownArchiveEntity,
};
pub use self::assignment::{
    AssignmentChange, AssignmentOutcome, AssignmentRequest, AssignmentResult, AssignmentService,
};
pub use self::auth::{BearerToken, BearerTokenError};
pub use self::auth_service::AuthService;
pub use self::capability::{
    ALL_CAPABILITIES, Capability, capabilities_for, has_capability, require_any_cap,
    require_caps,
};
pub use self::dashboard::{
    CLEAR_CONFIRMATION, ClearActivityRequest, ClearReport, DashboardConfig, DashboardFeature,
    DashboardFeatures, DashboardScope, DashboardService, DashboardSummary, HubContext, KpiScope,
    Kpis,
};
pub use self::ecosystem::EcosystemLinks;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::{
    AccountRecord, HUB_ROLES, Principal, Role, UnknownRole, normalize_identity,
    resolved_user_code, role_for_code,
};
pub use self::inventory::{Availability, Catalog, InventoryService, check_availability};
pub use self::order::{
    CatalogItem, CreateOrderRequest, DEFAULT_CURRENCY, Destination, HubOrders, NewOrder,
    NewOrderItem, Order, OrderAction, OrderActionRequest, OrderChange, OrderItem,
    OrderItemRequest, OrderService, OrderStatus, OrderType, OrderView, Participant,
    ParticipationType, ViewerStatus, format_order_id, is_visible_to, order_id_prefix,
    plan_transition, viewer_status,
};
pub use self::report::{
    AckOutcome, Acknowledger, Acknowledgment, CreateFeedbackRequest, CreateReportRequest,
    DEFAULT_FEEDBACK_KIND, DEFAULT_REPORT_TYPE, DEFAULT_SEVERITY, Feedback, HubReports,
    NewFeedback, NewReport, Report, ReportKind, ReportService, ReportStatus, ReportUpdate,
    Resolution, TicketScope, UnknownReportStatus,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use cks_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
