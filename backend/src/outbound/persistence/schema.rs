//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Platform administrators.
    admin_users (admin_id) {
        admin_id -> Text,
        /// Identity provider user id.
        clerk_user_id -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Managers; the root of each ecosystem.
    managers (manager_id) {
        manager_id -> Text,
        clerk_user_id -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Contractors under a manager.
    contractors (contractor_id) {
        contractor_id -> Text,
        clerk_user_id -> Nullable<Text>,
        /// Owning manager code.
        cks_manager -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Customers under a contractor.
    customers (customer_id) {
        customer_id -> Text,
        clerk_user_id -> Nullable<Text>,
        cks_manager -> Nullable<Text>,
        contractor_id -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Service centers under a customer.
    centers (center_id) {
        center_id -> Text,
        clerk_user_id -> Nullable<Text>,
        cks_manager -> Nullable<Text>,
        contractor_id -> Nullable<Text>,
        customer_id -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Crew members; linked to the hierarchy through their center.
    crew (crew_id) {
        crew_id -> Text,
        clerk_user_id -> Nullable<Text>,
        cks_manager -> Nullable<Text>,
        assigned_center -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Warehouses fulfilling product orders.
    warehouses (warehouse_id) {
        warehouse_id -> Text,
        clerk_user_id -> Nullable<Text>,
        cks_manager -> Nullable<Text>,
        name -> Text,
        email -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Orderable products. Prices are minor units.
    catalog_products (product_id) {
        product_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        category -> Nullable<Text>,
        unit_of_measure -> Nullable<Text>,
        unit_price -> Int8,
        currency -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orderable services. Prices are minor units.
    catalog_services (service_id) {
        service_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        category -> Nullable<Text>,
        unit_of_measure -> Nullable<Text>,
        unit_price -> Int8,
        currency -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stock per warehouse and item.
    inventory_items (id) {
        id -> Int8,
        warehouse_id -> Text,
        item_code -> Text,
        item_name -> Text,
        quantity_available -> Int4,
        status -> Text,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Product and service orders.
    ///
    /// Ecosystem links (`manager_id` .. `crew_id`) are copied from the
    /// creator at insert time so hub listings filter by column.
    orders (order_id) {
        order_id -> Text,
        order_type -> Text,
        title -> Text,
        status -> Text,
        next_actor_role -> Nullable<Text>,
        next_actor_code -> Nullable<Text>,
        creator_id -> Text,
        creator_role -> Text,
        destination -> Nullable<Text>,
        destination_role -> Nullable<Text>,
        manager_id -> Nullable<Text>,
        contractor_id -> Nullable<Text>,
        customer_id -> Nullable<Text>,
        center_id -> Nullable<Text>,
        crew_id -> Nullable<Text>,
        assigned_warehouse -> Nullable<Text>,
        expected_date -> Nullable<Timestamptz>,
        delivery_date -> Nullable<Timestamptz>,
        transformed_id -> Nullable<Text>,
        rejection_reason -> Nullable<Text>,
        notes -> Nullable<Text>,
        total_amount -> Int8,
        currency -> Text,
        metadata -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Order line items; `line_number` is unique per order.
    order_items (id) {
        id -> Int8,
        order_id -> Text,
        line_number -> Int4,
        catalog_item_code -> Text,
        name -> Text,
        item_type -> Text,
        description -> Nullable<Text>,
        quantity -> Int4,
        unit_of_measure -> Nullable<Text>,
        unit_price -> Int8,
        currency -> Text,
        total_price -> Int8,
        metadata -> Jsonb,
    }
}

diesel::table! {
    /// Accounts taking part in an order.
    order_participants (id) {
        id -> Int8,
        order_id -> Text,
        participant_id -> Text,
        participant_role -> Text,
        participation_type -> Text,
        added_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issue reports.
    reports (report_id) {
        report_id -> Text,
        #[sql_name = "type"]
        report_type -> Text,
        severity -> Text,
        title -> Text,
        description -> Text,
        center_id -> Nullable<Text>,
        customer_id -> Nullable<Text>,
        status -> Text,
        created_by_role -> Text,
        created_by_id -> Text,
        cks_manager -> Nullable<Text>,
        resolution_notes -> Nullable<Text>,
        resolved_by -> Nullable<Text>,
        resolved_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// Feedback tickets.
    feedback (feedback_id) {
        feedback_id -> Text,
        kind -> Text,
        title -> Text,
        message -> Text,
        center_id -> Nullable<Text>,
        customer_id -> Nullable<Text>,
        status -> Text,
        created_by_role -> Text,
        created_by_id -> Text,
        cks_manager -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        archived_at -> Nullable<Timestamptz>,
        archived_by -> Nullable<Text>,
        archive_reason -> Nullable<Text>,
        deletion_scheduled -> Nullable<Timestamptz>,
        restored_at -> Nullable<Timestamptz>,
        restored_by -> Nullable<Text>,
    }
}

diesel::table! {
    /// One row per (report, account).
    report_acknowledgments (id) {
        id -> Int8,
        report_id -> Text,
        acknowledged_by_id -> Text,
        acknowledged_by_role -> Text,
        acknowledged_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per (feedback, account).
    feedback_acknowledgments (id) {
        id -> Int8,
        feedback_id -> Text,
        acknowledged_by_id -> Text,
        acknowledged_by_role -> Text,
        acknowledged_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit log.
    system_activity (activity_id) {
        activity_id -> Int8,
        activity_type -> Text,
        description -> Text,
        actor_id -> Text,
        actor_role -> Text,
        target_id -> Nullable<Text>,
        target_type -> Nullable<Text>,
        metadata -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Parent links captured when an entity is archived.
    archive_relationships (id) {
        id -> Int8,
        entity_type -> Text,
        entity_id -> Text,
        parent_type -> Text,
        parent_id -> Text,
        relationship_data -> Jsonb,
        archived_by -> Nullable<Text>,
        archived_at -> Timestamptz,
        restored -> Bool,
        restored_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_participants -> orders (order_id));
diesel::joinable!(report_acknowledgments -> reports (report_id));
diesel::joinable!(feedback_acknowledgments -> feedback (feedback_id));

diesel::allow_tables_to_appear_in_same_query!(
    admin_users,
    managers,
    contractors,
    customers,
    centers,
    crew,
    warehouses,
    catalog_products,
    catalog_services,
    inventory_items,
    orders,
    order_items,
    order_participants,
    reports,
    feedback,
    report_acknowledgments,
    feedback_acknowledgments,
    system_activity,
    archive_relationships,
);
