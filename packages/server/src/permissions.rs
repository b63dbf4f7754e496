//! Permission tags stored on roles and checked by [`crate::extractors::auth::AuthUser`].

pub const MANAGE_USERS: &str = "manage_users";
pub const MANAGE_ROLES: &str = "manage_roles";
pub const MANAGE_MOVIES: &str = "manage_movies";
pub const MANAGE_AUDITIONS: &str = "manage_auditions";
pub const MANAGE_SETTINGS: &str = "manage_settings";
pub const MANAGE_PAGES: &str = "manage_pages";
pub const MANAGE_NOTIFICATIONS: &str = "manage_notifications";
pub const MANAGE_PAYMENTS: &str = "manage_payments";
pub const VIEW_DASHBOARD: &str = "view_dashboard";

/// Every known permission with a short description, in display order.
pub const ALL: &[(&str, &str)] = &[
    (MANAGE_USERS, "Create, edit, deactivate and delete users"),
    (MANAGE_ROLES, "Create and edit roles and their permissions"),
    (MANAGE_MOVIES, "Create, edit and delete movies and their roles"),
    (MANAGE_AUDITIONS, "Review every audition and change its status"),
    (MANAGE_SETTINGS, "Read and change system settings"),
    (MANAGE_PAGES, "Manage CMS pages"),
    (MANAGE_NOTIFICATIONS, "Broadcast push notifications"),
    (MANAGE_PAYMENTS, "View all payments"),
    (VIEW_DASHBOARD, "View the admin dashboard"),
];

pub fn is_known(permission: &str) -> bool {
    ALL.iter().any(|(p, _)| *p == permission)
}

/// Permissions granted to the `Admin` role on first start.
pub const ADMIN_DEFAULTS: &[&str] = &[
    MANAGE_USERS,
    MANAGE_MOVIES,
    MANAGE_AUDITIONS,
    MANAGE_PAGES,
    MANAGE_NOTIFICATIONS,
    MANAGE_PAYMENTS,
    VIEW_DASHBOARD,
];
