use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{
    audition, auth, dashboard, movie, notification, page, payment, profile, role, setting, user,
};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/profile", profile_routes())
        .nest("/users", user_routes())
        .nest("/roles", role_routes())
        .nest("/movies", movie_routes())
        .nest("/auditions", audition_routes())
        .nest("/settings", setting_routes())
        .nest("/pages", page_routes())
        .nest("/notifications", notification_routes())
        .nest("/payments", payment_routes())
        .nest("/dashboard", dashboard_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::verify_email))
        .routes(routes!(auth::resend_otp))
        .routes(routes!(auth::forgot_password))
        .routes(routes!(auth::reset_password))
        .routes(routes!(auth::me))
        .routes(routes!(auth::change_password))
}

fn profile_routes() -> OpenApiRouter<AppState> {
    let json = OpenApiRouter::new()
        .routes(routes!(profile::update_profile))
        .routes(routes!(profile::update_device_token))
        .routes(routes!(profile::remove_gallery_image));

    let uploads = OpenApiRouter::new()
        .routes(routes!(profile::upload_photo))
        .routes(routes!(profile::upload_gallery))
        .layer(profile::image_upload_body_limit());

    json.merge(uploads)
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::get_user, user::update_user, user::delete_user))
        .routes(routes!(user::update_user_status))
}

fn role_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(role::list_roles, role::create_role))
        .routes(routes!(role::list_permissions))
        .routes(routes!(role::get_role, role::update_role, role::delete_role))
}

fn movie_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(movie::list_movies, movie::create_movie))
        .routes(routes!(movie::get_movie, movie::update_movie, movie::delete_movie))
        .routes(routes!(movie::list_movie_roles))
}

fn audition_routes() -> OpenApiRouter<AppState> {
    let json = OpenApiRouter::new()
        .routes(routes!(audition::list_auditions))
        .routes(routes!(audition::list_my_auditions))
        .routes(routes!(audition::get_audition, audition::delete_audition))
        .routes(routes!(audition::remove_video))
        .routes(routes!(audition::update_audition_status));

    let uploads = OpenApiRouter::new()
        .routes(routes!(audition::create_audition))
        .routes(routes!(audition::update_audition))
        .layer(audition::video_upload_body_limit());

    json.merge(uploads)
}

fn setting_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(setting::list_settings, setting::update_settings))
        .routes(routes!(setting::public_settings))
}

fn page_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(page::list_pages, page::create_page))
        .routes(routes!(page::page_menu))
        .routes(routes!(page::get_published_page))
        .routes(routes!(page::get_page, page::update_page, page::delete_page))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            notification::list_notifications,
            notification::send_notification
        ))
        .routes(routes!(
            notification::get_notification,
            notification::delete_notification
        ))
}

fn payment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(payment::list_payments))
        .routes(routes!(payment::create_order))
        .routes(routes!(payment::verify_payment))
        .routes(routes!(payment::list_my_payments))
}

fn dashboard_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(dashboard::get_dashboard))
}
