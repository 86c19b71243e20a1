pub mod admin;

pub mod auth;

pub mod codes;

pub mod system;

pub use admin::configure_admin_routes;
pub use auth::configure_auth_routes;
pub use codes::configure_code_routes;
pub use system::configure_system_routes;
