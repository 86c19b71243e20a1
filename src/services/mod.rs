pub mod admin;
pub mod analyzer;
pub mod auth;
pub mod submissions;
pub mod system;

pub use admin::AdminService;
pub use analyzer::{CodeAnalyzer, OllamaAnalyzer, create_analyzer};
pub use auth::AuthService;
pub use submissions::SubmissionService;
pub use system::SystemService;
