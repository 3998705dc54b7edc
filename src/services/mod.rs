pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthSession};
pub use auth_service_impl::SeaOrmAuthService;

pub mod report_service;
pub use report_service::{GeneratedReport, ReportRequest, ReportService};

pub mod token;
pub use token::{Claims, JwtService};
