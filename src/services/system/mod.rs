use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::config::AppConfig;
use crate::models::system::responses::HealthResponse;
use crate::models::{ApiResponse, AppStartTime};

pub struct SystemService;

impl SystemService {
    pub fn new_lazy() -> Self {
        Self
    }

    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    // 健康检查
    pub async fn health(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let config = self.get_config();
        let now = chrono::Utc::now();
        let started_at = request
            .app_data::<actix_web::web::Data<AppStartTime>>()
            .map(|t| t.start_datetime)
            .unwrap_or(now);

        let response = HealthResponse {
            status: "ok".to_string(),
            system_name: config.app.system_name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: config.app.environment.clone(),
            started_at,
            uptime_seconds: now.signed_duration_since(started_at).num_seconds(),
        };

        Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Service is healthy")))
    }
}
