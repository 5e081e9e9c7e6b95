use crate::{
    api::{attendance, report},
    auth::middleware::auth_middleware,
    error::{json_error, query_error},
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP quota shared by every worker. Build it once, outside the
/// `HttpServer` factory.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("invalid rate limit: {requests_per_min} per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(api_prefix)
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .wrap(from_fn(auth_middleware))
            .wrap(Governor::new(limiter))
            .service(
                web::scope("/attendance")
                    .route("/mark-in", web::post().to(attendance::mark_in))
                    .route("/mark-out", web::post().to(attendance::mark_out))
                    .route("/all", web::get().to(attendance::all_attendance))
                    .route("/my", web::get().to(attendance::my_attendance))
                    .route("/sweep", web::post().to(attendance::run_sweep)),
            )
            .service(
                web::scope("/report")
                    .route("/daily", web::get().to(report::daily_report))
                    .route("/weekly", web::get().to(report::weekly_summary))
                    .route("/monthly", web::get().to(report::monthly_summary))
                    .route("/submit", web::post().to(report::submit_report))
                    .route("/check", web::get().to(report::check_report))
                    .route("/by-user", web::get().to(report::reports_by_user)),
            ),
    );
}
