use crate::{
    api::{attendance, auth, employee, live},
    config::Config,
    state::AppState,
};
use actix_cors::Cors;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use anyhow::{Result, anyhow};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-route rate limiters, keyed by peer IP. Built once so all workers share the quota.
#[derive(Clone)]
pub struct Limiters {
    login: Arc<Limiter>,
    signup: Arc<Limiter>,
    api: Arc<Limiter>,
}

impl Limiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            signup: Arc::new(build_limiter(config.rate_signup_per_min)?),
            api: Arc::new(build_limiter(config.rate_api_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min}/min"))?;
    Ok(Governor::new(&cfg))
}

/// CORS policy; `*` (or nothing configured) allows any origin.
pub fn cors(config: &Config) -> Cors {
    let origins = &config.cors_allowed_origins;

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        debug!("CORS: Allowing any origin");
        return Cors::permissive();
    }

    let mut cors = Cors::default().allow_any_method().allow_any_header();
    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    debug!("CORS: Allowed origins: {:?}", origins);
    cors
}

/// Malformed or incomplete JSON bodies get the same failure shape as domain errors.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({
            "success": false,
            "message": err.to_string()
        }));
        InternalError::from_response(err, response).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let limiters = &state.limiters;

    cfg.app_data(state.config.clone())
        .app_data(state.stores.clone())
        .app_data(state.broadcaster.clone())
        .app_data(state.usernames.clone())
        .app_data(json_config());

    cfg.service(
        web::scope(&state.config.api_prefix)
            .service(
                web::resource("/login")
                    .wrap(limiters.login.clone())
                    .route(web::post().to(auth::handle_login)),
            )
            .service(
                web::resource("/signup")
                    .wrap(limiters.signup.clone())
                    .route(web::post().to(auth::handle_signup)),
            )
            .service(
                web::scope("/employee")
                    .wrap(limiters.api.clone())
                    // /employee/add
                    .service(web::resource("/add").route(web::post().to(employee::handle_add)))
                    // /employee/list
                    .service(web::resource("/list").route(web::get().to(employee::handle_list))),
            )
            .service(
                web::scope("/attendance")
                    .wrap(limiters.api.clone())
                    // /attendance/log
                    .service(web::resource("/log").route(web::post().to(attendance::handle_log)))
                    // /attendance/view
                    .service(
                        web::resource("/view").route(web::get().to(attendance::handle_view)),
                    ),
            ),
    );

    // Live feed
    cfg.service(web::resource("/ws/{channel}").route(web::get().to(live::subscribe)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
