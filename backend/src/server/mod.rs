//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub(crate) use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetricsBuilder;

use election::Trace;
use election::inbound::http::configure;
use election::inbound::http::health::{HealthState, live, ready};
use election::inbound::http::state::HttpState;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure))
        .service(ready)
        .service(live)
}

/// Construct an Actix HTTP server over the supplied handler state.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails or the
/// metrics middleware cannot be configured.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let deps = AppDependencies {
        health_state,
        http_state: web::Data::new(http_state),
    };
    let ServerConfig {
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus: configured_metrics,
    } = config;

    #[cfg(feature = "metrics")]
    let prometheus = match configured_metrics {
        Some(metrics) => metrics,
        None => PrometheusMetricsBuilder::new("election")
            .endpoint("/metrics")
            .build()
            .map_err(|err| std::io::Error::other(format!("configure Prometheus metrics: {err}")))?,
    };

    let server = HttpServer::new(move || {
        let app = build_app(deps.clone());
        #[cfg(feature = "metrics")]
        let wrapped = app.wrap(prometheus.clone());
        #[cfg(not(feature = "metrics"))]
        let wrapped = app;
        wrapped
    })
    .bind(bind_addr)?
    .run();

    Ok(server)
}
