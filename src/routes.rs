use crate::{
    api::{attendance, employee, payroll, report},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst always build a governor config");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));
    let scan_limiter = Arc::new(build_limiter(config.rate_scan_per_min));

    // Public routes (register checks the admin token itself)
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(handlers::me)
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    .service(
                        web::resource("/{id}/compensation")
                            .route(web::put().to(employee::save_compensation)),
                    )
                    .service(
                        web::resource("/{id}/badge").route(web::post().to(employee::rotate_badge)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // scanners fire in bursts; they get their own budget
                    .service(
                        web::resource("/scan")
                            .wrap(scan_limiter)
                            .route(web::post().to(attendance::scan)),
                    )
                    .service(web::resource("/mark").route(web::post().to(attendance::mark_day)))
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(attendance::update_status)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    .service(
                        web::resource("/calculate").route(web::post().to(payroll::calculate)),
                    )
                    // before /{employee_id} so "export" is not parsed as an id
                    .service(
                        web::resource("/export").route(web::get().to(payroll::export_payroll)),
                    )
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(payroll::employee_compensation)),
                    ),
            )
            .service(
                web::scope("/report")
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(report::attendance_report)),
                    )
                    .service(
                        web::resource("/attendance/export")
                            .route(web::get().to(report::export_attendance_report)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// KIOSK
//  └─ POST /api/attendance/scan { token }   (first scan of the day = check-in, next = check-out)
