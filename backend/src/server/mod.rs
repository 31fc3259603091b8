//! Server construction and middleware wiring.

mod config;

pub use config::{AppConfig, ConfigError, ImageConfig, MailConfig, PaymentConfig, SmsConfig};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, HttpServer};
use mockable::{Clock, DefaultClock};

use crate::domain::ports::{
    ImageStore, Mailer, PaymentGateway, SessionStore, SmsSender, VerificationStore,
};
use crate::domain::{
    AccountService, DirectoryService, NotificationDispatcher, OtpLedger, PaymentService,
    SchedulingService,
};
use crate::inbound::http::error::json_error_handler;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{admin, doctors, health, patients};
use crate::middleware::Trace;
use crate::outbound::images::HttpImageStore;
use crate::outbound::mail::HttpMailer;
use crate::outbound::payment::HttpPaymentGateway;
use crate::outbound::persistence::MemoryDirectory;
use crate::outbound::sms::HttpSmsSender;
use crate::outbound::ttl_store::{MemorySessionStore, MemoryVerificationStore};

/// Wire the domain services onto the in-memory stores and the HTTP
/// provider adapters.
///
/// # Errors
/// Propagates [`std::io::Error`] when a provider client cannot be built.
pub fn build_state(config: &AppConfig) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let directory = Arc::new(MemoryDirectory::new());
    let verification: Arc<dyn VerificationStore> =
        Arc::new(MemoryVerificationStore::new(Arc::clone(&clock)));
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(Arc::clone(&clock)));

    let mailer: Arc<dyn Mailer> = Arc::new(
        HttpMailer::new(
            config.mail.api_url.clone(),
            config.mail.api_key.clone(),
            config.mail.sender.clone(),
        )
        .map_err(adapter_error)?,
    );
    let sms: Arc<dyn SmsSender> = Arc::new(
        HttpSmsSender::new(
            &config.sms.api_url,
            config.sms.account_sid.clone(),
            config.sms.auth_token.clone(),
            config.sms.sender.clone(),
        )
        .map_err(adapter_error)?,
    );
    let gateway: Arc<dyn PaymentGateway> = Arc::new(
        HttpPaymentGateway::new(
            &config.payment.api_url,
            config.payment.key_id.clone(),
            config.payment.key_secret.clone(),
        )
        .map_err(adapter_error)?,
    );
    let images: Arc<dyn ImageStore> = Arc::new(
        HttpImageStore::new(config.image.api_url.clone(), config.image.api_key.clone())
            .map_err(adapter_error)?,
    );

    let notifier = Arc::new(NotificationDispatcher::new(mailer, sms));
    let otp = Arc::new(OtpLedger::new(
        verification,
        Arc::clone(&clock),
        Arc::clone(&notifier),
    ));

    let accounts = Arc::new(AccountService::new(
        directory.clone(),
        directory.clone(),
        sessions.clone(),
        Arc::clone(&otp),
        Arc::clone(&images),
        Arc::clone(&clock),
        config.admin.clone(),
        config.default_country_code.clone(),
    ));
    let scheduling = Arc::new(SchedulingService::new(
        directory.clone(),
        directory.clone(),
        directory.clone(),
        notifier,
        Arc::clone(&clock),
    ));
    let payments = Arc::new(PaymentService::new(
        directory.clone(),
        gateway,
        config.currency.clone(),
    ));
    let directory_service = Arc::new(DirectoryService::new(directory, images, clock));

    Ok(HttpState::new(
        accounts,
        scheduling,
        payments,
        directory_service,
        sessions,
    ))
}

fn adapter_error(error: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(format!("provider client construction failed: {error}"))
}

fn build_app(
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(Trace)
        .service(web::scope("/api/user").configure(patients::configure))
        .service(web::scope("/api/doctor").configure(doctors::configure))
        .service(web::scope("/api/admin").configure(admin::configure))
        .configure(health::configure)
}

/// Construct an Actix HTTP server from the application configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when a provider client cannot be built or
/// the socket cannot be bound.
pub fn create_server(config: &AppConfig) -> std::io::Result<Server> {
    let http_state = web::Data::new(build_state(config)?);
    let server = HttpServer::new(move || build_app(http_state.clone()))
        .bind(config.bind_addr)?
        .run();
    Ok(server)
}
