use crate::config::app_config;
use governor::{
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorRateLimiter,
};
use lettre::message::header::{Header, HeaderName, HeaderValue};
use lettre::{
    message::Mailbox,
    transport::smtp::client::{Tls, TlsParameters},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shared::job::SendJobPayload;
use std::num::NonZeroU32;
use thiserror::Error;

type RateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("relay rejected the message: {0}")]
    Relay(#[from] lettre::transport::smtp::Error),
}

macro_rules! fixed_name_header {
    ($ty:ident, $name:literal) => {
        struct $ty(String);

        impl Header for $ty {
            fn name() -> HeaderName {
                HeaderName::new_from_ascii_str($name)
            }

            fn parse(s: &str) -> Result<Self, lettre::message::header::HeaderError> {
                Ok($ty(s.to_owned()))
            }

            fn display(&self) -> HeaderValue {
                HeaderValue::new(Self::name(), self.0.clone())
            }
        }
    };
}

fixed_name_header!(XMessageId, "X-Message-Id");
fixed_name_header!(XUserId, "X-User-Id");
fixed_name_header!(XDomainId, "X-Domain-Id");
fixed_name_header!(XApiKeyId, "X-Api-Key-Id");

/// A single caller-supplied header whose name isn't known ahead of time.
/// `lettre`'s `Header` trait ties the header name to the type, so arbitrary
/// names go through this one type holding both the name and the value.
struct CustomHeader {
    name: String,
    value: String,
}

impl Header for CustomHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str("X-Custom")
    }

    fn parse(_s: &str) -> Result<Self, lettre::message::header::HeaderError> {
        unreachable!("CustomHeader is never parsed back out of a message")
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(HeaderName::new_from_ascii_str(&self.name), self.value.clone())
    }
}

/// Dials the configured upstream SMTP relay. A single transport is built once
/// and reused across jobs; `lettre`'s `AsyncSmtpTransport` pools connections
/// internally, so there is no per-job dial cost beyond the TCP/STARTTLS
/// handshake the pool already amortizes.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    rate_limiter: RateLimiter,
}

impl Mailer {
    pub fn new() -> Mailer {
        let cfg = app_config();

        let tls = TlsParameters::builder(cfg.haraka_host.clone())
            .dangerous_accept_invalid_certs(true)
            .build()
            .expect("failed to build relay TLS parameters");

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&cfg.haraka_host)
            .port(cfg.haraka_port)
            .tls(Tls::Opportunistic(tls))
            .build();

        let quota = Quota::per_second(
            NonZeroU32::new(cfg.worker_rate_limit_per_sec).unwrap_or(NonZeroU32::new(1).unwrap()),
        );

        Mailer {
            transport,
            rate_limiter: GovernorRateLimiter::direct(quota),
        }
    }

    /// Builds and dials the SMTP envelope for a send job. The relay's
    /// response is treated as accept/reject for every recipient in the
    /// envelope at once: the upstream relay is spoken to over a single
    /// connection per job, not per recipient, so a finer-grained per-address
    /// outcome isn't observable at this layer.
    pub async fn send(&self, job: &SendJobPayload) -> Result<String, MailerError> {
        self.rate_limiter.until_ready().await;

        let from: Mailbox = match &job.from_name {
            Some(name) => format!("{} <{}>", name, job.from_address).parse()?,
            None => job.from_address.parse()?,
        };

        let mut builder = Message::builder()
            .from(from)
            .subject(job.subject.clone())
            .message_id(Some(job.message_id.clone()))
            .header(XMessageId(job.message_id.clone()))
            .header(XUserId(job.user_id.clone()))
            .header(XDomainId(job.domain_id.clone()))
            .header(XApiKeyId(job.api_key_id.clone()));

        for recipient in &job.to {
            builder = builder.to(recipient.parse()?);
        }

        if let Some(reply_to) = &job.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        for (name, value) in &job.headers {
            builder = builder.header(CustomHeader {
                name: name.clone(),
                value: value.clone(),
            });
        }

        let body = match (&job.html, &job.text) {
            (Some(html), _) => builder
                .header(lettre::message::header::ContentType::TEXT_HTML)
                .body(html.clone())?,
            (None, Some(text)) => builder
                .header(lettre::message::header::ContentType::TEXT_PLAIN)
                .body(text.clone())?,
            (None, None) => builder.body(String::new())?,
        };

        let response = self.transport.send(body).await?;

        Ok(format!("{:?}", response.code()))
    }
}
