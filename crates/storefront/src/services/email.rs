//! Email service for order confirmations, account verification and password
//! resets.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Without SMTP
//! configuration the service runs disabled: messages are rendered and logged
//! instead of sent.

use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use pokebin_core::Email;

use crate::config::StorefrontConfig;
use crate::services::auth::{RESET_TOKEN_TTL_HOURS, VERIFICATION_TOKEN_TTL_HOURS};
use crate::services::checkout::{OrderConfirmation, OrderNotifier};

/// Subject line of the order confirmation.
pub const ORDER_CONFIRMATION_SUBJECT: &str = "Order received";

const VERIFY_EMAIL_SUBJECT: &str = "Verify your Pokebin account";

const PASSWORD_RESET_SUBJECT: &str = "Reset your Pokebin password";

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    full_name: &'a str,
    order_id: i64,
    product_titles: &'a [String],
    total: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    full_name: &'a str,
    order_id: i64,
    products: String,
    total: String,
}

#[derive(Template)]
#[template(path = "email/verify_email.html")]
struct VerifyEmailHtml<'a> {
    username: &'a str,
    verify_url: &'a str,
    valid_hours: i64,
}

#[derive(Template)]
#[template(path = "email/verify_email.txt")]
struct VerifyEmailText<'a> {
    username: &'a str,
    verify_url: &'a str,
    valid_hours: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    username: &'a str,
    reset_url: &'a str,
    token: &'a str,
    valid_hours: i64,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    username: &'a str,
    reset_url: &'a str,
    token: &'a str,
    valid_hours: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    /// `None` when SMTP is not configured
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
    reply_to: String,
    base_url: String,
}

impl EmailService {
    /// Create the email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &StorefrontConfig) -> Result<Self, SmtpError> {
        let Some(email) = &config.email else {
            tracing::warn!("SMTP not configured; emails will be logged, not sent");
            return Ok(Self::disabled(&config.support_email, &config.base_url));
        };

        let credentials = Credentials::new(
            email.smtp_username.clone(),
            email.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email.smtp_host)?
            .port(email.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            mailer: Some(mailer),
            from_address: email.from_address.clone(),
            reply_to: config.support_email.clone(),
            base_url: config.base_url.clone(),
        })
    }

    /// A service that logs messages instead of sending them.
    #[must_use]
    pub fn disabled(support_email: &str, base_url: &str) -> Self {
        Self {
            mailer: None,
            from_address: support_email.to_owned(),
            reply_to: support_email.to_owned(),
            base_url: base_url.to_owned(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send the "Order received" email for a placed order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        let (text, html) = render_order_confirmation(confirmation)?;

        self.send_multipart_email(
            confirmation.recipient.as_str(),
            ORDER_CONFIRMATION_SUBJECT,
            &text,
            &html,
        )
        .await
    }

    /// Send the account verification link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_verification_email(
        &self,
        to: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let verify_url = self.verify_url(token);
        let html = VerifyEmailHtml {
            username,
            verify_url: &verify_url,
            valid_hours: VERIFICATION_TOKEN_TTL_HOURS,
        }
        .render()?;
        let text = VerifyEmailText {
            username,
            verify_url: &verify_url,
            valid_hours: VERIFICATION_TOKEN_TTL_HOURS,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), VERIFY_EMAIL_SUBJECT, &text, &html)
            .await
    }

    fn verify_url(&self, token: &str) -> String {
        format!("{}/auth/verify-email?token={token}", self.base_url)
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset_email(
        &self,
        to: &Email,
        username: &str,
        token: &str,
    ) -> Result<(), EmailError> {
        let reset_url = self.reset_url(token);
        let html = PasswordResetHtml {
            username,
            reset_url: &reset_url,
            token,
            valid_hours: RESET_TOKEN_TTL_HOURS,
        }
        .render()?;
        let text = PasswordResetText {
            username,
            reset_url: &reset_url,
            token,
            valid_hours: RESET_TOKEN_TTL_HOURS,
        }
        .render()?;

        self.send_multipart_email(to.as_str(), PASSWORD_RESET_SUBJECT, &text, &html)
            .await
    }

    fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.base_url)
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .reply_to(
                self.reply_to
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.reply_to.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        let Some(mailer) = &self.mailer else {
            tracing::info!(to = %to, subject = %subject, "Email delivery disabled");
            tracing::debug!(body = %text_body, "Unsent email body");
            return Ok(());
        };

        mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for EmailService {
    async fn order_placed(&self, confirmation: &OrderConfirmation) -> Result<(), EmailError> {
        self.send_order_confirmation(confirmation).await
    }
}

/// Render the plain text and HTML bodies of an order confirmation.
fn render_order_confirmation(
    confirmation: &OrderConfirmation,
) -> Result<(String, String), EmailError> {
    let total = confirmation.total.to_string();

    let text = OrderConfirmationText {
        full_name: &confirmation.full_name,
        order_id: confirmation.order_id.as_i64(),
        products: confirmation.product_titles.join(", "),
        total: total.clone(),
    }
    .render()?;

    let html = OrderConfirmationHtml {
        full_name: &confirmation.full_name,
        order_id: confirmation.order_id.as_i64(),
        product_titles: &confirmation.product_titles,
        total,
    }
    .render()?;

    Ok((text, html))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pokebin_core::{Money, OrderId};
    use rust_decimal::Decimal;

    fn confirmation() -> OrderConfirmation {
        OrderConfirmation {
            order_id: OrderId::new(42),
            recipient: Email::parse("ash@example.com").unwrap(),
            full_name: "Ash Ketchum".to_string(),
            product_titles: vec!["Pikachu Plush".to_string(), "Poke Ball <Mini>".to_string()],
            total: Money::new(Decimal::new(2500, 2)),
        }
    }

    #[test]
    fn test_order_confirmation_text() {
        let (text, _) = render_order_confirmation(&confirmation()).unwrap();

        assert!(text.contains("Your order number is: 42"));
        assert!(text.contains("Pikachu Plush, Poke Ball <Mini>"));
        assert!(text.contains("Total paid: $25.00"));
    }

    #[test]
    fn test_order_confirmation_html_escapes_titles() {
        let (_, html) = render_order_confirmation(&confirmation()).unwrap();

        assert!(html.contains("<li>Pikachu Plush</li>"));
        assert!(html.contains("Poke Ball &#60;Mini&#62;") || html.contains("Poke Ball &lt;Mini&gt;"));
        assert!(html.contains("$25.00"));
    }

    #[test]
    fn test_verify_url() {
        let service = EmailService::disabled("support@pokebin.app", "https://pokebin.app");
        assert_eq!(
            service.verify_url("abc_-123"),
            "https://pokebin.app/auth/verify-email?token=abc_-123"
        );
    }

    #[test]
    fn test_reset_url() {
        let service = EmailService::disabled("support@pokebin.app", "https://pokebin.app");
        assert_eq!(
            service.reset_url("abc_-123"),
            "https://pokebin.app/reset-password?token=abc_-123"
        );
    }

    #[test]
    fn test_password_reset_text() {
        let text = PasswordResetText {
            username: "misty",
            reset_url: "https://pokebin.app/reset-password?token=t0k",
            token: "t0k",
            valid_hours: RESET_TOKEN_TTL_HOURS,
        }
        .render()
        .unwrap();

        assert!(text.starts_with("Hi misty,"));
        assert!(text.contains("Or enter this code: t0k"));
        assert!(text.contains("expires in 72 hours"));
    }

    #[tokio::test]
    async fn test_disabled_service_accepts_messages() {
        let service = EmailService::disabled("support@pokebin.app", "https://pokebin.app");
        assert!(!service.is_enabled());

        service.send_order_confirmation(&confirmation()).await.unwrap();
        service
            .send_verification_email(
                &Email::parse("misty@example.com").unwrap(),
                "misty",
                "token",
            )
            .await
            .unwrap();
        service
            .send_password_reset_email(
                &Email::parse("misty@example.com").unwrap(),
                "misty",
                "token",
            )
            .await
            .unwrap();
    }
}
