use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use crate::errors::ServiceError;

/// Transactional email delivery.
///
/// Notification sends are fire-and-forget from the caller's point of view;
/// the notification service spawns them and logs failures instead of failing
/// the originating request.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_html(
        &self,
        to: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), ServiceError>;
}

/// `reqwest`-backed mail client speaking a SendGrid-style JSON API.
pub struct HttpMailer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    from_address: String,
    from_name: String,
}

#[derive(Serialize)]
struct MailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<MailAddress<'a>>,
}

#[derive(Serialize)]
struct MailContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: MailAddress<'a>,
    subject: &'a str,
    content: Vec<MailContent<'a>>,
}

impl HttpMailer {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        from_address: impl Into<String>,
        from_name: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            from_address: from_address.into(),
            from_name: from_name.into(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    #[instrument(skip(self, html_body), fields(recipients = to.len()))]
    async fn send_html(
        &self,
        to: &[String],
        subject: &str,
        html_body: &str,
    ) -> Result<(), ServiceError> {
        if to.is_empty() {
            return Ok(());
        }

        let request = SendRequest {
            personalizations: vec![Personalization {
                to: to
                    .iter()
                    .map(|email| MailAddress { email, name: None })
                    .collect(),
            }],
            from: MailAddress {
                email: &self.from_address,
                name: Some(&self.from_name),
            },
            subject,
            content: vec![MailContent {
                content_type: "text/html",
                value: html_body,
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/v3/mail/send",
                self.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::ExternalServiceError(format!("email: {e}")))?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "email: send failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
