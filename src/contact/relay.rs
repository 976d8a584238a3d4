//! Email relay used to deliver contact form submissions.

use crate::config::{join_url, ContactConfig};
use futures::future::BoxFuture;
use serde::Serialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("email relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email relay rejected the message: HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("contact form relay is not configured")]
    NotConfigured,
}

/// The fixed set of fields the email template receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub to_email: String,
    pub from_name: String,
    pub from_email: String,
    pub phone: String,
    pub level: String,
    pub interest: String,
    pub message: String,
    pub newsletter: String,
}

pub trait EmailRelay: Send + Sync {
    fn send<'a>(&'a self, params: &'a TemplateParams) -> BoxFuture<'a, Result<(), RelayError>>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a TemplateParams,
}

/// EmailJS REST client.
#[derive(Debug, Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    api_url: String,
    public_key: String,
    service_id: String,
    template_id: String,
}

impl EmailJsClient {
    pub fn new(client: reqwest::Client, config: &ContactConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            public_key: config.public_key.clone(),
            service_id: config.service_id.clone(),
            template_id: config.template_id.clone(),
        }
    }

    pub fn endpoint(&self) -> String {
        join_url(&self.api_url, "api/v1.0/email/send")
    }

    async fn post(&self, params: &TemplateParams) -> Result<(), RelayError> {
        let request = SendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.public_key,
            template_params: params,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!("Email sent successfully from {}", params.from_email);
        Ok(())
    }
}

impl EmailRelay for EmailJsClient {
    fn send<'a>(&'a self, params: &'a TemplateParams) -> BoxFuture<'a, Result<(), RelayError>> {
        Box::pin(self.post(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn params() -> TemplateParams {
        TemplateParams {
            to_email: "office@example.com".to_string(),
            from_name: "Ana".to_string(),
            from_email: "ana@example.com".to_string(),
            phone: "Not provided".to_string(),
            level: "beginner".to_string(),
            interest: "Not specified".to_string(),
            message: "Hola".to_string(),
            newsletter: "Yes".to_string(),
        }
    }

    fn client_for(server: &MockServer) -> EmailJsClient {
        EmailJsClient::new(
            reqwest::Client::new(),
            &ContactConfig {
                api_url: server.uri(),
                public_key: "public-key".to_string(),
                service_id: "service_1".to_string(),
                template_id: "template_1".to_string(),
                to_email: "office@example.com".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_send_posts_emailjs_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1.0/email/send"))
            .and(body_json(serde_json::json!({
                "service_id": "service_1",
                "template_id": "template_1",
                "user_id": "public-key",
                "template_params": {
                    "to_email": "office@example.com",
                    "from_name": "Ana",
                    "from_email": "ana@example.com",
                    "phone": "Not provided",
                    "level": "beginner",
                    "interest": "Not specified",
                    "message": "Hola",
                    "newsletter": "Yes"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&mock_server)
            .await;

        client_for(&mock_server).send(&params()).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_carries_status_and_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("The template ID is invalid"))
            .expect(1)
            .mount(&mock_server)
            .await;

        match client_for(&mock_server).send(&params()).await {
            Err(RelayError::Rejected { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "The template ID is invalid");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let client = EmailJsClient::new(
            reqwest::Client::new(),
            &ContactConfig {
                api_url: "https://api.emailjs.com/".to_string(),
                public_key: String::new(),
                service_id: String::new(),
                template_id: String::new(),
                to_email: String::new(),
            },
        );
        assert_eq!(client.endpoint(), "https://api.emailjs.com/api/v1.0/email/send");
    }
}
