use anyhow::Context;
use quick_xml::escape::escape;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};

pub const PHONE_NOT_PROVIDED: &str = "No proporcionado";

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
}

fn required(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ContactRequest {
    /// `None` when any of `name`, `email` or `message` is missing or blank.
    pub fn validate(&self) -> Option<ContactForm> {
        Some(ContactForm {
            name: required(&self.name)?,
            email: required(&self.email)?,
            phone: required(&self.phone),
            message: required(&self.message)?,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl ContactMessage {
    pub fn new(form: &ContactForm, recipient: &str) -> Self {
        let phone = form.phone.as_deref().unwrap_or(PHONE_NOT_PROVIDED);
        let html = format!(
            "<h2>Nuevo mensaje de contacto</h2>\
             <p><strong>Nombre:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Teléfono:</strong> {}</p>\
             <p><strong>Mensaje:</strong></p>\
             <p>{}</p>",
            escape(form.name.as_str()),
            escape(form.email.as_str()),
            escape(phone),
            escape(form.message.as_str()),
        );
        let text = format!(
            "Nombre: {}\nEmail: {}\nTeléfono: {}\n\n{}",
            form.name, form.email, phone, form.message
        );
        Self {
            to: recipient.to_string(),
            reply_to: form.email.clone(),
            subject: format!("Nuevo mensaje de contacto de {}", form.name),
            html,
            text,
        }
    }
}

pub enum ContactMailer {
    Webhook {
        client: ClientWithMiddleware,
        url: String,
    },
    Log,
}

impl ContactMailer {
    pub fn new(client: ClientWithMiddleware, webhook_url: Option<String>) -> Self {
        match webhook_url {
            Some(url) => Self::Webhook { client, url },
            None => {
                log::warn!("CONTACT_WEBHOOK_URL is not set, contact messages will only be logged");
                Self::Log
            }
        }
    }

    pub async fn send(&self, message: &ContactMessage) -> Result<(), anyhow::Error> {
        match self {
            Self::Webhook { client, url } => {
                let body = serde_json::to_vec(message)?;
                client
                    .post(url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body)
                    .send()
                    .await
                    .context("Unable to reach contact webhook")?
                    .error_for_status()
                    .context("Contact webhook rejected the message")?;
                log::info!("Contact message from {} delivered", message.reply_to);
            }
            Self::Log => {
                log::info!(
                    "Contact message to {}: {}\n{}",
                    message.to,
                    message.subject,
                    message.text
                );
            }
        }
        Ok(())
    }
}
