use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Mail relay rejected message: {0}")]
    Rejected(String),
}

/// Kinds of transactional mail the service sends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    MatchProposal,
    MatchAccepted,
    MatchRejected,
    MatchDelivered,
    RequestReceived,
    RequestStatus,
    VerificationDecision,
}

/// Values substituted into a template
#[derive(Debug, Clone, Default)]
pub struct EmailContext {
    pub recipient_name: String,
    pub subject_line: String,
    pub counterpart_name: String,
    pub message: String,
    pub status: String,
    pub link: String,
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    fn subject(&self, ctx: &EmailContext) -> String {
        match self {
            EmailTemplate::MatchProposal => format!("New Donation Offer: {}", ctx.subject_line),
            EmailTemplate::MatchAccepted => format!("Donation Accepted: {}", ctx.subject_line),
            EmailTemplate::MatchRejected => format!("Donation Declined: {}", ctx.subject_line),
            EmailTemplate::MatchDelivered => format!("Donation Delivered: {}", ctx.subject_line),
            EmailTemplate::RequestReceived => format!("New Donation Request: {}", ctx.subject_line),
            EmailTemplate::RequestStatus => match ctx.status.as_str() {
                "accepted" => format!("Donation Request Accepted: {}", ctx.subject_line),
                "rejected" => format!("Donation Request Declined: {}", ctx.subject_line),
                "completed" => format!("Donation Completed: {}", ctx.subject_line),
                _ => format!("Donation Request Updated: {}", ctx.subject_line),
            },
            EmailTemplate::VerificationDecision => {
                format!("Verification Update: {}", ctx.subject_line)
            }
        }
    }

    fn lead(&self, ctx: &EmailContext) -> String {
        match self {
            EmailTemplate::MatchProposal => format!(
                "{} would like to donate \"{}\" to your organization.",
                ctx.counterpart_name, ctx.subject_line
            ),
            EmailTemplate::MatchAccepted => format!(
                "{} accepted your donation \"{}\".",
                ctx.counterpart_name, ctx.subject_line
            ),
            EmailTemplate::MatchRejected => format!(
                "{} declined your donation \"{}\".",
                ctx.counterpart_name, ctx.subject_line
            ),
            EmailTemplate::MatchDelivered => format!(
                "{} marked \"{}\" as delivered.",
                ctx.counterpart_name, ctx.subject_line
            ),
            EmailTemplate::RequestReceived => format!(
                "{} requested your donation \"{}\".",
                ctx.counterpart_name, ctx.subject_line
            ),
            EmailTemplate::RequestStatus => format!(
                "Your request for \"{}\" is now {}.",
                ctx.subject_line, ctx.status
            ),
            EmailTemplate::VerificationDecision => format!(
                "Your {} request is now {}.",
                ctx.subject_line, ctx.status
            ),
        }
    }

    /// Render subject and plain-text body for one recipient
    pub fn render(&self, to: &str, ctx: &EmailContext, site_name: &str, site_url: &str) -> OutgoingEmail {
        let greeting = if ctx.recipient_name.is_empty() {
            "there"
        } else {
            ctx.recipient_name.as_str()
        };
        let mut body = format!("Hello {},\n\n{}\n", greeting, self.lead(ctx));

        if !ctx.message.is_empty() {
            body.push_str(&format!("\nMessage: {}\n", ctx.message));
        }
        if !ctx.link.is_empty() {
            body.push_str(&format!(
                "\nView details: {}{}\n",
                site_url.trim_end_matches('/'),
                ctx.link
            ));
        }
        body.push_str(&format!("\n{}\n", site_name));

        OutgoingEmail {
            to: to.to_string(),
            subject: self.subject(ctx),
            body,
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError>;
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    reply_to: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Delivers mail by POSTing JSON to an HTTP mail relay
pub struct HttpMailer {
    relay_url: String,
    api_key: Option<String>,
    from_address: String,
    reply_to: String,
    client: Client,
}

impl HttpMailer {
    pub fn new(
        relay_url: String,
        api_key: Option<String>,
        from_address: String,
        reply_to: String,
        timeout: Duration,
    ) -> Result<Self, MailerError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            relay_url,
            api_key,
            from_address,
            reply_to,
            client,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        let payload = RelayMessage {
            from: &self.from_address,
            reply_to: &self.reply_to,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let mut request = self.client.post(&self.relay_url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(MailerError::Rejected(format!(
                "relay returned {}",
                response.status()
            )));
        }

        tracing::debug!("Email '{}' sent to {}", email.subject, email.to);
        Ok(())
    }
}

/// Writes mail to the log instead of delivering it
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailerError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Email (log only)");
        Ok(())
    }
}
