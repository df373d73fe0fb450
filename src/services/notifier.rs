use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::NewNotification;
use crate::services::mailer::{EmailContext, EmailTemplate, Mailer};
use crate::services::store::ProfileStore;

/// Email leg of a notice
#[derive(Debug, Clone)]
pub struct EmailNotice {
    pub to: String,
    pub template: EmailTemplate,
    pub context: EmailContext,
}

/// One message for one user: an in-app notification plus optional email
#[derive(Debug, Clone)]
pub struct Notice {
    pub user_id: Uuid,
    pub message: String,
    pub link: String,
    pub email: Option<EmailNotice>,
}

impl Notice {
    pub fn new(user_id: Uuid, message: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            user_id,
            message: message.into(),
            link: link.into(),
            email: None,
        }
    }

    /// Attach an email when the recipient has an address on file
    pub fn with_email(
        mut self,
        to: Option<&str>,
        template: EmailTemplate,
        context: EmailContext,
    ) -> Self {
        self.email = to.filter(|addr| !addr.is_empty()).map(|addr| EmailNotice {
            to: addr.to_string(),
            template,
            context,
        });
        self
    }
}

/// Best-effort, non-blocking delivery of notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Site identity used in rendered mail
#[derive(Debug, Clone)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
}

/// Queues notices onto a background worker
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    /// Start the delivery worker on the current tokio runtime.
    ///
    /// The worker exits once every sender has been dropped.
    pub fn spawn(
        store: Arc<dyn ProfileStore>,
        mailer: Arc<dyn Mailer>,
        site: SiteInfo,
    ) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Notice>();

        let handle = tokio::spawn(async move {
            while let Some(notice) = receiver.recv().await {
                deliver(store.as_ref(), mailer.as_ref(), &site, notice).await;
            }
            tracing::debug!("Notification worker stopped");
        });

        (Self { sender }, handle)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        if let Err(e) = self.sender.send(notice) {
            tracing::warn!(
                "Notification worker is gone, dropping notice for {}",
                e.0.user_id
            );
        }
    }
}

async fn deliver(store: &dyn ProfileStore, mailer: &dyn Mailer, site: &SiteInfo, notice: Notice) {
    let record = NewNotification {
        user_id: notice.user_id,
        message: notice.message,
        link: notice.link,
    };

    if let Err(e) = store.insert_notification(record).await {
        tracing::warn!("Failed to store notification for {}: {}", notice.user_id, e);
    }

    if let Some(email) = notice.email {
        let outgoing = email
            .template
            .render(&email.to, &email.context, &site.name, &site.url);

        if let Err(e) = mailer.send(&outgoing).await {
            tracing::warn!("Failed to send '{}' to {}: {}", outgoing.subject, outgoing.to, e);
        }
    }
}
