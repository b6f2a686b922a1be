//! Queue service client (order messages).
//!
//! Message text is sent as-is inside the `<MessageText>` element, XML-escaped
//! but not base64-encoded.

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use super::{Service, check, xml};
use crate::storage::StorageError;

/// Client for the Queue service of one account.
#[derive(Debug, Clone)]
pub struct QueueClient {
    pub(super) service: Service,
}

impl QueueClient {
    pub(super) const fn new(service: Service) -> Self {
        Self { service }
    }

    /// Create a queue. An existing queue is left untouched.
    pub async fn create_queue(&self, queue: &str) -> Result<(), StorageError> {
        let url = self.service.url(&[queue])?;
        let response = self
            .service
            .send(self.service.request(Method::PUT, url))
            .await?;
        match check(response, queue).await {
            Ok(_) | Err(StorageError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Put a message at the back of the queue.
    pub async fn send_message(&self, queue: &str, text: &str) -> Result<(), StorageError> {
        let url = self.service.url(&[queue, "messages"])?;
        let body = format!(
            "<QueueMessage><MessageText>{}</MessageText></QueueMessage>",
            xml::escape(text)
        );
        let response = self
            .service
            .send(
                self.service
                    .request(Method::POST, url)
                    .header(CONTENT_TYPE, "application/xml")
                    .body(body),
            )
            .await?;
        check(response, queue).await?;
        debug!(queue, "Message sent");
        Ok(())
    }

    /// Receive up to `count` messages.
    ///
    /// Received messages become invisible for the service's default
    /// visibility timeout and reappear afterwards; they are not deleted.
    pub async fn receive_messages(
        &self,
        queue: &str,
        count: u8,
    ) -> Result<Vec<String>, StorageError> {
        let mut url = self.service.url(&[queue, "messages"])?;
        url.set_query(Some(&format!("numofmessages={count}")));
        let response = self
            .service
            .send(self.service.request(Method::GET, url))
            .await?;
        let body = check(response, queue).await?.text().await?;
        let texts: Vec<String> = xml::elements(&body, "QueueMessage")
            .into_iter()
            .filter_map(|message| xml::element(message, "MessageText"))
            .map(xml::unescape)
            .collect();
        debug!(queue, count = texts.len(), "Messages received");
        Ok(texts)
    }
}
