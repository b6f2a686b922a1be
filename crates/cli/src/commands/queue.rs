//! Order queue inspection.

use abc_retailers_admin::storage::{RetailStorage, clamp_receive_count};

/// Receive up to `count` order messages and print each as a JSON line.
///
/// # Errors
///
/// Returns an error if the queue cannot be read.
#[allow(clippy::print_stdout)]
pub async fn receive(
    storage: &dyn RetailStorage,
    count: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = clamp_receive_count(count);
    let messages = storage.receive_order_messages(count).await?;
    tracing::info!(requested = count, received = messages.len(), "Received order messages");

    for message in &messages {
        println!("{}", serde_json::to_string(message)?);
    }
    Ok(())
}
