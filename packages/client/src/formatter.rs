//! Message formatting utilities for client display.

use tayori_shared::time::timestamp_to_rfc3339;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a message delivered to this client
    ///
    /// # Arguments
    ///
    /// * `from` - The user ID of the sender
    /// * `text` - The message text
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_delivered_message(from: &str, text: &str, received_at: i64) -> String {
        let timestamp_str = timestamp_to_rfc3339(received_at);
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             received at {}\n\
             ------------------------------------------------------------\n",
            from, text, timestamp_str
        )
    }

    /// Format a rejection sent back by the server
    pub fn format_rejection(code: &str, message: &str) -> String {
        format!("\n! {} ({})\n", message, code)
    }

    /// Format a confirmation message after sending
    pub fn format_sent_confirmation(recipient_id: &str, sent_at: i64) -> String {
        let timestamp_str = timestamp_to_rfc3339(sent_at);
        format!("sent to @{} at {}\n", recipient_id, timestamp_str)
    }

    /// Format the hint shown for lines that are not `@recipient text`
    pub fn format_usage() -> String {
        "usage: @recipient message\n".to_string()
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
