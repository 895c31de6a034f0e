//! Parsing of user input lines.

/// One line typed by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    /// `@recipient text`
    Send { recipient_id: String, text: String },
    /// Anything else; the caller prints a usage hint
    Invalid,
}

/// Parse `@recipient text` into a send command.
///
/// 本文の前後の空白は取り除く。宛先のみ（本文なし）は空のメッセージとして送る。
pub fn parse_input(line: &str) -> InputCommand {
    let Some(rest) = line.trim().strip_prefix('@') else {
        return InputCommand::Invalid;
    };

    let (recipient_id, text) = match rest.split_once(char::is_whitespace) {
        Some((recipient_id, text)) => (recipient_id, text.trim()),
        None => (rest, ""),
    };

    if recipient_id.is_empty() {
        return InputCommand::Invalid;
    }

    InputCommand::Send {
        recipient_id: recipient_id.to_string(),
        text: text.to_string(),
    }
}
