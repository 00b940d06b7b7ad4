//! Prompt assembly

use super::types::HistoryEntry;
use crate::llm::Message;

/// Render the flat prompt sent to the provider
///
/// Sections, in order: system prompt, context, the last `max_history`
/// exchanges (oldest first), then the new query. Empty sections are left
/// out.
pub fn build_prompt(
    system_prompt: &str,
    context: Option<&str>,
    history: &[HistoryEntry],
    max_history: usize,
    query: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !system_prompt.is_empty() {
        parts.push(format!("System: {}\n", system_prompt));
    }

    if let Some(context) = context.filter(|c| !c.is_empty()) {
        parts.push(format!("Context: {}\n", context));
    }

    if !history.is_empty() {
        parts.push("Previous conversation:".to_string());
        let start = history.len().saturating_sub(max_history);
        for entry in &history[start..] {
            parts.extend(entry.messages().iter().map(Message::to_string));
        }
        parts.push(String::new());
    }

    parts.push(Message::user(query).to_string());
    parts.join("\n")
}
