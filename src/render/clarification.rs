//! Clarification prompts
//!
//! Renders a `ClarificationRequest` as lettered choices and maps a typed
//! reply back to one of the offered options, so a plain text surface can
//! carry the clarification round-trip.

use ops_desk_types::{ClarificationOption, ClarificationRequest};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarificationView {
    pub field: String,
    pub prompt: String,
    pub choices: Vec<ClarificationChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClarificationChoice {
    /// "A", "B", ... ; past "Z" the 1-based position
    pub key: String,
    pub label: String,
    pub option_id: String,
}

impl ClarificationView {
    /// Markdown rendering for chat-style surfaces
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![format!("**{}**", self.prompt), String::new()];
        for choice in &self.choices {
            lines.push(format!("**{}.** {}", choice.key, choice.label));
        }
        lines.push(String::new());
        lines.push("---".to_string());
        lines.push(format!(
            "Type a letter (A/B/C...) or a name to select, or **{}** to abort.",
            CANCEL_REPLY.to_uppercase()
        ));
        lines.join("\n")
    }
}

pub fn render_clarification(request: &ClarificationRequest) -> ClarificationView {
    let prompt = if request.message.trim().is_empty() {
        format!("Which {} did you mean?", request.field)
    } else {
        request.message.clone()
    };

    ClarificationView {
        field: request.field.clone(),
        prompt,
        choices: request
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| ClarificationChoice {
                key: choice_key(i),
                label: option.label.clone(),
                option_id: option.id.to_string(),
            })
            .collect(),
    }
}

/// Word that abandons the pending command from a text surface
pub const CANCEL_REPLY: &str = "cancel";

/// What a typed reply to a clarification asks for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClarificationReply<'a> {
    Select(&'a ClarificationOption),
    Cancel,
}

/// Interpret a typed reply.
///
/// Tried in order: a label that matches exactly one option
/// (case-insensitive), choice letter, 1-based number, option id, the cancel
/// word, then a unique label prefix. A label wins over a letter so options
/// labelled "A", "B", "C" in any order select by label.
pub fn parse_reply<'a>(
    request: &'a ClarificationRequest,
    reply: &str,
) -> Option<ClarificationReply<'a>> {
    let reply = reply.trim();
    if reply.is_empty() {
        return None;
    }
    let options = &request.options;
    let lowered = reply.to_lowercase();

    let mut exact = options.iter().filter(|o| o.label.to_lowercase() == lowered);
    if let (Some(only), None) = (exact.next(), exact.next()) {
        return Some(ClarificationReply::Select(only));
    }

    if let Some(option) = options
        .iter()
        .enumerate()
        .find(|(i, _)| choice_key(*i).eq_ignore_ascii_case(reply))
        .map(|(_, o)| o)
    {
        return Some(ClarificationReply::Select(option));
    }

    if let Ok(n) = reply.parse::<usize>() {
        if (1..=options.len()).contains(&n) {
            return options.get(n - 1).map(ClarificationReply::Select);
        }
    }

    if let Some(option) = options.iter().find(|o| o.id.to_string() == reply) {
        return Some(ClarificationReply::Select(option));
    }

    if reply.eq_ignore_ascii_case(CANCEL_REPLY) {
        return Some(ClarificationReply::Cancel);
    }

    let mut prefixed = options
        .iter()
        .filter(|o| o.label.to_lowercase().starts_with(&lowered));
    match (prefixed.next(), prefixed.next()) {
        (Some(only), None) => Some(ClarificationReply::Select(only)),
        _ => None,
    }
}

/// Match a typed reply to an offered option; `None` for the cancel word.
pub fn resolve_reply<'a>(
    request: &'a ClarificationRequest,
    reply: &str,
) -> Option<&'a ClarificationOption> {
    match parse_reply(request, reply)? {
        ClarificationReply::Select(option) => Some(option),
        ClarificationReply::Cancel => None,
    }
}

fn choice_key(index: usize) -> String {
    if index < 26 {
        ((b'A' + index as u8) as char).to_string()
    } else {
        (index + 1).to_string()
    }
}
