//! Change events produced by one detection cycle.

use crate::models::{Availability, CatalogEntry, CoinDetails, MessageTemplates};

/// A classified difference between the fetched catalog and the known state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Key never seen before
    NewItem(CatalogEntry),

    /// Key seen before with a different availability
    StatusChanged {
        entry: CatalogEntry,
        previous: Availability,
    },
}

impl ChangeEvent {
    pub fn entry(&self) -> &CatalogEntry {
        match self {
            ChangeEvent::NewItem(entry) => entry,
            ChangeEvent::StatusChanged { entry, .. } => entry,
        }
    }

    pub fn is_new_item(&self) -> bool {
        matches!(self, ChangeEvent::NewItem(_))
    }

    /// Render the event as an HTML message using the given templates.
    ///
    /// Supported placeholders:
    /// - `{name}`, `{price}`, `{link}`, `{status}`, `{previous}`
    ///
    /// Non-empty detail fields are appended one per line.
    pub fn render(&self, templates: &MessageTemplates, details: Option<&CoinDetails>) -> String {
        let (template, previous) = match self {
            ChangeEvent::NewItem(_) => (&templates.new_item, ""),
            ChangeEvent::StatusChanged { previous, .. } => {
                (&templates.status_changed, previous.label())
            }
        };
        let entry = self.entry();

        let name = escape_html(&entry.display_name);
        let price = escape_html(&entry.price);
        let link = escape_html(&entry.detail_link);
        let mut message = fill_template(template, |placeholder| match placeholder {
            "name" => Some(name.as_str()),
            "price" => Some(price.as_str()),
            "link" => Some(link.as_str()),
            "status" => Some(entry.availability.label()),
            "previous" => Some(previous),
            _ => None,
        });

        if let Some(details) = details {
            for (label, value) in details.fields() {
                message.push('\n');
                message.push_str(label);
                message.push_str(": ");
                message.push_str(&escape_html(value));
            }
        }
        message
    }
}

/// Replace `{placeholder}` occurrences in one pass over `template`.
///
/// Substituted values are never rescanned. Unknown placeholders and
/// unmatched braces are kept verbatim.
fn fill_template<'a>(template: &str, value_of: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| {
            value_of(&after[..close]).map(|value| (value, close))
        }) {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
