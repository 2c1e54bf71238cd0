//! Human-readable summaries of applied changes.

use serde_json::{Map, Value};

/// Flattened `path: value` view of a change tree, for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSummary {
    entries: Vec<(String, Value)>,
}

impl ChangeSummary {
    /// Flatten a nested change tree (or an already-flat `path -> value` map).
    ///
    /// Objects are walked; every non-object value, and every empty object,
    /// becomes one entry.
    pub fn from_changes(changes: &Map<String, Value>) -> Self {
        let mut entries = Vec::new();
        flatten_into(&mut entries, "", changes);
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain-text bullet list with a pluralized count header.
    pub fn to_text(&self) -> String {
        if self.entries.is_empty() {
            return "No state changes.".to_string();
        }

        let mut out = header(self.entries.len());
        for (path, value) in &self.entries {
            out.push_str("\n- ");
            out.push_str(path);
            out.push_str(": ");
            out.push_str(&render_value(value));
        }
        out
    }

    /// HTML list equivalent of [`ChangeSummary::to_text`].
    pub fn to_html(&self) -> String {
        if self.entries.is_empty() {
            return "<p>No state changes.</p>".to_string();
        }

        let items: String = self
            .entries
            .iter()
            .map(|(path, value)| {
                format!(
                    "<li><code>{}: {}</code></li>",
                    escape_html(path),
                    escape_html(&render_value(value))
                )
            })
            .collect();
        format!("<p>{}</p><ul>{}</ul>", header(self.entries.len()), items)
    }
}

/// Render a change tree as a plain-text bullet list.
pub fn format_changes(changes: &Map<String, Value>) -> String {
    ChangeSummary::from_changes(changes).to_text()
}

/// Render a change tree as an HTML list.
pub fn format_changes_html(changes: &Map<String, Value>) -> String {
    ChangeSummary::from_changes(changes).to_html()
}

fn flatten_into(entries: &mut Vec<(String, Value)>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(entries, &path, inner),
            other => entries.push((path, other.clone())),
        }
    }
}

fn header(count: usize) -> String {
    if count == 1 {
        "Applied 1 state change:".to_string()
    } else {
        format!("Applied {count} state changes:")
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
