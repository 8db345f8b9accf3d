//! Contact form fields: validation rules and inline error rendering.

use std::sync::LazyLock;

use regex::Regex;
use shared::domain::{FieldName, FormSnapshot, Validity};

use crate::dom::{Document, NodeId};

pub const FORM_ID: &str = "contact-form";
pub const FORM_ERROR_CLASS: &str = "form-error";
const SHOW_CLASS: &str = "show";
const ERROR_BORDER: &str = "var(--color-error)";

pub const NAME_MIN_CHARS: usize = 2;
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 1000;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z .-]+$").expect("name pattern compiles"));
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// Validates one field value. Surrounding whitespace is ignored.
pub fn validate(field: FieldName, raw: &str) -> Validity {
    let value = raw.trim();
    let chars = value.chars().count();
    match field {
        FieldName::Name => {
            if value.is_empty() {
                Validity::invalid("Name is required")
            } else if chars < NAME_MIN_CHARS {
                Validity::invalid("Name must be at least 2 characters")
            } else if !NAME_PATTERN.is_match(value) {
                Validity::invalid("Name can only contain letters, spaces, dots, and hyphens")
            } else {
                Validity::Valid
            }
        }
        FieldName::Email => {
            if value.is_empty() {
                Validity::invalid("Email is required")
            } else if !is_valid_email(value) {
                Validity::invalid("Please enter a valid email address")
            } else {
                Validity::Valid
            }
        }
        FieldName::Subject => {
            if value.is_empty() {
                Validity::invalid("Please select a subject")
            } else {
                Validity::Valid
            }
        }
        FieldName::Message => {
            if value.is_empty() {
                Validity::invalid("Message is required")
            } else if chars < MESSAGE_MIN_CHARS {
                Validity::invalid("Message must be at least 10 characters")
            } else if chars > MESSAGE_MAX_CHARS {
                Validity::invalid("Message must be less than 1000 characters")
            } else {
                Validity::Valid
            }
        }
    }
}

pub fn form_node(doc: &Document) -> Option<NodeId> {
    doc.get_element_by_id(FORM_ID)
}

/// The form control carrying `name="{field}"`.
pub fn field_node(doc: &Document, field: FieldName) -> Option<NodeId> {
    let form = form_node(doc)?;
    doc.query_within(form, |element| {
        element.attribute("name") == Some(field.as_str())
    })
    .into_iter()
    .next()
}

pub fn submit_button(doc: &Document) -> Option<NodeId> {
    let form = form_node(doc)?;
    doc.query_within(form, |element| {
        element.tag == "button" && element.attribute("type") == Some("submit")
    })
    .into_iter()
    .next()
}

pub fn read_field(doc: &Document, field: FieldName) -> Option<String> {
    field_node(doc, field).and_then(|node| doc.value(node).map(str::to_string))
}

/// Current values of every field present in the form.
pub fn live_fields(doc: &Document) -> Vec<(FieldName, String)> {
    FieldName::ALL
        .into_iter()
        .filter_map(|field| read_field(doc, field).map(|value| (field, value)))
        .collect()
}

pub fn snapshot(doc: &Document) -> FormSnapshot {
    let mut snapshot = FormSnapshot::default();
    for (field, value) in live_fields(doc) {
        snapshot.set(field, value);
    }
    snapshot
}

pub fn show_field_error(doc: &mut Document, field: FieldName, message: &str) {
    let Some(slot) = doc.get_element_by_id(&field.error_slot_id()) else {
        return;
    };
    doc.set_text(slot, message);
    doc.add_class(slot, SHOW_CLASS);
    doc.set_style(slot, "display", "block");
    if let Some(input) = field_node(doc, field) {
        doc.set_style(input, "border-color", ERROR_BORDER);
    }
}

pub fn clear_field_error(doc: &mut Document, field: FieldName) {
    if let Some(slot) = doc.get_element_by_id(&field.error_slot_id()) {
        doc.set_text(slot, "");
        doc.remove_class(slot, SHOW_CLASS);
        doc.set_style(slot, "display", "none");
    }
    if let Some(input) = field_node(doc, field) {
        doc.set_style(input, "border-color", "");
    }
}

pub fn clear_all_errors(doc: &mut Document) {
    for slot in doc.query_class(FORM_ERROR_CLASS) {
        doc.set_text(slot, "");
        doc.remove_class(slot, SHOW_CLASS);
        doc.set_style(slot, "display", "none");
    }
    for field in FieldName::ALL {
        if let Some(input) = field_node(doc, field) {
            doc.set_style(input, "border-color", "");
        }
    }
}

/// Validates a field on blur and renders the outcome.
pub fn on_blur(doc: &mut Document, field: FieldName) -> Validity {
    let value = read_field(doc, field).unwrap_or_default();
    let validity = validate(field, &value);
    match validity.message() {
        Some(message) => show_field_error(doc, field, message),
        None => clear_field_error(doc, field),
    }
    validity
}

/// Typing into a field (or changing the subject select) clears its error
/// without re-validating.
pub fn on_input(doc: &mut Document, field: FieldName, value: &str) {
    if let Some(node) = field_node(doc, field) {
        doc.set_value(node, value);
    }
    clear_field_error(doc, field);
}

/// Validates every field and renders the errors. Returns the invalid fields.
pub fn revalidate_all(doc: &mut Document) -> Vec<FieldName> {
    FieldName::ALL
        .into_iter()
        .filter(|field| !on_blur(doc, *field).is_valid())
        .collect()
}

/// Empties every field, like `HTMLFormElement.reset` on a blank form.
pub fn reset(doc: &mut Document) {
    for field in FieldName::ALL {
        if let Some(node) = field_node(doc, field) {
            doc.set_value(node, "");
        }
    }
}
