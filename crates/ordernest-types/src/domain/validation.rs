use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{ValidationError, ValidationErrors};

/// Per-field validation messages, keyed by the JSON field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("validation failed");
        }
        f.write_str("validation failed: ")?;
        for (i, (field, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            let field: &str = &field;
            for err in field_errors {
                out.add(field, message_for(field, err));
            }
        }
        out
    }
}

fn readable(field: &str) -> String {
    field.replace('_', " ")
}

fn message_for(field: &str, err: &ValidationError) -> String {
    let name = readable(field);
    match rule_of(err) {
        "required" => format!("The {name} field is required."),
        "eq" => format!("Wrong {name} selected."),
        "min" => format!("The {name} value is too small."),
        "max" => format!("The {name} value is too large."),
        "phone" => format!("The {name} format is invalid."),
        _ => format!("Field {name} failed validation."),
    }
}

// `range` reports both bounds under one code; the offending side is
// recovered from the rejected value.
fn rule_of(err: &ValidationError) -> &str {
    if err.code != "range" {
        return err.code.as_ref();
    }
    let param = |name: &str| err.params.get(name).and_then(Value::as_f64);
    let Some(value) = param("value") else {
        return "range";
    };
    let below_min = param("min").is_some_and(|min| value < min);
    let at_or_below_floor = param("exclusive_min").is_some_and(|floor| value <= floor);
    if below_min || at_or_below_floor {
        "min"
    } else {
        "max"
    }
}
