pub mod entities;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::Value;

use crate::store::{EntityId, JsonDocument};

/// One violated rule. `field` is the stable machine-checkable path
/// ("title", "meals[1].recipeId"); `message` is the human-readable
/// sentence, which also names the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Declarative entity schema: a field-rule table plus cross-field date
/// ordering pairs. Validation is data-driven; no entity type gets its
/// own code path.
#[derive(Debug, Clone)]
pub struct Schema {
    pub fields: Vec<FieldSpec>,
    /// (earlier, later): the later field must hold a strictly greater
    /// date than the earlier one.
    pub ordered_dates: Vec<(&'static str, &'static str)>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    /// String with inclusive character-count bounds.
    Text { min: usize, max: usize },
    Email,
    /// Foreign-key-shaped string: 24-character hex identifier.
    Reference,
    Int { min: i64, max: i64 },
    Bool,
    /// ISO-8601 date or datetime; normalized to UTC RFC 3339.
    Date,
    /// Plain YYYY-MM-DD string, kept as-is.
    DayStamp,
    OneOf(&'static [&'static str]),
    /// Array of scalar items with length bounds.
    List {
        min: usize,
        max: usize,
        item: Box<FieldKind>,
    },
    /// Array of nested objects with a fixed shape.
    ObjectList {
        min: usize,
        max: usize,
        shape: Vec<FieldSpec>,
    },
}

impl Schema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            ordered_dates: Vec::new(),
        }
    }

    pub fn with_ordered_dates(mut self, earlier: &'static str, later: &'static str) -> Self {
        self.ordered_dates.push((earlier, later));
        self
    }

    /// Validate a request payload against this schema. Every field is
    /// evaluated and every violation collected; on success the returned
    /// value is the normalized payload, which callers must use instead
    /// of the raw input.
    pub fn validate(&self, payload: &Value) -> Result<JsonDocument, Vec<FieldError>> {
        let Some(object) = payload.as_object() else {
            return Err(vec![FieldError::new(
                "payload",
                "payload must be a JSON object",
            )]);
        };

        let mut errors = Vec::new();
        let mut value = JsonDocument::new();

        for key in object.keys() {
            if !self.fields.iter().any(|f| f.name == key) {
                errors.push(FieldError::new(key.clone(), format!("{key} is not allowed")));
            }
        }

        for spec in &self.fields {
            match object.get(spec.name) {
                None | Some(Value::Null) => {
                    if spec.required {
                        errors.push(rule_error(spec.name, "is required"));
                    }
                }
                Some(raw) => {
                    if let Some(normalized) = check_kind(spec.name, &spec.kind, raw, &mut errors) {
                        value.insert(spec.name.to_string(), normalized);
                    }
                }
            }
        }

        for (earlier, later) in &self.ordered_dates {
            if let (Some(start), Some(end)) = (date_field(&value, earlier), date_field(&value, later))
            {
                if end <= start {
                    errors.push(rule_error(later, &format!("must be after {earlier}")));
                }
            }
        }

        if errors.is_empty() {
            Ok(value)
        } else {
            Err(errors)
        }
    }
}

fn rule_error(path: &str, rule: &str) -> FieldError {
    FieldError::new(path, format!("{path} {rule}"))
}

fn check_kind(
    path: &str,
    kind: &FieldKind,
    raw: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    match kind {
        FieldKind::Text { min, max } => {
            let Some(s) = raw.as_str() else {
                errors.push(rule_error(path, "must be a string"));
                return None;
            };
            let len = s.chars().count();
            if len < *min {
                errors.push(rule_error(path, &format!("must be at least {min} characters")));
                None
            } else if len > *max {
                errors.push(rule_error(path, &format!("cannot exceed {max} characters")));
                None
            } else {
                Some(raw.clone())
            }
        }
        FieldKind::Email => {
            let valid = raw.as_str().is_some_and(is_email);
            if valid {
                Some(raw.clone())
            } else {
                errors.push(rule_error(path, "must be a valid email address"));
                None
            }
        }
        FieldKind::Reference => {
            let valid = raw.as_str().is_some_and(EntityId::is_valid);
            if valid {
                Some(raw.clone())
            } else {
                errors.push(rule_error(path, "must be a 24-character hex identifier"));
                None
            }
        }
        FieldKind::Int { min, max } => {
            // Whole-valued floats (20.0) count as integers, matching
            // source formats with no int/float split.
            let parsed = raw.as_i64().or_else(|| {
                raw.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                    .map(|f| f as i64)
            });
            let Some(n) = parsed else {
                errors.push(rule_error(path, "must be an integer"));
                return None;
            };
            if n < *min {
                errors.push(rule_error(path, &format!("must be at least {min}")));
                None
            } else if n > *max {
                errors.push(rule_error(path, &format!("cannot exceed {max}")));
                None
            } else {
                Some(Value::from(n))
            }
        }
        FieldKind::Bool => {
            if raw.is_boolean() {
                Some(raw.clone())
            } else {
                errors.push(rule_error(path, "must be a boolean"));
                None
            }
        }
        FieldKind::Date => match raw.as_str().and_then(parse_date) {
            Some(dt) => Some(Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true))),
            None => {
                errors.push(rule_error(path, "must be a valid ISO-8601 date"));
                None
            }
        },
        FieldKind::DayStamp => {
            let valid = raw.as_str().is_some_and(is_day_stamp);
            if valid {
                Some(raw.clone())
            } else {
                errors.push(rule_error(path, "must be a date in YYYY-MM-DD format"));
                None
            }
        }
        FieldKind::OneOf(allowed) => {
            let valid = raw.as_str().is_some_and(|s| allowed.contains(&s));
            if valid {
                Some(raw.clone())
            } else {
                errors.push(rule_error(path, &format!("must be one of {}", allowed.join(", "))));
                None
            }
        }
        FieldKind::List { min, max, item } => {
            let Some(items) = raw.as_array() else {
                errors.push(rule_error(path, "must be an array"));
                return None;
            };
            if !check_array_bounds(path, items.len(), *min, *max, errors) {
                return None;
            }
            let before = errors.len();
            let normalized: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| check_kind(&format!("{path}[{i}]"), item, v, errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(normalized))
        }
        FieldKind::ObjectList { min, max, shape } => {
            let Some(items) = raw.as_array() else {
                errors.push(rule_error(path, "must be an array"));
                return None;
            };
            if !check_array_bounds(path, items.len(), *min, *max, errors) {
                return None;
            }
            let before = errors.len();
            let normalized: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| check_shape(&format!("{path}[{i}]"), shape, v, errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(normalized))
        }
    }
}

fn check_shape(
    path: &str,
    shape: &[FieldSpec],
    raw: &Value,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let Some(object) = raw.as_object() else {
        errors.push(rule_error(path, "must be an object"));
        return None;
    };

    for key in object.keys() {
        if !shape.iter().any(|f| f.name == key) {
            let item_path = format!("{path}.{key}");
            errors.push(FieldError::new(item_path.clone(), format!("{item_path} is not allowed")));
        }
    }

    let mut out = serde_json::Map::new();
    for spec in shape {
        let item_path = format!("{path}.{}", spec.name);
        match object.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    errors.push(rule_error(&item_path, "is required"));
                }
            }
            Some(v) => {
                if let Some(normalized) = check_kind(&item_path, &spec.kind, v, errors) {
                    out.insert(spec.name.to_string(), normalized);
                }
            }
        }
    }
    Some(Value::Object(out))
}

fn check_array_bounds(
    path: &str,
    len: usize,
    min: usize,
    max: usize,
    errors: &mut Vec<FieldError>,
) -> bool {
    if len < min {
        errors.push(rule_error(path, &format!("must contain at least {min} item(s)")));
        false
    } else if len > max {
        errors.push(rule_error(path, &format!("cannot exceed {max} items")));
        false
    } else {
        true
    }
}

fn is_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_day_stamp(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN)))
}

fn date_field(value: &JsonDocument, name: &str) -> Option<DateTime<Utc>> {
    value.get(name).and_then(Value::as_str).and_then(parse_date)
}
