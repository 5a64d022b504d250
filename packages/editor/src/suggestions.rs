//! Typed normalization of content-parser guesses.
//!
//! Parser output is never trusted verbatim. Each known field becomes a
//! [`FieldSuggestion`] variant whose [`normalize`](FieldSuggestion::normalize)
//! either yields a clean [`FieldValue`] or nothing. Merging only writes values
//! that survived normalization, so an empty or unparseable guess can never
//! clobber what the operator typed.

use crate::collaborators::ParsedField;
use crate::draft::{DraftRecord, FieldValue, RecordKind};

/// A parser guess for one known field, still in raw text form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSuggestion {
    Title(String),
    Description(String),
    Body(String),
    Tags(String),
    Price(String),
    Area(String),
    Rooms(String),
    Bathrooms(String),
    PropertyType(String),
    SaleType(String),
    City(String),
    District(String),
    Neighborhood(String),
}

impl FieldSuggestion {
    /// Map a parser key onto a variant; unknown keys are ignored
    pub fn from_raw(field: &str, value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let key: String = field
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_ascii_lowercase();

        let suggestion = match key.as_str() {
            "title" | "name" | "headline" => FieldSuggestion::Title(value),
            "description" | "summary" => FieldSuggestion::Description(value),
            "body" | "content" => FieldSuggestion::Body(value),
            "tags" | "keywords" => FieldSuggestion::Tags(value),
            "price" => FieldSuggestion::Price(value),
            "area" | "size" | "squaremeters" | "sqm" => FieldSuggestion::Area(value),
            "rooms" | "bedrooms" => FieldSuggestion::Rooms(value),
            "bathrooms" | "baths" => FieldSuggestion::Bathrooms(value),
            "propertytype" | "type" => FieldSuggestion::PropertyType(value),
            "saletype" | "listingtype" | "offer" => FieldSuggestion::SaleType(value),
            "city" => FieldSuggestion::City(value),
            "district" => FieldSuggestion::District(value),
            "neighborhood" | "neighbourhood" => FieldSuggestion::Neighborhood(value),
            _ => return None,
        };
        Some(suggestion)
    }

    /// Draft field this suggestion writes to
    pub fn field(&self) -> &'static str {
        match self {
            FieldSuggestion::Title(_) => "title",
            FieldSuggestion::Description(_) => "description",
            FieldSuggestion::Body(_) => "body",
            FieldSuggestion::Tags(_) => "tags",
            FieldSuggestion::Price(_) => "price",
            FieldSuggestion::Area(_) => "area",
            FieldSuggestion::Rooms(_) => "rooms",
            FieldSuggestion::Bathrooms(_) => "bathrooms",
            FieldSuggestion::PropertyType(_) => "property_type",
            FieldSuggestion::SaleType(_) => "sale_type",
            FieldSuggestion::City(_) => "city",
            FieldSuggestion::District(_) => "district",
            FieldSuggestion::Neighborhood(_) => "neighborhood",
        }
    }

    /// Whether records of `kind` have this field at all
    pub fn applies_to(&self, kind: RecordKind) -> bool {
        match self {
            FieldSuggestion::Title(_) | FieldSuggestion::Description(_) | FieldSuggestion::Tags(_) => {
                true
            }
            FieldSuggestion::Body(_) => kind == RecordKind::Article,
            FieldSuggestion::City(_)
            | FieldSuggestion::District(_)
            | FieldSuggestion::Neighborhood(_) => kind != RecordKind::Article,
            FieldSuggestion::Price(_)
            | FieldSuggestion::Area(_)
            | FieldSuggestion::Rooms(_)
            | FieldSuggestion::Bathrooms(_)
            | FieldSuggestion::PropertyType(_)
            | FieldSuggestion::SaleType(_) => kind == RecordKind::Property,
        }
    }

    /// Clean value, or `None` when the guess is empty or unparseable
    pub fn normalize(&self) -> Option<FieldValue> {
        match self {
            FieldSuggestion::Title(raw)
            | FieldSuggestion::Description(raw)
            | FieldSuggestion::Body(raw)
            | FieldSuggestion::City(raw)
            | FieldSuggestion::District(raw)
            | FieldSuggestion::Neighborhood(raw) => {
                let text = collapse_whitespace(raw);
                (!text.is_empty()).then(|| FieldValue::Text(text))
            }
            FieldSuggestion::Tags(raw) => {
                let mut tags: Vec<String> = Vec::new();
                for tag in raw.split([',', ';', '\n']) {
                    let tag = collapse_whitespace(tag).to_lowercase();
                    if !tag.is_empty() && !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                (!tags.is_empty()).then(|| FieldValue::Tags(tags))
            }
            FieldSuggestion::Price(raw) | FieldSuggestion::Area(raw) => {
                let n = parse_locale_number(raw)?;
                if n <= 0.0 {
                    return None;
                }
                Some(number_value(n))
            }
            FieldSuggestion::Rooms(raw) | FieldSuggestion::Bathrooms(raw) => {
                leading_integer(raw).map(FieldValue::Integer)
            }
            FieldSuggestion::PropertyType(raw) => {
                property_type_alias(raw).map(FieldValue::text)
            }
            FieldSuggestion::SaleType(raw) => sale_type_alias(raw).map(FieldValue::text),
        }
    }
}

/// Turn parser output into typed suggestions, dropping unknown keys
pub fn from_parsed(fields: Vec<ParsedField>) -> Vec<FieldSuggestion> {
    fields
        .into_iter()
        .filter_map(|parsed| {
            let suggestion = FieldSuggestion::from_raw(&parsed.field, parsed.value);
            if suggestion.is_none() {
                tracing::debug!(field = %parsed.field, "ignoring unknown suggestion");
            }
            suggestion
        })
        .collect()
}

/// Write every normalizable suggestion into the draft.
///
/// Returns the fields that were written. Later suggestions for the same
/// field win.
pub fn apply(draft: &mut DraftRecord, suggestions: &[FieldSuggestion]) -> Vec<&'static str> {
    let mut applied: Vec<&'static str> = Vec::new();
    for suggestion in suggestions {
        if !suggestion.applies_to(draft.kind) {
            continue;
        }
        match suggestion.normalize() {
            Some(value) => {
                draft.set_field(suggestion.field(), value);
                if !applied.contains(&suggestion.field()) {
                    applied.push(suggestion.field());
                }
            }
            None => tracing::debug!(field = suggestion.field(), "suggestion did not normalize"),
        }
    }
    applied
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn alias_key(raw: &str) -> String {
    collapse_whitespace(&raw.replace(['-', '_'], " ")).to_lowercase()
}

fn property_type_alias(raw: &str) -> Option<&'static str> {
    let canonical = match alias_key(raw).as_str() {
        "apartment" | "flat" | "apt" | "condo" | "condominium" | "residence" | "daire" => {
            "apartment"
        }
        "villa" | "mansion" => "villa",
        "house" | "home" | "detached" | "detached house" | "townhouse" | "cottage" => "house",
        "land" | "plot" | "lot" | "field" | "arsa" => "land",
        "office" | "commercial" | "shop" | "store" | "retail" => "office",
        _ => return None,
    };
    Some(canonical)
}

fn sale_type_alias(raw: &str) -> Option<&'static str> {
    let canonical = match alias_key(raw).as_str() {
        "sale" | "sell" | "selling" | "for sale" | "buy" | "satilik" => "sale",
        "rent" | "rental" | "lease" | "for rent" | "to let" | "let" | "kiralik" => "rent",
        _ => return None,
    };
    Some(canonical)
}

fn number_value(n: f64) -> FieldValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        FieldValue::Integer(n as i64)
    } else {
        FieldValue::Number(n)
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let digits: String = raw
        .trim_start()
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse a number written with any common grouping convention:
/// `1.250.000,50`, `1,250,000.50`, `1 250 000`, `2,5`, `€ 1.200`.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    // First numeric run only, so units like "m2" do not leak digits
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let negative = raw[..start].trim_end().ends_with('-');
    let body: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '\'') || c.is_whitespace())
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    let body = body.trim_end_matches(['.', ',']);

    let dots = body.matches('.').count();
    let commas = body.matches(',').count();

    let decimal = match (dots, commas) {
        (0, 0) => None,
        // Both present: whichever comes last is the decimal separator
        (d, c) if d > 0 && c > 0 => {
            let last_dot = body.rfind('.');
            let last_comma = body.rfind(',');
            if last_dot > last_comma {
                Some('.')
            } else {
                Some(',')
            }
        }
        // One separator kind repeated: grouping only
        (d, c) if d > 1 || c > 1 => None,
        _ => {
            let sep = if dots == 1 { '.' } else { ',' };
            let tail = body.rsplit(sep).next().unwrap_or_default();
            // A single separator followed by exactly three digits is grouping
            if tail.len() == 3 {
                None
            } else {
                Some(sep)
            }
        }
    };

    let mut normalized = String::with_capacity(body.len() + 1);
    if negative {
        normalized.push('-');
    }
    for c in body.chars() {
        match c {
            '0'..='9' => normalized.push(c),
            c if Some(c) == decimal => normalized.push('.'),
            _ => {}
        }
    }
    normalized.parse().ok()
}
