//! Attribute-level persistence boundary.
//!
//! Components keep typed configuration structs internally and only flatten
//! into an [`AttributeMap`] of ordered `key=value` pairs when saved. Each
//! component describes its attributes with a static schema of [`Field`]s that
//! carries the value kind used for validation and a declarative visibility
//! predicate for editors.

use std::{fmt, str::FromStr};

use crate::{Polygon, Rgb};

/// Errors raised while decoding attributes.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AttributeError {
    /// A schema field was absent from the map.
    #[error("missing attribute `{0}`")]
    MissingField(&'static str),
    /// A value did not satisfy its field kind.
    #[error("attribute `{key}` has invalid value `{value}`")]
    InvalidValue {
        /// Attribute key.
        key: String,
        /// Rejected value.
        value: String,
    },
    /// The map carried a key the schema does not know.
    #[error("unknown attribute `{0}`")]
    UnknownField(String),
    /// An encoded line was not of the form `key=value`.
    #[error("line {0} is not a key=value pair")]
    MalformedLine(usize),
}

/// Error returned when text names none of the values of a choice.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("`{value}` is not one of: {}", .choices.join(", "))]
pub struct UnknownChoice {
    value: String,
    choices: &'static [&'static str],
}

impl UnknownChoice {
    /// Rejection of `value` by a choice accepting `choices`.
    #[must_use]
    pub fn new(value: &str, choices: &'static [&'static str]) -> Self {
        Self {
            value: value.to_owned(),
            choices,
        }
    }

    /// The rejected text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Ordered collection of string attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder form of [`AttributeMap::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Value stored under `key`, or [`AttributeError::MissingField`].
    pub fn require(&self, key: &'static str) -> Result<&str, AttributeError> {
        self.get(key).ok_or(AttributeError::MissingField(key))
    }

    /// Parses the value stored under `key`.
    pub fn parse<T: FromStr>(&self, key: &'static str) -> Result<T, AttributeError> {
        let value = self.require(key)?;
        value.trim().parse().map_err(|_| AttributeError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the map as newline separated `key=value` lines.
    ///
    /// Backslashes and newlines inside values are escaped.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decodes lines produced by [`AttributeMap::encode`]; blank lines are skipped.
    pub fn decode(text: &str) -> Result<Self, AttributeError> {
        let mut map = Self::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or(AttributeError::MalformedLine(index + 1))?;
            map.insert(key.trim(), unescape(value));
        }
        Ok(map)
    }
}

impl fmt::Display for AttributeMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key}={}", escape(value))?;
        }
        Ok(())
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}

fn unescape(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some(other) => decoded.push(other),
            None => decoded.push('\\'),
        }
    }
    decoded
}

/// Value kind of a schema field, used to validate raw attribute strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Signed integer.
    Integer,
    /// Finite floating point number.
    Double,
    /// `true` or `false`.
    Boolean,
    /// Free text.
    Text,
    /// `r,g,b` colour.
    Color,
    /// One of a closed set of display strings.
    Choice(&'static [&'static str]),
    /// `x1,y1;x2,y2;...` polygon path.
    Path,
}

impl FieldKind {
    /// Reports whether `value` is acceptable for this kind.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Double => value.parse::<f64>().map_or(false, f64::is_finite),
            Self::Boolean => value.parse::<bool>().is_ok(),
            Self::Text => true,
            Self::Color => value.parse::<Rgb>().is_ok(),
            Self::Choice(options) => options.iter().any(|option| *option == value),
            Self::Path => value.parse::<Polygon>().is_ok(),
        }
    }
}

/// One attribute of a component schema.
pub struct Field<T> {
    name: &'static str,
    kind: FieldKind,
    description: &'static str,
    visible: Option<fn(&T) -> bool>,
}

impl<T> Field<T> {
    /// Declares an always visible field.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            visible: None,
        }
    }

    /// Restricts editor visibility to configurations satisfying `predicate`.
    #[must_use]
    pub const fn visible_when(self, predicate: fn(&T) -> bool) -> Self {
        Self {
            visible: Some(predicate),
            ..self
        }
    }

    /// Attribute key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Value kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Editor description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Evaluates the visibility predicate against `config`.
    #[must_use]
    pub fn is_visible(&self, config: &T) -> bool {
        self.visible.map_or(true, |predicate| predicate(config))
    }
}

/// Typed configuration that crosses the attribute boundary.
pub trait Configurable: Sized + 'static {
    /// Ordered field table describing every attribute.
    fn schema() -> &'static [Field<Self>];

    /// Flattens the configuration into attributes in schema order.
    fn to_attributes(&self) -> AttributeMap;

    /// Rebuilds a configuration from attributes already checked by [`Configurable::validate`].
    fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError>;

    /// Validates and decodes `map`.
    fn from_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
        Self::validate(map)?;
        Self::decode_attributes(map)
    }

    /// Checks that every schema field is present with an acceptable value and
    /// that no unknown keys are present.
    fn validate(map: &AttributeMap) -> Result<(), AttributeError> {
        let schema = Self::schema();
        if let Some((key, _)) = map
            .iter()
            .find(|(key, _)| !schema.iter().any(|field| field.name() == *key))
        {
            return Err(AttributeError::UnknownField(key.to_owned()));
        }
        for field in schema {
            let value = map.require(field.name())?;
            if !field.kind().accepts(value) {
                return Err(AttributeError::InvalidValue {
                    key: field.name().to_owned(),
                    value: value.to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Names of the fields an editor should currently show.
    fn visible_fields(&self) -> Vec<&'static str> {
        Self::schema()
            .iter()
            .filter(|field| field.is_visible(self))
            .map(Field::name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Marker {
        label: String,
        size: i32,
        outlined: bool,
        outline: Rgb,
    }

    static MARKER_SCHEMA: &[Field<Marker>] = &[
        Field::new("label", FieldKind::Text, "Marker label"),
        Field::new("size", FieldKind::Integer, "Marker size"),
        Field::new("outlined", FieldKind::Boolean, "Draw outline"),
        Field::new("outline", FieldKind::Color, "Outline colour").visible_when(is_outlined),
    ];

    fn is_outlined(marker: &Marker) -> bool {
        marker.outlined
    }

    impl Configurable for Marker {
        fn schema() -> &'static [Field<Self>] {
            MARKER_SCHEMA
        }

        fn to_attributes(&self) -> AttributeMap {
            AttributeMap::new()
                .with("label", &self.label)
                .with("size", self.size)
                .with("outlined", self.outlined)
                .with("outline", self.outline)
        }

        fn decode_attributes(map: &AttributeMap) -> Result<Self, AttributeError> {
            Ok(Self {
                label: map.require("label")?.to_owned(),
                size: map.parse("size")?,
                outlined: map.parse("outlined")?,
                outline: map.parse("outline")?,
            })
        }
    }

    fn marker() -> Marker {
        Marker {
            label: "line one\nback\\slash = odd".to_owned(),
            size: -3,
            outlined: false,
            outline: Rgb::new(1, 2, 3),
        }
    }

    #[test]
    fn encoded_text_survives_escaping() {
        let original = marker();
        let text = original.to_attributes().encode();
        assert_eq!(text.lines().count(), 4);
        let decoded = AttributeMap::decode(&text).expect("decode");
        assert_eq!(Marker::from_attributes(&decoded), Ok(original));
    }

    #[test]
    fn validation_rejects_unknown_missing_and_invalid_fields() {
        let attributes = marker().to_attributes();

        let unknown = attributes.clone().with("shadow", 1);
        assert_eq!(
            Marker::validate(&unknown),
            Err(AttributeError::UnknownField("shadow".to_owned()))
        );

        let missing = AttributeMap::decode("label=x\nsize=1\noutlined=true").expect("decode");
        assert_eq!(
            Marker::validate(&missing),
            Err(AttributeError::MissingField("outline"))
        );

        let invalid = attributes.with("size", "large");
        assert_eq!(
            Marker::validate(&invalid),
            Err(AttributeError::InvalidValue {
                key: "size".to_owned(),
                value: "large".to_owned()
            })
        );
    }

    #[test]
    fn decode_reports_malformed_lines() {
        assert_eq!(
            AttributeMap::decode("a=1\n\nbroken"),
            Err(AttributeError::MalformedLine(3))
        );
    }

    #[test]
    fn visibility_table_follows_configuration() {
        let mut config = marker();
        assert_eq!(config.visible_fields(), vec!["label", "size", "outlined"]);
        config.outlined = true;
        assert_eq!(
            config.visible_fields(),
            vec!["label", "size", "outlined", "outline"]
        );
    }

    #[test]
    fn choice_kind_accepts_listed_values_only() {
        let kind = FieldKind::Choice(&["Metric", "Manhattan"]);
        assert!(kind.accepts("Manhattan"));
        assert!(!kind.accepts("Euclid"));
        assert!(FieldKind::Path.accepts("0,0;1,1"));
        assert!(!FieldKind::Path.accepts("0,0;1"));
        assert!(!FieldKind::Double.accepts("NaN"));
    }
}
