use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::IntegrateError;

/// Separator used when a multi-valued field is rendered into a single cell.
pub const SET_SEPARATOR: &str = "||";

/// Column order of integrated compound tables.
pub const OUTPUT_COLUMNS: [Field; 7] = [
    Field::InchiKey,
    Field::Name,
    Field::Hmdb,
    Field::Lmid,
    Field::Kegg,
    Field::Chebi,
    Field::PubchemCompound,
];

/// A name outside the controlled vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field name: {0}")]
pub struct UnknownField(pub String);

/// Field names of the controlled vocabulary. Source-specific columns that are
/// not part of it are carried as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    InchiKey,
    Name,
    Hmdb,
    Lmid,
    Kegg,
    Chebi,
    PubchemCompound,
    Other(String),
}

impl Field {
    pub fn as_str(&self) -> &str {
        match self {
            Field::InchiKey => "InChIKey",
            Field::Name => "Name",
            Field::Hmdb => "HMDB",
            Field::Lmid => "LMID",
            Field::Kegg => "Kegg",
            Field::Chebi => "CHEBI",
            Field::PubchemCompound => "PC_compound",
            Field::Other(name) => name,
        }
    }

    /// Resolves a join-key name. Only the controlled vocabulary is accepted.
    pub fn parse_schema(name: &str) -> Result<Self, IntegrateError> {
        name.parse()
            .map_err(|_| IntegrateError::MissingKey(name.to_string()))
    }

    /// Resolves a table header cell, keeping unknown names as source-specific fields.
    pub fn from_header(name: &str) -> Self {
        name.parse()
            .unwrap_or_else(|_| Field::Other(name.trim().to_string()))
    }

    pub fn is_display_name(&self) -> bool {
        matches!(self, Field::Name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        OUTPUT_COLUMNS
            .iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .ok_or_else(|| UnknownField(value.to_string()))
    }
}

/// A field value: one string, or a set of strings when a source lists several
/// cross-references or two sources disagree irreconcilably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    Set(BTreeSet<String>),
}

impl FieldValue {
    pub fn set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Set(values.into_iter().map(Into::into).collect())
    }

    pub fn is_set(&self) -> bool {
        matches!(self, FieldValue::Set(_))
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            FieldValue::Set(_) => None,
        }
    }

    /// Individual members; a scalar yields itself once.
    pub fn members(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            FieldValue::Scalar(value) => Box::new(std::iter::once(value.as_str())),
            FieldValue::Set(values) => Box::new(values.iter().map(String::as_str)),
        }
    }

    pub fn into_set(self) -> BTreeSet<String> {
        match self {
            FieldValue::Scalar(value) => BTreeSet::from([value]),
            FieldValue::Set(values) => values,
        }
    }

    pub fn contains(&self, member: &str) -> bool {
        match self {
            FieldValue::Scalar(value) => value == member,
            FieldValue::Set(values) => values.contains(member),
        }
    }

    /// Table cell form: members joined by `||`.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Scalar(value) => value.clone(),
            FieldValue::Set(values) => values
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(SET_SEPARATOR),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

/// One parsed source entry. Absent fields are simply not present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: BTreeMap<Field, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &Field) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> BTreeMap<Field, FieldValue> {
        self.fields
    }
}

impl FromIterator<(Field, FieldValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (Field, FieldValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// The merged result for one join-key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    key: String,
    fields: BTreeMap<Field, FieldValue>,
}

impl Entity {
    pub fn new(key: impl Into<String>, fields: BTreeMap<Field, FieldValue>) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// The join-key value this entity was grouped under.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self, field: &Field) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &BTreeMap<Field, FieldValue> {
        &self.fields
    }

    pub fn name(&self) -> Option<&FieldValue> {
        self.fields.get(&Field::Name)
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.fields.insert(Field::Name, FieldValue::Scalar(name));
    }
}

/// Synonyms collected for one entity, in first-insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl SynonymSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the exact string was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_string());
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Cross-reference databases that publish synonym lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynonymSource {
    Hmdb,
    Lmid,
    PcCompound,
}

impl SynonymSource {
    /// Entity field whose values are looked up in this source's table.
    pub fn field(&self) -> Field {
        match self {
            SynonymSource::Hmdb => Field::Hmdb,
            SynonymSource::Lmid => Field::Lmid,
            SynonymSource::PcCompound => Field::PubchemCompound,
        }
    }
}

impl fmt::Display for SynonymSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynonymSource::Hmdb => write!(f, "HMDB"),
            SynonymSource::Lmid => write!(f, "LIPID MAPS"),
            SynonymSource::PcCompound => write!(f, "PubChem"),
        }
    }
}

/// Standard InChIKey shape: 14 + 10 + 1 uppercase letters.
pub fn is_standard_inchikey(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$").unwrap())
        .is_match(value)
}
