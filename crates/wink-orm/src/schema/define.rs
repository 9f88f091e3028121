//! Column and table definitions.
//!
//! Definitions are plain data: they deserialize from configuration, are
//! normalized by [`super::normalize`] and rendered by [`super::ddl`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the implicit primary-key column of entity tables.
pub const ID_COLUMN: &str = "id";

/// Name of the implicit logical-delete column of entity tables.
pub const DEL_FLAG_COLUMN: &str = "del_flag";

/// Native MySQL column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// `varchar`
    #[serde(rename = "varchar")]
    String,
    /// `text`
    #[serde(rename = "text")]
    Text,
    /// `json`
    #[serde(rename = "json")]
    Json,
    /// `int`
    #[serde(rename = "int")]
    Int,
    /// `bigint`
    #[serde(rename = "bigint")]
    BigInt,
    /// `float`
    #[serde(rename = "float")]
    Float,
    /// `double`
    #[serde(rename = "double")]
    Double,
    /// `decimal`
    #[serde(rename = "decimal")]
    Decimal,
    /// `tinyint`, used as a boolean.
    #[serde(rename = "tinyint")]
    Boolean,
    /// `date`
    #[serde(rename = "date")]
    Date,
    /// `time`
    #[serde(rename = "time")]
    Time,
    /// `datetime`
    #[serde(rename = "datetime")]
    DateTime,
    /// `timestamp`
    #[serde(rename = "timestamp")]
    Timestamp,
    /// `blob`
    #[serde(rename = "blob")]
    Blob,
}

impl ColumnType {
    /// The SQL type name.
    #[must_use]
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::String => "varchar",
            Self::Text => "text",
            Self::Json => "json",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Boolean => "tinyint",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Timestamp => "timestamp",
            Self::Blob => "blob",
        }
    }

    /// Length used when a definition omits one.
    #[must_use]
    pub const fn default_length(self) -> &'static [u32] {
        match self {
            Self::String => &[255],
            Self::Int | Self::Float | Self::Timestamp => &[4],
            Self::BigInt => &[8],
            Self::Decimal => &[10, 0],
            Self::Boolean => &[1],
            Self::Time => &[3],
            Self::Text | Self::Json | Self::Double | Self::Blob | Self::Date | Self::DateTime => &[],
        }
    }

    /// Types whose defaults are rendered as quoted string literals.
    #[must_use]
    pub const fn is_string_family(self) -> bool {
        matches!(self, Self::String | Self::Text | Self::Json)
    }

    /// Integer types whose length is only a display width.
    #[must_use]
    pub const fn has_display_width(self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Boolean)
    }

    /// Types that never carry a length.
    #[must_use]
    pub const fn is_lengthless(self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "varchar" | "string" => Ok(Self::String),
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "int" | "integer" => Ok(Self::Int),
            "bigint" => Ok(Self::BigInt),
            "float" => Ok(Self::Float),
            "double" => Ok(Self::Double),
            "decimal" => Ok(Self::Decimal),
            "tinyint" | "boolean" | "bool" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "time" => Ok(Self::Time),
            "datetime" => Ok(Self::DateTime),
            "timestamp" => Ok(Self::Timestamp),
            "blob" => Ok(Self::Blob),
            other => Err(format!("unsupported column type '{other}'")),
        }
    }
}

/// A column referenced by a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnReference {
    /// Referenced table.
    pub table: String,
    /// Referenced column.
    pub field: String,
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefine {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Length parts; empty means the type default.
    #[serde(default, deserialize_with = "deserialize_length")]
    pub length: Vec<u32>,
    /// `not null`
    #[serde(default)]
    pub required: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub primary: bool,
    /// Covered by its own unique index.
    #[serde(default)]
    pub unique: bool,
    /// `auto_increment`; only valid for [`ColumnType::Int`].
    #[serde(default)]
    pub auto_increment: bool,
    /// Default value as written in DDL, without quotes.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Referenced column, kept as metadata.
    #[serde(default)]
    pub references: Option<ColumnReference>,
}

fn deserialize_length<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Length {
        One(u32),
        Many(Vec<u32>),
    }

    Ok(match Option::<Length>::deserialize(deserializer)? {
        Some(Length::One(n)) => vec![n],
        Some(Length::Many(parts)) => parts,
        None => Vec::new(),
    })
}

impl ColumnDefine {
    /// Creates a nullable column with no extras.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: Vec::new(),
            required: false,
            primary: false,
            unique: false,
            auto_increment: false,
            default_value: None,
            comment: None,
            references: None,
        }
    }

    /// Sets the length parts.
    #[must_use]
    pub fn length(mut self, length: impl Into<Vec<u32>>) -> Self {
        self.length = length.into();
        self
    }

    /// Marks the column `not null`.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Adds the column to the primary key.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Gives the column its own unique index.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column `auto_increment`.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Records a referenced column.
    #[must_use]
    pub fn references(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.references = Some(ColumnReference {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Compares everything that `modify column` can change. Display widths
    /// of integer types are ignored.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.name == other.name
            && self.column_type == other.column_type
            && (self.column_type.has_display_width() || self.length == other.length)
            && self.required == other.required
            && self.auto_increment == other.auto_increment
            && self.default_value == other.default_value
            && self.comment == other.comment
    }

    /// Compares shape plus key membership.
    #[must_use]
    pub fn same_definition(&self, other: &Self) -> bool {
        self.same_shape(other) && self.primary == other.primary && self.unique == other.unique
    }
}

/// Definition of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefine {
    /// Table name.
    pub name: String,
    /// Default charset.
    #[serde(default)]
    pub charset: Option<String>,
    /// Storage engine.
    #[serde(default)]
    pub engine: Option<String>,
    /// Columns in definition order.
    pub column_defines: Vec<ColumnDefine>,
    /// Unique index names found on the live table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    /// A junction table: no implicit columns, composite primary key.
    #[serde(default)]
    pub is_relation_table: bool,
}

impl TableDefine {
    /// Creates an entity table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            charset: None,
            engine: None,
            column_defines: Vec::new(),
            constraints: Vec::new(),
            is_relation_table: false,
        }
    }

    /// Creates a relation (junction) table definition.
    #[must_use]
    pub fn relation(name: impl Into<String>) -> Self {
        Self {
            is_relation_table: true,
            ..Self::new(name)
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDefine) -> Self {
        self.column_defines.push(column);
        self
    }

    /// Sets the charset.
    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Looks a column up by name.
    #[must_use]
    pub fn find_column(&self, name: &str) -> Option<&ColumnDefine> {
        self.column_defines.iter().find(|c| c.name == name)
    }

    /// Names of the primary-key columns, in definition order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&str> {
        self.column_defines
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Returns a copy with the implicit columns applied.
    ///
    /// Entity tables gain an auto-increment `id` primary key in front and a
    /// `del_flag` column at the end, unless columns with those names are
    /// already declared. Relation tables gain nothing; every declared column
    /// joins a composite primary key instead.
    #[must_use]
    pub fn with_implicit_columns(&self) -> Self {
        let mut table = self.clone();
        if table.is_relation_table {
            for column in &mut table.column_defines {
                column.primary = true;
            }
            return table;
        }
        if table.find_column(ID_COLUMN).is_none() {
            let id = ColumnDefine::new(ID_COLUMN, ColumnType::Int)
                .auto_increment()
                .primary()
                .required();
            table.column_defines.insert(0, id);
        }
        if table.find_column(DEL_FLAG_COLUMN).is_none() {
            let del_flag = ColumnDefine::new(DEL_FLAG_COLUMN, ColumnType::Boolean)
                .required()
                .default_value("0");
            table.column_defines.push(del_flag);
        }
        table
    }
}
