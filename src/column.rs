//! Column definitions as read from the schema catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One column of one table on one side.
///
/// Identity is `(table, name)`; every other attribute is comparison payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Column {
    pub table: String,
    pub name: String,
    /// `None` means no default; `Some("")` is an explicit empty-string default.
    #[serde(default)]
    pub default_value: Option<String>,
    /// `"YES"` / `"NO"`, as declared by `information_schema`.
    pub is_nullable: String,
    pub data_type: String,
    /// Full declared type, e.g. `varchar(255)` or `decimal(10,2) unsigned`.
    pub column_type: String,
    #[serde(default)]
    pub comment: String,
    /// `PRI`, `UNI`, `MUL` or empty.
    #[serde(default)]
    pub key: String,
}

/// The six tracked attributes, in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    DefaultValue,
    IsNull,
    DataType,
    ColumnType,
    Comment,
    Key,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::DefaultValue,
        Field::IsNull,
        Field::DataType,
        Field::ColumnType,
        Field::Comment,
        Field::Key,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::DefaultValue => "DefaultValue",
            Field::IsNull => "IsNull",
            Field::DataType => "DataType",
            Field::ColumnType => "ColumnType",
            Field::Comment => "Comment",
            Field::Key => "Key",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Column {
    /// Create a column with empty attributes; fill in the rest with the builder methods.
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            is_nullable: "YES".to_string(),
            ..Default::default()
        }
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = "NO".to_string();
        self
    }

    /// Set both the data type and the full column type.
    pub fn typed(mut self, data_type: impl Into<String>, column_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self.column_type = column_type.into();
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// `table.column`
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }

    /// Display value of a tracked field.
    ///
    /// An absent default renders as the literal `NULL`.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::DefaultValue => self.default_value.as_deref().unwrap_or("NULL"),
            Field::IsNull => &self.is_nullable,
            Field::DataType => &self.data_type,
            Field::ColumnType => &self.column_type,
            Field::Comment => &self.comment,
            Field::Key => &self.key,
        }
    }

    /// Compare one tracked field against another column.
    ///
    /// Defaults compare on the underlying value, so an absent default and a
    /// literal `'NULL'` string default are not equal even though both display as `NULL`.
    pub fn field_eq(&self, other: &Column, field: Field) -> bool {
        match field {
            Field::DefaultValue => self.default_value == other.default_value,
            _ => self.field(field) == other.field(field),
        }
    }

    /// Whole-column equality: identity plus all six tracked fields.
    pub fn same_as(&self, other: &Column) -> bool {
        self.table == other.table
            && self.name == other.name
            && Field::ALL.iter().all(|f| self.field_eq(other, *f))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} default {} nullable {} key '{}' comment '{}'",
            self.full_name(),
            self.column_type,
            self.field(Field::DefaultValue),
            self.is_nullable,
            self.key,
            self.comment
        )
    }
}

/// A left and a right column sharing the same name.
#[derive(Debug, Clone, Copy)]
pub struct ColumnPair<'a> {
    pub left: &'a Column,
    pub right: &'a Column,
}

impl ColumnPair<'_> {
    pub fn is_equal(&self) -> bool {
        self.left.same_as(self.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> Column {
        Column::new("users", "email")
            .typed("varchar", "varchar(255)")
            .not_null()
            .key("UNI")
    }

    #[test]
    fn test_default_rendering() {
        let unset = email();
        let empty = email().default_value("");
        assert_eq!(unset.field(Field::DefaultValue), "NULL");
        assert_eq!(empty.field(Field::DefaultValue), "");
        assert!(!unset.field_eq(&empty, Field::DefaultValue));
    }

    #[test]
    fn test_literal_null_default_differs_from_unset() {
        let unset = email();
        let literal = email().default_value("NULL");
        assert_eq!(unset.field(Field::DefaultValue), literal.field(Field::DefaultValue));
        assert!(!unset.same_as(&literal));
    }

    #[test]
    fn test_same_as() {
        let a = email();
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&a.clone().comment("login")));

        let mut other_table = a.clone();
        other_table.table = "admins".into();
        assert!(!a.same_as(&other_table));
    }

    #[test]
    fn test_field_names() {
        let names: Vec<_> = Field::ALL.iter().map(Field::as_str).collect();
        assert_eq!(
            names,
            ["DefaultValue", "IsNull", "DataType", "ColumnType", "Comment", "Key"]
        );
    }
}
