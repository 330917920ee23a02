//! File metadata exposed to WHERE clauses.

use std::cmp::Ordering;
use std::fmt;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use super::{ExecutionError, ExecutionResult};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m.%d.%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Property {
    Name,
    Extension,
    Size,
    Content,
    Created,
    Modified,
    Accessed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    Timestamp,
}

impl Property {
    pub fn value_type(&self) -> ValueType {
        match self {
            Property::Name | Property::Extension | Property::Content => ValueType::Text,
            Property::Size => ValueType::Number,
            Property::Created | Property::Modified | Property::Accessed => ValueType::Timestamp,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Property::Name => "name",
            Property::Extension => "extension",
            Property::Size => "size",
            Property::Content => "content",
            Property::Created => "created",
            Property::Modified => "modified",
            Property::Accessed => "accessed",
        }
    }
}

impl FromStr for Property {
    type Err = ExecutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Property::Name),
            "extension" => Ok(Property::Extension),
            "size" => Ok(Property::Size),
            "content" => Ok(Property::Content),
            "created" => Ok(Property::Created),
            "modified" => Ok(Property::Modified),
            "accessed" => Ok(Property::Accessed),
            other => Err(ExecutionError::UnsupportedProperty(other.to_string())),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl PropertyValue {
    /// Converts a query literal to the semantic type of `property`.
    pub fn coerce(property: Property, literal: &str) -> ExecutionResult<Self> {
        let invalid = || ExecutionError::InvalidValue {
            property: property.to_string(),
            value: literal.to_string(),
        };

        match property.value_type() {
            ValueType::Text => Ok(PropertyValue::Text(literal.to_string())),
            ValueType::Number => literal
                .trim()
                .parse::<f64>()
                .map(PropertyValue::Number)
                .map_err(|_| invalid()),
            ValueType::Timestamp => parse_timestamp(literal)
                .map(PropertyValue::Timestamp)
                .ok_or_else(invalid),
        }
    }

    /// String form that LIKE and `=` patterns are tested against.
    pub fn as_text(&self) -> String {
        match self {
            PropertyValue::Text(text) => text.clone(),
            PropertyValue::Number(number) => number.to_string(),
            PropertyValue::Timestamp(time) => time.to_rfc3339(),
        }
    }

    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Text(l), PropertyValue::Text(r)) => Some(l.cmp(r)),
            (PropertyValue::Number(l), PropertyValue::Number(r)) => l.partial_cmp(r),
            (PropertyValue::Timestamp(l), PropertyValue::Timestamp(r)) => Some(l.cmp(r)),
            _ => None,
        }
    }
}

/// Metadata of one directory entry, read once and shared by every
/// comparison evaluated against that entry.
#[derive(Debug, Clone)]
pub struct FileProperties {
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub content: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub accessed: DateTime<Utc>,
}

impl FileProperties {
    /// Stats `path`. File content is only read when `with_content` is set.
    pub async fn resolve(path: &Path, with_content: bool) -> io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;

        let content = if with_content && metadata.is_file() {
            let bytes = tokio::fs::read(path).await?;
            Some(String::from_utf8_lossy(&bytes).into_owned())
        } else {
            None
        };

        Ok(Self {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size: metadata.len(),
            content,
            created: DateTime::from(birth_time(&metadata)),
            modified: DateTime::from(metadata.modified()?),
            accessed: DateTime::from(metadata.accessed()?),
        })
    }

    pub fn get(&self, property: Property) -> PropertyValue {
        match property {
            Property::Name => PropertyValue::Text(self.name.clone()),
            Property::Extension => PropertyValue::Text(self.extension.clone()),
            Property::Size => PropertyValue::Number(self.size as f64),
            Property::Content => PropertyValue::Text(self.content.clone().unwrap_or_default()),
            Property::Created => PropertyValue::Timestamp(self.created),
            Property::Modified => PropertyValue::Timestamp(self.modified),
            Property::Accessed => PropertyValue::Timestamp(self.accessed),
        }
    }
}

// Some file systems report no birth time, or report it as the epoch.
fn birth_time(metadata: &Metadata) -> SystemTime {
    match metadata.created() {
        Ok(time) if time != UNIX_EPOCH => time,
        _ => change_time(metadata),
    }
}

#[cfg(unix)]
fn change_time(metadata: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    use std::time::Duration;

    let seconds = metadata.ctime().max(0) as u64;
    let nanos = metadata.ctime_nsec().clamp(0, 999_999_999) as u32;
    UNIX_EPOCH + Duration::new(seconds, nanos)
}

#[cfg(not(unix))]
fn change_time(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(UNIX_EPOCH)
}

/// Accepts RFC 3339 plus the plain date forms users type in queries.
/// Dates without a zone are read as local time.
pub fn parse_timestamp(literal: &str) -> Option<DateTime<Utc>> {
    let literal = literal.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(literal) {
        return Some(time.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(literal, format) {
            return local_to_utc(naive);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(literal, format) {
            return date.and_hms_opt(0, 0, 0).and_then(local_to_utc);
        }
    }

    None
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|time| time.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_property_names() {
        assert_eq!("size".parse::<Property>().unwrap(), Property::Size);
        assert_eq!(Property::Created.value_type(), ValueType::Timestamp);
        assert!(matches!(
            "owner".parse::<Property>(),
            Err(ExecutionError::UnsupportedProperty(name)) if name == "owner"
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        for literal in ["01.01.2021", "01/01/2021", "2021-01-01", "2021-01-01 00:00:00"] {
            let time = parse_timestamp(literal)
                .unwrap_or_else(|| panic!("failed to parse {}", literal))
                .with_timezone(&Local);
            assert_eq!((time.year(), time.month(), time.day()), (2021, 1, 1), "{}", literal);
        }

        let utc = parse_timestamp("2021-06-01T12:00:00Z").unwrap();
        assert_eq!(utc.to_rfc3339(), "2021-06-01T12:00:00+00:00");

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_coerce_by_property_type() {
        assert_eq!(
            PropertyValue::coerce(Property::Size, " 1000 ").unwrap(),
            PropertyValue::Number(1000.0)
        );
        assert_eq!(
            PropertyValue::coerce(Property::Name, "10").unwrap(),
            PropertyValue::Text("10".to_string())
        );
        assert!(matches!(
            PropertyValue::coerce(Property::Size, "big"),
            Err(ExecutionError::InvalidValue { .. })
        ));
        assert!(PropertyValue::coerce(Property::Modified, "soon").is_err());
    }

    #[test]
    fn test_number_text_form_has_no_fraction() {
        assert_eq!(PropertyValue::Number(1000.0).as_text(), "1000");
    }

    #[tokio::test]
    async fn test_resolve_reads_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.final.txt");
        std::fs::write(&path, "hello").unwrap();

        let properties = FileProperties::resolve(&path, true).await.unwrap();
        assert_eq!(properties.name, "report.final");
        assert_eq!(properties.extension, "txt");
        assert_eq!(properties.size, 5);
        assert_eq!(properties.content.as_deref(), Some("hello"));

        let without = FileProperties::resolve(&path, false).await.unwrap();
        assert!(without.content.is_none());
    }

    #[tokio::test]
    async fn test_folders_have_no_content() {
        let dir = tempfile::tempdir().unwrap();
        let properties = FileProperties::resolve(dir.path(), true).await.unwrap();
        assert!(properties.content.is_none());
        assert_eq!(properties.get(Property::Content), PropertyValue::Text(String::new()));
    }
}
