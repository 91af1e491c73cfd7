//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::{BlockNode, ContentRecord, ParseError};

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value.to_string()])
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![value])
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(vec)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Front-matter data as written in the source header
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(
        deserialize_with = "string_or_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tags: Vec<String>,

    /// Additional custom fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    pub fn parse(content: &str) -> Result<(Self, &str), ParseError> {
        let content = content.trim_start();

        if content.starts_with("---") {
            return Self::parse_yaml(content);
        }

        if content.starts_with(";;;") || content.starts_with('{') {
            return Self::parse_json(content);
        }

        Err(ParseError::metadata("missing front-matter header"))
    }

    fn parse_yaml(content: &str) -> Result<(Self, &str), ParseError> {
        let (opening, rest) = content.split_once('\n').unwrap_or((content, ""));
        if opening.trim_end() != "---" {
            return Err(ParseError::metadata(
                "opening --- must stand on its own line",
            ));
        }

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == "---" {
                let yaml_content = &rest[..offset];
                let remaining = rest[offset + line.len()..].trim_start_matches(['\n', '\r']);

                if yaml_content.trim().is_empty() {
                    return Ok((FrontMatter::default(), remaining));
                }

                let fm = serde_yaml::from_str::<FrontMatter>(yaml_content)
                    .map_err(|e| ParseError::metadata(format!("invalid YAML front-matter: {}", e)))?;
                return Ok((fm, remaining));
            }
            offset += line.len();
        }

        Err(ParseError::metadata("front-matter is missing its closing ---"))
    }

    fn parse_json(content: &str) -> Result<(Self, &str), ParseError> {
        // JSON front-matter ends with ;;;
        if let Some(rest) = content.strip_prefix(";;;") {
            let end_pos = rest
                .find(";;;")
                .ok_or_else(|| ParseError::metadata("front-matter is missing its closing ;;;"))?;
            let json_content = &rest[..end_pos];
            let remaining = rest[end_pos + 3..].trim_start_matches(['\n', '\r']);
            return Ok((Self::from_json(json_content)?, remaining));
        }

        // A bare JSON object at the start
        let mut depth = 0;
        let mut in_string = false;
        let mut escaped = false;
        for (i, c) in content.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let json_content = &content[..=i];
                        let remaining = content[i + 1..].trim_start_matches(['\n', '\r']);
                        return Ok((Self::from_json(json_content)?, remaining));
                    }
                }
                _ => {}
            }
        }

        Err(ParseError::metadata("unterminated JSON front-matter"))
    }

    fn from_json(json: &str) -> Result<Self, ParseError> {
        serde_json::from_str(json)
            .map_err(|e| ParseError::metadata(format!("invalid JSON front-matter: {}", e)))
    }

    /// Parse the date string into a calendar date
    pub fn parse_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date_string)
    }

    /// Check the required fields and build a record around `body`
    pub fn into_record(self, body: Vec<BlockNode>) -> Result<ContentRecord, ParseError> {
        let date = match self.date.as_deref() {
            None => return Err(ParseError::metadata("missing required field `date`")),
            Some(raw) => parse_date_string(raw)
                .ok_or_else(|| ParseError::metadata(format!("unrecognised date `{}`", raw)))?,
        };

        let title = match self.title {
            Some(title) if !title.trim().is_empty() => title,
            Some(_) => return Err(ParseError::metadata("field `title` must not be empty")),
            None => return Err(ParseError::metadata("missing required field `title`")),
        };

        Ok(ContentRecord {
            title,
            description: self.description.unwrap_or_default(),
            date,
            banner: self.banner,
            tags: self.tags.into_iter().collect(),
            extra: self.extra,
            body,
        })
    }
}

impl From<&ContentRecord> for FrontMatter {
    fn from(record: &ContentRecord) -> Self {
        Self {
            title: Some(record.title.clone()),
            description: Some(record.description.clone()).filter(|d| !d.is_empty()),
            date: Some(record.date.format("%Y-%m-%d").to_string()),
            banner: record.banner.clone(),
            tags: record.tags.iter().cloned().collect(),
            extra: record.extra.clone(),
        }
    }
}

/// Parse a date string in various formats, keeping only the calendar date
fn parse_date_string(s: &str) -> Option<NaiveDate> {
    let s = s.trim();

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    // RFC 3339 / ISO 8601 with offset
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Type-safe React Query
description: About the difference between "having types" and "being type-safe"
date: 2023-01-07
banner: ./glasses.jpg
tags:
  - ReactJs
  - React Query
  - TypeScript
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Type-safe React Query"));
        assert_eq!(fm.banner.as_deref(), Some("./glasses.jpg"));
        assert_eq!(fm.tags, vec!["ReactJs", "React Query", "TypeScript"]);
        assert_eq!(fm.parse_date(), Some(ymd(2023, 1, 7)));
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = r#"{"title": "Test Post", "date": "2023-01-07", "tags": ["a", "b"]}

This is content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, Some("Test Post".to_string()));
        assert_eq!(fm.tags, vec!["a", "b"]);
        assert!(remaining.starts_with("This is content."));
    }

    #[test]
    fn test_parse_semicolon_json_frontmatter() {
        let content = ";;;\n{\"title\": \"Braces } in \\\"strings\\\"\", \"date\": \"2023-01-07\"}\n;;;\nBody";

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Braces } in \"strings\""));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_json_object_with_brace_in_string() {
        let content = "{\"title\": \"a } b\", \"date\": \"2023-01-07\"}\nBody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("a } b"));
        assert_eq!(remaining, "Body");
    }

    #[test]
    fn test_parse_single_string_tags() {
        let content = "---\ntitle: Single Tag Post\ndate: 2024-01-15\ntags: Notes\n---\n";

        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.tags, vec!["Notes"]);
    }

    #[test]
    fn test_empty_tags_key() {
        let content = "---\ntitle: T\ndate: 2024-01-15\ntags:\n---\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_extra_fields_preserved() {
        let content = "---\ntitle: T\ndate: 2024-01-15\nbannerCredit: Photo by someone\n---\n";
        let (fm, _) = FrontMatter::parse(content).unwrap();
        assert_eq!(
            fm.extra.get("bannerCredit"),
            Some(&serde_yaml::Value::String("Photo by someone".to_string()))
        );
    }

    #[test]
    fn test_missing_header() {
        let err = FrontMatter::parse("# Just a heading\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_unterminated_header() {
        let err = FrontMatter::parse("---\ntitle: T\ndate: 2024-01-15\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_wrong_shape() {
        let err = FrontMatter::parse("---\ntitle: [a, b]\ndate: 2024-01-15\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));

        let err = FrontMatter::parse("---\njust a sentence\n---\n").unwrap_err();
        assert!(matches!(err, ParseError::MalformedMetadata { .. }));
    }

    #[test]
    fn test_into_record_requires_title_and_date() {
        let (fm, _) = FrontMatter::parse("---\ndate: 2024-01-15\n---\n").unwrap();
        let err = fm.into_record(Vec::new()).unwrap_err();
        assert_eq!(err, ParseError::metadata("missing required field `title`"));

        let (fm, _) = FrontMatter::parse("---\ntitle: T\n---\n").unwrap();
        let err = fm.into_record(Vec::new()).unwrap_err();
        assert_eq!(err, ParseError::metadata("missing required field `date`"));

        let (fm, _) = FrontMatter::parse("---\ntitle: '  '\ndate: 2024-01-15\n---\n").unwrap();
        assert!(fm.into_record(Vec::new()).is_err());

        let (fm, _) = FrontMatter::parse("---\ntitle: T\ndate: someday\n---\n").unwrap();
        assert!(fm.into_record(Vec::new()).is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date_string("2023-01-07"), Some(ymd(2023, 1, 7)));
        assert_eq!(parse_date_string("2023/01/07"), Some(ymd(2023, 1, 7)));
        assert_eq!(parse_date_string("2023-01-07 10:30:00"), Some(ymd(2023, 1, 7)));
        assert_eq!(parse_date_string("2023-01-07T10:30:00+02:00"), Some(ymd(2023, 1, 7)));
        assert_eq!(parse_date_string("2023-13-07"), None);
        assert_eq!(parse_date_string("yesterday"), None);
    }

    #[test]
    fn test_from_record() {
        let mut record = ContentRecord::stub("T", ymd(2023, 1, 7));
        record.tags.insert("Rust".to_string());

        let fm = FrontMatter::from(&record);
        assert_eq!(fm.date.as_deref(), Some("2023-01-07"));
        assert_eq!(fm.description, None);
        assert_eq!(fm.tags, vec!["Rust"]);
    }
}
