//! Embedded widget references
//!
//! Widgets are written as self-closing JSX-style tags on their own lines:
//!
//! ```text
//! <Translations translations={[{ language: '简体中文', url: 'https://example.com/zh' }]} />
//! <Comments />
//! ```
//!
//! Each known widget name has a typed props schema. Unknown names and props
//! that do not match the schema are rejected at parse time.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use super::ParseError;

/// A resolved widget reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name", content = "props")]
pub enum Widget {
    Comments(CommentsProps),
    Attribution(AttributionProps),
    Translations(TranslationsProps),
    #[serde(rename = "Toc")]
    TableOfContents(TocProps),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentsProps {}

/// Credit line, usually for the banner image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributionProps {
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationsProps {
    pub translations: Vec<Translation>,
}

/// One translated copy of the article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Translation {
    pub language: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct TocProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u8>,
}

impl Widget {
    /// Names with a known schema
    pub const KNOWN: [&'static str; 4] = ["Comments", "Attribution", "Translations", "Toc"];

    /// Tag name as written in source
    pub fn name(&self) -> &'static str {
        match self {
            Widget::Comments(_) => "Comments",
            Widget::Attribution(_) => "Attribution",
            Widget::Translations(_) => "Translations",
            Widget::TableOfContents(_) => "Toc",
        }
    }

    /// Resolve a tag name and raw props into a typed widget
    pub fn resolve(name: &str, props: Mapping, line: usize) -> Result<Self, ParseError> {
        let widget = match name {
            "Comments" => Widget::Comments(from_props(name, props, line)?),
            "Attribution" => Widget::Attribution(from_props(name, props, line)?),
            "Translations" => Widget::Translations(from_props(name, props, line)?),
            "Toc" => {
                let props: TocProps = from_props(name, props, line)?;
                if let Some(depth) = props.max_depth {
                    if !(1..=6).contains(&depth) {
                        return Err(ParseError::props(
                            line,
                            name,
                            format!("maxDepth must be between 1 and 6, got {}", depth),
                        ));
                    }
                }
                Widget::TableOfContents(props)
            }
            _ => {
                return Err(ParseError::UnresolvedComponentReference {
                    line,
                    name: name.to_string(),
                })
            }
        };
        Ok(widget)
    }

    /// Parse a complete `<Name ... />` tag
    pub fn parse_tag(tag: &str, line: usize) -> Result<Self, ParseError> {
        let (name, props) = TagLexer::new(tag, line).read_tag()?;
        Self::resolve(&name, props, line)
    }

    /// Props as JSON, in schema field order
    pub fn props(&self) -> serde_json::Map<String, serde_json::Value> {
        let value = match self {
            Widget::Comments(p) => serde_json::to_value(p),
            Widget::Attribution(p) => serde_json::to_value(p),
            Widget::Translations(p) => serde_json::to_value(p),
            Widget::TableOfContents(p) => serde_json::to_value(p),
        };
        match value {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }

    /// Render back to a self-closing tag
    pub fn to_tag(&self) -> String {
        let mut tag = format!("<{}", self.name());
        for (key, value) in self.props() {
            match value {
                serde_json::Value::String(s) if !s.contains('"') => {
                    tag.push_str(&format!(" {}=\"{}\"", key, s));
                }
                other => tag.push_str(&format!(" {}={{{}}}", key, other)),
            }
        }
        tag.push_str(" />");
        tag
    }
}

fn from_props<T: DeserializeOwned>(name: &str, props: Mapping, line: usize) -> Result<T, ParseError> {
    serde_yaml::from_value(Value::Mapping(props)).map_err(|e| ParseError::props(line, name, e.to_string()))
}

/// Character-level reader for one widget tag
struct TagLexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    name: String,
}

impl TagLexer {
    fn new(input: &str, line: usize) -> Self {
        Self {
            chars: input.trim().chars().collect(),
            pos: 0,
            line,
            name: String::new(),
        }
    }

    fn read_tag(mut self) -> Result<(String, Mapping), ParseError> {
        if self.current_char() != '<' {
            return Err(self.error("widget tag must start with <"));
        }
        self.pos += 1;
        self.name = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if self.name.is_empty() {
            return Err(self.error("missing widget name"));
        }

        let mut props = Mapping::new();
        loop {
            self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                break;
            }
            match self.current_char() {
                '\0' => return Err(self.error("tag is not closed with />")),
                '>' => return Err(self.error("only self-closing widget tags are supported")),
                _ => {}
            }

            let key = self.read_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if key.is_empty() {
                return Err(self.error(format!("unexpected `{}`", self.current_char())));
            }

            self.skip_whitespace();
            let value = if self.current_char() == '=' {
                self.pos += 1;
                self.skip_whitespace();
                self.read_value()?
            } else {
                Value::Bool(true)
            };

            if props.insert(Value::String(key.clone()), value).is_some() {
                return Err(self.error(format!("prop `{}` given twice", key)));
            }
        }

        if self.pos < self.chars.len() {
            return Err(self.error("unexpected text after />"));
        }

        Ok((self.name, props))
    }

    fn read_value(&mut self) -> Result<Value, ParseError> {
        match self.current_char() {
            quote @ ('"' | '\'') => {
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.chars.len() && self.chars[self.pos] != quote {
                    self.pos += 1;
                }
                if self.pos >= self.chars.len() {
                    return Err(self.error("unterminated string prop"));
                }
                let s: String = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Ok(Value::String(s))
            }
            '{' => {
                let expr = self.read_expression()?;
                serde_yaml::from_str::<Value>(&expr)
                    .map_err(|e| self.error(format!("cannot read expression `{}`: {}", expr, e)))
            }
            c => Err(self.error(format!("unexpected `{}` in prop value", c))),
        }
    }

    /// Read a `{...}` expression, returning its inside
    fn read_expression(&mut self) -> Result<String, ParseError> {
        let start = self.pos + 1;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) if c == '\\' => self.pos += 1,
                Some(_) => {}
                None => match c {
                    '"' | '\'' | '`' => quote = Some(c),
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            let expr: String = self.chars[start..self.pos].iter().collect();
                            self.pos += 1;
                            return Ok(expr.trim().to_string());
                        }
                    }
                    _ => {}
                },
            }
            self.pos += 1;
        }

        Err(self.error("unterminated {expression}"))
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.pos < self.chars.len() && pred(self.chars[self.pos]) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        let s_chars: Vec<char> = s.chars().collect();
        self.chars.get(self.pos..self.pos + s_chars.len()) == Some(&s_chars[..])
    }

    fn current_char(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let name = if self.name.is_empty() { "?" } else { self.name.as_str() };
        ParseError::props(self.line, name, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments() {
        let widget = Widget::parse_tag("<Comments />", 1).unwrap();
        assert_eq!(widget, Widget::Comments(CommentsProps {}));
        assert_eq!(widget.to_tag(), "<Comments />");
    }

    #[test]
    fn test_translations_js_literal() {
        let tag = r#"<Translations
  translations={[
    { language: '简体中文', url: 'https://example.com/zh/type-safe-react-query' },
    { language: "Español", url: "https://example.com/es" }
  ]}
/>"#;
        let widget = Widget::parse_tag(tag, 12).unwrap();
        let Widget::Translations(props) = &widget else {
            panic!("expected translations, got {:?}", widget);
        };
        assert_eq!(props.translations.len(), 2);
        assert_eq!(props.translations[0].language, "简体中文");
        assert_eq!(props.translations[1].url, "https://example.com/es");

        let reparsed = Widget::parse_tag(&widget.to_tag(), 1).unwrap();
        assert_eq!(reparsed, widget);
    }

    #[test]
    fn test_attribution_string_props() {
        let widget = Widget::parse_tag(r#"<Attribution author='Jane' url="https://example.com" />"#, 1).unwrap();
        assert_eq!(
            widget,
            Widget::Attribution(AttributionProps {
                author: "Jane".to_string(),
                url: Some("https://example.com".to_string()),
            })
        );
        assert_eq!(
            widget.to_tag(),
            r#"<Attribution author="Jane" url="https://example.com" />"#
        );
    }

    #[test]
    fn test_quote_in_string_prop_round_trips() {
        let widget = Widget::Attribution(AttributionProps {
            author: "Jane \"JD\" Doe".to_string(),
            url: None,
        });
        let tag = widget.to_tag();
        assert_eq!(Widget::parse_tag(&tag, 1).unwrap(), widget);
    }

    #[test]
    fn test_toc_depth() {
        let widget = Widget::parse_tag("<Toc maxDepth={3} />", 1).unwrap();
        assert_eq!(widget, Widget::TableOfContents(TocProps { max_depth: Some(3) }));
        assert_eq!(widget.to_tag(), "<Toc maxDepth={3} />");

        let err = Widget::parse_tag("<Toc maxDepth={9} />", 4).unwrap_err();
        assert!(matches!(err, ParseError::InvalidComponentProps { line: 4, .. }));
    }

    #[test]
    fn test_unknown_widget() {
        let err = Widget::parse_tag("<Newsletter />", 5).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnresolvedComponentReference {
                line: 5,
                name: "Newsletter".to_string()
            }
        );
    }

    #[test]
    fn test_schema_violations() {
        let cases = [
            "<Comments enabled />",
            "<Attribution />",
            "<Attribution author={42} />",
            "<Translations translations=\"nope\" />",
            "<Translations translations={[{ language: 'de' }]} />",
            "<Comments a=\"1\" a=\"2\" />",
            "<Comments>",
            "<Comments /> trailing",
            "<Toc maxDepth={3 />",
        ];
        for tag in cases {
            let err = Widget::parse_tag(tag, 1).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidComponentProps { .. }),
                "{} gave {:?}",
                tag,
                err
            );
        }
    }
}
