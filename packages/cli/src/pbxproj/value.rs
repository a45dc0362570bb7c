//! The NeXTSTEP property-list format backing `project.pbxproj`.
//!
//! The format provides three data types we care about:
//! - String:     `contents` or `"quoted contents"`
//! - Array:      `( element, ... )`
//! - Dictionary: `{ key = value; ... }`
//!
//! Comments (`/* ... */` and `// ...`) are optional and Xcode loads a
//! project fine without them, so the parser discards them and the writer
//! emits none. Object ordering inside a dictionary is preserved on
//! round-trip; Xcode does not depend on it but stable output keeps diffs
//! small.

use crate::{Error, Result};
use std::fmt::Write;

/// A parsed plist value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Value {
    String(String),
    Array(Vec<Value>),
    Dict(Dict),
}

impl Value {
    pub(crate) fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub(crate) fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub(crate) fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub(crate) fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }
}

/// An insertion-ordered dictionary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub(crate) fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Insert or replace.
    pub(crate) fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The array under `key`, inserting an empty one if absent or not an
    /// array.
    pub(crate) fn ensure_array(&mut self, key: &str) -> &mut Vec<Value> {
        if !matches!(self.get(key), Some(Value::Array(_))) {
            self.insert(key, Value::Array(Vec::new()));
        }
        match self.get_mut(key) {
            Some(Value::Array(a)) => a,
            _ => unreachable!("just inserted"),
        }
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

/// Parse a full `project.pbxproj` document into its root dictionary.
pub(crate) fn parse(text: &str) -> Result<Dict> {
    let mut parser = Parser {
        chars: text.chars().collect(),
        pos: 0,
    };

    parser.skip_junk();
    let root = parser.parse_dict()?;
    parser.skip_junk();
    if !parser.at_end() {
        return Err(Error::Parse(format!(
            "trailing content at offset {}",
            parser.pos
        )));
    }

    Ok(root)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expect(&mut self, c: char) -> Result<()> {
        match self.bump() {
            Some(got) if got == c => Ok(()),
            got => Err(Error::Parse(format!(
                "expected `{c}` at offset {}, found {got:?}",
                self.pos
            ))),
        }
    }

    /// Skip whitespace and both comment forms.
    fn skip_junk(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'/') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.chars.get(self.pos + 1) == Some(&'*') => {
                    self.pos += 2;
                    while !self.at_end() {
                        if self.peek() == Some('*') && self.chars.get(self.pos + 1) == Some(&'/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        self.skip_junk();
        match self.peek() {
            Some('{') => Ok(Value::Dict(self.parse_dict()?)),
            Some('(') => Ok(Value::Array(self.parse_array()?)),
            _ => Ok(Value::String(self.parse_string()?)),
        }
    }

    fn parse_dict(&mut self) -> Result<Dict> {
        self.expect('{')?;
        let mut dict = Dict::new();

        loop {
            self.skip_junk();
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(dict);
            }
            if self.at_end() {
                return Err(Error::Parse("unterminated dictionary".to_string()));
            }

            let key = self.parse_string()?;
            self.skip_junk();
            self.expect('=')?;
            let value = self.parse_value()?;
            self.skip_junk();
            self.expect(';')?;

            dict.insert(key, value);
        }
    }

    fn parse_array(&mut self) -> Result<Vec<Value>> {
        self.expect('(')?;
        let mut items = Vec::new();

        loop {
            self.skip_junk();
            if self.peek() == Some(')') {
                self.pos += 1;
                return Ok(items);
            }
            if self.at_end() {
                return Err(Error::Parse("unterminated array".to_string()));
            }

            items.push(self.parse_value()?);
            self.skip_junk();
            if self.peek() == Some(',') {
                self.pos += 1;
            }
        }
    }

    fn parse_string(&mut self) -> Result<String> {
        self.skip_junk();
        match self.peek() {
            Some('"') => self.parse_quoted(),
            Some(c) if is_bare_char(c) => {
                let mut s = String::new();
                while let Some(c) = self.peek() {
                    if !is_bare_char(c) {
                        break;
                    }
                    s.push(c);
                    self.pos += 1;
                }
                Ok(s)
            }
            got => Err(Error::Parse(format!(
                "expected a string at offset {}, found {got:?}",
                self.pos
            ))),
        }
    }

    fn parse_quoted(&mut self) -> Result<String> {
        self.expect('"')?;
        let mut s = String::new();

        loop {
            match self.bump() {
                None => return Err(Error::Parse("unterminated string".to_string())),
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(Error::Parse("unterminated escape".to_string())),
                },
                Some(c) => s.push(c),
            }
        }
    }
}

fn is_bare_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '/' | '.' | '-' | ':')
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || !s.chars().all(is_bare_char)
}

fn write_string(out: &mut String, s: &str) {
    if !needs_quoting(s) {
        out.push_str(s);
        return;
    }

    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str("(\n");
            for item in items {
                indent(out, depth + 1);
                write_value(out, item, depth + 1);
                out.push_str(",\n");
            }
            indent(out, depth);
            out.push(')');
        }
        Value::Dict(dict) => {
            out.push_str("{\n");
            for (key, val) in dict.entries() {
                indent(out, depth + 1);
                write_string(out, key);
                out.push_str(" = ");
                write_value(out, val, depth + 1);
                out.push_str(";\n");
            }
            indent(out, depth);
            out.push('}');
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Serialize a root dictionary back into pbxproj text.
pub(crate) fn serialize(root: &Dict) -> String {
    let mut out = String::new();
    _ = writeln!(out, "// !$*UTF8*$!");
    write_value(&mut out, &Value::Dict(root.clone()), 0);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_strings_arrays_and_dicts() {
        let root = parse(
            r#"// !$*UTF8*$!
{
    archiveVersion = 1;
    classes = {
    };
    objects = {
        AA /* a comment */ = {
            isa = PBXGroup;
            children = (
                BB,
                CC,
            );
            sourceTree = "<group>";
        };
    };
    rootObject = AA;
}"#,
        )
        .unwrap();

        assert_eq!(root.get_str("archiveVersion"), Some("1"));
        assert_eq!(root.get_str("rootObject"), Some("AA"));

        let objects = root.get("objects").unwrap().as_dict().unwrap();
        let group = objects.get("AA").unwrap().as_dict().unwrap();
        assert_eq!(group.get_str("isa"), Some("PBXGroup"));
        assert_eq!(group.get_str("sourceTree"), Some("<group>"));
        assert_eq!(
            group.get("children").unwrap().as_array().unwrap().len(),
            2
        );
    }

    #[test]
    fn quoted_strings_unescape() {
        let root = parse(r#"{ a = "hello \"world\"\n"; }"#).unwrap();
        assert_eq!(root.get_str("a"), Some("hello \"world\"\n"));
    }

    #[test]
    fn serialization_round_trips() {
        let text = r#"{
    name = ShareExt;
    path = "Share Extension";
    children = (
        AA,
    );
    settings = {
        PRODUCT_NAME = ShareExt;
    };
}"#;
        let root = parse(text).unwrap();
        let reparsed = parse(&serialize(&root)).unwrap();
        assert_eq!(root, reparsed);
    }

    #[test]
    fn bare_strings_stay_bare_and_specials_get_quoted() {
        let mut dict = Dict::new();
        dict.insert("sourceTree", Value::string("<group>"));
        dict.insert("path", Value::string("ShareExtension"));

        let out = serialize(&dict);
        assert!(out.contains("sourceTree = \"<group>\";"));
        assert!(out.contains("path = ShareExtension;"));
    }

    #[test]
    fn trailing_garbage_is_an_error() {
        assert!(parse("{ a = 1; } nope").is_err());
    }
}
