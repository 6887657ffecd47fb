//! OpenStep property list codec for `project.pbxproj`
//!
//! Supports the subset Xcode writes: dictionaries, arrays and strings (quoted
//! or bare), with `//` and `/* */` comments. Comments are dropped on read and
//! regenerated as section markers on write.

use std::collections::BTreeMap;
use std::fmt::Write as _;

/// A property list value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Array(Vec<Value>),
    Dictionary(Dictionary),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dictionary_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Dictionary> for Value {
    fn from(dict: Dictionary) -> Self {
        Value::Dictionary(dict)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// An insertion-ordered dictionary
///
/// Equality ignores key order, as property list dictionaries do.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    entries: Vec<(String, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace; new keys are appended
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(existing) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Dictionary {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| o == v))
    }
}

impl Eq for Dictionary {}

/// Error produced while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse a property list whose root is a dictionary
pub fn parse(text: &str) -> Result<Dictionary, ParseError> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
    };

    parser.skip_trivia()?;
    let root = match parser.value()? {
        Value::Dictionary(dict) => dict,
        _ => return Err(parser.error("root object is not a dictionary")),
    };
    parser.skip_trivia()?;
    if parser.pos < parser.bytes.len() {
        return Err(parser.error("unexpected content after root dictionary"));
    }
    Ok(root)
}

fn is_bare(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'/' | b':' | b'.' | b'-' | b'+')
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> ParseError {
        let end = self.pos.min(self.text.len());
        let line = self.bytes[..end].iter().filter(|b| **b == b'\n').count() + 1;
        ParseError {
            line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(prefix)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.starts_with(b"//") => {
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.starts_with(b"/*") => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos >= self.bytes.len() {
                            self.pos = start;
                            return Err(self.error("unterminated comment"));
                        }
                        if self.starts_with(b"*/") {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), ParseError> {
        self.skip_trivia()?;
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected as char)))
        }
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => self.dictionary().map(Value::Dictionary),
            Some(b'(') => self.array().map(Value::Array),
            Some(b'"') | Some(b'\'') => self.quoted().map(Value::String),
            Some(b) if is_bare(b) => Ok(Value::String(self.bare())),
            Some(b) => Err(self.error(format!("unexpected character '{}'", b as char))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn key(&mut self) -> Result<String, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'"') | Some(b'\'') => self.quoted(),
            Some(b) if is_bare(b) => Ok(self.bare()),
            _ => Err(self.error("expected dictionary key")),
        }
    }

    fn dictionary(&mut self) -> Result<Dictionary, ParseError> {
        self.pos += 1;
        let mut dict = Dictionary::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(dict);
                }
                None => return Err(self.error("unterminated dictionary")),
                _ => {}
            }
            let key = self.key()?;
            self.expect(b'=')?;
            let value = self.value()?;
            self.expect(b';')?;
            dict.insert(key, value);
        }
    }

    fn array(&mut self) -> Result<Vec<Value>, ParseError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(items);
                }
                None => return Err(self.error("unterminated array")),
                _ => {}
            }
            items.push(self.value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {}
                _ => return Err(self.error("expected ',' or ')' in array")),
            }
        }
    }

    fn bare(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_bare) {
            self.pos += 1;
        }
        self.text[start..self.pos].to_string()
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let quote = self.bytes[self.pos];
        let start = self.pos;
        self.pos += 1;
        let mut out: Vec<u8> = Vec::new();

        loop {
            let Some(b) = self.peek() else {
                self.pos = start;
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;

            if b == quote {
                break;
            }
            if b != b'\\' {
                out.push(b);
                continue;
            }

            let Some(escaped) = self.peek() else {
                self.pos = start;
                return Err(self.error("unterminated string"));
            };
            self.pos += 1;
            match escaped {
                b'n' => out.push(b'\n'),
                b't' => out.push(b'\t'),
                b'r' => out.push(b'\r'),
                b'U' | b'u' => {
                    let digits = self
                        .text
                        .get(self.pos..self.pos + 4)
                        .ok_or_else(|| self.error("truncated unicode escape"))?;
                    let code = u32::from_str_radix(digits, 16)
                        .map_err(|_| self.error("invalid unicode escape"))?;
                    let ch = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
                    let mut buf = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                    self.pos += 4;
                }
                other => out.push(other),
            }
        }

        String::from_utf8(out).map_err(|_| self.error("string is not valid UTF-8"))
    }
}

/// Serialize a root dictionary in Xcode's layout
pub fn write(root: &Dictionary) -> String {
    let mut out = String::from("// !$*UTF8*$!\n");
    write_dictionary(&mut out, root, 0, true);
    out.push('\n');
    out
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push('\t');
    }
}

fn write_string(out: &mut String, s: &str) {
    let bare = !s.is_empty()
        && s.bytes().all(is_bare)
        && !s.contains("//")
        && !s.contains("/*");
    if bare {
        out.push_str(s);
        return;
    }

    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn write_value(out: &mut String, value: &Value, level: usize) {
    match value {
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push_str("(\n");
            for item in items {
                indent(out, level + 1);
                write_value(out, item, level + 1);
                out.push_str(",\n");
            }
            indent(out, level);
            out.push(')');
        }
        Value::Dictionary(dict) => write_dictionary(out, dict, level, false),
    }
}

fn write_dictionary(out: &mut String, dict: &Dictionary, level: usize, is_root: bool) {
    out.push_str("{\n");
    for (key, value) in dict.iter() {
        indent(out, level + 1);
        write_string(out, key);
        out.push_str(" = ");
        match value {
            Value::Dictionary(objects) if is_root && key == "objects" => {
                write_objects(out, objects, level + 1)
            }
            _ => write_value(out, value, level + 1),
        }
        out.push_str(";\n");
    }
    indent(out, level);
    out.push('}');
}

fn write_inline(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('(');
            for item in items {
                write_inline(out, item);
                out.push_str(", ");
            }
            out.push(')');
        }
        Value::Dictionary(dict) => {
            out.push('{');
            for (key, value) in dict.iter() {
                write_string(out, key);
                out.push_str(" = ");
                write_inline(out, value);
                out.push_str("; ");
            }
            out.push('}');
        }
    }
}

/// Objects are grouped into per-isa sections sorted by isa, then id
fn write_objects(out: &mut String, objects: &Dictionary, level: usize) {
    let mut sections: BTreeMap<&str, Vec<(&str, &Value)>> = BTreeMap::new();
    for (id, object) in objects.iter() {
        let isa = object
            .as_dictionary()
            .and_then(|d| d.get_str("isa"))
            .unwrap_or("");
        sections.entry(isa).or_default().push((id, object));
    }

    out.push_str("{\n");
    for (isa, mut entries) in sections {
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let _ = write!(out, "\n/* Begin {} section */\n", isa);
        let single_line = matches!(isa, "PBXBuildFile" | "PBXFileReference");
        for (id, object) in entries {
            indent(out, level + 1);
            write_string(out, id);
            out.push_str(" = ");
            if single_line {
                write_inline(out, object);
            } else {
                write_value(out, object, level + 1);
            }
            out.push_str(";\n");
        }
        let _ = writeln!(out, "/* End {} section */", isa);
    }
    indent(out, level);
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 56;
	objects = {

/* Begin PBXBuildFile section */
		B1 /* App.swift in Sources */ = {isa = PBXBuildFile; fileRef = F1 /* App.swift */; };
/* End PBXBuildFile section */

/* Begin PBXFileReference section */
		F1 /* App.swift */ = {isa = PBXFileReference; lastKnownFileType = sourcecode.swift; path = App.swift; sourceTree = "<group>"; };
/* End PBXFileReference section */

/* Begin PBXGroup section */
		G1 = {
			isa = PBXGroup;
			children = (
				F1 /* App.swift */,
			);
			name = "My \"App\"";
			sourceTree = "<group>";
		};
/* End PBXGroup section */
	};
	rootObject = G1 /* Project object */;
}
"#;

    #[test]
    fn test_parse_sample() {
        let root = parse(SAMPLE).unwrap();

        assert_eq!(root.get_str("objectVersion"), Some("56"));
        assert_eq!(root.get_str("rootObject"), Some("G1"));
        assert!(root.get("classes").unwrap().as_dictionary().unwrap().is_empty());

        let objects = root.get("objects").unwrap().as_dictionary().unwrap();
        assert_eq!(objects.len(), 3);

        let group = objects.get("G1").unwrap().as_dictionary().unwrap();
        assert_eq!(group.get_str("name"), Some("My \"App\""));
        assert_eq!(group.get_str("sourceTree"), Some("<group>"));
        let children = group.get("children").unwrap().as_array().unwrap();
        assert_eq!(children, &vec![Value::from("F1")]);
    }

    #[test]
    fn test_write_then_parse_preserves_document() {
        let root = parse(SAMPLE).unwrap();
        let written = write(&root);
        let reparsed = parse(&written).unwrap();

        assert_eq!(root, reparsed);
        // Writing is a fixed point after the first pass
        assert_eq!(write(&reparsed), written);
    }

    #[test]
    fn test_writer_layout() {
        let root = parse(SAMPLE).unwrap();
        let written = write(&root);

        assert!(written.starts_with("// !$*UTF8*$!\n{\n"));
        assert!(written.contains("/* Begin PBXGroup section */"));
        assert!(written.contains("\t\tB1 = {isa = PBXBuildFile; fileRef = F1; };\n"));
        assert!(written.contains("sourceTree = \"<group>\";"));
        assert!(written.contains("name = \"My \\\"App\\\"\";"));
    }

    #[test]
    fn test_urls_are_quoted() {
        let root = Dictionary::new().with("repositoryURL", "https://github.com/org/repo");
        let written = write(&root);
        assert!(written.contains("repositoryURL = \"https://github.com/org/repo\";"));
        assert_eq!(parse(&written).unwrap(), root);
    }

    #[test]
    fn test_dictionary_equality_ignores_order() {
        let a = Dictionary::new().with("isa", "PBXGroup").with("path", "Data");
        let b = Dictionary::new().with("path", "Data").with("isa", "PBXGroup");
        assert_eq!(a, b);
        assert_ne!(a, Dictionary::new().with("isa", "PBXGroup"));
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut dict = Dictionary::new().with("path", "Old");
        dict.insert("path", "New");
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_str("path"), Some("New"));
    }

    #[test]
    fn test_escapes() {
        let root = parse(r#"{ a = "line\nnext\ttab \\ \U00e9"; }"#).unwrap();
        assert_eq!(root.get_str("a"), Some("line\nnext\ttab \\ é"));
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse("{\n\ta = 1;\n\tb = ;\n}").unwrap_err();
        assert_eq!(err.line, 3);

        assert!(parse("{ a = (1, 2; }").is_err());
        assert!(parse("{ a = 1; } trailing").is_err());
        assert!(parse("( a )").is_err());
        assert!(parse("{ /* open").is_err());
        assert!(parse(r#"{ a = "open; }"#).is_err());
    }
}
