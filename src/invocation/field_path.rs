use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "[{}]", index),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldPathError {
    #[error("malformed field path `{path}` at byte {position}")]
    Malformed { path: String, position: usize },

    #[error("field '{0}' not found")]
    MissingKey(String),

    #[error("index {index} is out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot access {segment} on {kind}")]
    NotAContainer { segment: String, kind: &'static str },
}

/// Dotted/bracket path into a JSON response, e.g. `result[0].text`.
///
/// A bare numeric key (`choices.0`) also indexes arrays.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        let malformed = |position: usize| FieldPathError::Malformed {
            path: path.to_string(),
            position,
        };

        let mut segments = Vec::new();
        let mut key = String::new();
        let mut chars = path.char_indices().peekable();
        // true right after `]`, where only `.` or `[` may follow
        let mut after_index = false;

        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(malformed(pos));
                    }
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    after_index = false;
                    if chars.peek().is_none() {
                        return Err(malformed(pos));
                    }
                }
                '[' => {
                    if !key.is_empty() {
                        segments.push(PathSegment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some((_, ']')) if !digits.is_empty() => break,
                            Some((p, _)) => return Err(malformed(p)),
                            None => return Err(malformed(path.len())),
                        }
                    }
                    let index = digits.parse().map_err(|_| malformed(pos))?;
                    segments.push(PathSegment::Index(index));
                    after_index = true;
                }
                ']' => return Err(malformed(pos)),
                _ if after_index => return Err(malformed(pos)),
                _ => key.push(c),
            }
        }
        if !key.is_empty() {
            segments.push(PathSegment::Key(key));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Walk `value` along the path. An empty path yields `value` itself.
    pub fn extract<'a>(&self, value: &'a Value) -> Result<&'a Value, FieldPathError> {
        let mut current = value;
        for segment in &self.segments {
            current = match (segment, current) {
                (PathSegment::Index(index), Value::Array(items)) => items
                    .get(*index)
                    .ok_or(FieldPathError::IndexOutOfRange { index: *index, len: items.len() })?,
                (PathSegment::Key(key), Value::Array(items)) if key.bytes().all(|b| b.is_ascii_digit()) => {
                    let index: usize = key.parse().map_err(|_| FieldPathError::MissingKey(key.clone()))?;
                    items
                        .get(index)
                        .ok_or(FieldPathError::IndexOutOfRange { index, len: items.len() })?
                }
                (PathSegment::Key(key), Value::Object(map)) => map
                    .get(key)
                    .ok_or_else(|| FieldPathError::MissingKey(key.clone()))?,
                (segment, other) => {
                    return Err(FieldPathError::NotAContainer {
                        segment: segment.to_string(),
                        kind: kind_of(other),
                    });
                }
            };
        }
        Ok(current)
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
