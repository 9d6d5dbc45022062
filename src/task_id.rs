use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Identifier of a task or subtask across both backends.
///
/// Local task files address top-level tasks by positive integer and subtasks
/// by `parent.sub`; the remote tracker uses project-prefixed keys such as
/// `PROJ-123`. Anything else found in a dependency list is kept verbatim as
/// an opaque key so it can still be reported and removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Task(u64),
    Subtask { parent: u64, sub: u64 },
    Key(String),
}

impl TaskId {
    pub fn subtask(parent: u64, sub: u64) -> Self {
        Self::Subtask { parent, sub }
    }

    pub fn key(value: impl Into<String>) -> Self {
        Self::Key(value.into())
    }

    pub fn is_subtask(&self) -> bool {
        matches!(self, Self::Subtask { .. })
    }

    /// Parent task number for composite subtask addresses.
    pub fn parent(&self) -> Option<u64> {
        match self {
            Self::Subtask { parent, .. } => Some(*parent),
            _ => None,
        }
    }

    fn parse_number(digits: &str) -> Result<u64, TaskIdParseError> {
        let n = digits
            .parse::<u64>()
            .map_err(|_| TaskIdParseError::OutOfRange(digits.to_string()))?;
        if n == 0 {
            return Err(TaskIdParseError::Zero);
        }
        Ok(n)
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(n) => write!(f, "{n}"),
            Self::Subtask { parent, sub } => write!(f, "{parent}.{sub}"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

impl FromStr for TaskId {
    type Err = TaskIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TaskIdParseError::Empty);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(TaskIdParseError::Whitespace);
        }

        if is_digits(trimmed) {
            return Ok(Self::Task(Self::parse_number(trimmed)?));
        }

        // Dotted form is only a subtask address when both halves are numeric;
        // otherwise the token is kept as an opaque key.
        if let Some((parent, sub)) = trimmed.split_once('.')
            && is_digits(parent)
            && is_digits(sub)
        {
            return Ok(Self::Subtask {
                parent: Self::parse_number(parent)?,
                sub: Self::parse_number(sub)?,
            });
        }

        Ok(Self::Key(trimmed.to_string()))
    }
}

impl From<u64> for TaskId {
    fn from(value: u64) -> Self {
        Self::Task(value)
    }
}

impl TryFrom<&str> for TaskId {
    type Error = TaskIdParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Task(n) => serializer.serialize_u64(*n),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TaskIdVisitor;

        impl serde::de::Visitor<'_> for TaskIdVisitor {
            type Value = TaskId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a positive task number, a `parent.sub` address, or a tracker key")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if value == 0 {
                    return Err(E::custom(TaskIdParseError::Zero));
                }
                Ok(TaskId::Task(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if value < 0 {
                    return Err(E::custom("task id cannot be negative"));
                }
                self.visit_u64(value as u64)
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                self.visit_str(&value)
            }
        }

        deserializer.deserialize_any(TaskIdVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIdParseError {
    Empty,
    Whitespace,
    Zero,
    OutOfRange(String),
}

impl fmt::Display for TaskIdParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "task id cannot be empty"),
            Self::Whitespace => write!(f, "task id cannot contain whitespace"),
            Self::Zero => write!(f, "task numbers start at 1"),
            Self::OutOfRange(digits) => write!(f, "task number {digits} is out of range"),
        }
    }
}

impl std::error::Error for TaskIdParseError {}
