//! ODBC connection strings.
//!
//! `key=value;` pairs, keys compared case-insensitively. A value wrapped in
//! braces may contain `;`, and `}}` inside braces stands for `}`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionString {
    attributes: Vec<(String, String)>,
}

impl ConnectionString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self> {
        let mut attributes = Self::new();
        let mut rest = input;

        loop {
            rest = rest.trim_start_matches(|c: char| c == ';' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }

            let Some(eq) = rest.find('=') else {
                return Err(Error::Config(format!("missing '=' in segment {rest:?}")));
            };
            let key = rest[..eq].trim();
            if key.is_empty() || key.contains(';') {
                let segment = rest.split(';').next().unwrap_or(rest);
                return Err(Error::Config(format!("missing key in segment {segment:?}")));
            }
            rest = rest[eq + 1..].trim_start();

            let value = if let Some(braced) = rest.strip_prefix('{') {
                let (value, consumed) = read_braced(braced)?;
                rest = &braced[consumed..];
                match rest.trim_start().strip_prefix(';') {
                    Some(after) => rest = after,
                    None if rest.trim().is_empty() => rest = "",
                    None => {
                        return Err(Error::Config(format!(
                            "unexpected text after braced value of {key:?}"
                        )))
                    }
                }
                value
            } else {
                let end = rest.find(';').unwrap_or(rest.len());
                let value = rest[..end].trim().to_owned();
                rest = &rest[end..];
                value
            };

            attributes.set(key, value);
        }

        Ok(attributes)
    }

    /// Value of `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// Sets `key`, replacing an existing attribute in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self
            .attributes
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(key))?;
        Some(self.attributes.remove(index).1)
    }

    pub fn driver(&mut self, driver: impl Into<String>) -> &mut Self {
        self.set("Driver", driver)
    }

    pub fn dsn(&mut self, dsn: impl Into<String>) -> &mut Self {
        self.set("DSN", dsn)
    }

    pub fn server(&mut self, server: impl Into<String>) -> &mut Self {
        self.set("Server", server)
    }

    pub fn database(&mut self, database: impl Into<String>) -> &mut Self {
        self.set("Database", database)
    }

    pub fn user(&mut self, user: impl Into<String>) -> &mut Self {
        self.set("UID", user)
    }

    pub fn password(&mut self, password: impl Into<String>) -> &mut Self {
        self.set("PWD", password)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Reads up to the closing brace; returns the value and bytes consumed.
fn read_braced(input: &str) -> Result<(String, usize)> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
        if c == '}' {
            if let Some(&(_, '}')) = chars.peek() {
                chars.next();
                value.push('}');
                continue;
            }
            return Ok((value, index + 1));
        }
        value.push(c);
    }
    Err(Error::Config("unterminated '{' in value".to_owned()))
}

fn needs_braces(value: &str) -> bool {
    value.starts_with('{')
        || value.contains(';')
        || value.contains('}')
        || value != value.trim()
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.attributes {
            if needs_braces(value) {
                write!(f, "{key}={{{}}};", value.replace('}', "}}"))?;
            } else {
                write!(f, "{key}={value};")?;
            }
        }
        Ok(())
    }
}

impl FromStr for ConnectionString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_pairs() {
        let conn = ConnectionString::parse("Driver=FreeTDS;Server=db1; Database = sales ;;").unwrap();
        assert_eq!(conn.get("driver"), Some("FreeTDS"));
        assert_eq!(conn.get("SERVER"), Some("db1"));
        assert_eq!(conn.get("database"), Some("sales"));
        assert_eq!(conn.get("uid"), None);
    }

    #[test]
    fn braced_values_keep_separators() {
        let conn = ConnectionString::parse("PWD={a;b}}c};UID=sa").unwrap();
        assert_eq!(conn.get("pwd"), Some("a;b}c"));
        assert_eq!(conn.get("uid"), Some("sa"));
    }

    #[test]
    fn segment_without_equals_is_rejected() {
        let err = ConnectionString::parse("Server=db1;garbage").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unterminated_brace_is_rejected() {
        assert!(ConnectionString::parse("PWD={abc").is_err());
    }

    #[test]
    fn display_braces_when_needed() {
        let mut conn = ConnectionString::new();
        conn.server("localhost").password("p;w}d").user("sa");
        let rendered = conn.to_string();
        assert_eq!(rendered, "Server=localhost;PWD={p;w}}d};UID=sa;");
        assert_eq!(ConnectionString::parse(&rendered).unwrap(), conn);
    }

    #[test]
    fn set_replaces_case_insensitively() {
        let mut conn: ConnectionString = "server=a".parse().unwrap();
        conn.server("b");
        assert_eq!(conn.iter().count(), 1);
        assert_eq!(conn.get("Server"), Some("b"));
        assert_eq!(conn.remove("SERVER").as_deref(), Some("b"));
        assert!(conn.is_empty());
    }
}
