//! Author and committer value objects
//!
//! A signature is an identity (`Name <email>`) plus a timestamp with its
//! UTC offset, rendered the way commit and tag headers store them:
//! `Name <email> 1640995200 +0200`.

use crate::errors::{GitError, Result};
use chrono::{DateTime, FixedOffset};

/// Who authored or committed: a name and an email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    name: String,
    email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Identity {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parse `Name <email>`: the name is the trimmed text left of the
    /// first `<`, the email the text between `<` and `>`.
    pub fn parse(text: &str) -> Result<Self> {
        let open = text
            .find('<')
            .ok_or_else(|| GitError::InvalidFormat(format!("missing '<' in identity {text:?}")))?;
        let close = text
            .find('>')
            .ok_or_else(|| GitError::InvalidFormat(format!("missing '>' in identity {text:?}")))?;
        if close < open {
            return Err(GitError::InvalidFormat(format!(
                "malformed identity {text:?}"
            )));
        }

        Ok(Identity {
            name: text[..open].trim().to_string(),
            email: text[open + 1..close].to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// An identity stamped with seconds-from-epoch and a UTC offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    identity: Identity,
    timestamp: DateTime<FixedOffset>,
}

impl Signature {
    pub fn new(identity: Identity, timestamp: DateTime<FixedOffset>) -> Self {
        Signature {
            identity,
            timestamp,
        }
    }

    /// Parse the header text form `Name <email> <seconds> ±HHMM`.
    pub fn parse(text: &str) -> Result<Self> {
        // split from the right: offset, seconds, then the identity remainder
        let parts: Vec<&str> = text.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(GitError::InvalidFormat(format!(
                "malformed signature {text:?}"
            )));
        }

        let offset = parse_offset(parts[0])?;
        let seconds = parts[1]
            .parse::<i64>()
            .map_err(|_| GitError::InvalidFormat(format!("invalid timestamp {:?}", parts[1])))?;
        let identity = Identity::parse(parts[2])?;

        let timestamp = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| GitError::InvalidFormat(format!("timestamp {seconds} out of range")))?
            .with_timezone(&offset);

        Ok(Signature {
            identity,
            timestamp,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.timestamp
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.identity,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }
}

/// Parse a `±HHMM` offset into a fixed timezone.
fn parse_offset(text: &str) -> Result<FixedOffset> {
    let bytes = text.as_bytes();
    if bytes.len() != 5 || (bytes[0] != b'+' && bytes[0] != b'-') {
        return Err(GitError::InvalidFormat(format!(
            "invalid timezone offset {text:?}"
        )));
    }

    let hours = text[1..3]
        .parse::<i32>()
        .map_err(|_| GitError::InvalidFormat(format!("invalid timezone offset {text:?}")))?;
    let minutes = text[3..5]
        .parse::<i32>()
        .map_err(|_| GitError::InvalidFormat(format!("invalid timezone offset {text:?}")))?;

    let mut total = (hours * 60 + minutes) * 60;
    if bytes[0] == b'-' {
        total = -total;
    }

    FixedOffset::east_opt(total)
        .ok_or_else(|| GitError::InvalidFormat(format!("invalid timezone offset {text:?}")))
}
