use std::{fmt, str::FromStr};
use thiserror::Error;

/// Keyword that starts every request line.
pub const ROI_COMMAND: &str = "ROI";

/// Maximum number of response bytes read per call.
pub const MAX_RESPONSE_LEN: usize = 1024;

/// A region of interest. The coordinate space belongs to the caller and
/// values are passed through without range checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Roi {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Roi {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Moves the origin by `delta` on both axes, wrapping at the `i32`
    /// bounds.
    pub fn offset(&self, delta: i32) -> Self {
        Self {
            x: self.x.wrapping_add(delta),
            y: self.y.wrapping_add(delta),
            ..*self
        }
    }

    /// The request as it goes on the wire, `ROI <x> <y> <w> <h>\n`.
    pub fn request_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { x, y, w, h } = self;
        write!(f, "{} {} {} {} {}", ROI_COMMAND, x, y, w, h)
    }
}

impl From<[i32; 4]> for Roi {
    fn from([x, y, w, h]: [i32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl TryFrom<&[i32]> for Roi {
    type Error = ProtocolError;

    fn try_from(values: &[i32]) -> Result<Self, Self::Error> {
        let values: [i32; 4] = values
            .try_into()
            .map_err(|_| ProtocolError::FieldCount(values.len()))?;
        Ok(values.into())
    }
}

impl FromStr for Roi {
    type Err = ProtocolError;

    /// Parses a request line. Fields after the fourth are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some(ROI_COMMAND) => {}
            Some(other) => return Err(ProtocolError::UnknownCommand(other.to_string())),
            None => return Err(ProtocolError::UnknownCommand(String::new())),
        }

        let fields: Vec<&str> = tokens.take(4).collect();
        if fields.len() < 4 {
            return Err(ProtocolError::FieldCount(fields.len()));
        }

        let mut values = [0i32; 4];
        for (value, field) in values.iter_mut().zip(&fields) {
            *value = field
                .parse()
                .map_err(|_| ProtocolError::InvalidInteger(field.to_string()))?;
        }

        Ok(values.into())
    }
}

/// Turns the raw bytes of a response into its text: everything before the
/// first newline, lossily decoded.
pub fn decode_response(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|&byte| byte == b'\n')
        .unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    #[error("expected 4 ROI fields, got {0}")]
    FieldCount(usize),

    #[error("invalid integer {0:?}")]
    InvalidInteger(String),
}
