//! Line protocol definitions
//!
//! Every frame on the wire is one `\n`-terminated line, except the raw
//! payload that follows a file-transfer header. Input lines are decoded
//! once into a `ClientLine`; output lines are built as `ServerLine` and
//! rendered through `Display`.

use std::fmt;

/// Prefix marking the start of a file upload.
pub const FILE_MARKER: &str = "FILE:";

/// Client → Server line (after registration)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientLine {
    /// Plain chat text
    Chat(String),
    /// `FILE:<name>`, followed by a size line and the raw bytes
    FileStart(String),
}

impl ClientLine {
    /// Decode one trimmed input line.
    ///
    /// The file name is everything after the marker, taken verbatim.
    pub fn decode(line: &str) -> Self {
        match line.strip_prefix(FILE_MARKER) {
            Some(name) => ClientLine::FileStart(name.to_string()),
            None => ClientLine::Chat(line.to_string()),
        }
    }
}

/// Server → Client line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Every active room name
    Rooms(Vec<String>),
    /// Display names in the receiver's room, in join order
    Users(Vec<String>),
    /// Relayed chat message
    Chat { from: String, content: String },
    /// A member joined the room
    Joined { username: String },
    /// A member left the room
    Left { username: String },
    /// A member started uploading a file
    FileShared { from: String, filename: String },
    /// An upload finished
    FileComplete { filename: String },
}

impl fmt::Display for ServerLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerLine::Rooms(names) => write!(f, "Rooms: {}", names.join(", ")),
            ServerLine::Users(names) => write!(f, "Users: {}", names.join(", ")),
            ServerLine::Chat { from, content } => write!(f, "{}: {}", from, content),
            ServerLine::Joined { username } => write!(f, "{} has joined the room.", username),
            ServerLine::Left { username } => write!(f, "{} has left the room.", username),
            ServerLine::FileShared { from, filename } => {
                write!(f, "{} is sharing a file: {}", from, filename)
            }
            ServerLine::FileComplete { filename } => {
                write!(f, "File upload complete: {}", filename)
            }
        }
    }
}

impl ServerLine {
    /// Wire form including the trailing newline
    pub fn to_wire(&self) -> String {
        format!("{}\n", self)
    }
}

/// Decode raw line bytes: lossy UTF-8, surrounding whitespace removed.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}
