//! Shell replies, rendered the way redis-cli prints them

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ok,
    Nil,
    Status(String),
    Bulk(String),
    Integer(i64),
    Array(Vec<String>),
    Error(String),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Ok => write!(f, "OK"),
            Reply::Nil => write!(f, "(nil)"),
            Reply::Status(s) => write!(f, "{}", s),
            Reply::Bulk(s) => write!(f, "\"{}\"", s),
            Reply::Integer(n) => write!(f, "(integer) {}", n),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) \"{}\"", i + 1, item)?;
                }
                Ok(())
            }
            Reply::Error(msg) => write!(f, "(error) ERR {}", msg),
        }
    }
}
