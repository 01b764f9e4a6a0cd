//! Command parsing for the shell

use thiserror::Error;

/// A parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping(Option<String>),
    Get(String),
    Set(String, String),
    Del(Vec<String>),
    Exists(Vec<String>),
    Peek(String),
    Keys,
    DbSize,
    FlushDb,
    Info,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_uppercase().as_str() {
            "PING" => match args.as_slice() {
                [] => Command::Ping(None),
                [msg] => Command::Ping(Some(msg.to_string())),
                _ => return Err(ParseError::WrongArity("ping")),
            },
            "GET" => Command::Get(single(&args, "get")?),
            "PEEK" => Command::Peek(single(&args, "peek")?),
            "SET" => match args.split_first() {
                Some((key, value)) if !value.is_empty() => {
                    Command::Set(key.to_string(), value.join(" "))
                }
                _ => return Err(ParseError::WrongArity("set")),
            },
            "DEL" => Command::Del(at_least_one(&args, "del")?),
            "EXISTS" => Command::Exists(at_least_one(&args, "exists")?),
            "KEYS" => no_args(&args, "keys", Command::Keys)?,
            "DBSIZE" => no_args(&args, "dbsize", Command::DbSize)?,
            "FLUSHDB" => no_args(&args, "flushdb", Command::FlushDb)?,
            "INFO" => no_args(&args, "info", Command::Info)?,
            "QUIT" | "EXIT" => Command::Quit,
            _ => return Err(ParseError::Unknown(name.to_string())),
        };

        Ok(Some(command))
    }
}

fn single(args: &[&str], name: &'static str) -> Result<String, ParseError> {
    match args {
        [key] => Ok(key.to_string()),
        _ => Err(ParseError::WrongArity(name)),
    }
}

fn at_least_one(args: &[&str], name: &'static str) -> Result<Vec<String>, ParseError> {
    if args.is_empty() {
        return Err(ParseError::WrongArity(name));
    }
    Ok(args.iter().map(|s| s.to_string()).collect())
}

fn no_args(args: &[&str], name: &'static str, command: Command) -> Result<Command, ParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::WrongArity(name))
    }
}
