use std::path::PathBuf;
use std::str::FromStr;

use pasvftp::{FileType, FormatControl};

pub enum Command {
    Appe(PathBuf, String),
    Connect(String),
    Get(String, PathBuf),
    Help,
    Login,
    Ls(Option<String>),
    Mkdir(String),
    Noop,
    Put(PathBuf, String),
    Quit,
    Rm(String),
    Rmdir(String),
    Size(String),
    Type(FileType),
}

impl FromStr for Command {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Split string by space
        let mut args = s.split_ascii_whitespace();
        // Match args
        match args.next() {
            Some(cmd) => match cmd.to_ascii_uppercase().as_str() {
                "APPE" => {
                    let local: PathBuf = match args.next() {
                        Some(l) => PathBuf::from(l),
                        None => return Err("Missing `source` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Appe(local, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "CONNECT" => match args.next() {
                    Some(addr) => Ok(Self::Connect(addr.to_string())),
                    None => Err("Missing `addr` field"),
                },
                "GET" => {
                    let file: String = match args.next() {
                        Some(f) => f.to_string(),
                        None => return Err("Missing `file` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Get(file, PathBuf::from(d))),
                        None => Err("Missing `dest` field"),
                    }
                }
                "HELP" => Ok(Self::Help),
                "LOGIN" => Ok(Self::Login),
                "LS" => Ok(Self::Ls(args.next().map(|d| d.to_string()))),
                "MKDIR" => match args.next() {
                    Some(dir) => Ok(Self::Mkdir(dir.to_string())),
                    None => Err("Missing `dir` field"),
                },
                "NOOP" => Ok(Self::Noop),
                "PUT" => {
                    let local: PathBuf = match args.next() {
                        Some(l) => PathBuf::from(l),
                        None => return Err("Missing `source` field"),
                    };
                    match args.next() {
                        Some(d) => Ok(Self::Put(local, d.to_string())),
                        None => Err("Missing `dest` field"),
                    }
                }
                "QUIT" => Ok(Self::Quit),
                "RM" => match args.next() {
                    Some(file) => Ok(Self::Rm(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "RMDIR" => match args.next() {
                    Some(dir) => Ok(Self::Rmdir(dir.to_string())),
                    None => Err("Missing `dir` field"),
                },
                "SIZE" => match args.next() {
                    Some(file) => Ok(Self::Size(file.to_string())),
                    None => Err("Missing `file` field"),
                },
                "TYPE" => match args.next().map(|t| t.to_ascii_uppercase()).as_deref() {
                    Some("A") => Ok(Self::Type(FileType::Ascii(FormatControl::Default))),
                    Some("I") => Ok(Self::Type(FileType::Binary)),
                    Some(_) => Err("Invalid type"),
                    None => Err("Missing `type` field"),
                },
                _ => Err("Unknown command"),
            },
            None => Err("Unknown command"),
        }
    }
}
