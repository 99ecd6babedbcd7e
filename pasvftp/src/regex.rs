//! # FTP Regex
//!
//! Regular expressions to parse FTP replies

use lazy_regex::{Lazy, Regex};

/// Extracts the six comma separated numbers of a PASV reply (h1,h2,h3,h4,p1,p2).
/// Parentheses are optional, since some servers omit them.
pub static PASV_PORT_RE: Lazy<Regex> =
    lazy_regex!(r"(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3}),\s*(\d{1,3})");

/// Extracts the file size from the text of a SIZE reply.
pub static SIZE_RE: Lazy<Regex> = lazy_regex!(r"(\d+)\s*$");
