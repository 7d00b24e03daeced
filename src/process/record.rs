//! Decoding of the raw per-process records handed out by the provider.
//!
//! Every function here takes the record text and nothing else; which process
//! it came from is the caller's business.

use crate::error::ParseError;

/// Longest name kept; longer names are cut at a char boundary.
pub const MAX_NAME_LEN: usize = 255;

/// Accumulated CPU time of a process, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuTicks {
    pub user: u64,
    pub system: u64,
}

impl CpuTicks {
    pub fn total(&self) -> u64 {
        self.user.saturating_add(self.system)
    }
}

pub fn parse_name(raw: &str) -> Result<String, ParseError> {
    let name = strip_line_terminator(raw);
    if name.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(truncate_name(name))
}

fn strip_line_terminator(raw: &str) -> &str {
    let s = raw.strip_suffix('\n').unwrap_or(raw);
    s.strip_suffix('\r').unwrap_or(s)
}

fn truncate_name(name: &str) -> String {
    match name.char_indices().nth(MAX_NAME_LEN) {
        Some((cut, _)) => name[..cut].to_string(),
        None => name.to_string(),
    }
}

/// Finds the `State:` line of a status record and returns its code, e.g. `S`
/// for `State:\tS (sleeping)`.
pub fn parse_state(raw: &str) -> Result<char, ParseError> {
    let value = raw
        .lines()
        .find_map(|line| line.strip_prefix("State:"))
        .ok_or(ParseError::MissingField("State"))?;

    let token = value
        .split_whitespace()
        .next()
        .ok_or(ParseError::MissingField("State"))?;

    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => Ok(code),
        _ => Err(ParseError::InvalidValue {
            field: "State",
            value: token.to_string(),
        }),
    }
}

/// Parses `"<resident> <virtual>"` page counts and converts them to kilobytes.
pub fn parse_memory(raw: &str, page_size: u64) -> Result<(u64, u64), ParseError> {
    let mut fields = raw.split_whitespace();
    let resident = parse_u64(fields.next(), "resident")?;
    let virt = parse_u64(fields.next(), "virtual")?;

    let kb_per_page = page_size / 1024;
    Ok((
        pages_to_kb(resident, kb_per_page, "resident")?,
        pages_to_kb(virt, kb_per_page, "virtual")?,
    ))
}

fn pages_to_kb(pages: u64, kb_per_page: u64, field: &'static str) -> Result<u64, ParseError> {
    pages.checked_mul(kb_per_page).ok_or_else(|| ParseError::InvalidValue {
        field,
        value: pages.to_string(),
    })
}

/// Extracts user and system ticks, the 14th and 15th fields of a stat line.
pub fn parse_cpu_ticks(raw: &str) -> Result<CpuTicks, ParseError> {
    let line = raw.lines().next().ok_or(ParseError::Empty)?;

    // The name in field 2 is wrapped in parentheses and may hold spaces, so
    // count from the closing one when it is there (it leaves field 3 first).
    let (rest, first_field) = match line.rfind(')') {
        Some(close) => (&line[close + 1..], 3),
        None => (line, 1),
    };

    let mut fields = rest.split_whitespace().skip(14 - first_field);
    let user = parse_u64(fields.next(), "utime")?;
    let system = parse_u64(fields.next(), "stime")?;
    Ok(CpuTicks { user, system })
}

fn parse_u64(field: Option<&str>, name: &'static str) -> Result<u64, ParseError> {
    let field = field.ok_or(ParseError::MissingField(name))?;
    field.parse().map_err(|_| ParseError::InvalidValue {
        field: name,
        value: field.to_string(),
    })
}
