//! Parser for CDL, the text form of a NetCDF header printed by `ncdump`.
//!
//! Handles the subset of CDL that `ncdump -h` and `ncdump -v <var>` emit for
//! classic and flat netCDF-4 files:
//!
//! ```text
//! netcdf tas_EUR-11_... {
//! dimensions:
//!     time = UNLIMITED ; // (1826 currently)
//!     bnds = 2 ;
//! variables:
//!     double time(time) ;
//!         time:units = "days since 1949-12-01 00:00:00" ;
//!     float tas(time, rlat, rlon) ;
//!
//! // global attributes:
//!         :project_id = "CORDEX" ;
//! data:
//!
//!  time = 20454.5, 20455.5 ;
//! }
//! ```
//!
//! Nested groups and user-defined types are skipped.

use std::collections::BTreeMap;

use crate::error::{NetCdfError, NetCdfResult};

/// Value of a variable or global attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Numbers(Vec<f64>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Numbers(_) => None,
        }
    }

    /// Render the value as a string; numeric lists are space separated.
    pub fn to_text(&self) -> String {
        match self {
            AttrValue::Text(s) => s.clone(),
            AttrValue::Numbers(values) => values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// A declared dimension. `len` is `None` for `UNLIMITED` without a count.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub len: Option<usize>,
    pub unlimited: bool,
}

/// A declared variable with its attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub name: String,
    pub dtype: String,
    pub dimensions: Vec<String>,
    pub attributes: BTreeMap<String, AttrValue>,
}

/// Parsed CDL document.
#[derive(Debug, Clone, Default)]
pub struct CdlDocument {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<VariableDecl>,
    pub global_attributes: BTreeMap<String, AttrValue>,
    /// Numeric data printed in the `data:` section, keyed by variable
    pub data: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Types,
    Dimensions,
    Variables,
    Data,
    Done,
}

impl CdlDocument {
    /// Parse CDL text.
    pub fn parse(text: &str) -> NetCdfResult<Self> {
        let mut doc = CdlDocument::default();
        let mut section = Section::Preamble;
        let mut pending = String::new();

        for (index, raw) in text.lines().enumerate() {
            if section == Section::Done {
                break;
            }
            let line = strip_comment(raw);
            let trimmed = line.trim();

            if pending.is_empty() {
                if trimmed.is_empty() {
                    continue;
                }
                if let Some(rest) = trimmed.strip_prefix("netcdf ") {
                    doc.name = rest.trim_end_matches('{').trim().to_string();
                    continue;
                }
                let next = match trimmed {
                    "types:" => Some(Section::Types),
                    "dimensions:" => Some(Section::Dimensions),
                    "variables:" => Some(Section::Variables),
                    "data:" => Some(Section::Data),
                    "}" => Some(Section::Done),
                    t if t.starts_with("group:") => Some(Section::Done),
                    _ => None,
                };
                if let Some(next) = next {
                    section = next;
                    continue;
                }
            }

            if !pending.is_empty() {
                pending.push(' ');
            }
            pending.push_str(trimmed);

            if statement_complete(&pending) {
                let statement = pending.trim_end().trim_end_matches(';').trim().to_string();
                pending.clear();
                doc.apply(section, &statement).map_err(|e| {
                    NetCdfError::InvalidFormat(format!("CDL line {}: {}", index + 1, e))
                })?;
            }
        }

        if !pending.trim().is_empty() {
            return Err(NetCdfError::InvalidFormat(format!(
                "unterminated CDL statement: {}",
                pending
            )));
        }

        Ok(doc)
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDecl> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    fn apply(&mut self, section: Section, statement: &str) -> Result<(), String> {
        match section {
            Section::Dimensions => self.apply_dimensions(statement),
            // Files without variables print global attributes straight away
            Section::Preamble | Section::Variables => self.apply_variable_statement(statement),
            Section::Data => self.apply_data(statement),
            Section::Types | Section::Done => Ok(()),
        }
    }

    fn apply_dimensions(&mut self, statement: &str) -> Result<(), String> {
        for declaration in statement.split(',') {
            let (name, value) = declaration
                .split_once('=')
                .ok_or_else(|| format!("malformed dimension '{}'", declaration.trim()))?;
            let value = value.trim();
            let (len, unlimited) = if value.eq_ignore_ascii_case("UNLIMITED") {
                (None, true)
            } else {
                let len = value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid length for dimension {}: '{}'", name.trim(), value))?;
                (Some(len), false)
            };
            self.dimensions.push(Dimension {
                name: name.trim().to_string(),
                len,
                unlimited,
            });
        }
        Ok(())
    }

    fn apply_variable_statement(&mut self, statement: &str) -> Result<(), String> {
        match assignment_split(statement) {
            Some((lhs, rhs)) => self.apply_attribute(lhs, rhs),
            None => self.apply_declaration(statement),
        }
    }

    fn apply_attribute(&mut self, lhs: &str, rhs: &str) -> Result<(), String> {
        // netCDF-4 output may prefix a type: `string time:units = ...`
        let target = lhs.split_whitespace().last().unwrap_or_default();
        let (variable, attribute) = target
            .split_once(':')
            .ok_or_else(|| format!("malformed attribute '{}'", lhs.trim()))?;
        let value = parse_attr_value(rhs)?;

        if variable.is_empty() {
            self.global_attributes.insert(attribute.to_string(), value);
            return Ok(());
        }

        let decl = self
            .variables
            .iter_mut()
            .find(|v| v.name == variable)
            .ok_or_else(|| format!("attribute for undeclared variable '{}'", variable))?;
        decl.attributes.insert(attribute.to_string(), value);
        Ok(())
    }

    fn apply_declaration(&mut self, statement: &str) -> Result<(), String> {
        let (dtype, rest) = statement
            .split_once(char::is_whitespace)
            .ok_or_else(|| format!("malformed declaration '{}'", statement))?;

        for item in split_top_level(rest, ',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (name, dimensions) = match item.split_once('(') {
                Some((name, dims)) => {
                    let dims = dims
                        .strip_suffix(')')
                        .ok_or_else(|| format!("unbalanced parentheses in '{}'", item))?;
                    let dims = dims
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string)
                        .collect();
                    (name.trim(), dims)
                }
                None => (item, Vec::new()),
            };
            self.variables.push(VariableDecl {
                name: name.to_string(),
                dtype: dtype.to_string(),
                dimensions,
                attributes: BTreeMap::new(),
            });
        }
        Ok(())
    }

    fn apply_data(&mut self, statement: &str) -> Result<(), String> {
        let (name, values) = assignment_split(statement)
            .ok_or_else(|| format!("malformed data statement '{}'", statement))?;
        let name = name.trim();

        // Character data is not needed for metadata work
        if values.trim_start().starts_with('"') {
            return Ok(());
        }

        let parsed = split_top_level(values, ',')
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| {
                if v == "_" {
                    Ok(f64::NAN)
                } else {
                    parse_number(v)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.data.insert(name.to_string(), parsed);
        Ok(())
    }
}

/// Split `lhs = rhs` at the first `=` outside a string literal.
fn assignment_split(statement: &str) -> Option<(&str, &str)> {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in statement.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '=' => return Some((&statement[..i], &statement[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Remove a trailing `//` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut previous_slash = false;
    for (i, c) in line.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                previous_slash = false;
            }
            '/' if previous_slash => return &line[..i - 1],
            '/' => previous_slash = true,
            _ => previous_slash = false,
        }
    }
    line
}

/// A statement is complete once its last significant character is a `;`
/// outside any string literal.
fn statement_complete(text: &str) -> bool {
    let mut in_string = false;
    let mut escaped = false;
    let mut last = None;
    for c in text.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            last = Some('"');
            continue;
        }
        if c == '"' {
            in_string = true;
        }
        if !c.is_whitespace() {
            last = Some(c);
        }
    }
    !in_string && last == Some(';')
}

/// Split on `separator` outside string literals and parentheses.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn parse_attr_value(rhs: &str) -> Result<AttrValue, String> {
    let items: Vec<&str> = split_top_level(rhs, ',')
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    match items.first() {
        None => Err("empty attribute value".to_string()),
        // ncdump splits long strings into several comma separated literals
        Some(first) if first.starts_with('"') => {
            let mut text = String::new();
            for item in items {
                text.push_str(&unquote(item)?);
            }
            Ok(AttrValue::Text(text))
        }
        Some(_) => items
            .into_iter()
            .map(parse_number)
            .collect::<Result<Vec<_>, _>>()
            .map(AttrValue::Numbers),
    }
}

fn unquote(item: &str) -> Result<String, String> {
    let inner = item
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| format!("unterminated string {}", item))?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Ok(out)
}

/// Parse a CDL numeric literal, dropping type suffixes (`1.5f`, `2s`, `3UB`, ...).
fn parse_number(token: &str) -> Result<f64, String> {
    let trimmed = token.trim().trim_end_matches(|c: char| {
        matches!(c, 'f' | 'F' | 'd' | 'D' | 'l' | 'L' | 's' | 'S' | 'b' | 'B' | 'u' | 'U')
    });
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{}'", token.trim()))
}
