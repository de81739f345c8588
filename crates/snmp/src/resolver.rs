//! OID string resolution.
//!
//! A configured OID string is tried, in order, as
//! 1. a literal dotted OID (`.1.3.6.1.2.1.1.3.0`, `iso.org.dod.internet...`)
//! 2. a symbol from the built-in table followed by an optional suffix
//!    (`sysUpTime.0`, `IF-MIB::ifInOctets.2`)
//! 3. a wildcard or unique prefix of a symbol (`sysUp*.0`, `ifHCIn.3`)
//!
//! The first stage that recognises the input decides the result. Nothing
//! here performs I/O, so it is safe to call while loading configuration.

use crate::error::OidError;
use crate::mib::{self, MibEntry};
use regex::Regex;
use snmp_reader_types::Oid;

/// Resolve an OID string into its numeric form
pub fn resolve(text: &str) -> Result<Oid, OidError> {
    let text = text.trim();
    let (module, path) = split_module(text);
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        return Err(OidError::Empty);
    }

    let parts: Vec<&str> = path.split('.').collect();
    let head = parts[0];

    if module.is_none() {
        if let Some(result) = literal(&parts) {
            return result;
        }
    }

    if let Some(entry) = mib::lookup(module, head) {
        return walk(entry.oid.clone(), &parts[1..]);
    }

    let entry = partial(module, head)?;
    log::debug!("'{}' matched {}::{}", head, entry.module, entry.name);
    walk(entry.oid.clone(), &parts[1..])
}

/// Whether `text` resolves to an OID
pub fn check_oid(text: &str) -> bool {
    match resolve(text) {
        Ok(_) => true,
        Err(e) => {
            log::debug!("OID check failed for '{}': {}", text, e);
            false
        }
    }
}

fn split_module(text: &str) -> (Option<&str>, &str) {
    match text.split_once("::") {
        Some((module, path)) => (Some(module), path),
        None => (None, text),
    }
}

/// `name(n)` as used in fully spelled-out OIDs
fn labelled_number(part: &str) -> Option<u32> {
    let open = part.find('(')?;
    let inner = part[open + 1..].strip_suffix(')')?;
    inner.parse().ok()
}

fn literal(parts: &[&str]) -> Option<Result<Oid, OidError>> {
    let head = parts[0];
    let numeric_head = head.parse::<u32>().is_ok() || labelled_number(head).is_some();
    let from_root = mib::lookup(Some("SNMPv2-SMI"), head).map_or(false, |e| e.oid.len() == 1);
    if !numeric_head && !from_root {
        return None;
    }

    Some(walk(Oid::from_vec(Vec::new()), parts).and_then(|oid| {
        match oid.as_slice() {
            [first, _, ..] if *first <= 2 => Ok(oid),
            _ => Err(OidError::BadPrefix),
        }
    }))
}

/// Append `parts` below `base`, each either a number, `name(n)`, or the
/// name of a direct child in the table
fn walk(base: Oid, parts: &[&str]) -> Result<Oid, OidError> {
    let mut subs = base.as_slice().to_vec();
    for part in parts {
        if let Ok(n) = part.parse::<u32>() {
            subs.push(n);
        } else if let Some(n) = labelled_number(part) {
            subs.push(n);
        } else if part.is_empty() || part.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(OidError::BadSubIdentifier(part.to_string()));
        } else {
            let parent = Oid::from_slice(&subs);
            match mib::child(&parent, part) {
                Some(entry) => subs.push(entry.oid.as_slice()[parent.len()]),
                None => return Err(OidError::UnknownSymbol(part.to_string())),
            }
        }
    }
    Ok(Oid::from_vec(subs))
}

/// Wildcard (`*`, `?`) or unique-prefix match against the symbol table
fn partial(module: Option<&str>, pattern: &str) -> Result<&'static MibEntry, OidError> {
    let in_module = |entry: &&MibEntry| module.map_or(true, |m| m == entry.module);

    let matches: Vec<&'static MibEntry> = if pattern.contains(['*', '?']) {
        let glob = regex::escape(pattern).replace(r"\*", ".*").replace(r"\?", ".");
        let re = Regex::new(&format!("^{}$", glob))
            .map_err(|_| OidError::UnknownSymbol(pattern.to_string()))?;
        mib::entries()
            .iter()
            .filter(in_module)
            .filter(|entry| re.is_match(entry.name))
            .collect()
    } else {
        mib::entries()
            .iter()
            .filter(in_module)
            .filter(|entry| entry.name.starts_with(pattern))
            .collect()
    };

    match matches.as_slice() {
        [] => Err(OidError::UnknownSymbol(pattern.to_string())),
        [entry] => Ok(*entry),
        many => Err(OidError::Ambiguous {
            pattern: pattern.to_string(),
            candidates: many.len(),
        }),
    }
}
