//! # IO Address Resolution
//!
//! Turns a symbolic sensor key into a concrete input address. A resolver
//! either settles on exactly one candidate or gives up with `None`; asking
//! the operator to disambiguate is the caller's business.

use crate::model::Io;

pub trait IoResolver {
    /// Resolve `key` against `ios`.
    ///
    /// `context_name`/`context_id` identify the record asking (for logs),
    /// `hint` narrows ambiguous matches (usually the cylinder name).
    fn resolve(
        &self,
        ios: &[Io],
        key: &str,
        exact_match: bool,
        context_name: &str,
        context_id: i32,
        hint: Option<&str>,
    ) -> Option<String>;
}

/// Default resolver: exact address/name match first, then substring match
/// on the IO name, narrowed by the hint.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoAddressResolver;

impl IoAddressResolver {
    fn settle(
        candidates: Vec<&Io>,
        hint: Option<&str>,
        key: &str,
        context_name: &str,
        context_id: i32,
    ) -> Option<String> {
        let mut addresses: Vec<&str> = candidates.iter().map(|io| io.address.as_str()).collect();
        addresses.sort_unstable();
        addresses.dedup();
        match addresses.len() {
            0 => None,
            1 => Some(addresses[0].to_string()),
            _ => {
                if let Some(hint) = hint.filter(|h| !h.is_empty()) {
                    let mut narrowed: Vec<&str> = candidates
                        .iter()
                        .filter(|io| io.io_name.contains(hint))
                        .map(|io| io.address.as_str())
                        .collect();
                    narrowed.sort_unstable();
                    narrowed.dedup();
                    if let [address] = narrowed.as_slice() {
                        return Some(address.to_string());
                    }
                }
                tracing::warn!(
                    "[LDGC] IO key '{}' for {} ({}) is ambiguous: {} candidates",
                    key,
                    context_name,
                    context_id,
                    candidates.len()
                );
                None
            }
        }
    }
}

impl IoResolver for IoAddressResolver {
    fn resolve(
        &self,
        ios: &[Io],
        key: &str,
        exact_match: bool,
        context_name: &str,
        context_id: i32,
        hint: Option<&str>,
    ) -> Option<String> {
        if key.is_empty() {
            return None;
        }

        let exact: Vec<&Io> = ios
            .iter()
            .filter(|io| io.address == key || io.io_name == key)
            .collect();
        if !exact.is_empty() || exact_match {
            return Self::settle(exact, hint, key, context_name, context_id);
        }

        let partial: Vec<&Io> = ios.iter().filter(|io| io.io_name.contains(key)).collect();
        Self::settle(partial, hint, key, context_name, context_id)
    }
}
