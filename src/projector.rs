use std::collections::HashSet;

/// Turns object keys into output lines relative to the listing prefix.
///
/// In recursive mode every key yields its tail. Otherwise only the first
/// `/`-delimited segment of the tail is reported, once per listing.
pub struct KeyProjector<'a> {
    prefix: &'a str,
    recursive: bool,
    seen: HashSet<String>,
}

impl<'a> KeyProjector<'a> {
    pub fn new(prefix: &'a str, recursive: bool) -> KeyProjector<'a> {
        KeyProjector {
            prefix,
            recursive,
            seen: HashSet::new(),
        }
    }

    /// Returns the line to emit for `key`, if any.
    pub fn project<'k>(&mut self, key: &'k str) -> Option<&'k str> {
        let tail = self.strip_prefix(key);

        if self.recursive {
            return Some(tail);
        }

        let segment = match tail.find('/') {
            Some(idx) => &tail[..idx],
            None => tail,
        };

        if self.seen.insert(segment.to_string()) {
            Some(segment)
        } else {
            None
        }
    }

    fn strip_prefix<'k>(&self, key: &'k str) -> &'k str {
        if self.prefix.is_empty() {
            return key;
        }

        // keys outside the prefix pass through untouched
        key.strip_prefix(self.prefix).unwrap_or(key)
    }
}
