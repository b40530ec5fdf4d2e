//! Copy filters: per-mapping transformations applied while staging a file.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Produces a staged file from its source instead of a byte-for-byte copy
pub trait CopyFilter {
    fn transform(&self, source: &mut dyn BufRead, destination: &mut dyn Write) -> io::Result<()>;
}

impl<F> CopyFilter for F
where
    F: Fn(&mut dyn BufRead, &mut dyn Write) -> io::Result<()>,
{
    fn transform(&self, source: &mut dyn BufRead, destination: &mut dyn Write) -> io::Result<()> {
        self(source, destination)
    }
}

/// Replaces literal substrings line by line, applying patterns in order
#[derive(Debug, Clone, Default)]
pub struct PlainTextReplacer {
    patterns: Vec<(String, String)>,
}

impl PlainTextReplacer {
    pub fn new<I, F, T>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (F, T)>,
        F: Into<String>,
        T: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }
}

impl CopyFilter for PlainTextReplacer {
    fn transform(&self, source: &mut dyn BufRead, destination: &mut dyn Write) -> io::Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if source.read_line(&mut line)? == 0 {
                break;
            }
            let mut replaced = line.clone();
            for (from, to) in &self.patterns {
                replaced = replaced.replace(from.as_str(), to);
            }
            destination.write_all(replaced.as_bytes())?;
        }
        Ok(())
    }
}

/// Copy filters keyed by the mapping source they apply to
#[derive(Default)]
pub struct FilterSet {
    filters: HashMap<String, Box<dyn CopyFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `filter` for every file produced by the mapping source `key`
    pub fn register<K: Into<String>, F: CopyFilter + 'static>(&mut self, key: K, filter: F) {
        self.filters.insert(key.into(), Box::new(filter));
    }

    pub fn get(&self, key: &str) -> Option<&dyn CopyFilter> {
        self.filters.get(key).map(|f| &**f)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.filters.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &dyn CopyFilter, input: &str) -> String {
        let mut source = io::Cursor::new(input.as_bytes());
        let mut output = Vec::new();
        filter.transform(&mut source, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_plain_text_replacer() {
        let replacer = PlainTextReplacer::new([("@VERSION@", "1.2.3"), ("@NAME@", "demo")]);
        let output = run(&replacer, "name=@NAME@\nversion=@VERSION@\nraw");
        assert_eq!(output, "name=demo\nversion=1.2.3\nraw");
    }

    #[test]
    fn test_replacements_apply_in_order() {
        let replacer = PlainTextReplacer::new([("a", "b"), ("b", "c")]);
        assert_eq!(run(&replacer, "ab\n"), "cc\n");
    }

    #[test]
    fn test_closure_is_a_filter() {
        let mut filters = FilterSet::new();
        filters.register(
            "notes.txt",
            |source: &mut dyn BufRead, destination: &mut dyn Write| -> io::Result<()> {
                for line in source.lines() {
                    writeln!(destination, "{}", line?.to_uppercase())?;
                }
                Ok(())
            },
        );

        let filter = filters.get("notes.txt").unwrap();
        assert_eq!(run(filter, "hello\nworld\n"), "HELLO\nWORLD\n");
        assert!(filters.get("other.txt").is_none());
    }
}
