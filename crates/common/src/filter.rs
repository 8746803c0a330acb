//! Per-handler filter over a logger hierarchy.
//!
//! A logger entry applies to its own target and to targets nested below it
//! (`name::...`). Plain string prefixes do not count: an entry for `docling`
//! says nothing about `docling_core`. The most specific matching entry wins;
//! targets with no matching entry use the default level.

use tracing::level_filters::LevelFilter;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter};

#[derive(Debug, Clone)]
pub struct LoggerFilter {
    default: LevelFilter,
    // Sorted longest target first so the first match is the most specific.
    entries: Vec<(String, LevelFilter)>,
}

impl LoggerFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            entries: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.entries.retain(|(existing, _)| *existing != target);
        self.entries.push((target, level));
        self.entries
            .sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        self
    }

    pub fn default_level(&self) -> LevelFilter {
        self.default
    }

    /// Level governing `target`.
    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.entries
            .iter()
            .find(|(name, _)| is_within(target, name))
            .map_or(self.default, |(_, level)| *level)
    }

    pub fn would_enable(&self, target: &str, level: &Level) -> bool {
        *level <= self.level_for(target)
    }
}

/// True if `target` is `logger` itself or nested below it.
fn is_within(target: &str, logger: &str) -> bool {
    match target.strip_prefix(logger) {
        Some(rest) => rest.is_empty() || rest.starts_with("::"),
        None => false,
    }
}

impl<S> Filter<S> for LoggerFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        self.would_enable(meta.target(), meta.level())
    }

    fn max_level_hint(&self) -> Option<LevelFilter> {
        self.entries
            .iter()
            .map(|(_, level)| *level)
            .chain([self.default])
            .max()
    }
}
