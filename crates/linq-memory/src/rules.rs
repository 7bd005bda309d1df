// SPDX-FileCopyrightText: 2026 Linq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword rules that drive preference mining.
//!
//! A [`RuleSet`] maps category to an ordered keyword list. Declaration order
//! matters for first-match-wins, so the JSON rule file is read with a visitor
//! that keeps object key order instead of going through a hash map.
//!
//! [`RuleBook`] holds the current set behind an `ArcSwap`. A mining pass takes
//! one `Arc<RuleSet>` at its start and keeps it; a reload publishes a whole
//! new set without disturbing passes already running.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use linq_core::LinqError;
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, Debouncer};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info, warn};

/// Debounce window for rule file change events.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Ordered mapping of category to keywords.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleSet {
    categories: Vec<(String, Vec<String>)>,
}

impl RuleSet {
    /// Build from `(category, keywords)` pairs in declaration order.
    ///
    /// A repeated category keeps its first position; its keywords are
    /// replaced by the later declaration, matching how a JSON object with a
    /// duplicated key is usually read.
    pub fn new<C, K>(categories: impl IntoIterator<Item = (C, Vec<K>)>) -> Self
    where
        C: Into<String>,
        K: Into<String>,
    {
        let mut set = Self::default();
        for (category, keywords) in categories {
            set.insert(
                category.into(),
                keywords.into_iter().map(Into::into).collect(),
            );
        }
        set
    }

    fn insert(&mut self, category: String, keywords: Vec<String>) {
        match self.categories.iter_mut().find(|(c, _)| *c == category) {
            Some(slot) => slot.1 = keywords,
            None => self.categories.push((category, keywords)),
        }
    }

    /// The built-in rules written on first run.
    pub fn default_rules() -> Self {
        Self::new([
            (
                "fact",
                vec!["我叫", "我是", "我的名字是", "你可以叫我", "我学", "专业是"],
            ),
            ("like", vec!["喜欢", "爱", "讨厌", "不喜欢", "受不了", "挺喜欢"]),
            ("hobby", vec!["经常", "习惯", "总是", "每次", "一般会"]),
        ])
    }

    /// Categories with their keywords, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(c, k)| (c.as_str(), k.as_slice()))
    }

    pub fn keywords(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, k)| k.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|(_, k)| k.is_empty())
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|(_, k)| k.len()).sum()
    }

    /// Parse a JSON rule document.
    pub fn from_json(text: &str) -> Result<Self, LinqError> {
        let set: RuleSet = serde_json::from_str(text)
            .map_err(|e| LinqError::Config(format!("invalid rule file: {e}")))?;
        set.validate()?;
        Ok(set)
    }

    /// Pretty JSON with non-ASCII keywords written as-is.
    pub fn to_json_pretty(&self) -> Result<String, LinqError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LinqError::Internal(format!("cannot serialize rules: {e}")))
    }

    /// An empty keyword would match every turn.
    fn validate(&self) -> Result<(), LinqError> {
        for (category, keywords) in &self.categories {
            if keywords.iter().any(|k| k.is_empty()) {
                return Err(LinqError::Config(format!(
                    "rule category `{category}` contains an empty keyword"
                )));
            }
        }
        Ok(())
    }

    /// Read the rule file at `path`, creating it with [`RuleSet::default_rules`]
    /// when it does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error; it is
    /// never overwritten.
    pub fn load_or_init(path: &Path) -> Result<Self, LinqError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let set = Self::from_json(&text).map_err(|e| match e {
                    LinqError::Config(msg) => {
                        LinqError::Config(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })?;
                debug!(
                    path = %path.display(),
                    categories = set.category_count(),
                    keywords = set.keyword_count(),
                    "rules loaded"
                );
                Ok(set)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let set = Self::default_rules();
                set.write_to(path)?;
                info!(path = %path.display(), "wrote default rule file");
                Ok(set)
            }
            Err(e) => Err(LinqError::Config(format!(
                "cannot read rule file {}: {e}",
                path.display()
            ))),
        }
    }

    fn write_to(&self, path: &Path) -> Result<(), LinqError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                LinqError::Config(format!(
                    "cannot create rule directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| {
            LinqError::Config(format!("cannot write rule file {}: {e}", path.display()))
        })
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, keywords) in &self.categories {
            map.serialize_entry(category, keywords)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping category names to keyword arrays")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleSet, A::Error> {
                let mut set = RuleSet::default();
                while let Some((category, keywords)) =
                    access.next_entry::<String, Vec<String>>()?
                {
                    set.insert(category, keywords);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// Atomically replaceable holder of the active [`RuleSet`].
#[derive(Debug)]
pub struct RuleBook {
    path: PathBuf,
    current: ArcSwap<RuleSet>,
}

impl RuleBook {
    /// Load (or initialize) the rule file and hold it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, LinqError> {
        let path = path.into();
        let set = RuleSet::load_or_init(&path)?;
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(set),
        })
    }

    /// A book not backed by a file; `reload` keeps the set as is.
    pub fn fixed(set: RuleSet) -> Self {
        Self {
            path: PathBuf::new(),
            current: ArcSwap::from_pointee(set),
        }
    }

    /// Snapshot for one mining pass.
    pub fn current(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the rule file and publish it. On failure the previous set stays.
    pub fn reload(&self) -> Result<Arc<RuleSet>, LinqError> {
        if self.path.as_os_str().is_empty() {
            return Ok(self.current());
        }
        let set = Arc::new(RuleSet::load_or_init(&self.path)?);
        self.current.store(Arc::clone(&set));
        info!(
            path = %self.path.display(),
            categories = set.category_count(),
            keywords = set.keyword_count(),
            "rules reloaded"
        );
        Ok(set)
    }

    /// Publish `set` directly.
    pub fn replace(&self, set: RuleSet) {
        self.current.store(Arc::new(set));
    }
}

/// Reloads a [`RuleBook`] whenever its file changes on disk.
///
/// Watching stops when the watcher is dropped.
pub struct RuleWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl RuleWatcher {
    pub fn spawn(book: Arc<RuleBook>) -> Result<Self, LinqError> {
        let file = book.path().to_path_buf();
        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = file.file_name().map(|n| n.to_os_string());

        let handler_book = Arc::clone(&book);
        let mut debouncer = new_debouncer(
            WATCH_DEBOUNCE,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|event| event.path.file_name().map(|n| n.to_os_string()) == file_name);
                    if touched && let Err(e) = handler_book.reload() {
                        warn!(error = %e, "rule reload failed, keeping previous rules");
                    }
                }
                Err(e) => warn!(error = %e, "rule file watch error"),
            },
        )
        .map_err(|e| LinqError::Internal(format!("cannot create rule watcher: {e}")))?;

        // The directory is watched so that editors that replace the file
        // (write to temp, then rename) are still seen.
        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| {
                LinqError::Internal(format!("cannot watch {}: {e}", dir.display()))
            })?;
        info!(path = %file.display(), "watching rule file");

        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

impl fmt::Debug for RuleWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleWatcher").finish_non_exhaustive()
    }
}
