use crate::error::{LogbookError, LogbookResult};
use crate::pool::ContentPools;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub const DEFAULT_HISTORY_BOUND: usize = 3;
pub const DEFAULT_GAP: u64 = 8;

fn default_history_bound() -> usize {
    DEFAULT_HISTORY_BOUND
}

fn default_gap() -> u64 {
    DEFAULT_GAP
}

/// Anti-repetition rule applied to every pool draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Exclude the last `history_bound` picks of the category.
    Recent {
        #[serde(default = "default_history_bound")]
        history_bound: usize,
    },
    /// Exclude any value picked within the last `gap` draws of the category.
    Gap {
        #[serde(default = "default_gap")]
        gap: u64,
    },
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::Recent {
            history_bound: DEFAULT_HISTORY_BOUND,
        }
    }
}

impl SelectionPolicy {
    pub fn validate(&self) -> LogbookResult<()> {
        match self {
            SelectionPolicy::Recent { history_bound: 0 } => Err(LogbookError::config(
                "selection history_bound must be at least 1",
            )),
            SelectionPolicy::Gap { gap: 0 } => {
                Err(LogbookError::config("selection gap must be at least 1"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CategoryHistory {
    recent: VecDeque<String>,
    last_used: HashMap<String, u64>,
    step: u64,
    last: Option<String>,
}

/// Per-category selection memory for one generation run.
#[derive(Debug, Clone, Default)]
pub struct UsageHistory {
    categories: HashMap<String, CategoryHistory>,
}

impl UsageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values currently excluded under the count policy, oldest first.
    pub fn recent(&self, key: &str) -> Vec<&str> {
        self.categories
            .get(key)
            .map(|entry| entry.recent.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// The value most recently returned for `key`.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.categories.get(key).and_then(|entry| entry.last.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn entry(&mut self, key: &str) -> &mut CategoryHistory {
        self.categories.entry(key.to_string()).or_default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarietySelector {
    policy: SelectionPolicy,
}

impl VarietySelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Looks `category` up for `kind` and draws from it.
    pub fn select_from<R: Rng + ?Sized>(
        &self,
        pools: &ContentPools,
        category: &str,
        kind: &str,
        history: &mut UsageHistory,
        rng: &mut R,
    ) -> LogbookResult<String> {
        let pool = pools
            .lookup(category, kind)
            .ok_or_else(|| LogbookError::EmptyPool {
                category: category.to_string(),
            })?;
        self.select(&pool.history_key, pool.candidates, history, rng)
    }

    /// Draws one candidate and records it in `history[key]`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        key: &str,
        candidates: &[String],
        history: &mut UsageHistory,
        rng: &mut R,
    ) -> LogbookResult<String> {
        if candidates.is_empty() {
            return Err(LogbookError::EmptyPool {
                category: key.to_string(),
            });
        }
        let entry = history.entry(key);
        let chosen = match self.policy {
            SelectionPolicy::Recent { history_bound } => {
                Self::select_recent(key, entry, candidates, history_bound, rng)
            }
            SelectionPolicy::Gap { gap } => Self::select_gap(key, entry, candidates, gap, rng),
        }
        .ok_or_else(|| LogbookError::EmptyPool {
            category: key.to_string(),
        })?;
        entry.last = Some(chosen.clone());
        Ok(chosen)
    }

    fn select_recent<R: Rng + ?Sized>(
        key: &str,
        entry: &mut CategoryHistory,
        candidates: &[String],
        history_bound: usize,
        rng: &mut R,
    ) -> Option<String> {
        let exclusions: Vec<String> = if entry.recent.len() >= candidates.len() {
            // Every candidate is recent: start a new cycle, but never repeat the last pick.
            debug!(category = key, "usage history exhausted, resetting");
            let last = entry.recent.back().cloned();
            entry.recent.clear();
            last.into_iter().collect()
        } else {
            entry.recent.iter().cloned().collect()
        };

        let chosen = choose_excluding(candidates, |value| exclusions.contains(value), rng)?;
        entry.recent.push_back(chosen.clone());
        while entry.recent.len() > history_bound {
            entry.recent.pop_front();
        }
        Some(chosen)
    }

    fn select_gap<R: Rng + ?Sized>(
        key: &str,
        entry: &mut CategoryHistory,
        candidates: &[String],
        gap: u64,
        rng: &mut R,
    ) -> Option<String> {
        entry.step += 1;
        let step = entry.step;
        let last = entry.last.clone();
        let is_last = |value: &String| last.as_ref() == Some(value);

        let eligible: Vec<&String> = candidates
            .iter()
            .filter(|value| {
                let within_gap = entry
                    .last_used
                    .get(value.as_str())
                    .is_some_and(|used| step - used < gap);
                !within_gap && !is_last(*value)
            })
            .collect();

        let chosen = match eligible.choose(rng) {
            Some(value) => (*value).clone(),
            None => {
                debug!(category = key, step, "no candidate outside the gap, resetting");
                entry.last_used.clear();
                choose_excluding(candidates, is_last, rng)?
            }
        };
        entry.last_used.insert(chosen.clone(), step);
        Some(chosen)
    }
}

/// Uniform draw from `candidates` minus `excluded`; the full pool when nothing remains.
fn choose_excluding<R, F>(candidates: &[String], excluded: F, rng: &mut R) -> Option<String>
where
    R: Rng + ?Sized,
    F: Fn(&String) -> bool,
{
    let allowed: Vec<&String> = candidates.iter().filter(|value| !excluded(*value)).collect();
    if allowed.is_empty() {
        candidates.choose(rng).cloned()
    } else {
        allowed.choose(rng).map(|value| (*value).clone())
    }
}
