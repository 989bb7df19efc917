//! Match format rules.
//!
//! A match snapshot only carries the *name* of its format (`match_type`). The number of sets a player needs to win
//! the match is looked up here. Unknown names fall back to the table's default format rather than failing, since
//! the match documents are created by an external admin tool that may use names this server does not know about.
use std::collections::HashMap;

use log::*;

use crate::db_types::DEFAULT_MATCH_TYPE;

#[derive(Debug, Clone)]
pub struct RuleTable {
    sets_to_win: HashMap<String, u32>,
    default_type: String,
}

impl Default for RuleTable {
    fn default() -> Self {
        let sets_to_win = [("single_set", 1), ("best_of_3", 2), ("best_of_5", 3), ("best_of_7", 4)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        Self { sets_to_win, default_type: DEFAULT_MATCH_TYPE.to_string() }
    }
}

impl RuleTable {
    /// Sets the format used for unknown match types. If `match_type` is not itself in the table, the current default
    /// is kept.
    pub fn with_default_type(mut self, match_type: &str) -> Self {
        if self.sets_to_win.contains_key(match_type) {
            self.default_type = match_type.to_string();
        } else {
            warn!("🏓️ Cannot use unknown match type '{match_type}' as the default. Keeping '{}'", self.default_type);
        }
        self
    }

    pub fn with_rule(mut self, match_type: &str, sets_to_win: u32) -> Self {
        self.sets_to_win.insert(match_type.to_string(), sets_to_win.max(1));
        self
    }

    pub fn default_type(&self) -> &str {
        self.default_type.as_str()
    }

    /// The number of sets a player must win to take a match of the given type.
    pub fn sets_to_win(&self, match_type: &str) -> u32 {
        match self.sets_to_win.get(match_type) {
            Some(n) => *n,
            None => {
                debug!("🏓️ Unknown match type '{match_type}'. Using '{}' rules", self.default_type);
                self.sets_to_win.get(&self.default_type).copied().unwrap_or(3)
            },
        }
    }
}
