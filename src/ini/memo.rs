//! Packrat memo table.
//!
//! For every offset the table records which rules matched and where they
//! ended, and which rules are known not to match. A `(offset, rule)` pair is
//! never recorded both ways: a match always wins, so a no-match is ignored
//! once any match for the pair exists and is forgotten when one arrives. Pending marks are counted per `(offset, rule)` and are used to
//! break left recursion in both passes.

use std::collections::{HashMap, HashSet};

use super::grammar::RuleId;

/// What the table knows about a rule at an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The longest recorded end.
    Match(usize),
    NoMatch,
}

#[derive(Debug, Default)]
pub struct Memo {
    matches: Vec<Vec<(RuleId, usize)>>,
    no_match: HashSet<(usize, RuleId)>,
    pending: HashMap<(usize, RuleId), usize>,
}

impl Memo {
    pub fn set_match(&mut self, offset: usize, id: RuleId, to: usize) {
        self.no_match.remove(&(offset, id));
        if self.matches.len() <= offset {
            self.matches.resize_with(offset + 1, Vec::new);
        }
        let at = &mut self.matches[offset];
        if !at.contains(&(id, to)) {
            at.push((id, to));
        }
    }

    pub fn set_no_match(&mut self, offset: usize, id: RuleId) {
        let matched = self
            .matches
            .get(offset)
            .is_some_and(|at| at.iter().any(|&(rule, _)| rule == id));
        if !matched {
            self.no_match.insert((offset, id));
        }
    }

    pub fn has_match_to(&self, offset: usize, id: RuleId, to: usize) -> bool {
        self.matches
            .get(offset)
            .is_some_and(|at| at.contains(&(id, to)))
    }

    pub fn longest_match(&self, offset: usize, id: RuleId) -> Option<usize> {
        self.matches
            .get(offset)?
            .iter()
            .filter(|&&(rule, _)| rule == id)
            .map(|&(_, to)| to)
            .max()
    }

    pub fn longest_result(&self, offset: usize, id: RuleId) -> Option<Outcome> {
        if self.no_match.contains(&(offset, id)) {
            return Some(Outcome::NoMatch);
        }
        self.longest_match(offset, id).map(Outcome::Match)
    }

    /// Forgets one recorded end, so a later build at the same offset picks
    /// the next longest.
    pub fn drop_match_to(&mut self, offset: usize, id: RuleId, to: usize) {
        if let Some(at) = self.matches.get_mut(offset) {
            if let Some(pos) = at.iter().position(|&entry| entry == (id, to)) {
                at.remove(pos);
            }
        }
    }

    pub fn pending(&self, offset: usize, id: RuleId) -> bool {
        self.pending.contains_key(&(offset, id))
    }

    pub fn mark_pending(&mut self, offset: usize, id: RuleId) {
        *self.pending.entry((offset, id)).or_insert(0) += 1;
    }

    pub fn unmark_pending(&mut self, offset: usize, id: RuleId) {
        if let Some(count) = self.pending.get_mut(&(offset, id)) {
            *count -= 1;
            if *count == 0 {
                self.pending.remove(&(offset, id));
            }
        }
    }

    pub fn reset_pending(&mut self) {
        self.pending.clear();
    }
}
