//! Construction pass: replays the memo table into a tree.
//!
//! Only recorded matches are consulted, never the input. Every composite rule
//! takes its longest recorded end at the current offset; a choice descends
//! into the first option that reaches exactly that end.

use super::ast::{Node, NodeKind};
use super::error::Error;
use super::grammar::{Choice, GRAMMAR, Grammar, Rule, RuleId, Sequence};
use super::memo::Memo;

pub struct Builder<'g> {
    grammar: &'g Grammar,
    memo: Memo,
    offset: usize,
}

impl Builder<'static> {
    /// A builder for memo tables filled with the INI grammar.
    pub fn new(memo: Memo) -> Self {
        Self::with_grammar(&GRAMMAR, memo)
    }
}

impl<'g> Builder<'g> {
    pub fn with_grammar(grammar: &'g Grammar, mut memo: Memo) -> Self {
        memo.reset_pending();
        Self {
            grammar,
            memo,
            offset: 0,
        }
    }

    pub fn build_root(mut self) -> Result<Node, Error> {
        let root = self.grammar.root();
        let mut nodes = self
            .build(root)
            .ok_or_else(|| Error::InvalidAst("root produced no match".to_string()))?;
        match nodes.len() {
            1 => Ok(nodes.remove(0)),
            n => Err(Error::InvalidAst(format!("root produced {n} nodes"))),
        }
    }

    fn build(&mut self, id: RuleId) -> Option<Vec<Node>> {
        let grammar = self.grammar;
        match grammar.rule(id) {
            Rule::Char(_) => None,
            Rule::Sequence(seq) => self.build_sequence(id, seq),
            Rule::Choice(choice) => self.build_choice(id, choice),
        }
    }

    fn build_sequence(&mut self, id: RuleId, seq: &Sequence) -> Option<Vec<Node>> {
        let from = self.offset;
        let to = self.memo.longest_match(from, id)?;
        let parsed = to > from;

        if seq.all_chars {
            self.offset = to;
            return Some(emit(seq.node, from, to, Vec::new()));
        }

        if !self.enter(id, &seq.generalizes_to, from, to) {
            return None;
        }

        let mut nodes = Vec::new();
        let mut index = 0;
        let mut count = 0;
        while index < seq.items.len() {
            let item = seq.items[index];
            let item_from = self.offset;
            let Some(built) = self.build(item.rule) else {
                index += 1;
                count = 0;
                continue;
            };

            if self.offset > item_from {
                nodes.extend(built);
                count += 1;
                if item.max == Some(count) {
                    index += 1;
                    count = 0;
                }
                continue;
            }

            // zero width: still owed `min` repetitions
            for _ in count..item.min {
                nodes.extend(built.iter().cloned());
            }
            index += 1;
            count = 0;
        }

        if !parsed {
            self.leave(id, &seq.generalizes_to, from);
        }
        Some(emit(seq.node, from, to, nodes))
    }

    fn build_choice(&mut self, id: RuleId, choice: &Choice) -> Option<Vec<Node>> {
        let from = self.offset;
        let to = self.memo.longest_match(from, id)?;
        let parsed = to > from;

        if !self.enter(id, &choice.generalizes_to, from, to) {
            return None;
        }

        let option = choice
            .options
            .iter()
            .copied()
            .find(|&option| self.memo.has_match_to(from, option, to));
        let children = option.map(|option| self.build(option).unwrap_or_default());

        if !parsed {
            self.leave(id, &choice.generalizes_to, from);
        }
        Some(emit(choice.node, from, to, children?))
    }

    /// Consumes the match about to be built so a nested evaluation of the
    /// same rule at the same offset sees the next shorter one. Zero-width
    /// matches cannot be consumed that way and are guarded by pending marks
    /// instead; returns false when the rule is already being built here.
    fn enter(&mut self, id: RuleId, generalizations: &[RuleId], from: usize, to: usize) -> bool {
        if to > from {
            self.memo.drop_match_to(from, id, to);
            for &general in generalizations {
                self.memo.drop_match_to(from, general, to);
            }
            return true;
        }

        if self.memo.pending(from, id) {
            return false;
        }
        self.memo.mark_pending(from, id);
        for &general in generalizations {
            self.memo.mark_pending(from, general);
        }
        true
    }

    fn leave(&mut self, id: RuleId, generalizations: &[RuleId], from: usize) {
        self.memo.unmark_pending(from, id);
        for &general in generalizations {
            self.memo.unmark_pending(from, general);
        }
    }
}

fn emit(kind: Option<NodeKind>, from: usize, to: usize, children: Vec<Node>) -> Vec<Node> {
    match kind {
        Some(kind) => vec![Node {
            kind,
            from,
            to,
            children,
        }],
        None => children,
    }
}
