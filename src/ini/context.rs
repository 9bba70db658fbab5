//! Recognition pass.
//!
//! The recognizer walks the grammar over the input and fills the memo table
//! without building anything. Each `parse_*` returns the end offset of the
//! match starting at `from`, or `None`.
//!
//! Failure tracking keeps the furthest offset where a character was rejected
//! and the most specific reportable rule that failed because of it. Any match
//! that reaches past that offset clears it again.

use std::io::BufRead;

use super::chars::CharClass;
use super::error::{Error, ParseError};
use super::grammar::{Choice, Commit, GRAMMAR, Grammar, Rule, RuleId, Sequence};
use super::input::Input;
use super::memo::{Memo, Outcome};

pub struct Context<'g, R> {
    grammar: &'g Grammar,
    input: Input<R>,
    memo: Memo,
    consumed: usize,
    fail_offset: Option<usize>,
    failing: Option<RuleId>,
}

impl<R: BufRead> Context<'static, R> {
    /// A context for the INI grammar.
    pub fn new(reader: R) -> Self {
        Self::with_grammar(&GRAMMAR, reader)
    }
}

impl<'g, R: BufRead> Context<'g, R> {
    pub fn with_grammar(grammar: &'g Grammar, reader: R) -> Self {
        Self {
            grammar,
            input: Input::new(reader),
            memo: Memo::default(),
            consumed: 0,
            fail_offset: None,
            failing: None,
        }
    }

    /// Runs the root rule from offset zero.
    pub fn recognize(&mut self) {
        self.parse(self.grammar.root(), 0);
    }

    /// Checks that the root matched the whole input.
    pub fn finalize(&mut self) -> Result<(), Error> {
        if let Some(e) = self.input.take_error() {
            return Err(Error::Read(e));
        }

        let root = self.grammar.root();
        let blamed = self.failing.unwrap_or(root);
        match self.memo.longest_result(0, root) {
            Some(Outcome::Match(to)) if to >= self.input.read_len() => {}
            _ => return Err(self.parse_error(blamed).into()),
        }

        let next = self.input.read_len();
        match self.input.get(next) {
            None => match self.input.take_error() {
                Some(e) => Err(Error::Read(e)),
                None => Ok(()),
            },
            Some(_) => Err(self.parse_error(root).into()),
        }
    }

    pub fn into_parts(self) -> (Memo, Vec<char>) {
        (self.memo, self.input.into_chars())
    }

    fn parse(&mut self, id: RuleId, from: usize) -> Option<usize> {
        let grammar = self.grammar;
        match grammar.rule(id) {
            Rule::Char(class) => self.parse_char(class, from),
            Rule::Sequence(seq) => self.parse_sequence(id, seq, from),
            Rule::Choice(choice) => self.parse_choice(id, choice, from),
        }
    }

    fn parse_char(&mut self, class: &CharClass, from: usize) -> Option<usize> {
        match self.input.get(from) {
            Some(c) if class.matches(c) => Some(self.success(from + 1)),
            _ => {
                if Some(from) > self.fail_offset {
                    self.fail_offset = Some(from);
                    self.failing = None;
                }
                None
            }
        }
    }

    fn parse_sequence(&mut self, id: RuleId, seq: &Sequence, from: usize) -> Option<usize> {
        if !seq.all_chars {
            if self.memo.pending(from, id) {
                return None;
            }
            self.memo.mark_pending(from, id);
        }

        let mut to = from;
        let mut index = 0;
        let mut count = 0;
        while index < seq.items.len() {
            let item = seq.items[index];
            let Some(end) = self.parse(item.rule, to) else {
                if count >= item.min {
                    index += 1;
                    count = 0;
                    continue;
                }

                // an earlier evaluation at this offset may already have
                // settled the outcome; keep it rather than contradict it
                let result = match self.memo.longest_result(from, id) {
                    Some(remembered) => {
                        if Some(to) > self.fail_offset {
                            self.clear_failure();
                        }
                        match remembered {
                            Outcome::Match(end) => Some(self.success(end)),
                            Outcome::NoMatch => None,
                        }
                    }
                    None => {
                        self.blame(id, seq.commit);
                        None
                    }
                };
                if !seq.all_chars {
                    self.memo.unmark_pending(from, id);
                }
                return result;
            };

            let parsed = end > to;
            if parsed {
                count += 1;
            }
            to = end;
            if !parsed || item.max == Some(count) {
                index += 1;
                count = 0;
            }
        }

        if seq.commit.no_keyword && self.is_keyword(from, to) {
            self.blame(id, seq.commit);
            if !seq.all_chars {
                self.memo.unmark_pending(from, id);
            }
            return None;
        }

        for &general in &seq.generalizes_to {
            if self.memo.pending(from, general) {
                self.memo.set_match(from, general, to);
            }
        }

        if Some(to) > self.fail_offset {
            self.clear_failure();
        }

        self.memo.set_match(from, id, to);
        if !seq.all_chars {
            self.memo.unmark_pending(from, id);
        }
        Some(self.success(to))
    }

    fn parse_choice(&mut self, id: RuleId, choice: &Choice, from: usize) -> Option<usize> {
        match self.memo.longest_result(from, id) {
            Some(Outcome::Match(to)) => return Some(self.success(to)),
            Some(Outcome::NoMatch) => return None,
            None => {}
        }
        if self.memo.pending(from, id) {
            return None;
        }
        self.memo.mark_pending(from, id);

        let initial_offset = self.fail_offset;
        let initial_failing = self.failing;
        let mut fail_offset = initial_offset;
        let mut failing = None;
        let mut matched: Option<usize> = None;

        // Options may be left recursive through the generalization records,
        // so keep retrying until a whole pass yields nothing longer.
        loop {
            let mut found = false;
            for &option in &choice.options {
                match self.parse(option, from) {
                    None => {
                        if self.fail_offset > fail_offset {
                            fail_offset = self.fail_offset;
                            failing = self.failing;
                        }
                    }
                    Some(end) if matched.is_none_or(|to| end > to) => {
                        matched = Some(end);
                        found = true;
                        self.memo.set_match(from, id, end);
                    }
                    Some(_) => {}
                }
            }
            if !found {
                break;
            }
        }

        if let Some(to) = matched {
            if choice.commit.no_keyword && self.is_keyword(from, to) {
                self.blame(id, choice.commit);
                self.memo.unmark_pending(from, id);
                return None;
            }

            if fail_offset > Some(to) {
                self.fail_offset = fail_offset;
                self.failing = failing;
            } else if Some(to) > initial_offset {
                self.clear_failure();
            } else {
                self.fail_offset = initial_offset;
                self.failing = initial_failing;
            }

            self.memo.unmark_pending(from, id);
            return Some(self.success(to));
        }

        if fail_offset > initial_offset {
            self.fail_offset = fail_offset;
            self.failing = failing;
            self.blame(id, choice.commit);
        }
        self.memo.set_no_match(from, id);
        self.memo.unmark_pending(from, id);
        None
    }

    fn is_keyword(&mut self, from: usize, to: usize) -> bool {
        let grammar = self.grammar;
        let keywords = grammar.keywords();
        if keywords.is_empty() {
            return false;
        }
        let text: String = (from..to).filter_map(|offset| self.input.get(offset)).collect();
        keywords.iter().any(|keyword| *keyword == text)
    }

    fn success(&mut self, to: usize) -> usize {
        self.consumed = self.consumed.max(to);
        to
    }

    fn blame(&mut self, id: RuleId, commit: Commit) {
        if self.failing.is_none() && commit.reportable() {
            self.failing = Some(id);
        }
    }

    fn clear_failure(&mut self) {
        self.fail_offset = None;
        self.failing = None;
    }

    fn parse_error(&mut self, rule: RuleId) -> ParseError {
        let name = self.grammar.rule(rule).name();
        let name = name.split(':').next().unwrap_or(name);

        if self.failing.is_none() {
            self.fail_offset = Some(self.consumed);
        }
        let offset = self.fail_offset.unwrap_or(self.consumed);

        let mut line = 0;
        let mut column = 0;
        for offset in 0..offset {
            match self.input.get(offset) {
                Some('\n') => {
                    line += 1;
                    column = 0;
                }
                Some(_) => column += 1,
                None => break,
            }
        }

        ParseError {
            offset,
            line,
            column,
            rule_name: name.to_string(),
        }
    }
}
