//! The compiled INI grammar.
//!
//! Rules live in an arena and refer to each other by [`RuleId`], so recursive
//! constructs never need owning cycles. The grammar is built once into
//! [`GRAMMAR`] and only read afterwards.
//!
//! Two properties are derived when the grammar is finished rather than
//! written by hand:
//!
//! - `generalizes_to`: the choices that list a rule as an option, directly or
//!   through other choices. A rule's match is shared with these while they are
//!   being evaluated at the same offset.
//! - `all_chars`: a sequence made only of character classes. It consumes input
//!   on every item, so it can never loop at a fixed offset and skips pending
//!   tracking.

use once_cell::sync::Lazy;

use super::ast::NodeKind;
use super::chars::CharClass;

pub type RuleId = usize;

/// Per-rule behaviour flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commit {
    /// The rule emits no node of its own.
    pub alias: bool,
    /// The rule matches insignificant whitespace; never blamed in errors.
    pub whitespace: bool,
    /// The rule fails when its match spells a reserved keyword.
    pub no_keyword: bool,
    /// The rule is named in the grammar source and can be blamed in errors.
    pub user_defined: bool,
}

impl Commit {
    /// Whether a failure of this rule makes a useful diagnostic.
    pub fn reportable(self) -> bool {
        self.user_defined && !self.whitespace
    }
}

/// One element of a sequence: a sub-rule repeated `min..=max` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub rule: RuleId,
    pub min: usize,
    /// `None` is unbounded.
    pub max: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    pub name: &'static str,
    pub node: Option<NodeKind>,
    pub commit: Commit,
    pub items: Vec<Item>,
    pub generalizes_to: Vec<RuleId>,
    pub all_chars: bool,
}

#[derive(Debug, Clone)]
pub struct Choice {
    pub name: &'static str,
    pub node: Option<NodeKind>,
    pub commit: Commit,
    pub options: Vec<RuleId>,
    pub generalizes_to: Vec<RuleId>,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Char(CharClass),
    Sequence(Sequence),
    Choice(Choice),
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Char(_) => "",
            Rule::Sequence(s) => s.name,
            Rule::Choice(c) => c.name,
        }
    }
}

#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
    root: RuleId,
    keywords: Vec<&'static str>,
}

impl Grammar {
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id]
    }

    pub fn root(&self) -> RuleId {
        self.root
    }

    /// Literal words a `no_keyword` rule may not match in full.
    pub fn keywords(&self) -> &[&'static str] {
        &self.keywords
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

pub static GRAMMAR: Lazy<Grammar> = Lazy::new(ini_grammar);

pub(super) fn once(rule: RuleId) -> Item {
    Item {
        rule,
        min: 1,
        max: Some(1),
    }
}

pub(super) fn optional(rule: RuleId) -> Item {
    Item {
        rule,
        min: 0,
        max: Some(1),
    }
}

pub(super) fn many(rule: RuleId) -> Item {
    Item {
        rule,
        min: 0,
        max: None,
    }
}

pub(super) fn many1(rule: RuleId) -> Item {
    Item {
        rule,
        min: 1,
        max: None,
    }
}

/// How a composite rule shows up in the tree and in diagnostics.
#[derive(Clone, Copy)]
pub(super) enum Shape {
    /// Structural glue: alias, never blamed.
    Glue,
    /// Named alias: spliced, but blamed in errors.
    Named(&'static str),
    /// Named whitespace alias.
    Whitespace(&'static str),
    /// Emits a node of the given kind.
    Node(&'static str, NodeKind),
}

impl Shape {
    fn parts(self) -> (&'static str, Option<NodeKind>, Commit) {
        match self {
            Shape::Glue => (
                "",
                None,
                Commit {
                    alias: true,
                    ..Commit::default()
                },
            ),
            Shape::Named(name) => (
                name,
                None,
                Commit {
                    alias: true,
                    user_defined: true,
                    ..Commit::default()
                },
            ),
            Shape::Whitespace(name) => (
                name,
                None,
                Commit {
                    alias: true,
                    whitespace: true,
                    user_defined: true,
                    ..Commit::default()
                },
            ),
            Shape::Node(name, kind) => (
                name,
                Some(kind),
                Commit {
                    user_defined: true,
                    ..Commit::default()
                },
            ),
        }
    }
}

/// Arena under construction. Rules may be reserved first and defined later,
/// which is how forward and recursive references are expressed.
#[derive(Default)]
pub(super) struct GrammarBuilder {
    rules: Vec<Option<Rule>>,
}

impl GrammarBuilder {
    pub(super) fn reserve(&mut self) -> RuleId {
        self.rules.push(None);
        self.rules.len() - 1
    }

    fn define(&mut self, id: RuleId, rule: Rule) -> RuleId {
        self.rules[id] = Some(rule);
        id
    }

    pub(super) fn chars(&mut self, class: CharClass) -> RuleId {
        let id = self.reserve();
        self.define(id, Rule::Char(class))
    }

    pub(super) fn sequence(&mut self, shape: Shape, items: Vec<Item>) -> RuleId {
        let id = self.reserve();
        self.define_sequence(id, shape, items)
    }

    pub(super) fn define_sequence(&mut self, id: RuleId, shape: Shape, items: Vec<Item>) -> RuleId {
        let (name, node, commit) = shape.parts();
        self.define(
            id,
            Rule::Sequence(Sequence {
                name,
                node,
                commit,
                items,
                generalizes_to: Vec::new(),
                all_chars: false,
            }),
        )
    }

    pub(super) fn choice(&mut self, shape: Shape, options: Vec<RuleId>) -> RuleId {
        let id = self.reserve();
        self.define_choice(id, shape, options)
    }

    pub(super) fn define_choice(&mut self, id: RuleId, shape: Shape, options: Vec<RuleId>) -> RuleId {
        let (name, node, commit) = shape.parts();
        self.define(
            id,
            Rule::Choice(Choice {
                name,
                node,
                commit,
                options,
                generalizes_to: Vec::new(),
            }),
        )
    }

    /// Makes a composite rule fail whenever its match spells a keyword.
    #[cfg(test)]
    pub(super) fn forbid_keywords(&mut self, id: RuleId) {
        match &mut self.rules[id] {
            Some(Rule::Sequence(Sequence { commit, .. }))
            | Some(Rule::Choice(Choice { commit, .. })) => commit.no_keyword = true,
            _ => panic!("rule {id} cannot carry keywords"),
        }
    }

    /// A glue sequence matching a single character of `class`.
    pub(super) fn token(&mut self, class: CharClass) -> RuleId {
        let c = self.chars(class);
        self.sequence(Shape::Glue, vec![once(c)])
    }

    pub(super) fn finish(self, root: RuleId, keywords: Vec<&'static str>) -> Grammar {
        let mut rules: Vec<Rule> = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(id, rule)| rule.unwrap_or_else(|| panic!("grammar rule {id} reserved but never defined")))
            .collect();

        let generalizations = generalizations(&rules);
        let char_only: Vec<bool> = rules.iter().map(|r| matches!(r, Rule::Char(_))).collect();

        for (id, rule) in rules.iter_mut().enumerate() {
            match rule {
                Rule::Sequence(seq) => {
                    seq.generalizes_to = generalizations[id].clone();
                    seq.all_chars = seq.items.iter().all(|item| char_only[item.rule]);
                }
                Rule::Choice(choice) => {
                    choice.generalizes_to = generalizations[id].clone();
                }
                Rule::Char(_) => {}
            }
        }

        Grammar {
            rules,
            root,
            keywords,
        }
    }
}

/// For every rule, the choices that accept it as an option, transitively.
fn generalizations(rules: &[Rule]) -> Vec<Vec<RuleId>> {
    let mut result: Vec<Vec<RuleId>> = vec![Vec::new(); rules.len()];
    for (id, rule) in rules.iter().enumerate() {
        if let Rule::Choice(choice) = rule {
            for &option in &choice.options {
                if !result[option].contains(&id) {
                    result[option].push(id);
                }
            }
        }
    }

    loop {
        let mut changed = false;
        for id in 0..rules.len() {
            let parents = result[id].clone();
            for parent in parents {
                for grand in result[parent].clone() {
                    if grand != id && !result[id].contains(&grand) {
                        result[id].push(grand);
                        changed = true;
                    }
                }
            }
        }
        if !changed {
            break;
        }
    }

    result
}

/// Builds the INI grammar:
///
/// ```text
/// config      = ws* (nl (ws* nl)*)? ws* (entry (ws* (nl (ws* nl)* ws* entry))*)? (ws* nl (ws* nl)*)? ws*
/// entry       = comment | group | keyed-value
/// comment     = "#" (ws* [^\n] (ws* [^\n])*)?
/// group       = group-key-form (ws* line (ws* line)*)?
/// line        = nl ws* (keyed-value | value-form | comment)
/// group-key-form = group-key | group-key ws* comment
/// group-key   = "[" ws* key ws* "]"
/// keyed-value = key ws* "=" ws* value-form
/// key         = symbol (("." | "::") symbol)*
/// symbol      = [a-zA-Z0-9_-]+
/// value-form  = value | value ws* comment
/// value       = value-char (ws* value-char)* | quote
/// value-char  = [^\n'"\\\[\]=#] | "\" ws* any
/// quote       = "'" (...) "'" | "\"" (...) "\""
/// ```
fn ini_grammar() -> Grammar {
    let mut g = GrammarBuilder::default();

    let space = g.chars(CharClass::of(&[' ', '\u{8}', '\u{c}', '\r', '\t', '\u{b}']));
    let whitespace = g.sequence(Shape::Whitespace("whitespace"), vec![once(space)]);
    let ws = g.choice(Shape::Glue, vec![whitespace]);

    let newline = g.chars(CharClass::of(&['\n']));
    let nl = g.sequence(Shape::Whitespace("nl"), vec![once(newline)]);

    // comment
    let hash = g.token(CharClass::of(&['#']));
    let comment_char = g.token(CharClass::not(&['\n']));
    let comment_more = g.sequence(Shape::Glue, vec![many(ws), once(comment_char)]);
    let comment_body = g.sequence(
        Shape::Glue,
        vec![many(ws), once(comment_char), many(comment_more)],
    );
    let comment = g.sequence(
        Shape::Node("comment", NodeKind::Comment),
        vec![once(hash), optional(comment_body)],
    );

    // quotes
    let single_quote = quoted(&mut g, ws, '\'', "single-quote");
    let double_quote = quoted(&mut g, ws, '"', "double-quote");
    let quote = g.choice(
        Shape::Node("quote", NodeKind::Quote),
        vec![single_quote, double_quote],
    );

    // bare values
    let plain_char = g.token(CharClass::not(&['\n', '\'', '"', '\\', '[', ']', '=', '#']));
    let backslash = g.token(CharClass::of(&['\\']));
    let any_char = g.token(CharClass::any());
    let escaped_char = g.sequence(
        Shape::Glue,
        vec![once(backslash), many(ws), once(any_char)],
    );
    let value_char = g.choice(Shape::Named("value-char"), vec![plain_char, escaped_char]);
    let value_more = g.sequence(Shape::Glue, vec![many(ws), once(value_char)]);
    let bare_value = g.sequence(Shape::Glue, vec![once(value_char), many(value_more)]);
    let value = g.choice(
        Shape::Node("value", NodeKind::Value),
        vec![bare_value, quote],
    );
    let commented_value = g.sequence(Shape::Glue, vec![once(value), many(ws), once(comment)]);
    let value_form = g.choice(Shape::Named("value-form"), vec![value, commented_value]);

    // keys
    let symbol_char = g.chars(
        CharClass::of(&['_', '-'])
            .with_range('a', 'z')
            .with_range('A', 'Z')
            .with_range('0', '9'),
    );
    let symbol_char = g.sequence(Shape::Named("symbol-char"), vec![once(symbol_char)]);
    let symbol = g.sequence(
        Shape::Node("symbol", NodeKind::Symbol),
        vec![many1(symbol_char)],
    );
    let dot = g.token(CharClass::of(&['.']));
    let colon = g.chars(CharClass::of(&[':']));
    let double_colon = g.sequence(Shape::Glue, vec![once(colon), once(colon)]);
    let key_sep = g.choice(Shape::Named("key-sep"), vec![dot, double_colon]);
    let key_more = g.sequence(Shape::Glue, vec![once(key_sep), once(symbol)]);
    let key = g.sequence(
        Shape::Node("key", NodeKind::Key),
        vec![once(symbol), many(key_more)],
    );

    let equals = g.token(CharClass::of(&['=']));
    let keyed_value = g.sequence(
        Shape::Node("keyed-value", NodeKind::KeyedValue),
        vec![once(key), many(ws), once(equals), many(ws), once(value_form)],
    );

    // groups
    let open = g.token(CharClass::of(&['[']));
    let close = g.token(CharClass::of(&[']']));
    let group_key = g.sequence(
        Shape::Node("group-key", NodeKind::GroupKey),
        vec![once(open), many(ws), once(key), many(ws), once(close)],
    );
    let commented_group_key =
        g.sequence(Shape::Glue, vec![once(group_key), many(ws), once(comment)]);
    let group_key_form = g.choice(
        Shape::Named("group-key-form"),
        vec![group_key, commented_group_key],
    );
    let group_entry = g.choice(Shape::Glue, vec![keyed_value, value_form, comment]);
    let group_line = g.sequence(Shape::Glue, vec![once(nl), many(ws), once(group_entry)]);
    let group_line_more = g.sequence(Shape::Glue, vec![many(ws), once(group_line)]);
    let group_body = g.sequence(
        Shape::Glue,
        vec![many(ws), once(group_line), many(group_line_more)],
    );
    let group = g.sequence(
        Shape::Node("group", NodeKind::Group),
        vec![once(group_key_form), optional(group_body)],
    );

    // document
    let entry = g.choice(Shape::Named("entry"), vec![comment, group, keyed_value]);
    let blank = g.sequence(Shape::Glue, vec![many(ws), once(nl)]);
    let separated_entry = g.sequence(
        Shape::Glue,
        vec![once(nl), many(blank), many(ws), once(entry)],
    );
    let separated_more = g.sequence(Shape::Glue, vec![many(ws), once(separated_entry)]);
    let entries_tail = g.sequence(
        Shape::Glue,
        vec![many(ws), once(separated_entry), many(separated_more)],
    );
    let entries = g.sequence(Shape::Glue, vec![once(entry), optional(entries_tail)]);
    let leading = g.sequence(Shape::Glue, vec![once(nl), many(blank)]);
    let trailing = g.sequence(Shape::Glue, vec![many(ws), once(nl), many(blank)]);
    let body = g.sequence(
        Shape::Named("config"),
        vec![optional(leading), many(ws), optional(entries), optional(trailing)],
    );
    let config = g.reserve();
    g.define_sequence(
        config,
        Shape::Node("config", NodeKind::Config),
        vec![many(ws), once(body), many(ws)],
    );

    g.finish(config, Vec::new())
}

/// `q (ws* c (ws* c)*)? ws* q` where `c` is a non-quote, non-backslash char
/// or a backslash, optional whitespace and any char.
fn quoted(g: &mut GrammarBuilder, ws: RuleId, q: char, name: &'static str) -> RuleId {
    let open = g.token(CharClass::of(&[q]));
    let plain = g.token(CharClass::not(&[q, '\\']));
    let backslash = g.token(CharClass::of(&['\\']));
    let any = g.token(CharClass::any());
    let escaped = g.sequence(Shape::Glue, vec![once(backslash), many(ws), once(any)]);
    let content_char = g.choice(Shape::Glue, vec![plain, escaped]);
    let more = g.sequence(Shape::Glue, vec![many(ws), once(content_char)]);
    let content = g.sequence(
        Shape::Glue,
        vec![many(ws), once(content_char), many(more)],
    );
    let close = g.token(CharClass::of(&[q]));
    g.sequence(
        Shape::Named(name),
        vec![once(open), optional(content), many(ws), once(close)],
    )
}
