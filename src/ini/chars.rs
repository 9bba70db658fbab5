//! Single code point matching for the grammar's terminal rules.

/// A set of code points, given as explicit characters plus inclusive ranges.
///
/// A negated class matches every code point the plain class would reject, so
/// `CharClass::any()` is simply the empty class negated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharClass {
    chars: Vec<char>,
    ranges: Vec<(char, char)>,
    negated: bool,
}

impl CharClass {
    /// Matches exactly the listed characters.
    pub fn of(chars: &[char]) -> Self {
        Self {
            chars: chars.to_vec(),
            ranges: Vec::new(),
            negated: false,
        }
    }

    /// Matches everything except the listed characters.
    pub fn not(chars: &[char]) -> Self {
        Self {
            negated: true,
            ..Self::of(chars)
        }
    }

    /// Matches any code point.
    pub fn any() -> Self {
        Self::not(&[])
    }

    /// Adds an inclusive range to the class.
    pub fn with_range(mut self, lo: char, hi: char) -> Self {
        self.ranges.push((lo, hi));
        self
    }

    pub fn matches(&self, c: char) -> bool {
        let listed = self.chars.contains(&c)
            || self.ranges.iter().any(|&(lo, hi)| lo <= c && c <= hi);
        listed != self.negated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_chars() {
        let class = CharClass::of(&['#', '=']);
        assert!(class.matches('#'));
        assert!(class.matches('='));
        assert!(!class.matches('a'));
    }

    #[test]
    fn ranges_are_inclusive() {
        let class = CharClass::of(&['_']).with_range('a', 'z');
        assert!(class.matches('a'));
        assert!(class.matches('z'));
        assert!(class.matches('_'));
        assert!(!class.matches('A'));
    }

    #[test]
    fn negation_inverts() {
        let class = CharClass::not(&['\n', '#']);
        assert!(class.matches('x'));
        assert!(class.matches('é'));
        assert!(!class.matches('\n'));
        assert!(!class.matches('#'));
    }

    #[test]
    fn any_matches_everything() {
        let class = CharClass::any();
        assert!(class.matches('\n'));
        assert!(class.matches('\u{10FFFF}'));
    }
}
