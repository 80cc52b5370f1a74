//! Hint generation (spec.md §4.A).
//!
//! Produces a deterministic, lazily-extending sequence of short distinct
//! labels drawn from a seed alphabet, preferring shorter labels. This is the
//! label assignment order the [`engine`](crate::engine) consumes directly.

use crate::error::ConfigError;

/// A seed set of distinct letters used to build hint labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<char>,
}

/// One row of the built-in seed table (spec.md §4.A).
macro_rules! builtin_alphabets {
    ($($name:literal => $letters:literal),+ $(,)?) => {
        /// Names of the built-in seed alphabets, in table order.
        pub const BUILTIN_NAMES: &[&str] = &[$($name),+];

        fn builtin_letters(name: &str) -> Option<&'static str> {
            match name {
                $($name => Some($letters),)+
                _ => None,
            }
        }
    };
}

builtin_alphabets! {
    "numeric" => "1234567890",
    "abcd" => "abcdefghijklmnopqrstuvwxyz",
    "qwerty" => "asdfqwerzxcvjklmiuopghtybn",
    "qwerty-homerow" => "asdfghjkl",
    "qwerty-left-hand" => "asdfgqwertzxcvb",
    "qwerty-right-hand" => "hjklyuiopnm",
    "azerty" => "qsdfazerwxcvjklmuiopghtybn",
    "azerty-homerow" => "qsdfghjklm",
    "azerty-left-hand" => "qsdfgazertwxcvb",
    "azerty-right-hand" => "hjklmuiopyn",
    "qwertz" => "asdfqwerzxcvjkluiopmghtybn",
    "dvorak" => "aoeuhtnsidpygcrlmwvzxqjkbf",
    "colemak" => "arstdhneiozxcvmqwfpgjluy",
}

impl Alphabet {
    /// Builds an alphabet from a seed string of distinct letters. Duplicate
    /// letters are removed, keeping the first occurrence.
    pub fn new(letters: &str) -> Self {
        let mut seen = std::collections::HashSet::new();
        let letters = letters.chars().filter(|c| seen.insert(*c)).collect();
        Self { letters }
    }

    /// Looks up one of the built-in seed sets by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAlphabet`] if `name` is not in
    /// [`BUILTIN_NAMES`].
    pub fn by_name(name: &str) -> Result<Self, ConfigError> {
        builtin_letters(name)
            .map(Self::new)
            .ok_or_else(|| ConfigError::UnknownAlphabet(name.to_string()))
    }

    /// The number of distinct seed letters.
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    /// Returns true if this alphabet has no letters.
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Produces `n` distinct non-empty labels, preferring shorter ones
    /// (spec.md §4.A):
    ///
    /// - If `n <= len()`, returns the first `n` letters as single-char labels.
    /// - Otherwise, repeatedly expands the last remaining not-yet-expanded
    ///   label into `len()` longer labels (appending each seed letter). Once
    ///   every label in the current frontier has been expanded, the newly
    ///   produced labels become the next frontier, so expansion continues
    ///   past `len()²` labels with no upper bound.
    ///
    /// The returned order is deterministic and is the order hints are
    /// assigned in by [`crate::engine`].
    pub fn hints(&self, n: usize) -> Vec<String> {
        let k = self.letters.len();
        if n == 0 || k == 0 {
            return Vec::new();
        }
        if n <= k {
            return self.letters[..n].iter().map(|c| c.to_string()).collect();
        }

        let mut labels: Vec<String> = self.letters.iter().map(|c| c.to_string()).collect();
        let mut frontier = labels.len();
        while labels.len() < n {
            if frontier == 0 {
                frontier = labels.len();
            }
            frontier -= 1;
            let prefix = labels.remove(frontier);
            let expansion: Vec<String> = self.letters.iter().map(|c| format!("{prefix}{c}")).collect();
            for (offset, label) in expansion.into_iter().enumerate() {
                labels.insert(frontier + offset, label);
            }
        }
        labels.truncate(n);
        labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_within_seed_size_are_single_chars() {
        let a = Alphabet::new("abcd");
        assert_eq!(a.hints(3), vec!["a", "b", "c"]);
    }

    #[test]
    fn hints_beyond_seed_size_extend_deterministically() {
        let a = Alphabet::new("abcd");
        let hints = a.hints(5);
        assert_eq!(hints.len(), 5);
        assert_eq!(&hints[..3], &["a", "b", "c"]);
        // the fourth letter's single-char slot was expanded into two-char labels
        assert!(hints[3].starts_with('d') && hints[3].len() == 2);
        assert!(hints[4].starts_with('d') && hints[4].len() == 2);
    }

    #[test]
    fn hints_are_distinct() {
        let a = Alphabet::new("abc");
        let hints = a.hints(20);
        let unique: std::collections::HashSet<_> = hints.iter().collect();
        assert_eq!(unique.len(), hints.len());
    }

    #[test]
    fn zero_count_is_empty() {
        let a = Alphabet::new("abcd");
        assert!(a.hints(0).is_empty());
    }

    #[test]
    fn new_deduplicates_letters() {
        let a = Alphabet::new("aabbc");
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn by_name_builtin() {
        assert!(Alphabet::by_name("qwerty").is_ok());
        assert!(Alphabet::by_name("not-a-real-alphabet").is_err());
    }

    #[test]
    fn all_builtin_names_resolve() {
        for name in BUILTIN_NAMES {
            assert!(Alphabet::by_name(name).is_ok(), "{name} should resolve");
        }
    }
}
