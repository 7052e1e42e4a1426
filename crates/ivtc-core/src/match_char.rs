//! Field-match characters.
//!
//! Every source frame carries one of five match characters describing which
//! field combination reconstructs the progressive frame. The character also
//! selects a column in the per-frame metric arrays; the two metric families
//! use different column mappings.

use crate::error::{ProjectError, Result};

/// A per-frame field match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Match {
    P,
    C,
    N,
    B,
    U,
}

impl Match {
    /// Parse a match character. Anything outside `{p,c,n,b,u}` is rejected.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'p' => Ok(Match::P),
            'c' => Ok(Match::C),
            'n' => Ok(Match::N),
            'b' => Ok(Match::B),
            'u' => Ok(Match::U),
            other => Err(ProjectError::InvalidMatchChar(other)),
        }
    }

    /// The lowercase character used in documents and scripts.
    #[inline]
    pub fn to_char(self) -> char {
        match self {
            Match::P => 'p',
            Match::C => 'c',
            Match::N => 'n',
            Match::B => 'b',
            Match::U => 'u',
        }
    }

    /// Column in the five-value mic array.
    #[inline]
    pub fn mic_index(self) -> usize {
        match self {
            Match::P => 0,
            Match::C => 1,
            Match::N => 2,
            Match::B => 3,
            Match::U => 4,
        }
    }

    /// Column in the two-value dmetric arrays.
    ///
    /// `n` and `u` alias onto the `p` column, `b` onto the `c` column. The
    /// asymmetry is relied upon by the dmetrics guesser; do not straighten
    /// it out.
    #[inline]
    pub fn dmetric_index(self) -> usize {
        match self {
            Match::P | Match::N | Match::U => 0,
            Match::C | Match::B => 1,
        }
    }

    /// Next match in the full rotation `c → n → b → p → u → c`.
    #[inline]
    pub fn successor(self) -> Self {
        match self {
            Match::C => Match::N,
            Match::N => Match::B,
            Match::B => Match::P,
            Match::P => Match::U,
            Match::U => Match::C,
        }
    }

    /// Next match in the short rotation `c → n → b → c`.
    #[inline]
    pub fn successor_cnb(self) -> Self {
        match self {
            Match::C => Match::N,
            Match::N => Match::B,
            _ => Match::C,
        }
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_roundtrip() {
        for c in ['p', 'c', 'n', 'b', 'u'] {
            assert_eq!(Match::from_char(c).unwrap().to_char(), c);
        }
    }

    #[test]
    fn test_invalid_char_rejected() {
        assert_eq!(
            Match::from_char('x'),
            Err(ProjectError::InvalidMatchChar('x'))
        );
    }

    #[test]
    fn test_mic_indices() {
        assert_eq!(Match::P.mic_index(), 0);
        assert_eq!(Match::C.mic_index(), 1);
        assert_eq!(Match::N.mic_index(), 2);
        assert_eq!(Match::B.mic_index(), 3);
        assert_eq!(Match::U.mic_index(), 4);
    }

    #[test]
    fn test_dmetric_indices_alias() {
        // n and u share p's column, b shares c's column.
        assert_eq!(Match::N.dmetric_index(), Match::P.dmetric_index());
        assert_eq!(Match::U.dmetric_index(), Match::P.dmetric_index());
        assert_eq!(Match::B.dmetric_index(), Match::C.dmetric_index());
        assert_ne!(Match::P.dmetric_index(), Match::C.dmetric_index());
    }

    #[test]
    fn test_rotations_return_to_start() {
        let mut m = Match::C;
        for _ in 0..5 {
            m = m.successor();
        }
        assert_eq!(m, Match::C);

        let mut m = Match::C;
        for _ in 0..3 {
            m = m.successor_cnb();
        }
        assert_eq!(m, Match::C);
    }
}
