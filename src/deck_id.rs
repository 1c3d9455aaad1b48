//! Deck identifiers and the sources that produce them.

use std::fmt;

use rand::Rng;

/// Zero-padded numeric identifier printed on a report and used in its file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeckId(String);

impl DeckId {
    /// Formats `value` as a zero-padded identifier of `length` digits.
    ///
    /// Values wider than `length` keep only their lowest `length` digits.
    pub fn from_number(value: u64, length: usize) -> Self {
        let modulus = 10u64.checked_pow(length as u32);
        let value = match modulus {
            Some(modulus) => value % modulus,
            None => value,
        };
        Self(format!("{:0width$}", value, width = length))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces a deck identifier for each run.
///
/// Identifiers are not checked for uniqueness across runs.
pub trait DeckIdSource {
    fn next_id(&mut self, length: usize) -> DeckId;
}

/// Draws identifiers uniformly from `0..10^length`.
#[derive(Debug, Default)]
pub struct RandomDeckId;

impl DeckIdSource for RandomDeckId {
    fn next_id(&mut self, length: usize) -> DeckId {
        let upper = 10u64.checked_pow(length as u32).unwrap_or(u64::MAX);
        let value = rand::rng().random_range(0..upper);
        DeckId::from_number(value, length)
    }
}

/// Hands out consecutive identifiers starting from a fixed value.
#[derive(Debug, Default)]
pub struct SequentialDeckId {
    next: u64,
}

impl SequentialDeckId {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl DeckIdSource for SequentialDeckId {
    fn next_id(&mut self, length: usize) -> DeckId {
        let id = DeckId::from_number(self.next, length);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_zero_padded() {
        assert_eq!(DeckId::from_number(42, 9).as_str(), "000000042");
        assert_eq!(DeckId::from_number(123_456_789, 9).to_string(), "123456789");
    }

    #[test]
    fn wide_values_are_truncated_to_length() {
        assert_eq!(DeckId::from_number(1_234_567_890, 9).as_str(), "234567890");
    }

    #[test]
    fn random_ids_have_requested_length() {
        let mut source = RandomDeckId;
        for _ in 0..100 {
            let id = source.next_id(9);
            assert_eq!(id.as_str().len(), 9);
            assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[test]
    fn sequential_ids_increment() {
        let mut source = SequentialDeckId::starting_at(7);
        assert_eq!(source.next_id(9).as_str(), "000000007");
        assert_eq!(source.next_id(9).as_str(), "000000008");
    }
}
