use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const CARD_COUNT_MAX: i8 = 127;

/// Per-monster card counts, saturating at 127.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MonsterBook {
    entries: HashMap<u32, i8>,
}

impl MonsterBook {
    /// Records a card for the monster and returns the new count.
    pub fn record(&mut self, card_id: u32) -> i8 {
        let count = self.entries.entry(card_id).or_insert(0);
        if *count < CARD_COUNT_MAX {
            *count += 1;
        }
        *count
    }

    pub fn count(&self, card_id: u32) -> i8 {
        self.entries.get(&card_id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, i8)> + '_ {
        self.entries.iter().map(|(id, count)| (*id, *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_saturates_at_cap() {
        let mut book = MonsterBook::default();
        for _ in 0..200 {
            book.record(100100);
        }
        assert_eq!(book.count(100100), 127);
    }
}
