//! Fixed-size bitset over symbol ids, used for FIRST sets and lookaheads.

use thicket_table::SymbolId;

#[derive(Clone, Debug, Default)]
pub(crate) struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: SymbolId) -> bool {
        let (word, bit) = (symbol as usize / 64, symbol as usize % 64);
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        let before = self.words[word];
        self.words[word] |= 1 << bit;
        before != self.words[word]
    }

    pub fn contains(&self, symbol: SymbolId) -> bool {
        let (word, bit) = (symbol as usize / 64, symbol as usize % 64);
        self.words.get(word).is_some_and(|w| w & (1 << bit) != 0)
    }

    /// Add every member of `other`; returns whether anything was new.
    pub fn union_with(&mut self, other: &TokenSet) -> bool {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (mine, theirs) in self.words.iter_mut().zip(&other.words) {
            let merged = *mine | theirs;
            changed |= merged != *mine;
            *mine = merged;
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (i * 64 + bit) as SymbolId)
        })
    }
}
