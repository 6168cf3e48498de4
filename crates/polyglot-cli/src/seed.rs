// crates/polyglot-cli/src/seed.rs
// ============================================================================
// Module: Synthetic Catalog Seeding
// Description: Deterministic generator for bulk-load translation entries.
// Purpose: Produce unique, valid entries for load and search testing.
// Dependencies: polyglot-core, rand
// ============================================================================

//! ## Overview
//! Generates `key_xxxxxx` entries with a random locale, a short lorem
//! sentence, and one to three tags. Keys are unique across the whole run so a
//! seeded catalog never trips the (key, locale) uniqueness rule on its own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use polyglot_core::NewEntry;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

// ============================================================================
// SECTION: Vocabulary
// ============================================================================

/// Locales assigned to seeded entries.
pub(crate) const SEED_LOCALES: [&str; 5] = ["en", "fr", "es", "de", "it"];
/// Tags assigned to seeded entries.
pub(crate) const SEED_TAGS: [&str; 3] = ["mobile", "web", "desktop"];
/// Random letters following the `key_` prefix.
const KEY_SUFFIX_LEN: usize = 6;
/// Word pool for generated sentences.
const WORDS: [&str; 24] = [
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "minim", "veniam", "quis", "nostrud",
];

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Stateful generator of unique synthetic entries.
pub(crate) struct SeedGenerator {
    /// Random source.
    rng: StdRng,
    /// Keys issued so far.
    issued: HashSet<String>,
}

impl SeedGenerator {
    /// Creates a generator; a fixed seed makes the output reproducible.
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Generates the next `size` entries.
    pub(crate) fn batch(&mut self, size: usize) -> Vec<NewEntry> {
        (0..size).map(|_| self.entry()).collect()
    }

    /// Generates one entry with a key not issued before.
    fn entry(&mut self) -> NewEntry {
        let key = self.unique_key();
        let locale = SEED_LOCALES.choose(&mut self.rng).copied().unwrap_or("en");
        let content = self.sentence();
        let tag_count = self.rng.gen_range(1..=SEED_TAGS.len());
        let tags: Vec<String> = SEED_TAGS
            .choose_multiple(&mut self.rng, tag_count)
            .map(|tag| (*tag).to_string())
            .collect();
        NewEntry {
            key,
            locale: locale.to_string(),
            content,
            tags,
        }
    }

    /// Draws keys until one is fresh.
    fn unique_key(&mut self) -> String {
        loop {
            let suffix: String = (0..KEY_SUFFIX_LEN)
                .map(|_| char::from(b'a' + self.rng.gen_range(0..26u8)))
                .collect();
            let key = format!("key_{suffix}");
            if self.issued.insert(key.clone()) {
                return key;
            }
        }
    }

    /// Builds a capitalized sentence of four to ten words.
    fn sentence(&mut self) -> String {
        let count = self.rng.gen_range(4..=10);
        let words: Vec<&str> =
            (0..count).filter_map(|_| WORDS.choose(&mut self.rng).copied()).collect();
        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get(..1) {
            let upper = first.to_ascii_uppercase();
            sentence.replace_range(..1, &upper);
        }
        sentence.push('.');
        sentence
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
