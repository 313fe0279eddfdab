//! N-gram expansion of tokenized titles.
//!
//! Tiered mode groups the contiguous word windows of a title by size, largest
//! first, and widens every window with punctuation-substituted spellings so a
//! title saying "20/50" can still hit a catalog entry stored as "20-50".
//! Pooled mode produces one flat collection of windows annotated with their
//! exact-cased and normalized spellings.

use std::collections::BTreeSet;

use crate::normalizer::{normal_form, split_words};

/// Default largest window size.
pub const DEFAULT_MAX_NGRAM_SIZE: usize = 6;

/// Default characters treated as interchangeable inside a model number.
pub const DEFAULT_PUNCTUATION: &[char] = &['-', '/', '.'];

/// All n-grams of one window size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tier {
    pub size: usize,
    pub ngrams: BTreeSet<String>,
}

/// One pooled-mode window: the substring as written and its normal form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PooledNgram {
    pub text: String,
    pub normal: String,
}

/// Every contiguous window of `size` words, joined by a single space.
pub fn windows<S: AsRef<str>>(tokens: &[S], size: usize) -> Vec<String> {
    if size == 0 || size > tokens.len() {
        return Vec::new();
    }
    tokens
        .windows(size)
        .map(|w| {
            w.iter()
                .map(<S as AsRef<str>>::as_ref)
                .collect::<Vec<&str>>()
                .join(" ")
        })
        .collect()
}

/// The base form plus, for every ordered pair `(a, b)` of `punctuation`,
/// the form with every `a` replaced by `b`.
pub fn punctuation_variants(base: &str, punctuation: &[char]) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    out.insert(base.to_string());
    for &from in punctuation {
        if !base.contains(from) {
            continue;
        }
        for &to in punctuation {
            out.insert(base.replace(from, &to.to_string()));
        }
    }
    out
}

/// Build the tier list for `tokens`, from `max_size` down to 1.
///
/// Sizes larger than the token count produce nothing and are left out, so
/// an empty token list yields an empty tier list.
pub fn expand_tiers(tokens: &[String], max_size: usize, punctuation: &[char]) -> Vec<Tier> {
    (1..=max_size.min(tokens.len()))
        .rev()
        .filter_map(|size| {
            let ngrams: BTreeSet<String> = windows(tokens, size)
                .iter()
                .flat_map(|base| punctuation_variants(base, punctuation))
                .collect();
            if ngrams.is_empty() {
                None
            } else {
                Some(Tier { size, ngrams })
            }
        })
        .collect()
}

/// Pooled-mode windows of the raw title, sizes `max_size` down to 1.
pub fn pooled_ngrams(title: &str, max_size: usize) -> Vec<PooledNgram> {
    let words = split_words(title);
    (1..=max_size.min(words.len()))
        .rev()
        .flat_map(|size| windows(&words, size))
        .map(|text| {
            let normal = normal_form(&text);
            PooledNgram { text, normal }
        })
        .collect()
}

/// Single candidate set for pooled lookup: both spellings of every window.
pub fn pooled_candidates(ngrams: &[PooledNgram]) -> BTreeSet<String> {
    ngrams
        .iter()
        .flat_map(|n| [n.text.trim(), n.normal.trim()])
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
