//! Rule based suffix stripping for Spanish.
//!
//! The word is split into the regions R1, R2 and RV, then a fixed pipeline runs
//! once: attached pronouns, verb endings, nominal endings, residual vowels and
//! finally diacritics. Every table is matched longest suffix first and only
//! inside the region the step is gated on.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

type Word = Vec<char>;

struct SuffixTable(Vec<Word>);

impl SuffixTable {
    fn new(suffixes: &[&str]) -> Self {
        let mut table: Vec<Word> = suffixes.iter().map(|s| s.chars().collect()).collect();
        table.sort_by(|a, b| b.len().cmp(&a.len()));
        SuffixTable(table)
    }

    /// Length of the longest entry that ends `word` and starts at or after `region`.
    fn find(&self, word: &[char], region: usize) -> Option<usize> {
        self.0
            .iter()
            .find(|s| in_region(word, s.len(), region) && word.ends_with(s))
            .map(Vec::len)
    }

    fn strip(&self, word: &mut Word, region: usize) -> bool {
        match self.find(word, region) {
            Some(n) => {
                word.truncate(word.len() - n);
                true
            }
            None => false,
        }
    }
}

lazy_static! {
    static ref PRONOUNS: SuffixTable = SuffixTable::new(&[
        "me", "se", "sela", "selo", "selas", "selos", "le", "les", "nos", "te", "la", "lo", "las", "los",
    ]);
    // (as written before the pronoun, restored form)
    static ref PRE_PRONOUNS: Vec<(Word, Word)> = [
        ("iéndo", "iendo"), ("ándo", "ando"), ("ár", "ar"), ("ér", "er"), ("ír", "ir"),
    ]
    .iter()
    .map(|(a, b)| (a.chars().collect(), b.chars().collect()))
    .collect();
    static ref Y_VERB: SuffixTable = SuffixTable::new(&[
        "yeron", "yendo", "yamos", "yais", "yáis", "yan", "yen", "yas", "yes", "ya", "ye", "yo", "yó",
    ]);
    static ref G_VERB: SuffixTable = SuffixTable::new(&["emos", "éis", "en", "es"]);
    static ref VERB: SuffixTable = SuffixTable::new(&[
        "aríamos", "eríamos", "iríamos", "iéramos", "iésemos",
        "aríais", "aremos", "asteis", "ábamos", "áramos", "ásemos", "eríais", "eremos", "iríais", "iremos",
        "ierais", "ieseis", "isteis",
        "arían", "arías", "abais", "arais", "aseis", "erían", "erías", "eréis", "irían", "irías", "iréis",
        "ieran", "iesen", "ieron", "iendo", "ieras", "ieses", "íamos",
        "arán", "arás", "aban", "aran", "asen", "aron", "aste", "ando", "abas", "adas", "aras", "ases", "ados",
        "amos", "erán", "erás", "ería", "irán", "irás", "iría", "iera", "iese", "iste", "idas", "íais", "idos",
        "imos",
        "ará", "aré", "aba", "ada", "ara", "ase", "ado", "áis", "erá", "eré", "irá", "iré", "ida", "ían", "ido",
        "ías",
        "ad", "an", "ar", "as", "ed", "er", "ía", "id", "ió", "ir", "ís",
    ]);
    static ref FIRST_LAYER: SuffixTable = SuffixTable::new(&[
        "amientos", "imientos", "amiento", "imiento", "anzas", "ismos", "ables", "ibles", "istas",
        "anza", "icos", "icas", "ismo", "able", "ible", "ista", "osos", "osas", "ico", "ica", "oso", "osa",
    ]);
    static ref SECOND_LAYER: SuffixTable = SuffixTable::new(&[
        "aciones", "adoras", "adores", "ancias", "idores", "idoras", "adora", "ación", "antes", "ancia",
        "idora", "acion", "ador", "ante", "idor",
    ]);
    static ref LOGIA: SuffixTable = SuffixTable::new(&["logías", "logias", "logía", "logia"]);
    static ref UCION: SuffixTable = SuffixTable::new(&["uciones", "ución", "ucion"]);
    static ref CION: SuffixTable = SuffixTable::new(&["ccion", "cción", "cion", "ción", "sion", "sión"]);
    static ref ENCIA: SuffixTable = SuffixTable::new(&["encias", "encia", "entes", "ente"]);
    static ref IDAD: SuffixTable = SuffixTable::new(&["idades", "idad"]);
    static ref IVO: SuffixTable = SuffixTable::new(&["ivas", "ivos", "iva", "ivo"]);
    static ref RESIDUAL: SuffixTable = SuffixTable::new(&["os", "al", "a", "o", "á", "í", "ó", "i"]);
    static ref RESIDUAL_E: SuffixTable = SuffixTable::new(&["e", "é"]);
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ü')
}

fn in_region(word: &[char], suffix_len: usize, region: usize) -> bool {
    word.len() >= suffix_len && word.len() - suffix_len >= region
}

fn ends_in_region(word: &[char], suffix: &str, region: usize) -> bool {
    let suffix: Word = suffix.chars().collect();
    in_region(word, suffix.len(), region) && word.ends_with(&suffix)
}

fn drop_last(word: &mut Word, n: usize) {
    word.truncate(word.len().saturating_sub(n));
}

/// First index after `start` holding a consonant that follows a vowel.
fn region_after(word: &[char], start: usize) -> usize {
    (start.max(1)..word.len())
        .find(|&i| !is_vowel(word[i]) && is_vowel(word[i - 1]))
        .unwrap_or(word.len())
}

fn r1(word: &[char]) -> usize {
    region_after(word, 1)
}

fn r2(word: &[char], r1: usize) -> usize {
    region_after(word, r1 + 1)
}

fn rv(word: &[char]) -> usize {
    if word.len() <= 3 {
        return word.len();
    }
    if !is_vowel(word[1]) {
        if let Some(i) = (2..word.len()).find(|&i| is_vowel(word[i])) {
            return i + 1;
        }
    }
    if is_vowel(word[0]) && is_vowel(word[1]) {
        if let Some(i) = (2..word.len()).find(|&i| !is_vowel(word[i])) {
            return i + 1;
        }
    }
    3
}

fn strip_pronoun(word: &mut Word, rv: usize) {
    const YENDO: [char; 5] = ['y', 'e', 'n', 'd', 'o'];
    for pronoun in &PRONOUNS.0 {
        if !(in_region(word, pronoun.len(), rv) && word.ends_with(pronoun)) {
            continue;
        }
        let end = word.len() - pronoun.len();
        for (written, restored) in PRE_PRONOUNS.iter() {
            let n = written.len();
            if end < n || end - n < rv {
                continue;
            }
            let before = &word[end - n..end];
            if before != written.as_slice() && before != restored.as_slice() {
                continue;
            }
            word.truncate(end - n);
            word.extend_from_slice(restored);
            return;
        }
        if end >= YENDO.len() + 1 && end - YENDO.len() >= rv && word[end - YENDO.len()..end] == YENDO
            && word[end - YENDO.len() - 1] == 'u'
        {
            word.truncate(end);
            return;
        }
    }
}

fn strip_verb_suffix(word: &mut Word, rv: usize) {
    if let Some(n) = Y_VERB.find(word, rv) {
        if word.len() > n && word[word.len() - n - 1] == 'u' {
            drop_last(word, n);
        }
    }
    if G_VERB.strip(word, rv) && ends_in_region(word, "u", rv) && word.ends_with(&['g', 'u']) {
        word.pop();
    }
    VERB.strip(word, rv);
}

fn strip_non_verb_suffix(word: &mut Word, r1: usize, r2: usize) {
    FIRST_LAYER.strip(word, r2);

    if SECOND_LAYER.strip(word, r2) && ends_in_region(word, "ic", r2) {
        drop_last(word, 2);
    }
    if LOGIA.strip(word, r2) {
        word.extend("log".chars());
    }
    if UCION.strip(word, r2) {
        word.push('u');
    }
    CION.strip(word, r2);
    ENCIA.strip(word, r2);

    if ends_in_region(word, "amente", r1) {
        drop_last(word, 6);
        if ends_in_region(word, "iv", r2) {
            drop_last(word, 2);
            if ends_in_region(word, "at", r2) {
                drop_last(word, 2);
            }
        } else if ["os", "ic", "ad"].iter().any(|s| ends_in_region(word, s, r2)) {
            drop_last(word, 2);
        }
    }

    if ends_in_region(word, "mente", r2) {
        drop_last(word, 5);
        if ["ante", "able", "ible"].iter().any(|s| ends_in_region(word, s, r2)) {
            drop_last(word, 4);
        }
    }

    if IDAD.strip(word, r2) {
        if ends_in_region(word, "abil", r2) {
            drop_last(word, 4);
        } else if ["iv", "ic"].iter().any(|s| ends_in_region(word, s, r2)) {
            drop_last(word, 2);
        }
    }

    if IVO.strip(word, r2) && ends_in_region(word, "at", r2) {
        drop_last(word, 2);
    }
}

fn strip_residual(word: &mut Word, rv: usize) {
    RESIDUAL.strip(word, rv);
    if RESIDUAL_E.strip(word, rv) && ends_in_region(word, "u", rv) && word.ends_with(&['g', 'u']) {
        word.pop();
    }
}

/// Decompose, drop combining marks, keep letters and digits.
fn strip_diacritics(word: &[char]) -> String {
    word.iter()
        .collect::<String>()
        .nfd()
        .filter(|c| !is_combining_mark(*c) && c.is_alphanumeric())
        .collect()
}

/// Stem without touching any memo.
pub fn stem_uncached(term: &str) -> String {
    let mut word: Word = term.chars().collect();
    let r1 = r1(&word);
    let r2 = r2(&word, r1);
    let rv = rv(&word);
    strip_pronoun(&mut word, rv);
    strip_verb_suffix(&mut word, rv);
    strip_non_verb_suffix(&mut word, r1, r2);
    strip_residual(&mut word, rv);
    strip_diacritics(&word)
}

/// Append-only term → stem memo shared by every query of a process.
///
/// Keys are never removed and a value never changes once written, so readers
/// only contend with the short write lock taken for a new key.
#[derive(Debug, Default)]
pub struct StemCache {
    memo: RwLock<HashMap<String, String>>,
}

impl StemCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: HashMap<String, String>) -> Self {
        Self { memo: RwLock::new(entries) }
    }

    pub fn stem(&self, term: &str) -> String {
        if let Some(stem) = self.memo.read().get(term) {
            return stem.clone();
        }
        let stem = stem_uncached(term);
        self.memo.write().entry(term.to_string()).or_insert(stem).clone()
    }

    pub fn get(&self, term: &str) -> Option<String> {
        self.memo.read().get(term).cloned()
    }

    /// Add entries for keys not already present.
    pub fn extend<I: IntoIterator<Item = (String, String)>>(&self, entries: I) {
        let mut memo = self.memo.write();
        for (term, stem) in entries {
            memo.entry(term).or_insert(stem);
        }
    }

    pub fn len(&self) -> usize {
        self.memo.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.memo.read().clone()
    }
}

/// Stem `term` through `cache`.
pub fn stem(term: &str, cache: &StemCache) -> String {
    cache.stem(term)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Word {
        s.chars().collect()
    }

    #[test]
    fn regions() {
        let w = chars("hablar");
        assert_eq!(r1(&w), 2);
        assert_eq!(r2(&w, 2), 5);
        assert_eq!(rv(&w), 3);
        assert_eq!(rv(&chars("sol")), 3);
        // two leading vowels: after the next consonant
        assert_eq!(rv(&chars("aéreo")), 3);
        // consonant in second place: after the next vowel
        assert_eq!(rv(&chars("estrella")), 4);
    }

    #[test]
    fn verb_forms_share_a_stem() {
        for w in ["hablar", "hablando", "hablaremos", "hablándole"] {
            assert_eq!(stem_uncached(w), "habl", "{w}");
        }
    }

    #[test]
    fn nominal_suffixes() {
        for w in ["capitalismo", "capitalista"] {
            assert_eq!(stem_uncached(w), "capit", "{w}");
        }
        assert_eq!(stem_uncached("revolución"), "revolu");
        assert_eq!(stem_uncached("revoluciones"), "revolu");
    }

    #[test]
    fn gu_keeps_the_g_before_a_dropped_e() {
        // verb step: "en" after "gu"
        assert_eq!(stem_uncached("persiguen"), "persig");
        // residual step: "e" after "gu"
        assert_eq!(stem_uncached("averigüe"), "averigu");
    }

    #[test]
    fn y_endings_need_a_preceding_u() {
        assert_eq!(stem_uncached("arguyeron"), "argu");
        // "yo" after "a" stays, only the residual vowel goes
        assert_eq!(stem_uncached("ensayo"), "ensay");
    }

    #[test]
    fn pronoun_after_uyendo() {
        assert_eq!(stem_uncached("distribuyendola"), "distribu");
    }

    #[test]
    fn logia_becomes_log() {
        assert_eq!(stem_uncached("arqueologías"), "arqueolog");
    }

    #[test]
    fn diacritics_are_removed() {
        assert_eq!(stem_uncached("nación"), "nacion");
        assert_eq!(stem_uncached("nacion"), "nacion");
        assert_eq!(stem_uncached("camión"), "camion");
    }

    #[test]
    fn stemming_is_idempotent() {
        for w in ["casa", "perro", "hablar", "nación", "capitalismo", "camión"] {
            let once = stem_uncached(w);
            assert_eq!(stem_uncached(&once), once, "{w}");
        }
    }

    #[test]
    fn short_and_empty_words() {
        assert_eq!(stem_uncached(""), "");
        assert_eq!(stem_uncached("y"), "y");
        assert_eq!(stem_uncached("sol"), "sol");
    }

    #[test]
    fn cache_memoizes_and_never_overwrites() {
        let cache = StemCache::new();
        assert!(cache.is_empty());
        assert_eq!(stem("casa", &cache), "cas");
        assert_eq!(cache.get("casa").as_deref(), Some("cas"));
        cache.extend(vec![("casa".to_string(), "other".to_string())]);
        assert_eq!(cache.stem("casa"), "cas");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn seeded_cache_is_trusted() {
        let mut seed = HashMap::new();
        seed.insert("gatos".to_string(), "gat".to_string());
        let cache = StemCache::with_entries(seed);
        assert_eq!(cache.stem("gatos"), "gat");
        assert_eq!(cache.snapshot().len(), 1);
    }
}
