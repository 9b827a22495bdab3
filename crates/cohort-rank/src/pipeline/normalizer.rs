use regex::Regex;
use std::sync::OnceLock;

/// Sentinel for records whose class (or grade) cannot be resolved.
pub const UNCLASSIFIED: &str = "Unclassified";

const CLASS_SUFFIX: &str = "班";

const BRACKETS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '（', '）', '【', '】', '［', '］', '〔', '〕', '｛', '｝', '<',
    '>', '《', '》',
];

const COMBINATION_DELIMITERS: &[char] = &[
    '+', '＋', ',', '，', '、', '/', '／', '|', '｜', '-', '—', '·', ';', '；', ':', '：',
];

static GRADE_PREFIX: OnceLock<Regex> = OnceLock::new();
static CLASS_TRAILER: OnceLock<Regex> = OnceLock::new();

fn grade_prefix() -> &'static Regex {
    GRADE_PREFIX.get_or_init(|| {
        Regex::new(
            r"(?i)^(高[一二三]|初[一二三]|[一二三四五六七八九]年级|(senior|junior|year|grade)\s*-?\s*\d+)",
        )
        .expect("grade prefix pattern compiles")
    })
}

fn class_trailer() -> &'static Regex {
    CLASS_TRAILER.get_or_init(|| Regex::new(r"(?i)(班|class)$").expect("class suffix compiles"))
}

/// Collapses superficially different spellings of one class into one key,
/// e.g. `高一（3）班`, `3 班` and `Senior-1 (3) class` all become `3班`.
pub fn canonical_class(raw: &str) -> String {
    let trimmed = raw.trim();

    let after_grade = grade_prefix()
        .find(trimmed)
        .map(|prefix| class_core(&trimmed[prefix.end()..]))
        .filter(|rest| !rest.is_empty());
    let core = after_grade.unwrap_or_else(|| class_core(trimmed));

    if core.is_empty() {
        return UNCLASSIFIED.to_string();
    }

    format!("{core}{CLASS_SUFFIX}")
}

/// Brackets and whitespace removed, trailing class token dropped.
fn class_core(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|ch| !BRACKETS.contains(ch) && !ch.is_whitespace())
        .collect();
    class_trailer().replace(&stripped, "").into_owned()
}

/// Elective label with separators and whitespace removed, order kept.
pub(crate) fn strip_combination_delimiters(label: &str) -> String {
    label
        .chars()
        .filter(|ch| !ch.is_whitespace() && !COMBINATION_DELIMITERS.contains(ch))
        .collect()
}

/// Order-insensitive key for an elective label: delimiters dropped, remaining
/// characters sorted. `化+物+生` and `物,化,生` share a key.
pub fn canonical_combination(label: &str) -> String {
    let mut chars: Vec<char> = strip_combination_delimiters(label).chars().collect();
    chars.sort_unstable();
    chars.into_iter().collect()
}
