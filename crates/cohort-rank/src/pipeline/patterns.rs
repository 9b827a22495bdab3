//! Field-name vocabularies used to recognise roles in an unannounced schema.
//!
//! Headers arrive in Chinese or English with no fixed spelling, so every role
//! is recognised by pattern rather than by exact name.

use regex::Regex;
use std::sync::OnceLock;

/// Identity-like names in priority order. The first pattern that matches any
/// field wins, even if a later pattern matches an earlier field.
const IDENTITY_PATTERNS: &[&str] = &[
    r"(?i)(^|[^a-z])id([^a-z]|$)",
    r"(?i)考号|准考证|exam\s*(no\.?|num|number)",
    r"(?i)学号|学籍号|student\s*(no\.?|num|number)",
    r"(?i)编号|代码|code",
];

const STRUCTURAL_PATTERN: &str = r"(?ix)
    总分|总成绩|合计|total|sum
    |备注|remark|note
    |状态|status
    |排名|名次|排序|位次|rank
    |序号|^no\.?$|^seq
    |考号|学号|准考证|编号|(^|[^a-z])id([^a-z]|$)
    |姓名|名字|name
    |班级|班别|^班$|class
    |年级|grade
    |^_|^assigned_|^rank_|^combinations$
";

const PRE_COMBINED_PATTERN: &str = r"(?ix)
    物化|化生|物生|生地|史地|史政|政史|政地|地政
    |理综|文综|综合
    |phys\w*\s*[+&/]\s*chem
";

const NAME_PATTERN: &str = r"(?i)^\s*(姓名|名字|学生姓名|name|student\s*name|full\s*name)\s*$";
const CLASS_PATTERN: &str = r"(?i)^\s*(班级|班别|班|行政班|所在班级|class|class\s*name)\s*$";
const GRADE_PATTERN: &str = r"(?i)^\s*(年级|届别|grade|grade\s*level|year)\s*$";
const DECLARED_TOTAL_PATTERN: &str = r"(?i)总分|总成绩|合计|^\s*total|^\s*sum\s*$";
const ELECTIVE_LABEL_PATTERN: &str = r"(?i)选科|选考|科目组合|组合|combination|elective|subject\s*group";
const RANKING_LIKE_PATTERN: &str = r"(?i)排名|名次|位次|rank|赋分|assigned";

static IDENTITY: OnceLock<Vec<Regex>> = OnceLock::new();
static STRUCTURAL: OnceLock<Regex> = OnceLock::new();
static PRE_COMBINED: OnceLock<Regex> = OnceLock::new();
static NAME: OnceLock<Regex> = OnceLock::new();
static CLASS: OnceLock<Regex> = OnceLock::new();
static GRADE: OnceLock<Regex> = OnceLock::new();
static DECLARED_TOTAL: OnceLock<Regex> = OnceLock::new();
static ELECTIVE_LABEL: OnceLock<Regex> = OnceLock::new();
static RANKING_LIKE: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("field pattern compiles"))
}

pub(crate) fn identity_patterns() -> &'static [Regex] {
    IDENTITY.get_or_init(|| {
        IDENTITY_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern).expect("identity pattern compiles"))
            .collect()
    })
}

/// Metadata columns that can never be scored.
pub(crate) fn is_structural(field: &str) -> bool {
    compiled(&STRUCTURAL, STRUCTURAL_PATTERN).is_match(field.trim())
}

/// Columns that already add two subjects together.
pub(crate) fn is_pre_combined(field: &str) -> bool {
    compiled(&PRE_COMBINED, PRE_COMBINED_PATTERN).is_match(field)
}

pub(crate) fn is_name_field(field: &str) -> bool {
    compiled(&NAME, NAME_PATTERN).is_match(field)
}

pub(crate) fn is_class_field(field: &str) -> bool {
    compiled(&CLASS, CLASS_PATTERN).is_match(field)
}

pub(crate) fn is_grade_field(field: &str) -> bool {
    compiled(&GRADE, GRADE_PATTERN).is_match(field)
}

/// A total supplied by the source, excluding rank and rebased-total columns.
pub(crate) fn is_declared_total(field: &str) -> bool {
    compiled(&DECLARED_TOTAL, DECLARED_TOTAL_PATTERN).is_match(field)
        && !compiled(&RANKING_LIKE, RANKING_LIKE_PATTERN).is_match(field)
}

pub(crate) fn is_elective_label(field: &str) -> bool {
    compiled(&ELECTIVE_LABEL, ELECTIVE_LABEL_PATTERN).is_match(field)
        && !compiled(&RANKING_LIKE, RANKING_LIKE_PATTERN).is_match(field)
}

/// Case-insensitive substring match in either script.
pub(crate) fn contains_keyword(field: &str, keywords: &[String]) -> bool {
    let lowered = field.to_lowercase();
    keywords
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
}
