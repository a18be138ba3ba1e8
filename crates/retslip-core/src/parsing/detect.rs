use crate::error::RetslipError;
use crate::model::Definitive;
use crate::profile::schema::ProfileDef;
use regex::Regex;

const DATE: &str = r"\d{1,2}/\d{1,2}/\d{4}";
/// Flag spellings recognized inside free text. Upper-case words belong to
/// job names such as "PHASE NO".
const FLAG: &str = r"(Yes|Ye|No)";
const FLAG_WORDS: [&str; 3] = ["Yes", "Ye", "No"];

/// Pattern recognizers for the fields of a return slip.
///
/// All methods are pure: they never mutate their input and are safe to call
/// speculatively. Patterns are compiled once from a [`ProfileDef`].
#[derive(Debug, Clone)]
pub struct Detectors {
    profile: ProfileDef,
    slip_exact: Regex,
    slip_any: Regex,
    date_any: Regex,
    date_exact: Regex,
    warehouse_any: Regex,
    warehouse_exact: Regex,
    warehouse_slip: Regex,
    tablet_code: Regex,
    total_open: Regex,
    flag_token: Regex,
    jobsite: Regex,
    cost_center: Regex,
    small_int: Regex,
    tail_int: Regex,
    region_code: Regex,
}

/// Free text with one or two definitive flags fused onto its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingFlags<'a> {
    pub text: &'a str,
    pub first: &'a str,
    pub second: Option<&'a str>,
}

impl Detectors {
    pub fn compile(profile: &ProfileDef) -> Result<Self, RetslipError> {
        let slip = format!(
            "{}\\d{{{}}}",
            regex::escape(&profile.slip_prefix),
            profile.slip_suffix_digits
        );
        let tablet = format!(r"\d{{2,4}}[{}]", regex::escape(&profile.tablet_suffixes));
        let warehouse = r"RO-[A-Z]{2}|\d+[A-Z]*";

        Ok(Detectors {
            slip_exact: Regex::new(&format!("^{slip}$"))?,
            slip_any: Regex::new(&slip)?,
            date_any: Regex::new(DATE)?,
            date_exact: Regex::new(&format!("^{DATE}$"))?,
            warehouse_any: Regex::new(&format!(r"(?i)\b({warehouse})(?:\s|$)"))?,
            warehouse_exact: Regex::new(r"(?i)^(RO-[A-Z]{2}|[A-Z0-9]{1,10})$")?,
            warehouse_slip: Regex::new(&format!(r"(?i)^({warehouse})\s+({slip})$"))?,
            tablet_code: Regex::new(&format!(r"\b{tablet}\b"))?,
            total_open: Regex::new(&format!(
                r"^(\d+)\s+({tablet}(?:[\s,]+{tablet})*)\s*,?$"
            ))?,
            flag_token: Regex::new(&format!(r"\b{FLAG}\b"))?,
            jobsite: Regex::new(&format!(
                r"\b{}\d{{{}}}\b",
                regex::escape(&profile.jobsite_lead_digit),
                profile.jobsite_digits.saturating_sub(1)
            ))?,
            cost_center: Regex::new(&format!(
                r"\b{}\d{{3}}\b",
                regex::escape(&profile.cost_center_prefix)
            ))?,
            small_int: Regex::new(r"\b\d{1,3}\b")?,
            tail_int: Regex::new(r"\b\d{1,2}\b")?,
            region_code: Regex::new(r"\b[A-Z]{2}\b")?,
            profile: profile.clone(),
        })
    }

    pub fn profile(&self) -> &ProfileDef {
        &self.profile
    }

    /// Exact match of the slip prefix followed by the suffix digits.
    pub fn is_slip_number(&self, s: &str) -> bool {
        self.slip_exact.is_match(s.trim())
    }

    /// First slip number appearing anywhere in `s`.
    pub fn find_slip<'a>(&self, s: &'a str) -> Option<&'a str> {
        self.slip_any.find(s).map(|m| m.as_str())
    }

    /// Date substrings (`M/D/YYYY`) in left-to-right order.
    pub fn extract_dates<'a>(&'a self, s: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.date_any.find_iter(s).map(|m| m.as_str())
    }

    pub fn is_date(&self, s: &str) -> bool {
        self.date_exact.is_match(s.trim())
    }

    /// `s` with every date replaced by a space.
    pub(crate) fn strip_dates(&self, s: &str) -> String {
        self.date_any.replace_all(s, " ").into_owned()
    }

    /// First warehouse code in `s`, upper-cased. Candidates longer than ten
    /// characters (slip numbers, jobsite ids) are skipped.
    pub fn extract_warehouse_code(&self, s: &str) -> Option<String> {
        self.warehouse_any
            .captures_iter(s)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|code| code.len() <= 10)
            .map(|code| code.to_uppercase())
    }

    /// Whether a whole cell (or line) is a warehouse code.
    pub fn is_warehouse_code(&self, s: &str) -> bool {
        let s = s.trim();
        self.warehouse_exact.is_match(s) && !self.is_state_code(s) && !self.is_date(s)
    }

    /// Split `<warehouse><whitespace><slip>` into its two parts.
    pub fn split_warehouse_slip<'a>(&self, s: &'a str) -> Option<(String, &'a str)> {
        let caps = self.warehouse_slip.captures(s.trim())?;
        Some((caps.get(1)?.as_str().to_uppercase(), caps.get(2)?.as_str()))
    }

    /// Coded tablet identifiers (2-4 digits plus a suffix letter) in input order.
    pub fn extract_tablet_codes<'a>(&self, s: &'a str) -> Vec<&'a str> {
        self.tablet_code.find_iter(s).map(|m| m.as_str()).collect()
    }

    pub fn has_tablet_code(&self, s: &str) -> bool {
        self.tablet_code.is_match(s)
    }

    /// Split `<integer><whitespace><tablet code list>`.
    pub fn split_total_open<'a>(&self, s: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.total_open.captures(s.trim())?;
        Some((caps.get(1)?.as_str(), caps.get(2)?.as_str().trim()))
    }

    /// Whether a whole cell is a recognized yes/no spelling.
    pub fn is_definitive_token(&self, s: &str) -> bool {
        Definitive::parse(s).is_some()
    }

    /// First definitive flag appearing as a word anywhere in `s`.
    pub fn find_definitive<'a>(&self, s: &'a str) -> Option<&'a str> {
        self.flag_token.find(s).map(|m| m.as_str())
    }

    /// Text before the first definitive flag word, and the flag itself.
    pub fn split_at_definitive<'a>(&self, s: &'a str) -> Option<(&'a str, &'a str)> {
        self.flag_token
            .find(s)
            .map(|m| (&s[..m.start()], m.as_str()))
    }

    /// Free text ending in exactly one or two definitive flag words.
    ///
    /// A longer run of flags, or flags with no text before them, is not a
    /// recognized fusion.
    pub fn split_trailing_flags<'a>(&self, s: &'a str) -> Option<TrailingFlags<'a>> {
        let s = s.trim();
        let words: Vec<&str> = s.split_whitespace().collect();
        let run = words.iter().rev().take_while(|w| is_flag_word(w)).count();
        if run == 0 || run > 2 || run == words.len() {
            return None;
        }

        let first = words[words.len() - run];
        let text_end = first.as_ptr() as usize - s.as_ptr() as usize;
        Some(TrailingFlags {
            text: s[..text_end].trim_end(),
            first,
            second: (run == 2).then(|| words[words.len() - 1]),
        })
    }

    pub fn is_state_code(&self, s: &str) -> bool {
        let s = s.trim();
        self.profile.state_codes.iter().any(|c| c == s)
    }

    /// Any standalone two-letter upper-case token.
    pub fn has_region_code(&self, s: &str) -> bool {
        self.region_code.is_match(s)
    }

    pub fn find_jobsite<'a>(&self, s: &'a str) -> Option<&'a str> {
        self.jobsite.find(s).map(|m| m.as_str())
    }

    pub fn find_cost_center<'a>(&self, s: &'a str) -> Option<&'a str> {
        self.cost_center.find(s).map(|m| m.as_str())
    }

    /// Bare integers of up to three digits, as in a Tablets list.
    pub fn extract_small_integers<'a>(&self, s: &'a str) -> Vec<&'a str> {
        self.small_int.find_iter(s).map(|m| m.as_str()).collect()
    }

    /// Bare one- or two-digit integers, as in trailing counts and delays.
    pub(crate) fn extract_tail_integers<'a>(&self, s: &'a str) -> Vec<&'a str> {
        self.tail_int.find_iter(s).map(|m| m.as_str()).collect()
    }

    /// The first noise marker contained in `s`.
    pub fn noise_marker<'a>(&'a self, s: &str) -> Option<&'a str> {
        self.profile
            .noise_markers
            .iter()
            .find(|m| s.contains(m.as_str()))
            .map(|m| m.as_str())
    }

    /// First known customer contained in `s`, in profile order.
    pub fn find_customer<'a>(&'a self, s: &str) -> Option<&'a str> {
        self.profile
            .known_customers
            .iter()
            .find(|c| s.contains(c.as_str()))
            .map(|c| c.as_str())
    }
}

fn is_flag_word(word: &str) -> bool {
    FLAG_WORDS.contains(&word)
}
