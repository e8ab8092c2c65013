//! Pure text normalization for part numbers, company names and addresses
//!
//! Nothing here touches the catalog. All rules are data ([`NormalizerRules`])
//! so deployments can extend the tables from TOML without code changes.

use crate::error::EngineError;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Maximum number of transforms chained when enumerating part variants
pub const MAX_TRANSFORMS: usize = 3;

const LEGAL_FORMS: &str =
    r"INC|INCORPORATED|CORP|CORPORATION|LLC|L\.L\.C|LTD|LIMITED|CO|COMPANY|LP|L\.P|LLP|L\.L\.P";

const STREET_TOKENS: &[&str] = &[
    "ST", "STREET", "AVE", "AVENUE", "BLVD", "BOULEVARD", "DR", "DRIVE", "RD", "ROAD", "LN",
    "LANE", "CT", "COURT", "PL", "PLACE", "PKWY", "PARKWAY", "HWY", "HIGHWAY", "WAY", "BOX",
];

static LEGAL_SUFFIX_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[,\s]*\b(?:{})\b\.?[,.\s]*$", LEGAL_FORMS))
        .expect("legal suffix pattern is valid")
});

static LEGAL_SUFFIX_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[,.\s]*(?:{})\b\.?[,\s]+", LEGAL_FORMS))
        .expect("legal prefix pattern is valid")
});

static LEGAL_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", LEGAL_FORMS)).expect("legal word pattern is valid")
});

static REGION_POSTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\b\.?\s+\d{5}").expect("region postal pattern is valid"));

static CITY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)([A-Z][A-Z .'-]*?),?[ \t]+[A-Z]{2}\.?[ \t]+\d{5}").expect("city pattern is valid")
});

static SUITE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:SUITE|STE|UNIT|APT|APARTMENT)\b\.?|#)\s*[0-9A-Z]+\s*-\s*(\d+)")
        .expect("suite range pattern is valid")
});

static SUITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\b(?:SUITE|STE|UNIT|APT|APARTMENT)\b\.?|#)\s*[0-9A-Z]+\b")
        .expect("suite pattern is valid")
});

static PO_BOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bP\.?\s*O\.?\s*BOX\b").expect("box pattern is valid"));

static REGION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r",\s*([A-Z]{2})\.?\s+(?:\d{5}|US\b)",
        r"\b([A-Z]{2})\s+\d{5}",
        r"\b([A-Z]{2})\s+US\b",
        r"(?m),\s*([A-Z]{2})\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("region pattern is valid"))
    .collect()
});

/// Configurable normalization tables (`[normalizer]` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerRules {
    /// Trailing vendor suffixes and their catalog spelling (`"-2" = "2"`)
    pub suffix_map: BTreeMap<String, String>,

    /// Vendor prefixes stripped from part numbers, checked in order
    pub vendor_prefixes: Vec<String>,

    /// Prefixes the catalog puts in front of vendor part numbers
    pub catalog_prefixes: Vec<String>,

    /// Industry words ignored when extracting a company's core name
    pub generic_words: Vec<String>,

    /// Street abbreviation table (`STREET = "ST"`)
    pub street_abbreviations: BTreeMap<String, String>,

    /// Two-letter tokens that look like regions but usually are not
    pub region_false_positives: Vec<String>,
}

impl Default for NormalizerRules {
    fn default() -> Self {
        let suffix_map = ('1'..='9')
            .chain('A'..='J')
            .map(|c| (format!("-{}", c), c.to_string()))
            .collect();

        let street_abbreviations = [
            ("STREET", "ST"),
            ("AVENUE", "AVE"),
            ("BOULEVARD", "BLVD"),
            ("BOUL", "BLVD"),
            ("DRIVE", "DR"),
            ("ROAD", "RD"),
            ("LANE", "LN"),
            ("COURT", "CT"),
            ("PLACE", "PL"),
            ("PARKWAY", "PKWY"),
            ("PARK", "PK"),
            ("NORTH", "N"),
            ("SOUTH", "S"),
            ("EAST", "E"),
            ("WEST", "W"),
            ("NORTHEAST", "NE"),
            ("NORTHWEST", "NW"),
            ("SOUTHEAST", "SE"),
            ("SOUTHWEST", "SW"),
        ]
        .iter()
        .map(|(full, abbr)| (full.to_string(), abbr.to_string()))
        .collect();

        Self {
            suffix_map,
            // Latin, Greek and mixed OCR spellings
            vendor_prefixes: strings(&["KOI ", "ΚΟΙ ", "ΚOI ", "KOI", "ΚΟΙ"]),
            catalog_prefixes: strings(&["ZTIP", "ZTI", "ZT", "TIP"]),
            generic_words: strings(&[
                "SUPPLY", "SUPPLIES", "WELDING", "GAS", "GASES", "OXYGEN", "INDUSTRIAL",
                "INDUSTRIES", "SERVICE", "SERVICES", "EQUIPMENT", "DISTRIBUTION", "DISTRIBUTORS",
                "SALES", "AND", "&", "THE", "OF",
            ]),
            street_abbreviations,
            region_false_positives: strings(&["CO", "ST", "RD", "DR", "BL", "AV", "CT", "PK", "PL"]),
        }
    }
}

/// A part number form reachable from the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartVariant {
    /// The transformed form
    pub form: String,
    /// Number of transforms applied (1 to [`MAX_TRANSFORMS`])
    pub transforms: usize,
}

/// Normalized view of a billing address block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedAddress {
    /// Street line only, normalized
    pub street: String,
    /// Every line of the block, normalized and joined with `", "`
    pub full_block: String,
    /// Two-letter region codes found in the block, in order of appearance
    pub region_codes: Vec<String>,
    /// City, when a `City, ST 12345` line is present
    pub city: Option<String>,
}

impl NormalizedAddress {
    /// Whether a street line was found
    pub fn has_street(&self) -> bool {
        !self.street.is_empty()
    }
}

/// Applies [`NormalizerRules`]
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: NormalizerRules,
    abbreviations: Vec<(Regex, String)>,
}

impl Normalizer {
    /// Compile the rule tables
    pub fn new(rules: NormalizerRules) -> Result<Self, EngineError> {
        let abbreviations = rules
            .street_abbreviations
            .iter()
            .map(|(full, abbr)| {
                let pattern = format!(r"\b{}\b\.?", regex::escape(&fold(full)));
                Regex::new(&pattern)
                    .map(|re| (re, fold(abbr)))
                    .map_err(|e| EngineError::InvalidConfig(format!("abbreviation '{}': {}", full, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules, abbreviations })
    }

    /// The default rule tables
    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(NormalizerRules::default())
    }

    /// The active rules
    pub fn rules(&self) -> &NormalizerRules {
        &self.rules
    }

    /// Canonical spelling of a part number as typed
    pub fn normalize_part_number(&self, raw: &str) -> String {
        fold(raw)
    }

    /// The suffix-collapsed form, or the folded query when no suffix applies
    pub fn primary_form(&self, raw: &str) -> String {
        let query = fold(raw);
        self.collapse_suffix(&query).unwrap_or(query)
    }

    /// The part of the query in front of a table suffix (`103D7-2` → `103D7`)
    pub fn suffix_base(&self, raw: &str) -> Option<String> {
        let query = fold(raw);
        self.rules
            .suffix_map
            .keys()
            .find_map(|suffix| split_suffix(&query, &fold(suffix)).map(str::to_string))
    }

    /// Every form reachable by up to [`MAX_TRANSFORMS`] transforms
    ///
    /// Each form is tagged with the fewest transforms that reach it. The
    /// result is sorted by (transforms, form) and never contains the query.
    pub fn part_variants(&self, raw: &str) -> Vec<PartVariant> {
        let query = fold(raw);
        let mut best: BTreeMap<String, usize> = BTreeMap::new();
        let mut frontier = vec![query.clone()];

        for depth in 1..=MAX_TRANSFORMS {
            let mut next = Vec::new();
            for form in &frontier {
                for variant in self.single_transforms(form) {
                    if variant.is_empty() || variant == query || best.contains_key(&variant) {
                        continue;
                    }
                    best.insert(variant.clone(), depth);
                    next.push(variant);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        let mut variants: Vec<PartVariant> = best
            .into_iter()
            .map(|(form, transforms)| PartVariant { form, transforms })
            .collect();
        variants.sort_by(|a, b| a.transforms.cmp(&b.transforms).then_with(|| a.form.cmp(&b.form)));
        variants
    }

    fn single_transforms(&self, form: &str) -> Vec<String> {
        [
            self.collapse_suffix(form),
            self.strip_vendor_prefix(form),
            remove_separators(form),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn collapse_suffix(&self, form: &str) -> Option<String> {
        self.rules.suffix_map.iter().find_map(|(suffix, replacement)| {
            split_suffix(form, &fold(suffix)).map(|base| format!("{}{}", base, fold(replacement)))
        })
    }

    fn strip_vendor_prefix(&self, form: &str) -> Option<String> {
        self.rules.vendor_prefixes.iter().find_map(|prefix| {
            let prefix = prefix.to_uppercase();
            let rest = form.strip_prefix(prefix.as_str())?.trim();
            has_key_shape(rest).then(|| rest.to_string())
        })
    }

    /// Company name with legal-structure suffixes removed
    ///
    /// `"Indiana Oxygen Co, Inc"` → `"INDIANA OXYGEN"`. A name that consists
    /// only of a legal form is kept as is.
    pub fn normalize_entity_name(&self, raw: &str) -> String {
        let mut name = clean_name(&fold(raw));
        loop {
            let stripped = LEGAL_SUFFIX_END.replace(&name, "");
            let stripped = LEGAL_SUFFIX_START.replace(&stripped, "");
            let cleaned = clean_name(&stripped);
            if cleaned.is_empty() || cleaned == name {
                return name;
            }
            name = cleaned;
        }
    }

    /// The distinctive part of a company name, without industry words
    ///
    /// `None` when fewer than three characters remain.
    pub fn core_name(&self, raw: &str) -> Option<String> {
        let normalized = self.normalize_entity_name(raw);
        let core = normalized
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '&'))
            .filter(|t| !t.is_empty() && !self.is_generic_word(t))
            .collect::<Vec<_>>()
            .join(" ");

        (core.chars().count() >= 3).then_some(core)
    }

    fn is_generic_word(&self, token: &str) -> bool {
        self.rules.generic_words.iter().any(|w| w.eq_ignore_ascii_case(token))
    }

    /// Normalize a raw billing address block
    pub fn normalize_address(&self, block: &str) -> NormalizedAddress {
        let lines = address_lines(block);
        let street_line = self.street_line(&lines);
        let upper = block.to_uppercase();

        NormalizedAddress {
            street: self.normalize_street(&street_line),
            full_block: lines
                .iter()
                .map(|l| self.normalize_street(l))
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            region_codes: self.region_codes(&upper),
            city: CITY_LINE
                .captures(&upper)
                .map(|caps| caps[1].trim().trim_end_matches(',').to_string())
                .filter(|c| !c.is_empty()),
        }
    }

    /// Normalize one street line
    ///
    /// Handles suite and unit numbers, box spellings and the abbreviation
    /// table. `"Suite 1700-1250 Boul."` keeps the building number `1250`.
    pub fn normalize_street(&self, line: &str) -> String {
        let mut street = fold(line);

        street = if SUITE_RANGE.is_match(&street) {
            SUITE_RANGE.replace_all(&street, "${1}").into_owned()
        } else {
            SUITE.replace_all(&street, "").into_owned()
        };

        street = PO_BOX.replace_all(&street, "PO BOX").into_owned();

        for (pattern, abbr) in &self.abbreviations {
            street = pattern.replace_all(&street, NoExpand(abbr)).into_owned();
        }

        fold(&street.replace([',', '.', ';'], " "))
    }

    /// Region codes found in an address block
    pub fn region_codes(&self, block: &str) -> Vec<String> {
        let upper = block.to_uppercase();
        let mut codes: Vec<String> = Vec::new();

        for pattern in REGION_PATTERNS.iter() {
            for caps in pattern.captures_iter(&upper) {
                let code = caps[1].to_string();
                let false_positive = self.rules.region_false_positives.iter().any(|fp| *fp == code);
                if !false_positive && !codes.contains(&code) {
                    codes.push(code);
                }
            }
        }

        codes
    }

    fn street_line(&self, lines: &[String]) -> String {
        let candidates: Vec<&String> = lines
            .iter()
            .filter(|line| !self.is_company_line(line) && !REGION_POSTAL.is_match(line))
            .collect();

        candidates
            .iter()
            .find(|line| line.starts_with(|c: char| c.is_ascii_digit()))
            .or_else(|| candidates.iter().find(|line| has_digit(line)))
            .or_else(|| candidates.iter().find(|line| has_street_token(line)))
            .or_else(|| candidates.first())
            .map(|line| line.to_string())
            .or_else(|| lines.first().cloned())
            .unwrap_or_default()
    }

    fn is_company_line(&self, line: &str) -> bool {
        if has_digit(line) {
            return false;
        }
        LEGAL_WORD.is_match(line)
            || line
                .split(|c: char| !c.is_alphanumeric() && c != '&')
                .any(|t| !t.is_empty() && self.is_generic_word(t))
    }
}

/// Uppercase, trim, collapse internal whitespace
pub fn fold(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase()
}

/// Whether a string looks like a catalog key: ASCII letters and digits
/// (dashes allowed), at least three of them
pub fn has_key_shape(candidate: &str) -> bool {
    let mut alnum = 0;
    for c in candidate.chars() {
        if c.is_ascii_alphanumeric() {
            alnum += 1;
        } else if c != '-' {
            return false;
        }
    }
    alnum >= 3
}

fn split_suffix<'a>(form: &'a str, suffix: &str) -> Option<&'a str> {
    let base = form.strip_suffix(suffix)?;
    let valid = !base.is_empty() && !base.ends_with(['-', ' ']);
    valid.then_some(base)
}

fn remove_separators(form: &str) -> Option<String> {
    form.contains(['-', ' '])
        .then(|| form.chars().filter(|c| *c != '-' && *c != ' ').collect())
}

fn clean_name(name: &str) -> String {
    fold(name)
        .trim_matches(|c: char| c == ',' || c == '.' || c.is_whitespace())
        .to_string()
}

fn address_lines(block: &str) -> Vec<String> {
    let lines: Vec<String> = block.lines().map(fold).filter(|l| !l.is_empty()).collect();
    if lines.len() == 1 && lines[0].contains(',') {
        return lines[0]
            .split(',')
            .map(fold)
            .filter(|l| !l.is_empty())
            .collect();
    }
    lines
}

fn has_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

fn has_street_token(line: &str) -> bool {
    line.split(|c: char| !c.is_alphanumeric())
        .any(|t| STREET_TOKENS.contains(&t))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
