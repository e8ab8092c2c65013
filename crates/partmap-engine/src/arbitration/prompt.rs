//! Prompts for candidate arbitration

use partmap_domain::{ArbitrationMode, ArbitrationRequest, CatalogKind};

/// Builds the arbitration prompt for one request
pub struct ArbitrationPrompt<'a> {
    request: &'a ArbitrationRequest,
}

impl<'a> ArbitrationPrompt<'a> {
    /// Create a prompt builder
    pub fn new(request: &'a ArbitrationRequest) -> Self {
        Self { request }
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(match self.request.mode {
            ArbitrationMode::AddressValidation => ADDRESS_VALIDATION_INSTRUCTIONS,
            ArbitrationMode::BestMatch => BEST_MATCH_INSTRUCTIONS,
        });
        prompt.push_str("\n\n");

        let (query_label, context_label) = match self.request.kind {
            CatalogKind::Parts => ("Part number on the document", "Line description"),
            CatalogKind::Entities => ("Company name on the document", "Billing address"),
        };
        prompt.push_str(&format!("{}: {}\n", query_label, self.request.query_text));
        if let Some(context) = self.request.context_text.as_deref().filter(|c| !c.trim().is_empty()) {
            prompt.push_str(&format!("{}:\n---\n{}\n---\n", context_label, context.trim()));
        }
        prompt.push('\n');

        prompt.push_str("Candidates:\n");
        for (i, candidate) in self.request.candidates.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. key: {} | {} | score: {:.0}\n",
                i + 1,
                candidate.key,
                candidate.display_text,
                candidate.score.value()
            ));
        }
        prompt.push('\n');

        prompt.push_str(OUTPUT_FORMAT);
        prompt
    }
}

const ADDRESS_VALIDATION_INSTRUCTIONS: &str = r#"Several catalog records match the name on a business document equally well. Decide which record the document refers to by comparing the billing address with each candidate's address.

Rules:
- The street number and street name matter most; city and region break remaining ties
- Suite, unit and floor numbers may be missing or differ
- Abbreviations (ST/STREET, BLVD/BOULEVARD, PKWY/PARKWAY) are equivalent
- If no candidate's address is consistent with the document, answer null"#;

const BEST_MATCH_INSTRUCTIONS: &str = r#"Pick the catalog record that best matches a reference taken from a business document. The candidate scores come from text similarity and may be misleading.

Rules:
- Only pick a candidate when you are confident it is the same item or company
- Typing errors, missing separators and extra vendor prefixes are common
- Different sizes, models or branches are different records
- If none of the candidates is a match, answer null"#;

const OUTPUT_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"best_match": "<candidate key or null>", "confidence": <0-100>, "reasoning": "<one sentence>"}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use partmap_domain::{ArbitrationCandidate, Confidence};

    fn request(mode: ArbitrationMode) -> ArbitrationRequest {
        ArbitrationRequest {
            kind: CatalogKind::Entities,
            query_text: "Acme Gas".to_string(),
            context_text: Some("400 Industrial Parkway\nPeoria, IL 61602".to_string()),
            candidates: vec![
                ArbitrationCandidate {
                    key: "C1001".to_string(),
                    display_text: "Acme Gas Co. | 12 Oak St, Springfield, IL 62701".to_string(),
                    score: Confidence::new(100.0),
                },
                ArbitrationCandidate {
                    key: "C1002".to_string(),
                    display_text: "Acme Gas Inc | 400 Industrial Pkwy, Peoria, IL 61602".to_string(),
                    score: Confidence::new(100.0),
                },
            ],
            mode,
        }
    }

    #[test]
    fn test_address_validation_prompt() {
        let prompt = ArbitrationPrompt::new(&request(ArbitrationMode::AddressValidation)).build();
        assert!(prompt.contains("comparing the billing address"));
        assert!(prompt.contains("Company name on the document: Acme Gas"));
        assert!(prompt.contains("Billing address:\n---\n400 Industrial Parkway"));
        assert!(prompt.contains("2. key: C1002 | Acme Gas Inc"));
        assert!(prompt.contains("\"best_match\""));
    }

    #[test]
    fn test_best_match_prompt_without_context() {
        let mut request = request(ArbitrationMode::BestMatch);
        request.kind = CatalogKind::Parts;
        request.context_text = None;
        let prompt = ArbitrationPrompt::new(&request).build();
        assert!(prompt.contains("Part number on the document"));
        assert!(!prompt.contains("Line description"));
        assert!(prompt.contains("score: 100"));
    }
}
