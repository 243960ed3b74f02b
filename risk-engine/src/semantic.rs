//! Prompt template and response parsing for the semantic fallback
//!
//! Model output is untrusted text. Parsing yields a strict three-way outcome
//! and never panics or errors outward.

use crate::oracle::{SemanticJudgment, SemanticOutcome};
use serde::Deserialize;
use tracing::debug;

/// Build the fixed instruction sent for a receiver VPA
pub fn build_prompt(receiver_vpa: &str) -> String {
    format!(
        "You are a payment fraud analyst. Analyze this UPI virtual payment address (VPA): \"{}\".\n\
         Does it impersonate a brand, a bank, a government authority or customer support, \
         or does it promise money such as prizes, refunds, cashback or lottery winnings?\n\
         Respond ONLY with a JSON object of the form \
         {{\"risk_score\": <integer 0-100>, \"reason\": \"<one short sentence>\"}}.",
        receiver_vpa
    )
}

/// Remove surrounding code-fence markers such as ```` ```json ```` and whitespace
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag, if any
        text = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    }

    let trimmed = text.trim_end();
    if let Some(rest) = trimmed.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

#[derive(Debug, Deserialize)]
struct RawJudgment {
    risk_score: serde_json::Number,
    reason: String,
}

/// Parse model output into a judgment; anything unexpected is `Malformed`
pub fn parse_judgment(raw: &str) -> SemanticOutcome {
    let body = strip_code_fences(raw);

    let parsed: RawJudgment = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(error = %e, "Semantic response is not the expected JSON");
            return SemanticOutcome::Malformed;
        }
    };

    let score = match parsed.risk_score.as_f64() {
        Some(s) if s.is_finite() && s >= 0.0 => s.round().min(100.0) as u8,
        _ => {
            debug!(risk_score = %parsed.risk_score, "Semantic risk_score out of range");
            return SemanticOutcome::Malformed;
        }
    };

    SemanticOutcome::Assessed(SemanticJudgment {
        risk_score: score,
        reason: parsed.reason.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessed(score: u8, reason: &str) -> SemanticOutcome {
        SemanticOutcome::Assessed(SemanticJudgment {
            risk_score: score,
            reason: reason.to_string(),
        })
    }

    #[test]
    fn test_prompt_mentions_vpa() {
        let prompt = build_prompt("pm_care_fund@upi");
        assert!(prompt.contains("\"pm_care_fund@upi\""));
        assert!(prompt.contains("risk_score"));
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```\n"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_parse_plain_and_fenced() {
        let plain = r#"{"risk_score": 85, "reason": "Impersonates a government relief fund"}"#;
        assert_eq!(
            parse_judgment(plain),
            assessed(85, "Impersonates a government relief fund")
        );

        let fenced = "```json\n{\"risk_score\": 10, \"reason\": \"Looks like a personal handle\"}\n```";
        assert_eq!(parse_judgment(fenced), assessed(10, "Looks like a personal handle"));
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse_judgment("I think this is risky"), SemanticOutcome::Malformed);
        assert_eq!(parse_judgment(r#"{"risk_score": 50}"#), SemanticOutcome::Malformed);
        assert_eq!(
            parse_judgment(r#"{"risk_score": "high", "reason": "x"}"#),
            SemanticOutcome::Malformed
        );
        assert_eq!(
            parse_judgment(r#"{"risk_score": -5, "reason": "x"}"#),
            SemanticOutcome::Malformed
        );
        assert_eq!(parse_judgment(""), SemanticOutcome::Malformed);
    }

    #[test]
    fn test_parse_clamps_large_scores() {
        assert_eq!(
            parse_judgment(r#"{"risk_score": 140, "reason": "scam"}"#),
            assessed(100, "scam")
        );
    }
}
