//! Prompt construction for the verification tasks.
//!
//! Each builder pairs a fixed instruction preamble with dynamic content that
//! is length-capped before interpolation, so a pathological claim or snippet
//! cannot blow the model's context window. All caps are in characters and
//! respect UTF-8 boundaries.

use verifact_core::EvidenceItem;

/// Longest claim text forwarded to the decomposition prompt.
pub const DECOMPOSE_CLAIM_CAP: usize = 800;
/// Longest claim text forwarded to the stance-classification prompt.
pub const STANCE_CLAIM_CAP: usize = 500;
/// Longest snippet forwarded per source in the stance prompt.
pub const STANCE_SNIPPET_CAP: usize = 400;
/// Longest claim text forwarded to the reasoning prompt.
pub const REASONING_CLAIM_CAP: usize = 400;
/// Evidence items listed in the reasoning prompt.
pub const REASONING_EVIDENCE_CAP: usize = 10;
/// Longest snippet listed per evidence item in the reasoning prompt.
pub const REASONING_SNIPPET_CAP: usize = 200;

const DECOMPOSE_PREAMBLE: &str = "You are a fact-checking assistant. The following text may contain \
one or more distinct factual claims that can be verified independently.\n\n\
Your task: list ONLY the distinct factual claims. Output a JSON array of strings, one claim per \
element. Use the exact wording of each claim. If there is only one factual claim, return that \
single claim as a one-element array. Do not add commentary or explanation outside the JSON array.";

const STANCE_PREAMBLE: &str = "You are a fact-checking assistant. For the following CLAIM, classify \
each SOURCE snippet as exactly one of: supports, refutes, neutral.\n\
- supports: the source clearly supports or confirms the claim.\n\
- refutes: the source clearly contradicts or debunks the claim.\n\
- neutral: the source does not clearly support or refute, or is irrelevant.";

const STANCE_INSTRUCTION: &str = "Respond with a JSON array of exactly one word per source in \
order: only \"supports\", \"refutes\", or \"neutral\". Example: [\"neutral\", \"refutes\", \"supports\"]";

const REASONING_PREAMBLE: &str = "You are a fact-checking assistant. Write a short, neutral \
reasoning (2-4 sentences) for the following verification result. Do not invent sources; only \
refer to the evidence listed. Do not use markdown links in the body.";

const SUMMARY_PREAMBLE: &str = "You are a fact-checking assistant. Below are the verification \
results for each sub-claim of a decomposed claim. Write a short, neutral summary (2-4 sentences) \
of the overall finding. Use only the information below; do not invent facts or sources.";

/// Take the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Take at most `max_chars` characters, backing up to the last space so a
/// word is never cut in half. Text that fits is returned unchanged.
pub fn truncate_at_word(text: &str, max_chars: usize) -> &str {
    let cut = truncate_chars(text, max_chars);
    if cut.len() == text.len() {
        return text;
    }
    match cut.rfind(' ') {
        Some(pos) => &cut[..pos],
        None => cut,
    }
}

/// Prompt asking the model to enumerate distinct factual claims.
pub fn decompose_prompt(claim: &str) -> String {
    format!(
        "{DECOMPOSE_PREAMBLE}\n\nText:\n{}\n\nOutput (JSON array of strings only):",
        truncate_at_word(claim, DECOMPOSE_CLAIM_CAP)
    )
}

/// Prompt asking the model to label each snippet's stance toward the claim.
///
/// Snippets are indexed so the reply array can be matched back by position.
pub fn stance_prompt(claim: &str, snippets: &[String]) -> String {
    let mut prompt = format!(
        "{STANCE_PREAMBLE}\n\nCLAIM: {}\n\nSOURCES (one per line, prefixed by index):\n",
        truncate_chars(claim, STANCE_CLAIM_CAP)
    );
    for (i, snippet) in snippets.iter().enumerate() {
        prompt.push_str(&format!(
            "\n{i}: {}\n",
            truncate_chars(snippet, STANCE_SNIPPET_CAP)
        ));
    }
    prompt.push('\n');
    prompt.push_str(STANCE_INSTRUCTION);
    prompt
}

/// Prompt asking the model for 2-4 sentences of reasoning behind a verdict.
pub fn reasoning_prompt(claim: &str, verdict: &str, evidence: &[EvidenceItem]) -> String {
    let listing = evidence
        .iter()
        .take(REASONING_EVIDENCE_CAP)
        .map(|item| {
            let snippet = truncate_chars(&item.snippet, REASONING_SNIPPET_CAP);
            if snippet.len() < item.snippet.len() {
                format!("- [{}]({}): {snippet}...", item.title, item.url)
            } else {
                format!("- [{}]({}): {snippet}", item.title, item.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "{REASONING_PREAMBLE}\n\nClaim: {}\nVerdict: {verdict}\n\nEvidence (title, url, snippet):\n{listing}\n\nReasoning:",
        truncate_chars(claim, REASONING_CLAIM_CAP)
    )
}

/// Prompt asking the model to summarize per-sub-claim findings.
pub fn summary_prompt(texts: &[String]) -> String {
    let mut prompt = format!("{SUMMARY_PREAMBLE}\n");
    for text in texts {
        prompt.push_str("\n- ");
        prompt.push_str(text);
        prompt.push('\n');
    }
    prompt.push_str("\nSummary:");
    prompt
}
