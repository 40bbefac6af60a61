//! Prompt templates for the completion capability
//!
//! Three templates, one per completion-backed stage. All of them target a
//! beginner audience: the assistant explains filings to people who do not
//! read filings.

use std::collections::BTreeMap;

/// Separator between passages in assembled context
const PASSAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Build the query reformulation prompt
///
/// Works from the question alone; retrieved passages are deliberately not
/// included since nothing relevant came back.
pub fn rewrite_question(question: &str) -> String {
    format!(
        "You are generating an improved question optimized for vector database retrieval. \
         Look at the input question and reason about its underlying semantic intent and keywords.\n\n\
         Initial question: {question}\n\n\
         Formulate an improved, highly-searchable question. Reply with the question only."
    )
}

/// Build the jargon extraction prompt over the kept passages
pub fn explain_jargon(context: &str) -> String {
    format!(
        "You are an expert financial advisor talking to a complete beginner. \
         Identify any highly technical financial, accounting, or SEC-specific terms in the text \
         below (e.g., Amortization, EBITDA, Derivatives). Generate a very simple, one-sentence \
         plain-English analogy or definition for each term. Produce the output strictly as a JSON \
         dictionary mapping the term to its simplified definition.\n\
         Example: {{\"Amortization\": \"A way of spreading out a big expense over time, like paying \
         off a car loan in monthly chunks.\"}}\n\n\
         Documents:\n\n{context}"
    )
}

/// Build the grounded synthesis prompt
pub fn grounded_answer(
    question: &str,
    context: &str,
    jargon: &BTreeMap<String, String>,
) -> String {
    let glossary = render_glossary(jargon);

    format!(
        "You are a helpful, beginner-friendly financial assistant analyzing SEC documents. \
         Answer the user's question using ONLY the provided document context. \
         If you don't know the answer based strictly on the context, say you don't know.\n\
         {glossary}\n\
         Instruction: use simple, plain English. If you must use a technical term, you MUST \
         include its simplified meaning inline for the user to understand. Keep your tone \
         encouraging and accessible.\n\n\
         Context: {context}\n\n\
         Question: {question}"
    )
}

/// Join passage contents in their graded order
pub fn assemble_context<'a>(passages: impl Iterator<Item = &'a str>) -> String {
    passages.collect::<Vec<_>>().join(PASSAGE_SEPARATOR)
}

/// Render the glossary block for the synthesis prompt; empty mapping
/// renders to nothing
fn render_glossary(jargon: &BTreeMap<String, String>) -> String {
    if jargon.is_empty() {
        return String::new();
    }

    let mut block =
        String::from("\nHere is a list of complex terms found in the context with their simplified meanings:\n");
    for (term, definition) in jargon {
        block.push_str(&format!("- {}: {}\n", term, definition));
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_prompt_carries_question() {
        let prompt = rewrite_question("how much cash does apple have");
        assert!(prompt.contains("how much cash does apple have"));
        assert!(prompt.contains("highly-searchable"));
    }

    #[test]
    fn test_jargon_prompt_shows_expected_shape() {
        let prompt = explain_jargon("Total EBITDA for the period...");
        assert!(prompt.contains("Total EBITDA for the period..."));
        assert!(prompt.contains("JSON"));
        assert!(prompt.contains("Amortization"));
    }

    #[test]
    fn test_answer_prompt_without_glossary() {
        let prompt = grounded_answer("q", "ctx", &BTreeMap::new());
        assert!(prompt.contains("ONLY the provided document context"));
        assert!(!prompt.contains("complex terms found in the context"));
    }

    #[test]
    fn test_answer_prompt_with_glossary_inlines_definitions() {
        let mut jargon = BTreeMap::new();
        jargon.insert(
            "Derivatives".to_string(),
            "Contracts whose value rides on something else.".to_string(),
        );

        let prompt = grounded_answer("q", "ctx", &jargon);
        assert!(prompt.contains("- Derivatives: Contracts whose value rides on something else."));
    }

    #[test]
    fn test_context_assembly_keeps_order() {
        let context = assemble_context(["first", "second"].into_iter());
        assert_eq!(context, "first\n\n---\n\nsecond");
    }
}
