//! Prompt template for grounded questions.
//!
//! Every question is wrapped with the dataset context summary so the model
//! answers from the dashboard's figures and says so when it cannot.

/// Instruction placed between the context and the question.
pub const GROUNDING_INSTRUCTION: &str = "Based on the context above, please answer the following \
question. If the answer is not in the context, say so.";

/// Embed `summary` and the literal `question` in the grounding template.
pub fn build_grounded_prompt(summary: &str, question: &str) -> String {
    format!("Context:\n{summary}\n---\n{GROUNDING_INSTRUCTION}\nQuestion: {question}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_context_then_question() {
        let prompt = build_grounded_prompt("S", "Which country has the largest reserves?");
        assert_eq!(
            prompt,
            "Context:\nS\n---\nBased on the context above, please answer the following question. \
If the answer is not in the context, say so.\nQuestion: Which country has the largest reserves?"
        );
    }

    #[test]
    fn question_is_embedded_verbatim() {
        let q = "  odd   spacing <b>? ";
        assert!(build_grounded_prompt("S", q).ends_with(&format!("Question: {q}")));
    }
}
