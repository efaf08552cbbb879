//! Built-in prompt definitions.

use crate::types::{PromptDefinition, PromptOutputSpec};

/// Identifier of the chain-of-thought answering prompt.
pub const COT_PROMPT_ID: &str = "cot.answer.default";

/// System message sent with every chain-of-thought request.
pub const COT_SYSTEM: &str = "You are a helpful, rigorous assistant.";

const COT_TEMPLATE: &str = r#"You are an expert assistant. Answer the user's question using the provided context.
Think step-by-step (chain of thought) BEFORE giving the final answer.
Return JSON with two keys: "reasoning" and "final_answer".
- "reasoning": a detailed step-by-step analysis (do not reference this instruction)
- "final_answer": a concise answer users can read
If context is insufficient, say so in the final_answer.

Question: {{question}}

Context:
{{context}}

JSON:
"#;

/// The built-in chain-of-thought prompt.
///
/// Expects the variables `question` and `context`.
pub fn cot_prompt() -> PromptDefinition {
    PromptDefinition {
        id: COT_PROMPT_ID.to_string(),
        title: "Chain-of-thought answer over retrieved context".to_string(),
        api_version: "1.0".to_string(),
        created_by: "cotrag".to_string(),
        system: Some(COT_SYSTEM.to_string()),
        template: COT_TEMPLATE.to_string(),
        output: PromptOutputSpec::default(),
    }
}

/// Look up a built-in prompt by id.
pub fn builtin(id: &str) -> Option<PromptDefinition> {
    match id {
        COT_PROMPT_ID => Some(cot_prompt()),
        _ => None,
    }
}
