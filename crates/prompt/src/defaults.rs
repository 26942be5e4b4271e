//! Built-in prompt definitions.

use crate::types::{PromptBehavior, PromptDefinition, PromptOutputSpec};

/// Identifier of the built-in answer prompt.
pub const DEFAULT_ANSWER_PROMPT_ID: &str = "alerts.answer.default";

const ANSWER_TEMPLATE: &str = r#"You are a helpful and friendly chatbot designed to answer questions based on the provided articles. Your expertise is limited to the topics of tax, global mobility, and immigration.

**Instructions:**
1.  Answer the user's question based only on the information provided in the "Context" section below.
2.  Be concise and provide informative answers.
3.  If the answer cannot be found within the context, politely refuse to answer by saying: "I'm sorry, but the answer to your question is not covered in the provided articles."
4.  If the user asks a question outside the topics of tax, global mobility, or immigration, politely refuse to answer by saying: "I can only answer questions related to tax, global mobility, and immigration."
5.  When referencing information from the articles, always cite the source URL(s) in brackets at the end of the sentence or paragraph.
6.  Do not invent or assume information not present in the articles.
7.  Maintain a friendly and helpful tone.

Question: {{query}}

Context:
{{context}}

Answer:"#;

/// The answer prompt used when the workspace does not override it.
pub fn default_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: DEFAULT_ANSWER_PROMPT_ID.to_string(),
        title: "Regional alerts answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "alertsbot".to_string(),
        behavior: PromptBehavior {
            tone: "friendly".to_string(),
            style: "concise".to_string(),
            temperature: None,
            top_p: None,
        },
        system: None,
        template: ANSWER_TEMPLATE.to_string(),
        output: PromptOutputSpec {
            format: "text".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_mentions_variables() {
        let def = default_answer_prompt();
        assert_eq!(def.id, DEFAULT_ANSWER_PROMPT_ID);
        assert!(def.template.contains("{{query}}"));
        assert!(def.template.contains("{{context}}"));
        assert!(def.template.contains("cite the source URL"));
    }
}
