//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use alertsbot_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the optional system template and the user template with the same
/// variables. Rendering is strict: a template referencing a variable that was
/// not supplied is an error rather than silently rendering an empty string, so
/// an answer prompt can never go out without its context.
///
/// # Example
/// ```no_run
/// use alertsbot_prompt::{build_prompt, default_answer_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "Did the visa rules change?".to_string());
/// vars.insert("context".to_string(), "Title: A\n...".to_string());
///
/// let built = build_prompt(&default_answer_prompt(), vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = match definition.system {
        Some(ref template) => Some(render_template(template, &variables)?),
        None => None,
    };
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        definition.behavior.temperature,
        definition.behavior.top_p,
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_answer_prompt;

    fn answer_vars() -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Is the tax deadline extended?".to_string());
        vars.insert(
            "context".to_string(),
            "Title: B\nDate: No Date\nURL: u2\nContent: tax deadline extended\n".to_string(),
        );
        vars
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "Hello, world!".to_string());

        let result = render_template("Question: {{query}}", &vars).unwrap();
        assert_eq!(result, "Question: Hello, world!");
    }

    #[test]
    fn test_render_does_not_escape() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "A & B <c>".to_string());
        let result = render_template("{{context}}", &vars).unwrap();
        assert_eq!(result, "A & B <c>");
    }

    #[test]
    fn test_build_default_answer_prompt() {
        let built = build_prompt(&default_answer_prompt(), answer_vars()).unwrap();
        assert!(built.user.contains("Question: Is the tax deadline extended?"));
        assert!(built.user.contains("Content: tax deadline extended"));
        assert!(built.user.trim_end().ends_with("Answer:"));
        assert!(built.system.is_none());
        assert_eq!(built.metadata.source_prompt_id, "alerts.answer.default");
    }

    #[test]
    fn test_build_with_system_template() {
        let mut def = default_answer_prompt();
        def.system = Some("Topic guard for: {{query}}".to_string());
        let built = build_prompt(&def, answer_vars()).unwrap();
        assert_eq!(
            built.system.as_deref(),
            Some("Topic guard for: Is the tax deadline extended?")
        );
    }

    #[test]
    fn test_render_template_missing_variable_fails() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        assert!(result.is_err());
    }
}
