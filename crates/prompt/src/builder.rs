//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use mingyu_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// # Example
/// ```no_run
/// use mingyu_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("query".to_string(), "假如张居正改革成功".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        temperature: definition.behavior.temperature,
        top_p: definition.behavior.top_p,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            resolved_variables: variables,
        },
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text output
    handlebars.register_escape_fn(handlebars::no_escape);

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
    use crate::loader::{builtin_prompt, NARRATIVE_PROMPT_ID};

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), "假如<海禁>未开".to_string());

        let result = render_template("假设：{{query}}", &vars).unwrap();
        // No HTML escaping
        assert_eq!(result, "假设：假如<海禁>未开");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars).unwrap();
        assert_eq!(result, "Question: ");
    }

    #[test]
    fn test_build_narrative_prompt() {
        let def = builtin_prompt(NARRATIVE_PROMPT_ID).unwrap().unwrap();
        let vars = HashMap::from([
            ("query".to_string(), "假如张居正改革成功".to_string()),
            ("fact".to_string(), "张居正推行一条鞭法。".to_string()),
            ("context".to_string(), "- 万历初年".to_string()),
            ("alpha".to_string(), "0.3".to_string()),
            ("keywords".to_string(), "张居正、改革".to_string()),
        ]);

        let built = build_prompt(&def, vars).unwrap();
        assert!(built.user.contains("【用户假设 (Query)】：假如张居正改革成功"));
        assert!(built.user.contains("Alpha = 0.3"));
        assert!(built.user.contains("张居正、改革"));
        assert!(!built.user.contains("{{"));
        assert!((built.top_p - 0.85).abs() < f32::EPSILON);
        assert_eq!(built.metadata.source_prompt_id, NARRATIVE_PROMPT_ID);
        assert_eq!(built.metadata.resolved_variables.len(), 5);
    }
}
