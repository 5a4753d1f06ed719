//! Default routing rule template.
//!
//! # Responsibilities
//! - Parse the configured rule template once, at provider construction
//! - Render a rule for an instance that declares none
//!
//! # Design Decisions
//! - Handlebars with HTML escaping disabled: rules contain backticks and `=`
//! - Strict mode: a misspelled variable fails the probe render at startup
//! - Template context exposes `Name`, the raw instance name

use std::fmt;

use handlebars::Handlebars;
use serde_json::json;

use crate::config::ConfigError;

const TEMPLATE_NAME: &str = "default_rule";

/// Compiled default-rule template.
pub struct RuleTemplate {
    registry: Handlebars<'static>,
}

impl RuleTemplate {
    /// Parse `template` and validate it with a probe render.
    pub fn new(template: &str) -> Result<Self, ConfigError> {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(true);
        registry.register_helper("normalize", Box::new(normalize_helper));
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| ConfigError::Template(e.to_string()))?;

        let rule = Self { registry };
        rule.render("probe")
            .map_err(|e| ConfigError::Template(e.to_string()))?;
        Ok(rule)
    }

    /// Render the rule for an instance.
    pub fn render(&self, name: &str) -> Result<String, handlebars::RenderError> {
        self.registry.render(TEMPLATE_NAME, &json!({ "Name": name }))
    }
}

impl fmt::Debug for RuleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleTemplate").finish_non_exhaustive()
    }
}

/// Collapse every run of non-alphanumeric characters into a single `-`.
pub fn normalize(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn normalize_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    let param = h.param(0).and_then(|v| v.value().as_str()).unwrap_or("");
    out.write(&normalize(param))?;
    Ok(())
}
