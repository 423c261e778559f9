//! @acp:module "Hero Renderer"
//! @acp:summary "Render a decision into the hero region as text, markdown or html"
//! @acp:domain personalization
//! @acp:layer output
//!
//! Rendering sits outside the personalization cycle. A failed render is
//! logged and the caller's original content is kept; the decision itself is
//! never affected.

use handlebars::Handlebars;

use crate::decision::DecisionResult;
use crate::error::{HeroError, Result};

const HERO_TEMPLATE: &str = "hero";

const TEXT_TEMPLATE: &str = "\
{{content.headline}}
{{content.subheadline}}
[ {{content.ctaText}} ] -> {{content.ctaLink}}
{{#if content.image}}image: {{content.image.src}} ({{content.image.alt}})
{{/if}}{{#each badges}}* {{label}}
{{/each}}";

const MARKDOWN_TEMPLATE: &str = "\
# {{content.headline}}

{{content.subheadline}}

[{{content.ctaText}}]({{content.ctaLink}})
{{#if content.image}}
![{{content.image.alt}}]({{content.image.src}})
{{/if}}{{#if badges}}
{{#each badges}}- **{{label}}**
{{/each}}{{/if}}";

const HTML_TEMPLATE: &str = "\
<section class=\"hero hero--{{templateId}}\" data-intent=\"{{intent}}\"{{#if variant}} data-variant=\"{{variant}}\"{{/if}}>
{{#if content.image}}  <img class=\"hero__image\" src=\"{{content.image.src}}\" alt=\"{{content.image.alt}}\">
{{/if}}  <h1 class=\"hero__headline\">{{content.headline}}</h1>
  <p class=\"hero__subheadline\">{{content.subheadline}}</p>
{{#each badges}}  <span class=\"hero__badge hero__badge--{{tone}}\">{{label}}</span>
{{/each}}  <a class=\"hero__cta\" href=\"{{content.ctaLink}}\">{{content.ctaText}}</a>
</section>
";

/// Output format for the hero region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderFormat {
    #[default]
    Text,
    Markdown,
    Html,
}

impl std::str::FromStr for RenderFormat {
    type Err = HeroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(RenderFormat::Text),
            "markdown" | "md" => Ok(RenderFormat::Markdown),
            "html" => Ok(RenderFormat::Html),
            _ => Err(HeroError::Other(format!("Unknown render format: {}", s))),
        }
    }
}

/// Applies a decision to some output surface
pub trait Renderer {
    fn render(&self, decision: &DecisionResult) -> Result<String>;
}

/// Handlebars-backed renderer for one format
pub struct HeroRenderer {
    registry: Handlebars<'static>,
    format: RenderFormat,
}

impl HeroRenderer {
    pub fn new(format: RenderFormat) -> Result<Self> {
        let source = match format {
            RenderFormat::Text => TEXT_TEMPLATE,
            RenderFormat::Markdown => MARKDOWN_TEMPLATE,
            RenderFormat::Html => HTML_TEMPLATE,
        };
        Self::with_template(format, source)
    }

    /// Renderer with a caller-supplied template over the decision's JSON form
    pub fn with_template(format: RenderFormat, source: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        if format != RenderFormat::Html {
            registry.register_escape_fn(handlebars::no_escape);
        }
        registry
            .register_template_string(HERO_TEMPLATE, source)
            .map_err(|e| HeroError::Template(Box::new(e)))?;
        Ok(Self { registry, format })
    }

    pub fn format(&self) -> RenderFormat {
        self.format
    }
}

impl Renderer for HeroRenderer {
    fn render(&self, decision: &DecisionResult) -> Result<String> {
        let data = serde_json::to_value(decision)?;
        let rendered = self.registry.render(HERO_TEMPLATE, &data)?;
        Ok(rendered.trim_end().to_string())
    }
}

/// Render, or keep `original` when rendering fails
pub fn render_or_fallback(renderer: &dyn Renderer, decision: &DecisionResult, original: &str) -> String {
    match renderer.render(decision) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(
                error = %e,
                intent = %decision.intent,
                "Hero render failed, keeping original content"
            );
            original.to_string()
        }
    }
}

/// Compact one-line summary of a decision
pub fn summary_line(decision: &DecisionResult) -> String {
    let mut line = format!(
        "{} {:.2} {}",
        decision.intent, decision.confidence, decision.template_id
    );
    if let Some(variant) = decision.variant {
        line.push_str(&format!(" variant {}", variant));
    }
    line
}
