use std::collections::BTreeMap;

use formwork_common::html::{attributes_to_string, escape_html};
use formwork_common::FormError;
use formwork_forms::{Element, ElementKind, Form, Group, Renderer, ScriptBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during HTML rendering
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Form error: {0}")]
    Form(#[from] FormError),
}

/// Options for HTML rendering
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HtmlRendererOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Tag wrapping each group
    pub group_tag: String,
    /// Render validation errors next to their elements
    pub show_errors: bool,
}

impl Default for HtmlRendererOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            group_tag: "fieldset".to_string(),
            show_errors: true,
        }
    }
}

impl HtmlRendererOptions {
    /// Load options from JSON; missing keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        serde_json::from_str(json).map_err(|e| RenderError::Form(e.into()))
    }
}

/// Output buffer tracking how deep the writer is inside form and group blocks
struct Context {
    options: HtmlRendererOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: HtmlRendererOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    /// One line at the current depth; compact output has no indent or newline
    fn line(&mut self, text: &str) {
        if self.options.pretty {
            for _ in 0..self.depth {
                self.buffer.push_str(&self.options.indent);
            }
        }
        self.buffer.push_str(text);
        if self.options.pretty {
            self.buffer.push('\n');
        }
    }

    fn open(&mut self, tag: &str, attributes: &BTreeMap<String, String>) {
        self.line(&format!("<{}{}>", tag, attributes_to_string(attributes)));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.line(&format!("</{}>", tag));
    }

    /// Open the configured group wrapper, with its legend
    fn open_group(&mut self, attributes: &BTreeMap<String, String>, legend: Option<String>) {
        let tag = self.options.group_tag.clone();
        self.open(&tag, attributes);
        if let Some(legend) = legend {
            self.line(&format!("<legend>{}</legend>", escape_html(&legend)));
        }
    }

    fn close_group(&mut self) {
        let tag = self.options.group_tag.clone();
        self.close(&tag);
    }

    fn label(&mut self, label: &str, target: Option<String>) {
        let target = target
            .map(|id| format!(" for=\"{}\"", escape_html(&id)))
            .unwrap_or_default();
        self.line(&format!("<label{}>{}</label>", target, escape_html(label)));
    }

    /// Validation message of the node just written, unless errors are hidden
    fn error(&mut self, error: Option<String>) {
        if !self.options.show_errors {
            return;
        }
        if let Some(error) = error {
            self.line(&format!(
                "<span class=\"error\">{}</span>",
                escape_html(&error)
            ));
        }
    }
}

/// Renderer writing HTML into an internal buffer
pub struct HtmlRenderer {
    ctx: Context,
    script: ScriptBuilder,
    errors: Vec<RenderError>,
}

impl HtmlRenderer {
    pub fn new(options: HtmlRendererOptions) -> Self {
        Self {
            ctx: Context::new(options),
            script: ScriptBuilder::new(),
            errors: Vec::new(),
        }
    }

    /// HTML written so far
    pub fn output(&self) -> &str {
        &self.ctx.buffer
    }

    /// Finish rendering, failing with the first error encountered
    pub fn into_output(mut self) -> Result<String, RenderError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }
        Ok(self.ctx.buffer)
    }

    fn add_script(&mut self) {
        if self.script.is_empty() {
            return;
        }
        match self.script.to_json() {
            Ok(json) => {
                let form_attr = self
                    .script
                    .form_id()
                    .map(|id| format!(" data-form=\"{}\"", escape_html(id)))
                    .unwrap_or_default();
                // Keep the payload from closing the script element early
                let json = json.replace("</", "<\\/");
                self.ctx.line(&format!(
                    "<script type=\"application/json\"{}>{}</script>",
                    form_attr, json
                ));
            }
            Err(e) => {
                warn!(error = %e, "Client rule serialization failed - continuing without script");
                self.errors.push(e.into());
            }
        }
    }
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(HtmlRendererOptions::default())
    }
}

impl Renderer for HtmlRenderer {
    fn start_form(&mut self, form: &Form) {
        debug!(form = ?form.id(), "Rendering form");
        self.script = ScriptBuilder::new();
        self.ctx.open("form", &with_id(form.attributes(), form.id()));
    }

    fn finish_form(&mut self, _form: &Form) {
        self.add_script();
        self.ctx.close("form");
    }

    fn start_group(&mut self, group: &Group) {
        self.ctx
            .open_group(&with_id(group.attributes(), group.id()), group.label());
        self.ctx.error(group.error());
    }

    fn finish_group(&mut self, _group: &Group) {
        self.ctx.close_group();
    }

    fn render_element(&mut self, element: &Element) {
        let html = element.to_html();
        if element.element_kind() == ElementKind::Hidden {
            if !html.is_empty() {
                self.ctx.line(&html);
            }
            return;
        }

        if let Some(label) = element.label() {
            self.ctx.label(&label, element.id());
        }
        if !html.is_empty() {
            self.ctx.line(&html);
        }
        self.ctx.error(element.error());
    }

    fn script_builder(&mut self) -> &mut ScriptBuilder {
        &mut self.script
    }
}

fn with_id(
    mut attributes: BTreeMap<String, String>,
    id: Option<String>,
) -> BTreeMap<String, String> {
    if let Some(id) = id {
        attributes.insert("id".to_string(), id);
    }
    attributes
}

/// Render a form to HTML
pub fn render_form(form: &Form, options: HtmlRendererOptions) -> Result<String, RenderError> {
    let mut renderer = HtmlRenderer::new(options);
    form.render(&mut renderer);
    renderer.into_output()
}
