//! # Formwork HTML renderer
//!
//! [`HtmlRenderer`] implements the visitor-mode [`Renderer`] contract and
//! writes plain HTML: a `<form>` tag, a `<fieldset>` per group, each
//! element's markup with its label and error, and the form's client-side
//! rules as a JSON `<script>` block.
//!
//! [`Renderer`]: formwork_forms::Renderer

mod renderer;


pub use renderer::{render_form, HtmlRenderer, HtmlRendererOptions, RenderError};
