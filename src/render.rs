//! HTML rendering for the form page

use crate::Result;
use crate::image::accept_attribute;
use crate::types::Outcome;
use minijinja::{Environment, context};

const PAGE_TEMPLATE: &str = "index.html";

/// Everything the page shows for one render
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Question to keep in the text field
    pub question: String,
    /// `data:` URI of the uploaded image, when there is one to show
    pub image_uri: Option<String>,
    /// Result of the last submission
    pub outcome: Option<Outcome>,
}

/// Page renderer with the template compiled into the binary.
///
/// `.html` templates are auto-escaped, so model output and echoed input are
/// always rendered as text.
#[derive(Debug, Clone)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(PAGE_TEMPLATE, include_str!("../templates/index.html"))?;
        Ok(Self { env })
    }

    pub fn render(&self, page: &Page) -> Result<String> {
        let template = self.env.get_template(PAGE_TEMPLATE)?;
        let html = template.render(context! {
            question => page.question,
            image_uri => page.image_uri,
            outcome => page.outcome,
            accept => accept_attribute(),
        })?;
        Ok(html)
    }
}
