//! Page rendering with Tera. Templates are embedded at compile time.

use crate::error::NavError;
use serde::Serialize;
use tera::{Context, Tera};

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, NavError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("index.html", include_str!("../templates/index.html")),
            ("login.html", include_str!("../templates/login.html")),
            ("setup.html", include_str!("../templates/setup.html")),
            ("dashboard.html", include_str!("../templates/dashboard.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &impl Serialize) -> Result<String, NavError> {
        let ctx = Context::from_serialize(context)?;
        Ok(self.tera.render(template, &ctx)?)
    }
}
