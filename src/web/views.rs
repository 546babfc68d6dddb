//! HTML templates compiled into the binary

use std::sync::Arc;

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../templates/layout.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("user.html", include_str!("../../templates/user.html")),
    ("error.html", include_str!("../../templates/error.html")),
    ("books/list.html", include_str!("../../templates/books/list.html")),
    ("books/search.html", include_str!("../../templates/books/search.html")),
    ("books/result.html", include_str!("../../templates/books/result.html")),
    ("books/add.html", include_str!("../../templates/books/add.html")),
    ("books/edit.html", include_str!("../../templates/books/edit.html")),
    ("books/remove.html", include_str!("../../templates/books/remove.html")),
];

#[derive(Clone)]
pub struct Views {
    env: Arc<Environment<'static>>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(context)
    }
}
