//! View engine
//!
//! Pages are Tera templates compiled into the binary from `templates/`.
//! When `views.path` is configured, every `*.html` file found there
//! replaces the embedded template with the same relative name.

use rust_embed::RustEmbed;
use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::ViewError;

#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct EmbeddedTemplates;

/// Compiled page templates
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Load the embedded templates, then apply overrides from `override_dir`
    pub fn new(override_dir: Option<&Path>) -> Result<Self, ViewError> {
        let mut templates = embedded_templates()?;

        if let Some(dir) = override_dir {
            let mut overrides = Vec::new();
            collect_templates_from_dir(dir, dir, &mut overrides)?;
            for (name, content) in overrides {
                tracing::info!("Template '{}' overridden from {:?}", name, dir);
                match templates.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = content,
                    None => templates.push((name, content)),
                }
            }
        }

        let mut tera = Tera::default();
        // Adds everything before resolving `extends`, so load order does not matter
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::TemplateError(describe(&e)))?;

        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ViewError> {
        self.tera.render(template, context).map_err(|e| {
            ViewError::TemplateError(format!("Failed to render '{}': {}", template, describe(&e)))
        })
    }

    /// Render `template`, falling back to a bare page showing `message`
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext, message: &str) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("{}", e);
                simple_error_page(message)
            }
        }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }
}

/// Error text with every `source()` appended
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

fn embedded_templates() -> Result<Vec<(String, String)>, ViewError> {
    let mut templates = Vec::new();
    for name in EmbeddedTemplates::iter() {
        let Some(file) = EmbeddedTemplates::get(&name) else {
            continue;
        };
        let content = String::from_utf8(file.data.into_owned())
            .map_err(|_| ViewError::Encoding(name.to_string()))?;
        templates.push((name.to_string(), content));
    }
    Ok(templates)
}

fn collect_templates_from_dir(
    base_path: &Path,
    current_path: &Path,
    templates: &mut Vec<(String, String)>,
) -> Result<(), ViewError> {
    if !current_path.exists() {
        tracing::warn!("Template directory {:?} does not exist", current_path);
        return Ok(());
    }

    for entry in fs::read_dir(current_path)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_templates_from_dir(base_path, &path, templates)?;
        } else if path.extension().is_some_and(|ext| ext == "html") {
            let relative_path = path.strip_prefix(base_path).map_err(|_| {
                ViewError::TemplateError(format!("{:?} is outside {:?}", path, base_path))
            })?;
            let template_name = relative_path.to_string_lossy().replace('\\', "/");
            templates.push((template_name, fs::read_to_string(&path)?));
        }
    }

    Ok(())
}

/// Last-resort page when even `error.html` cannot be rendered
pub fn simple_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="hr">
<head><meta charset="UTF-8"><title>Greška</title></head>
<body>
    <h1>Greška</h1>
    <p>{}</p>
    <p><a href="/">Početna</a></p>
</body>
</html>"#,
        tera::escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn context() -> TeraContext {
        let mut context = TeraContext::new();
        context.insert("title", "Početna");
        context.insert("nav_lookups", &Vec::<String>::new());
        context
    }

    #[test]
    fn test_embedded_templates_load() {
        let engine = ViewEngine::new(None).unwrap();
        for name in ["layout.html", "list.html", "form.html", "detail.html", "import.html", "home.html", "error.html"] {
            assert!(engine.has_template(name), "{} missing", name);
        }
    }

    #[test]
    fn test_override_directory_replaces_template() {
        let dir = TempDir::new().unwrap();
        let mut file = fs::File::create(dir.path().join("error.html")).unwrap();
        write!(file, "custom: {{{{ message }}}}").unwrap();

        let engine = ViewEngine::new(Some(dir.path())).unwrap();
        let mut context = context();
        context.insert("message", "<nema>");
        let html = engine.render("error.html", &context).unwrap();
        assert_eq!(html, "custom: &lt;nema&gt;");
        assert!(engine.has_template("list.html"));
    }

    #[test]
    fn test_missing_override_directory_is_ignored() {
        let dir = TempDir::new().unwrap();
        let engine = ViewEngine::new(Some(&dir.path().join("nema"))).unwrap();
        assert!(engine.has_template("layout.html"));
    }

    #[test]
    fn test_broken_override_fails_to_load() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("home.html"), "{% if %}").unwrap();
        assert!(matches!(
            ViewEngine::new(Some(dir.path())),
            Err(ViewError::TemplateError(_))
        ));
    }

    #[test]
    fn test_render_with_fallback() {
        let engine = ViewEngine::new(None).unwrap();
        let html = engine.render_with_fallback("nepostojeci.html", &context(), "Nema stranice");
        assert!(html.contains("Nema stranice"));
    }

    #[test]
    fn test_simple_error_page_escapes() {
        assert!(simple_error_page("<b>").contains("&lt;b&gt;"));
    }
}
