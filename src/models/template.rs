use anyhow::{Context, Result};
use minijinja::{Environment, Value};
use serde_json::json;

/// Estructura que contiene los datos para el renderizado de templates
#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub title: String,
    pub content: String,
}

/// Renderizador de templates que utiliza MiniJinja
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();

        env.add_filter("truncate", truncate_function);
        env.add_filter("strip_html", strip_html_function);

        Self { env }
    }

    pub fn render(&self, template: &str, context: &TemplateContext) -> Result<String> {
        let tmpl = self
            .env
            .template_from_str(template)
            .context("Failed to parse template")?;

        let template_vars = json!({
            "title": context.title,
            "content": context.content,
        });

        let rendered = tmpl
            .render(template_vars)
            .context("Failed to render template")?;

        Ok(rendered.trim().to_string())
    }

    /// Obtiene el template por defecto para un tipo de publisher específico
    pub fn get_default_template(publisher_type: &str) -> String {
        match publisher_type {
            "twitter" => "{{ title | truncate(100) }}\n\n{{ content | strip_html | truncate(170) }}".to_string(),
            "facebook" => "{{ title }}\n\n{{ content | strip_html }}".to_string(),
            "linkedin" => "{{ title }}\n\n{{ content | strip_html | truncate(2800) }}".to_string(),
            "instagram" => "{{ title }}\n\n{{ content | strip_html | truncate(2000) }}".to_string(),
            _ => "{{ title }}\n\n{{ content }}".to_string(),
        }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Recorta `text` a un máximo de `max_chars` caracteres, marcando el corte con "..."
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let keep = max_chars.saturating_sub(3);
    let truncated: String = text.chars().take(keep).collect();
    truncated + "..."
}

/// Función para truncar texto a un número específico de caracteres
fn truncate_function(value: Value, length: Value) -> Result<Value, minijinja::Error> {
    let text = value.as_str().unwrap_or("");
    let max_len = length.as_i64().unwrap_or(100).max(0) as usize;

    if text.chars().count() <= max_len {
        return Ok(Value::from(text));
    }

    let truncated = text.chars().take(max_len).collect::<String>();
    let result = if truncated.ends_with(' ') {
        truncated.trim_end().to_string() + "..."
    } else {
        // Encontrar el último espacio para no cortar palabras
        if let Some(last_space) = truncated.rfind(' ') {
            truncated[..last_space].to_string() + "..."
        } else {
            truncated + "..."
        }
    };

    Ok(Value::from(result))
}

/// Función básica para eliminar tags HTML
fn strip_html_function(value: Value) -> Result<Value, minijinja::Error> {
    let mut result = value.as_str().unwrap_or("").to_string();

    for tag in ["<br>", "<br/>", "<br />", "<p>", "</p>"] {
        result = result.replace(tag, "\n");
    }

    while let Some(start) = result.find('<') {
        if let Some(end) = result[start..].find('>') {
            result.replace_range(start..start + end + 1, "");
        } else {
            break;
        }
    }

    result = result
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Value::from(result))
}
