//! Static assets (logo and anything else dropped into the assets directory).

use std::path::Path;

use tower_http::services::ServeDir;
use tracing::warn;

pub const ASSETS_ROUTE: &str = "/assets";
pub const PLACEHOLDER_TEXT: &str = "Logo Placeholder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Logo {
    Image { src: String },
    Placeholder,
}

impl Logo {
    /// Use the logo if it exists under `assets_dir`, otherwise fall back to a text block.
    pub fn locate(assets_dir: &Path, file_name: &str) -> Self {
        let path = assets_dir.join(file_name);
        if path.is_file() && !file_name.contains("..") {
            Logo::Image {
                src: format!("{ASSETS_ROUTE}/{file_name}"),
            }
        } else {
            warn!(path = %path.display(), "logo file not found - using placeholder");
            Logo::Placeholder
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Logo::Image { src } => format!(
                r#"<img src="{}" alt="Grazioso Salvare logo" height="250" width="251" />"#,
                escape_html(src)
            ),
            Logo::Placeholder => format!(r#"<div class="logo-placeholder">{PLACEHOLDER_TEXT}</div>"#),
        }
    }
}

pub fn assets_service(assets_dir: &Path) -> ServeDir {
    ServeDir::new(assets_dir)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_logo_uses_placeholder() {
        let logo = Logo::locate(Path::new("/definitely/not/here"), "logo.png");
        assert_eq!(logo, Logo::Placeholder);
        assert!(logo.to_html().contains("Logo Placeholder"));
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
