use serde::de::Error;
use serde::{Deserialize, Deserializer};
use std::path::Path;

const CLASSIC_CSS: &str = include_str!("../../templates/classic.css");
const COMPACT_CSS: &str = include_str!("../../templates/compact.css");

/// Stylesheet applied to the rendered report. Custom templates are read once when the configuration is loaded.
#[derive(Clone, Default, PartialEq, Debug)]
pub enum Template {
    #[default]
    Classic,
    Compact,
    Custom { name: String, css: String },
}

impl Template {
    pub fn name(&self) -> &str {
        match self {
            Template::Classic => "classic",
            Template::Compact => "compact",
            Template::Custom { name, .. } => name,
        }
    }

    pub fn css(&self) -> &str {
        match self {
            Template::Classic => CLASSIC_CSS,
            Template::Compact => COMPACT_CSS,
            Template::Custom { css, .. } => css,
        }
    }

    /// Resolves a built-in template name, or reads the stylesheet at the given path.
    pub fn from_setting(value: &str) -> Result<Template, String> {
        match value.trim() {
            "" | "classic" => Ok(Template::Classic),
            "compact" => Ok(Template::Compact),
            path => {
                let path = Path::new(path);
                if path.extension().and_then(|e| e.to_str()) != Some("css") {
                    return Err(format!("unknown template '{}', expected 'classic', 'compact' or a path to a .css file", value));
                }

                let css = std::fs::read_to_string(path).map_err(|e| format!("unable to read template '{}': {}", path.display(), e))?;
                Ok(Template::Custom {
                    name: path.file_stem().and_then(|s| s.to_str()).unwrap_or("custom").to_string(),
                    css,
                })
            }
        }
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Template::from_setting(&value).map_err(Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    #[case("classic", Template::Classic)]
    #[case("", Template::Classic)]
    #[case("compact", Template::Compact)]
    fn from_setting_resolves_builtin_templates(#[case] value: &str, #[case] expected: Template) {
        assert_eq!(Template::from_setting(value), Ok(expected));
    }

    #[test]
    fn from_setting_reads_a_custom_stylesheet() {
        let mut file = tempfile::Builder::new().prefix("dark").suffix(".css").tempfile().unwrap();
        write!(file, "body {{ background: #000; }}").unwrap();

        let template = Template::from_setting(file.path().to_str().unwrap()).unwrap();

        assert_eq!(template.css(), "body { background: #000; }");
        assert!(template.name().starts_with("dark"));
    }

    #[test]
    fn from_setting_rejects_unknown_names() {
        assert!(Template::from_setting("fancy").is_err());
    }

    #[test]
    fn from_setting_rejects_missing_stylesheets() {
        assert!(Template::from_setting("/does/not/exist.css").is_err());
    }

    #[test]
    fn builtin_templates_carry_styles() {
        assert!(Template::Classic.css().contains("tr.even"));
        assert!(Template::Compact.css().contains("table#tdata"));
    }
}
