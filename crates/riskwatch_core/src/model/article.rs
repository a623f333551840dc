//! Article record returned by news providers.

use serde::Deserialize;

/// One news article as delivered by an external provider.
///
/// Read-only input. Identity, if any, is the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

impl Article {
    pub fn new(
        title: Option<&str>,
        description: Option<&str>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.map(str::to_string),
            description: description.map(str::to_string),
            url: url.into(),
        }
    }

    /// Lowercased `title + " " + description`, absent fields read as empty.
    pub fn normalized_text(&self) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        let description = self.description.as_deref().unwrap_or_default();
        format!("{title} {description}").to_lowercase()
    }

    /// Title for display, falling back to a fixed label.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "No title",
        }
    }

    /// Link for display; a missing URL renders as `#`.
    pub fn display_url(&self) -> &str {
        match self.url.trim() {
            "" => "#",
            url => url,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::Article;

    #[test]
    fn normalized_text_treats_missing_fields_as_empty() {
        let article = Article::new(Some("Tesla Faces FRAUD"), None, "https://a");
        assert_eq!(article.normalized_text(), "tesla faces fraud ");

        let empty = Article::default();
        assert_eq!(empty.normalized_text(), " ");
    }

    #[test]
    fn deserializes_provider_shape_with_nulls() {
        let json = r#"{"title":null,"description":"d","url":null,"source":{"id":null}}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.title, None);
        assert_eq!(article.description.as_deref(), Some("d"));
        assert_eq!(article.url, "");
        assert_eq!(article.display_title(), "No title");
        assert_eq!(article.display_url(), "#");
    }

    #[test]
    fn present_url_is_displayed_as_given() {
        let article = Article::new(Some("t"), None, "https://n/1");
        assert_eq!(article.display_url(), "https://n/1");
    }
}
