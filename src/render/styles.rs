/// Template stylesheets collected while a page renders, emitted once at
/// the end. Each template's CSS is queued at most once per page.
#[derive(Debug, Default)]
pub struct StyleQueue {
    entries: Vec<(String, String)>,
}

impl StyleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `css` for the template `slug`. Returns false when the CSS is
    /// blank or that template was already queued.
    pub fn push(&mut self, slug: &str, css: &str) -> bool {
        if css.trim().is_empty() || self.entries.iter().any(|(s, _)| s == slug) {
            return false;
        }
        self.entries.push((slug.to_string(), css.to_string()));
        true
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// `<style>` blocks in queue order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|(slug, css)| {
                format!(
                    "<style id=\"andw-news-css-{}\">{}</style>",
                    slug,
                    css.replace("</style", "")
                )
            })
            .collect()
    }
}
