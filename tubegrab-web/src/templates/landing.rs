//! URL entry page

use super::{base_template, escape_html};

/// Renders the URL form, optionally pre-filled and with an error message.
pub fn render(url: Option<&str>, error: Option<&str>) -> String {
    let url = escape_html(url.unwrap_or_default());
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let content = format!(
        r#"<h1>Video Downloader</h1>
        <form method="POST" action="/">
            <div class="form-group">
                <input type="text" name="url" placeholder="Enter video URL" required value="{url}">
            </div>
            <button type="submit">Download</button>
            {error_html}
        </form>"#
    );

    base_template("Video Downloader", &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_landing_has_no_error() {
        let html = render(None, None);
        assert!(html.contains(r#"name="url""#));
        assert!(html.contains(r#"value="""#));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn test_landing_escapes_url_and_error() {
        let html = render(Some(r#""><script>"#), Some("<b>bad</b>"));
        assert!(html.contains(r#"value="&quot;&gt;&lt;script&gt;""#));
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(!html.contains("<script>"));
    }
}
