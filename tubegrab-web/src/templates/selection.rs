//! Format and quality selection page

use tubegrab_core::VideoSummary;

use super::{base_template, escape_html};

/// Inputs of the selection page.
#[derive(Debug)]
pub struct SelectionView<'a> {
    /// URL posted back with the form
    pub url: &'a str,
    /// Present once the URL has resolved
    pub summary: Option<&'a VideoSummary>,
    pub error: Option<&'a str>,
}

pub fn render(view: &SelectionView<'_>) -> String {
    let title = view
        .summary
        .map(|s| escape_html(&s.title))
        .unwrap_or_else(|| "Download".to_string());

    let video_info = view
        .summary
        .map(|s| {
            let thumbnail = s
                .thumbnail_url
                .as_deref()
                .map(|t| {
                    format!(
                        r#"<div class="thumbnail"><img src="{}" alt="Thumbnail"></div>"#,
                        escape_html(t)
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<div class="video-info">
                {thumbnail}
                <div><h3>{title}</h3></div>
            </div>"#
            )
        })
        .unwrap_or_default();

    let error_html = view
        .error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();

    let quality_options: String = view
        .summary
        .map(|s| s.resolutions.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|label| {
            let label = escape_html(label);
            format!(
                r#"<input type="radio" id="q-{label}" name="quality" value="{label}" class="quality-option">
                <label for="q-{label}">{label}</label><br>"#
            )
        })
        .collect();

    let content = format!(
        r#"<h1>Download Options</h1>
        {video_info}
        {error_html}
        <div class="download-options">
            <form method="POST" action="/download">
                <input type="hidden" name="url" value="{url}">

                <div class="form-group">
                    <label>Format:</label><br>
                    <input type="radio" id="mp4" name="format" value="mp4" checked>
                    <label for="mp4">MP4 (Video)</label><br>
                    <input type="radio" id="mp3" name="format" value="mp3">
                    <label for="mp3">MP3 (Audio only)</label>
                </div>

                <div class="form-group" id="quality-options">
                    <label>Quality (for MP4):</label><br>
                    <input type="radio" id="q-highest" name="quality" value="highest" checked>
                    <label for="q-highest">Highest available</label><br>
                    {quality_options}
                </div>

                <button type="submit">Download Now</button>
            </form>
        </div>
        <p><a href="/">Look up another video</a></p>
        <script>
            document.getElementById('mp3').addEventListener('change', function() {{
                document.getElementById('quality-options').style.display = this.checked ? 'none' : 'block';
            }});
            document.getElementById('mp4').addEventListener('change', function() {{
                document.getElementById('quality-options').style.display = this.checked ? 'block' : 'none';
            }});
        </script>"#,
        url = escape_html(view.url),
    );

    base_template(&format!("Download {title}"), &content)
}
