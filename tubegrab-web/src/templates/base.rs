//! Base HTML document shared by all pages

/// Wraps page content in the document shell with the shared stylesheet.
///
/// `title` must already be escaped.
pub fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }}
        .container {{ background: #f9f9f9; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
        h1 {{ color: #ff0000; text-align: center; }}
        .form-group {{ margin-bottom: 15px; }}
        input[type="text"] {{ width: 100%; padding: 10px; border: 1px solid #ddd; border-radius: 4px; box-sizing: border-box; }}
        button {{ background: #ff0000; color: white; border: none; padding: 10px 15px; border-radius: 4px; cursor: pointer; }}
        button:hover {{ background: #cc0000; }}
        .error {{ color: red; }}
        .video-info {{ display: flex; margin: 20px 0; }}
        .thumbnail {{ margin-right: 20px; }}
        .thumbnail img {{ max-width: 200px; border-radius: 4px; }}
        .download-options {{ margin-top: 20px; }}
        .quality-option {{ margin-right: 10px; }}
    </style>
</head>
<body>
    <div class="container">
        {content}
    </div>
</body>
</html>"#
    )
}
