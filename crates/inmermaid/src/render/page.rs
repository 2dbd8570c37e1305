//! Self-contained HTML page that renders one Mermaid diagram.
//!
//! The page carries the diagram source twice: HTML-escaped inside the
//! `.mermaid` element (visible while loading, replaced by the SVG), and as
//! a JS string literal handed to `mermaid.render()`. The inline script
//! signals the outcome through `window.mermaidReady` / `window.mermaidError`,
//! which the browser pipeline polls.

use crate::core::config;

/// Build the HTML document for one diagram.
pub fn render_page(code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>
body {{
    margin: 0;
    padding: 20px;
    font-family: Arial, sans-serif;
    background: white;
    min-height: 100vh;
}}
#mermaid-container {{
    display: flex;
    justify-content: center;
    align-items: center;
    min-height: 400px;
}}
.mermaid {{
    background: white;
}}
.error {{
    color: red;
    font-weight: bold;
    padding: 20px;
    border: 2px solid red;
    border-radius: 5px;
    background: #ffe6e6;
    max-width: 600px;
}}
#status {{
    position: fixed;
    top: 10px;
    right: 10px;
    padding: 5px 10px;
    background: #f0f0f0;
    border-radius: 3px;
    font-size: 12px;
}}
</style>
</head>
<body>
<div id="status">Loading...</div>
<div id="mermaid-container">
<div class="mermaid" id="diagram">
{diagram_html}
</div>
</div>

<script src="{cdn_url}"></script>
<script>
document.getElementById('status').textContent = 'Initializing...';

function waitForMermaid() {{
    return new Promise((resolve, reject) => {{
        let attempts = 0;
        const maxAttempts = 50;

        function check() {{
            attempts++;
            if (typeof mermaid !== 'undefined') {{
                resolve();
            }} else if (attempts >= maxAttempts) {{
                reject(new Error('Mermaid failed to load'));
            }} else {{
                setTimeout(check, 100);
            }}
        }}
        check();
    }});
}}

async function initAndRender() {{
    try {{
        await waitForMermaid();

        mermaid.initialize({{
            startOnLoad: false,
            theme: 'default',
            securityLevel: 'loose',
            flowchart: {{
                useMaxWidth: false,
                htmlLabels: true
            }},
            sequence: {{
                useMaxWidth: false
            }},
            class: {{
                useMaxWidth: false
            }}
        }});

        document.getElementById('status').textContent = 'Rendering...';

        const element = document.getElementById('diagram');
        const diagramCode = {diagram_json};

        const {{svg}} = await mermaid.render('generatedDiagram', diagramCode);

        element.innerHTML = svg;
        document.getElementById('status').textContent = 'Ready';

        window.mermaidReady = true;
    }} catch (error) {{
        document.getElementById('status').textContent = 'Error';
        document.getElementById('mermaid-container').innerHTML =
            '<div class="error">Syntax Error: ' + error.message + '</div>';
        window.mermaidError = error.message;
    }}
}}

if (document.readyState === 'loading') {{
    document.addEventListener('DOMContentLoaded', initAndRender);
}} else {{
    initAndRender();
}}
</script>
</body>
</html>
"#,
        diagram_html = html_escape(code),
        cdn_url = config::render::MERMAID_CDN_URL,
        diagram_json = js_string_literal(code),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Encode the diagram source as a JS string literal.
///
/// JSON string encoding covers quotes, backslashes, and newlines. A literal
/// `</` would still terminate the surrounding `<script>` element during HTML
/// parsing, so it is additionally escaped as `\u003c/`.
fn js_string_literal(code: &str) -> String {
    serde_json::Value::String(code.to_string())
        .to_string()
        .replace("</", "\\u003c/")
}
