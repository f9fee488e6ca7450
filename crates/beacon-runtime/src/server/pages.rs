const STYLESHEET: &str = r#"<link rel="stylesheet" href="https://maxcdn.bootstrapcdn.com/bootstrap/3.3.6/css/bootstrap.min.css" crossorigin="anonymous">
<style>
.jumbotron { text-align: center; }
.header h3 { color: white; }
</style>"#;

const CAT_PICTURE: &str = "http://i.imgur.com/1uYroRF.gif";

/// Wrap `body` (trusted HTML) in the shared page layout.
pub(super) fn layout(title: &str, heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <title>{title}</title>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    {STYLESHEET}
  </head>
  <body>
    <div class="container">
      <div class="header clearfix navbar navbar-inverse">
        <div class="container"><h3>{heading}</h3></div>
      </div>
      {body}
    </div>
  </body>
</html>
"#,
        title = escape_html(title),
        heading = escape_html(heading),
    )
}

pub(super) fn info_body(ip: &str, instance_index: u32, cat_ports: &str) -> String {
    format!(
        r#"<div class="jumbotron">
        <h1>My overlay IP is: {}</h1>
        <h3>My instance index is: {}</h3>
        <p class="lead">I'm serving cats on TCP ports {}</p>
      </div>"#,
        escape_html(ip),
        instance_index,
        escape_html(cat_ports),
    )
}

pub(super) fn cat_body(ip: &str, port: u16) -> String {
    format!(
        r#"<div class="jumbotron">
        <p class="lead">Hello from the backend, here is a picture of a cat:</p>
        <p><img src="{}" /></p>
        <p class="lead">My IP is {}, you reached me on port {}</p>
      </div>"#,
        CAT_PICTURE,
        escape_html(ip),
        port,
    )
}

pub(super) fn error_body(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger" role="alert">
        <p class="lead">Request failed: {}</p>
      </div>"#,
        escape_html(message)
    )
}

/// Escape text for inclusion in HTML.
pub(super) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
