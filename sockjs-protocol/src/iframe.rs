use md5::{Digest, Md5};
use std::sync::LazyLock;

/// Fixed iframe HTML shell, with one substitution point for the SockJS
/// client library URL.
pub const IFRAME_HTML_TEMPLATE: &str = "<!DOCTYPE html>
<html>
<head>
  <meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\" />
  <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />
  <script>
    document.domain = document.domain;
    _sockjs_onload = function(){SockJS.bootstrap_iframe();};
  </script>
  <script src=\"%s\"></script>
</head>
<body>
  <h2>Don't panic!</h2>
  <p>This is a SockJS hidden iframe. It's used for cross domain magic.</p>
</body>
</html>";

/// MD5 of the raw template (placeholder unfilled), used as the iframe's ETag.
pub static IFRAME_MD5: LazyLock<String> = LazyLock::new(|| {
    let digest = Md5::digest(IFRAME_HTML_TEMPLATE.as_bytes());
    format!("{digest:x}")
});

/// Substitute the client URL into the iframe template.
pub fn render_iframe_html(client_url: &str) -> String {
    IFRAME_HTML_TEMPLATE.replacen("%s", client_url, 1)
}
