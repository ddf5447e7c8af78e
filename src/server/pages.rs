//! Server-rendered HTML pages.

use crate::core::Level;
use axum::response::Html;

const LANDING: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Lift Access</title></head>
<body>
<h1>Lift Access</h1>
<p>Authenticate with your face to control the lift.</p>
<p><a href="/face-login">Log in with face</a></p>
</body></html>"#;

const FACE_LOGIN: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Face Login</title></head>
<body>
<h1>Face Login</h1>
<video id="camera" autoplay playsinline width="320" height="240"></video>
<p><button id="capture">Authenticate</button></p>
<p id="status"></p>
<canvas id="frame" width="320" height="240" hidden></canvas>
<script>
const video = document.getElementById("camera");
const canvas = document.getElementById("frame");
const statusEl = document.getElementById("status");
navigator.mediaDevices.getUserMedia({ video: true })
  .then(stream => { video.srcObject = stream; })
  .catch(err => { statusEl.textContent = "Camera unavailable: " + err; });
document.getElementById("capture").addEventListener("click", () => {
  canvas.getContext("2d").drawImage(video, 0, 0, canvas.width, canvas.height);
  canvas.toBlob(blob => {
    const form = new FormData();
    form.append("image", blob, "capture.jpg");
    fetch("/authenticate", { method: "POST", body: form })
      .then(r => r.json())
      .then(body => {
        if (body.status === "success") { window.location = body.redirect_to; }
        else { statusEl.textContent = body.message; }
      });
  }, "image/jpeg");
});
</script>
</body></html>"#;

const FACE_LOGOUT: &str = r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Log out</title></head>
<body>
<h1>Log out?</h1>
<form method="post" action="/logout"><button type="submit">Log out</button></form>
<p><a href="/profile">Back to profile</a></p>
</body></html>"#;

pub fn landing() -> Html<&'static str> {
    Html(LANDING)
}

pub fn face_login() -> Html<&'static str> {
    Html(FACE_LOGIN)
}

pub fn face_logout() -> Html<&'static str> {
    Html(FACE_LOGOUT)
}

pub fn profile(user_name: &str, authorized_levels: &[Level]) -> Html<String> {
    let levels: String = authorized_levels
        .iter()
        .map(|level| format!("<li>Level {}</li>", level))
        .collect();

    Html(format!(
        r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Profile</title></head>
<body>
<h1>Welcome, {user}</h1>
<h2>Authorized levels</h2>
<ul>{levels}</ul>
<p><a href="/level_control">Lift control</a> | <a href="/face-logout">Log out</a></p>
</body></html>"#,
        user = escape_html(user_name),
        levels = levels,
    ))
}

pub fn level_control(current: Level) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html><head><meta charset="utf-8"><title>Lift Control</title></head>
<body>
<h1>Lift Control</h1>
<p>Current level: <strong id="level">{current}</strong></p>
<p><button data-level="1">Level 1</button> <button data-level="2">Level 2</button></p>
<p id="status"></p>
<p><a href="/profile">Back to profile</a></p>
<script>
const levelEl = document.getElementById("level");
const statusEl = document.getElementById("status");
document.querySelectorAll("button[data-level]").forEach(button => {{
  button.addEventListener("click", () => {{
    fetch("/change_level", {{
      method: "POST",
      headers: {{ "Content-Type": "application/x-www-form-urlencoded" }},
      body: "level=" + button.dataset.level,
    }})
      .then(r => r.json())
      .then(body => {{
        if (body.status === "success") {{ levelEl.textContent = body.new_level; }}
        else {{ statusEl.textContent = body.message; }}
      }});
  }});
}});
setInterval(() => {{
  fetch("/get_level").then(r => r.json()).then(body => {{ levelEl.textContent = body.current_level; }});
}}, 2000);
</script>
</body></html>"#,
        current = current,
    ))
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
