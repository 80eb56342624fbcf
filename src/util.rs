//! Small utility helpers used across modules.

/// Extract the token from an `Authorization: Bearer <token>` value.
/// Returns None for other schemes or an empty token.
pub fn bearer_token(header_value: &str) -> Option<String> {
  let (scheme, rest) = header_value.trim().split_once(' ')?;
  if !scheme.eq_ignore_ascii_case("bearer") {
    return None;
  }
  let token = rest.trim();
  if token.is_empty() { None } else { Some(token.to_string()) }
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge response bodies.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
