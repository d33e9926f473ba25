//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// This is intentionally simple (no nested/conditional logic).
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max).collect();
    format!("{}… ({} bytes total)", cut, s.len())
  }
}

/// Parse a free-form course duration string into content hours.
///
/// Accepted shapes: "12h 30m", "8h", "45m", "2.5h", "10 giờ", "30 phút",
/// or a bare number (interpreted as hours). Anything unparseable yields 0.0;
/// the phase scheduler clamps to at least one week regardless.
pub fn parse_duration_hours(s: &str) -> f64 {
  fn flush(num: &mut String, factor: f64, acc: &mut f64) {
    if let Ok(v) = num.parse::<f64>() {
      *acc += v * factor;
    }
    num.clear();
  }

  let mut hours = 0.0_f64;
  let mut num = String::new();

  let lower = s.to_lowercase();
  let mut chars = lower.chars().peekable();
  while let Some(ch) = chars.next() {
    if ch.is_ascii_digit() || ch == '.' {
      num.push(ch);
      continue;
    }
    if ch.is_whitespace() {
      continue;
    }
    if num.is_empty() {
      continue;
    }
    match ch {
      // "h", "hr", "hours", "giờ"
      'h' | 'g' => flush(&mut num, 1.0, &mut hours),
      // "m", "min", "minutes", "phút"
      'm' | 'p' => flush(&mut num, 1.0 / 60.0, &mut hours),
      _ => num.clear(),
    }
    // Swallow the rest of the unit word.
    while chars.peek().map_or(false, |c| c.is_alphabetic() || *c == 'ờ' || *c == 'ú') {
      chars.next();
    }
  }
  // Trailing bare number means hours ("12").
  flush(&mut num, 1.0, &mut hours);

  if hours.is_finite() && hours > 0.0 {
    hours
  } else {
    0.0
  }
}
