const FENCE: &str = "```";

/// Returns the JSON payload of a model reply: the body of the first
/// markdown fence (optionally tagged `json`), or the whole reply trimmed.
pub fn extract_json_payload(reply: &str) -> &str {
    fenced_body(reply, |rest| if rest.starts_with("json") { 4 } else { 0 }).unwrap_or(reply.trim())
}

/// Free-text variant: accepts any single-word language tag on the fence.
pub fn strip_reply(reply: &str) -> &str {
    fenced_body(reply, |rest| {
        rest.find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len())
    })
    .unwrap_or(reply.trim())
}

fn fenced_body(text: &str, tag_len: impl Fn(&str) -> usize) -> Option<&str> {
    let open = text.find(FENCE)? + FENCE.len();
    let rest = &text[open..];
    let rest = &rest[tag_len(rest)..];
    let rest = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);
    let close = rest.find(FENCE)?;
    let body = &rest[..close];
    if body.is_empty() { None } else { Some(body.trim()) }
}
