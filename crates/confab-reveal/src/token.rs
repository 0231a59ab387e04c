/// Split text into alternating word and whitespace runs.
///
/// Concatenating the tokens reproduces the input exactly, so a reveal job
/// can append tokens one batch at a time without losing spacing or line
/// breaks.
pub fn split_preserving_whitespace(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_is_ws: Option<bool> = None;

    for ch in text.chars() {
        let is_ws = ch.is_whitespace();
        match current_is_ws {
            Some(was_ws) if was_ws != is_ws => {
                tokens.push(std::mem::take(&mut current));
                current_is_ws = Some(is_ws);
            }
            None => current_is_ws = Some(is_ws),
            _ => {}
        }
        current.push(ch);
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
