use std::collections::HashMap;

/// Bounds render frequency for streaming message updates.
///
/// A high-frequency token stream would otherwise force a render per token.
/// The first partial for an id always renders (perceived latency), the final
/// state always renders, and in between a render happens only when the
/// content length moved by more than the threshold since the last render.
/// Completion resets the id so a later stream can reuse it.
#[derive(Debug)]
pub struct StreamCoalescer {
    threshold: usize,
    last_rendered: HashMap<String, usize>,
}

impl StreamCoalescer {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            last_rendered: HashMap::new(),
        }
    }

    /// Decide whether this update should reach the surface.
    pub fn should_render(&mut self, id: &str, content: &str, is_complete: bool) -> bool {
        let len = content.chars().count();

        if is_complete {
            self.last_rendered.remove(id);
            return true;
        }

        match self.last_rendered.get(id) {
            None => {
                self.last_rendered.insert(id.to_string(), len);
                true
            }
            Some(&last) if len.abs_diff(last) > self.threshold => {
                self.last_rendered.insert(id.to_string(), len);
                true
            }
            Some(_) => false,
        }
    }
}
