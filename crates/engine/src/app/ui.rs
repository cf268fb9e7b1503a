use super::world::Vec2;

/// Screen-space rectangle in window pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open on the right and bottom edges.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiText {
    pub text: String,
    pub color: [u8; 4],
}

impl UiText {
    pub fn new(text: impl Into<String>, color: [u8; 4]) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UiPanel {
    pub rect: ScreenRect,
    pub background: [u8; 4],
    pub border: Option<[u8; 4]>,
    pub lines: Vec<UiText>,
    /// Centers every line horizontally and the block vertically.
    pub centered: bool,
}

impl UiPanel {
    pub fn new(rect: ScreenRect, background: [u8; 4]) -> Self {
        Self {
            rect,
            background,
            border: None,
            lines: Vec::new(),
            centered: false,
        }
    }

    pub fn with_border(mut self, color: [u8; 4]) -> Self {
        self.border = Some(color);
        self
    }

    pub fn with_line(mut self, text: impl Into<String>, color: [u8; 4]) -> Self {
        self.lines.push(UiText::new(text, color));
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

/// Screen-fixed panels drawn above the world in push order. Scenes rebuild
/// the layer every tick.
#[derive(Debug, Clone, Default)]
pub struct UiLayer {
    panels: Vec<UiPanel>,
}

impl UiLayer {
    pub fn clear(&mut self) {
        self.panels.clear();
    }

    pub fn push(&mut self, panel: UiPanel) {
        self.panels.push(panel);
    }

    pub fn panels(&self) -> &[UiPanel] {
        &self.panels
    }
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a line
/// are split; explicit newlines are kept.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            let needed = if current_len == 0 {
                word.len()
            } else {
                current_len + 1 + word.len()
            };
            if needed > max_chars && current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let rect = ScreenRect::new(10.0, 10.0, 20.0, 20.0);
        assert!(rect.contains(Vec2::new(10.0, 10.0)));
        assert!(rect.contains(Vec2::new(29.9, 29.9)));
        assert!(!rect.contains(Vec2::new(30.0, 15.0)));
        assert!(!rect.contains(Vec2::new(9.9, 15.0)));
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap_text("the quick brown fox", 10),
            vec!["the quick".to_string(), "brown fox".to_string()]
        );
    }

    #[test]
    fn wrap_splits_overlong_words_and_keeps_newlines() {
        assert_eq!(
            wrap_text("abcdefgh ij\nk", 3),
            vec!["abc", "def", "gh", "ij", "k"]
        );
    }

    #[test]
    fn wrap_of_empty_text_is_single_empty_line() {
        assert_eq!(wrap_text("", 8), vec![String::new()]);
    }

    #[test]
    fn layer_keeps_push_order() {
        let mut layer = UiLayer::default();
        let rect = ScreenRect::new(0.0, 0.0, 1.0, 1.0);
        layer.push(UiPanel::new(rect, [0, 0, 0, 255]).with_line("a", [255; 4]));
        layer.push(UiPanel::new(rect, [0, 0, 0, 255]).with_line("b", [255; 4]));
        assert_eq!(layer.panels()[1].lines[0].text, "b");
        layer.clear();
        assert!(layer.panels().is_empty());
    }
}
