//! Screen geometry for the 128×64 OLED.
//!
//! Three stacked regions, each redrawn on its own:
//!
//! ```text
//!  y  0 ┌──────────────────────┐
//!       │   status (inverted)  │
//!  y 16 ├──────────────────────┤
//!       │ content, wrapped,    │
//!       │ up to 3 lines        │
//!  y 52 ├──────────────────────┤
//!       │ Cancel   Call    Yo  │
//!  y 64 └──────────────────────┘
//! ```

pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;

/// 6×10 mono font.
pub const CHAR_WIDTH: u32 = 6;
pub const LINE_HEIGHT: u32 = 11;

/// Characters that fit on one full-width line.
pub const COLUMNS: usize = (SCREEN_WIDTH / CHAR_WIDTH) as usize;

/// Lines of content shown before the rest is dropped.
pub const CONTENT_LINES: usize = 3;

/// Label centres for buttons A, B and C.
pub const LABEL_CENTRES: [i32; 3] = [21, 64, 107];

/// Axis-aligned screen area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub top: i32,
    pub height: u32,
}

impl Region {
    pub const fn bottom(&self) -> i32 {
        self.top + self.height as i32
    }
}

pub const STATUS_REGION: Region = Region { top: 0, height: 16 };
pub const CONTENT_REGION: Region = Region { top: 16, height: 36 };
pub const BUTTON_REGION: Region = Region { top: 52, height: 12 };

/// Number of characters (not bytes) in `text`.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Left x for `text` centred on `centre`, kept on screen.
pub fn centred_x(text: &str, centre: i32) -> i32 {
    let width = (char_count(text).min(COLUMNS) as u32 * CHAR_WIDTH) as i32;
    let x = centre - width / 2;
    x.clamp(0, (SCREEN_WIDTH as i32 - width).max(0))
}

/// Prefix of `text` holding at most `max_chars` characters.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Greedy hard wrap: break at `\n` and every `columns` characters.
pub fn wrap(text: &str, columns: usize) -> Wrap<'_> {
    Wrap {
        rest: Some(text),
        columns: columns.max(1),
    }
}

pub struct Wrap<'a> {
    rest: Option<&'a str>,
    columns: usize,
}

impl<'a> Iterator for Wrap<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        if rest.is_empty() {
            self.rest = None;
            return None;
        }

        let mut end = rest.len();
        let mut skip = 0;
        for (count, (i, c)) in rest.char_indices().enumerate() {
            if c == '\n' {
                end = i;
                skip = 1;
                break;
            }
            if count == self.columns {
                end = i;
                break;
            }
        }

        let line = &rest[..end];
        let tail = &rest[end + skip..];
        // A trailing newline doesn't open an empty last line.
        self.rest = if tail.is_empty() { None } else { Some(tail) };
        Some(line)
    }
}

/// Baseline y for line `index` of the content region.
pub fn content_baseline(index: usize) -> i32 {
    CONTENT_REGION.top + 9 + (index as u32 * LINE_HEIGHT) as i32
}
