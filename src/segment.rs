//! Splits message text into prose and fenced code segments.

/// Fence marker delimiting a code region.
pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Prose,
    Code,
}

/// A contiguous unit of a message's text, classified for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub kind: SegmentKind,
    pub content: String,
}

impl Segment {
    pub fn prose(content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Prose,
            content: content.into(),
        }
    }

    pub fn code(content: impl Into<String>) -> Self {
        Self {
            kind: SegmentKind::Code,
            content: content.into(),
        }
    }

    pub fn is_code(&self) -> bool {
        self.kind == SegmentKind::Code
    }
}

/// Split `text` into at most one prose segment followed by every fenced code
/// region in source order.
///
/// Regions are matched pairwise from the left. An unmatched trailing marker
/// and everything after it stay in the prose. The prose is everything outside
/// the matched regions, concatenated and trimmed; it always comes first even
/// when code appeared earlier in the text.
pub fn segment(text: &str) -> Vec<Segment> {
    let mut prose = String::new();
    let mut code = Vec::new();
    let mut rest = text;

    loop {
        let Some(open) = rest.find(FENCE) else {
            prose.push_str(rest);
            break;
        };
        let body_start = open + FENCE.len();
        let Some(close) = rest[body_start..].find(FENCE) else {
            prose.push_str(rest);
            break;
        };

        prose.push_str(&rest[..open]);
        code.push(Segment::code(&rest[body_start..body_start + close]));
        rest = &rest[body_start + close + FENCE.len()..];
    }

    let mut segments = Vec::with_capacity(code.len() + 1);
    let prose = prose.trim();
    if !prose.is_empty() {
        segments.push(Segment::prose(prose));
    }
    segments.extend(code);
    segments
}

/// Wrap `content` as a single fenced block.
pub fn fence(content: &str) -> String {
    format!("{FENCE}{content}{FENCE}")
}
