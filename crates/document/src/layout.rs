//! Page geometry, text measurement and the measured-pagination composer.
//!
//! All vertical positions in a [`DocumentPlan`] are in millimetres from
//! the top of an A4 page; the renderer converts to PDF coordinates. Block
//! heights mirror the line metrics of the original generator so documents
//! paginate the same way.

/// A4 page width in millimetres.
pub const PAGE_WIDTH: f32 = 210.0;
/// A4 page height in millimetres.
pub const PAGE_HEIGHT: f32 = 297.0;
/// Left/right page margin.
pub const MARGIN: f32 = 15.0;
/// Usable content width.
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Bottom zone reserved for the running footer; content never enters it.
pub const FOOTER_RESERVE: f32 = 25.0;
/// First content baseline on a continuation page.
pub const TOP_MARGIN: f32 = 15.0;
/// Height of the first-page banner band.
pub const BANNER_HEIGHT: f32 = 22.0;
/// First content position under the banner.
pub const BANNER_CONTENT_START: f32 = 28.0;

/// Approximate average glyph advance for Helvetica, in mm per point of
/// font size. Used for wrapping and centring; deliberately conservative so
/// wrapped lines never overrun the content width.
const CHAR_WIDTH_PER_PT: f32 = 0.21;

/// Advance per text line for a font size, in mm.
pub fn line_height(size: f32) -> f32 {
    size * 0.45
}

/// Estimated rendered width of a string, in mm.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * CHAR_WIDTH_PER_PT * 0.84
}

/// Character budget for one wrapped line of the given width.
pub fn max_chars(size: f32, width_mm: f32) -> usize {
    (width_mm / (size * CHAR_WIDTH_PER_PT)).max(1.0) as usize
}

/// Greedy word wrap against a character budget.
///
/// Words longer than the budget are emitted on their own line rather than
/// split; the estimate in [`max_chars`] leaves enough slack that this does
/// not overrun in practice.
pub fn wrap_text(text: &str, budget: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > budget {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// One drawable unit. A block is placed whole on a single page; the
/// composer never splits one across a boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// First-page identity band (clinic name, document title, date,
    /// address).
    Banner {
        clinic_name: String,
        subtitle: String,
        date_line: String,
        address: String,
    },
    /// Inverted section title band.
    SectionHeader(String),
    /// Bold label followed by a value on one line.
    LabelValue { label: String, value: String },
    /// Wrapped body text.
    Paragraph {
        lines: Vec<String>,
        size: f32,
        bold: bool,
    },
    /// One bulleted risk-disclosure item.
    Bullet { lines: Vec<String> },
    /// The boldface safety-alert box.
    Alert { lines: Vec<String> },
    /// One acknowledgment line: checkbox glyph plus statement text. A
    /// checked glyph is filled and carries the patient's initials.
    Checkbox {
        lines: Vec<String>,
        checked: bool,
        initials: String,
    },
    /// Reserved box for the embedded signature raster.
    Signature { width: f32, height: f32 },
}

impl Block {
    /// Measured height in mm, computed before placement.
    pub fn height(&self) -> f32 {
        match self {
            Block::Banner { .. } => BANNER_HEIGHT,
            Block::SectionHeader(_) => 12.0,
            Block::LabelValue { .. } => 5.0,
            Block::Paragraph { lines, size, .. } => lines.len() as f32 * line_height(*size) + 2.0,
            Block::Bullet { lines } => lines.len() as f32 * 3.8 + 1.0,
            Block::Alert { lines } => lines.len() as f32 * 4.0 + 8.0,
            Block::Checkbox { lines, .. } => lines.len() as f32 * 4.0 + 3.0,
            Block::Signature { height, .. } => height + 3.0,
        }
    }
}

/// A block with its resolved top position (mm from page top).
#[derive(Debug, Clone)]
pub struct Placed {
    pub y: f32,
    pub block: Block,
}

/// All blocks placed on one page.
#[derive(Debug, Clone, Default)]
pub struct PagePlan {
    pub blocks: Vec<Placed>,
}

/// Footer content repeated on every page; the page-number stamp is added
/// by the renderer once the total is known.
#[derive(Debug, Clone)]
pub struct FooterPlan {
    pub clinic_line: String,
    pub classification: String,
}

/// The fully composed document: positioned blocks per page plus the
/// repeated footer.
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    pub pages: Vec<PagePlan>,
    pub footer: FooterPlan,
}

impl DocumentPlan {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All placed blocks in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Placed> {
        self.pages.iter().flat_map(|page| page.blocks.iter())
    }
}

/// Running-cursor composer enforcing measured pagination.
pub struct Composer {
    pages: Vec<PagePlan>,
    y: f32,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            pages: vec![PagePlan::default()],
            y: TOP_MARGIN,
        }
    }

    /// Places a block, breaking the page first if its measured height
    /// would cross into the footer reserve.
    pub fn push(&mut self, block: Block) {
        let height = block.height();
        if self.y + height > PAGE_HEIGHT - FOOTER_RESERVE {
            self.pages.push(PagePlan::default());
            self.y = TOP_MARGIN;
        }
        let page = self
            .pages
            .last_mut()
            .expect("composer always holds at least one page");
        page.blocks.push(Placed { y: self.y, block });
        self.y += height;
    }

    /// Advances the cursor without placing anything. Spacing may run past
    /// the reserve; the next `push` will break the page.
    pub fn gap(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Current cursor position (mm from page top), for blocks that pin the
    /// cursor such as the banner.
    pub fn set_cursor(&mut self, y: f32) {
        self.y = y;
    }

    pub fn finish(self, footer: FooterPlan) -> DocumentPlan {
        DocumentPlan {
            pages: self.pages,
            footer,
        }
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}
