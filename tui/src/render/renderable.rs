use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::WidgetRef;

use crate::render::Insets;
use crate::render::RectExt as _;

/// Something that can be laid out in a column and may own the terminal cursor.
pub trait Renderable {
    fn render(&self, area: Rect, buf: &mut Buffer);
    fn desired_height(&self, width: u16) -> u16;
    fn cursor_pos(&self, _area: Rect) -> Option<(u16, u16)> {
        None
    }
}

pub type RenderableItem<'a> = Box<dyn Renderable + 'a>;

impl<'a, R> From<R> for Box<dyn Renderable + 'a>
where
    R: Renderable + 'a,
{
    fn from(value: R) -> Self {
        Box::new(value)
    }
}

impl Renderable for &str {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        self.render_ref(area, buf);
    }
    fn desired_height(&self, _width: u16) -> u16 {
        1
    }
}

impl<'a> Renderable for Line<'a> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        WidgetRef::render_ref(self, area, buf);
    }
    fn desired_height(&self, _width: u16) -> u16 {
        1
    }
}

/// Children stacked top to bottom, each given its desired height.
#[derive(Default)]
pub struct ColumnRenderable<'a> {
    children: Vec<RenderableItem<'a>>,
}

impl<'a> ColumnRenderable<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, child: impl Into<RenderableItem<'a>>) {
        self.children.push(child.into());
    }

    fn child_areas(&self, area: Rect) -> impl Iterator<Item = (&RenderableItem<'a>, Rect)> {
        let mut y = area.y;
        self.children.iter().map(move |child| {
            let height = child.desired_height(area.width);
            let child_area = Rect::new(area.x, y, area.width, height).intersection(area);
            y = y.saturating_add(height);
            (child, child_area)
        })
    }
}

impl Renderable for ColumnRenderable<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        for (child, child_area) in self.child_areas(area) {
            if !child_area.is_empty() {
                child.render(child_area, buf);
            }
        }
    }

    fn desired_height(&self, width: u16) -> u16 {
        self.children
            .iter()
            .map(|child| child.desired_height(width))
            .sum()
    }

    /// Cursor of the first child that reports one. At most one child is expected to.
    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.child_areas(area)
            .filter(|(_, child_area)| !child_area.is_empty())
            .find_map(|(child, child_area)| child.cursor_pos(child_area))
    }
}

pub struct InsetRenderable<'a> {
    child: RenderableItem<'a>,
    insets: Insets,
}

impl<'a> InsetRenderable<'a> {
    pub fn new(child: impl Into<RenderableItem<'a>>, insets: Insets) -> Self {
        Self {
            child: child.into(),
            insets,
        }
    }
}

impl Renderable for InsetRenderable<'_> {
    fn render(&self, area: Rect, buf: &mut Buffer) {
        self.child.render(area.inset(self.insets), buf);
    }
    fn desired_height(&self, width: u16) -> u16 {
        let inner_width = width.saturating_sub(self.insets.left + self.insets.right);
        self.child.desired_height(inner_width) + self.insets.top + self.insets.bottom
    }
    fn cursor_pos(&self, area: Rect) -> Option<(u16, u16)> {
        self.child.cursor_pos(area.inset(self.insets))
    }
}
