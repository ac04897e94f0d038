//! Page view with the annotation overlay
//!
//! The page is laid out in character cells. One cell covers
//! `CELL_WIDTH_UNITS` x `CELL_HEIGHT_UNITS` page units at 100% zoom, so a
//! cell maps to page coordinates by dividing by the current scale.

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use crate::annotation::{
    Annotation, AnnotationId, AnnotationKind, HIGHLIGHT_HEIGHT, HIGHLIGHT_WIDTH, PagePoint,
};
use crate::document::DocumentKind;
use crate::editor::Editor;
use crate::theme::Base16Palette;

pub const CELL_WIDTH_UNITS: f32 = 8.0;
pub const CELL_HEIGHT_UNITS: f32 = 16.0;

const COMMENT_MARKER: &str = "◆ ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub col: u16,
    pub row: u16,
}

impl Cell {
    pub fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

pub fn point_at(cell: Cell, scale: f32) -> PagePoint {
    PagePoint::new(
        f32::from(cell.col) * CELL_WIDTH_UNITS / scale,
        f32::from(cell.row) * CELL_HEIGHT_UNITS / scale,
    )
}

pub fn cell_for(x: f32, y: f32, scale: f32) -> Cell {
    let col = (x * scale / CELL_WIDTH_UNITS).round().max(0.0);
    let row = (y * scale / CELL_HEIGHT_UNITS).round().max(0.0);
    Cell::new(col.min(f32::from(u16::MAX)) as u16, row.min(f32::from(u16::MAX)) as u16)
}

/// Cells an annotation occupies: origin, width, height
fn footprint(annotation: &Annotation, scale: f32) -> (Cell, u16, u16) {
    let origin = cell_for(annotation.x, annotation.y, scale);
    let (width, height) = match annotation.kind {
        AnnotationKind::Highlight => {
            let w = annotation.width.unwrap_or(HIGHLIGHT_WIDTH) * scale / CELL_WIDTH_UNITS;
            let h = annotation.height.unwrap_or(HIGHLIGHT_HEIGHT) * scale / CELL_HEIGHT_UNITS;
            (w.ceil().max(1.0) as u16, h.ceil().max(1.0) as u16)
        }
        AnnotationKind::Comment => {
            let len = annotation.content.as_deref().map_or(0, UnicodeWidthStr::width);
            ((len + COMMENT_MARKER.width()) as u16, 1)
        }
        AnnotationKind::TextEdit => {
            let len = annotation.content.as_deref().map_or(0, UnicodeWidthStr::width);
            (len.max(1) as u16, 1)
        }
    };
    (origin, width, height)
}

fn contains(footprint: (Cell, u16, u16), cell: Cell) -> bool {
    let (origin, width, height) = footprint;
    cell.col >= origin.col
        && cell.row >= origin.row
        && u32::from(cell.col) < u32::from(origin.col) + u32::from(width)
        && u32::from(cell.row) < u32::from(origin.row) + u32::from(height)
}

#[derive(Debug, Default)]
pub struct PageCanvas {
    cursor: Cell,
    last_area: Option<Rect>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Cell {
        self.cursor
    }

    pub fn set_cursor(&mut self, cell: Cell) {
        self.cursor = cell;
    }

    /// The page area inside the border, as of the last draw
    pub fn area(&self) -> Option<Rect> {
        self.last_area
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (max_col, max_row) = self
            .last_area
            .map_or((i32::from(u16::MAX), i32::from(u16::MAX)), |area| {
                (
                    i32::from(area.width.saturating_sub(1)),
                    i32::from(area.height.saturating_sub(1)),
                )
            });
        let col = (i32::from(self.cursor.col) + dx).clamp(0, max_col);
        let row = (i32::from(self.cursor.row) + dy).clamp(0, max_row);
        self.cursor = Cell::new(col as u16, row as u16);
    }

    /// Map a terminal position to a page cell and move the cursor there
    pub fn hit(&mut self, column: u16, row: u16) -> Option<Cell> {
        let area = self.last_area?;
        let inside = column >= area.x
            && row >= area.y
            && column < area.x + area.width
            && row < area.y + area.height;
        if !inside {
            return None;
        }
        let cell = Cell::new(column - area.x, row - area.y);
        self.cursor = cell;
        Some(cell)
    }

    /// Topmost visible annotation under the cursor
    pub fn annotation_at_cursor(&self, editor: &Editor) -> Option<AnnotationId> {
        let scale = editor.view().scale();
        editor
            .visible_annotations()
            .into_iter()
            .rev()
            .find(|a| contains(footprint(a, scale), self.cursor))
            .map(|a| a.id)
    }

    pub fn render(
        &mut self,
        f: &mut Frame,
        area: Rect,
        editor: &Editor,
        text_color: Option<&str>,
        palette: &Base16Palette,
    ) {
        let view = editor.view();
        let title = match editor.document() {
            Some(doc) if view.rotation == 0 => {
                format!(" {} - page {} ", doc.name, view.current_page)
            }
            Some(doc) => format!(
                " {} - page {} (rotated {}°) ",
                doc.name, view.current_page, view.rotation
            ),
            None => " No document ".to_string(),
        };
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.base_03))
            .style(Style::default().bg(palette.base_00));
        let inner = block.inner(area);
        self.last_area = Some(inner);
        if self.cursor.col >= inner.width || self.cursor.row >= inner.height {
            self.cursor = Cell::default();
        }

        f.render_widget(Paragraph::new(self.page_lines(editor)).block(block), area);

        if editor.document().is_none() {
            return;
        }

        let text_color = text_color
            .and_then(|c| c.parse::<Color>().ok())
            .unwrap_or(palette.base_0d);
        let buf = f.buffer_mut();
        for annotation in editor.visible_annotations() {
            draw_annotation(buf, inner, annotation, view.scale(), text_color, palette);
        }
        if let Some(edit) = editor.annotations().active_edit() {
            if edit.page == view.current_page {
                let at = cell_for(edit.x, edit.y, view.scale());
                draw_text(
                    buf,
                    inner,
                    at,
                    &format!("{}▏", edit.text),
                    Style::default()
                        .fg(text_color)
                        .bg(palette.base_01)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
        }

        let x = inner.x + self.cursor.col;
        let y = inner.y + self.cursor.row;
        if x < inner.right() && y < inner.bottom() {
            buf[(x, y)].set_style(Style::default().add_modifier(Modifier::REVERSED));
        }
    }

    fn page_lines(&self, editor: &Editor) -> Vec<Line<'static>> {
        let Some(doc) = editor.document() else {
            return vec![
                Line::from(""),
                Line::from("  Open a pdf, docx, doc, txt, jpg or png file with o").centered(),
            ];
        };
        if let Some(text) = editor.page_text() {
            return text.into_iter().map(Line::from).collect();
        }

        let view = editor.view();
        let description = match doc.kind {
            DocumentKind::Pdf => format!("PDF page {} of {}", view.current_page, view.page_count),
            DocumentKind::Jpg | DocumentKind::Png => format!("Image: {}", doc.name),
            DocumentKind::Docx | DocumentKind::Doc => format!("Word document: {}", doc.name),
            DocumentKind::Txt => doc.name.clone(),
        };
        vec![
            Line::from(""),
            Line::from(description).centered(),
            Line::from(format!("{} at {}%", doc.size_label(), view.scale_percent())).centered(),
        ]
    }
}

fn draw_text(buf: &mut Buffer, inner: Rect, at: Cell, text: &str, style: Style) {
    if at.col >= inner.width || at.row >= inner.height {
        return;
    }
    let max_width = (inner.width - at.col) as usize;
    buf.set_stringn(inner.x + at.col, inner.y + at.row, text, max_width, style);
}

fn draw_annotation(
    buf: &mut Buffer,
    inner: Rect,
    annotation: &Annotation,
    scale: f32,
    text_color: Color,
    palette: &Base16Palette,
) {
    let (origin, width, height) = footprint(annotation, scale);
    match annotation.kind {
        AnnotationKind::Highlight => {
            let right = origin.col.saturating_add(width).min(inner.width);
            let bottom = origin.row.saturating_add(height).min(inner.height);
            for row in origin.row..bottom {
                for col in origin.col..right {
                    buf[(inner.x + col, inner.y + row)]
                        .set_bg(palette.base_0a)
                        .set_fg(palette.base_00);
                }
            }
        }
        AnnotationKind::Comment => {
            let content = annotation.content.as_deref().unwrap_or_default();
            draw_text(
                buf,
                inner,
                origin,
                &format!("{COMMENT_MARKER}{content}"),
                Style::default().fg(palette.base_0e).add_modifier(Modifier::ITALIC),
            );
        }
        AnnotationKind::TextEdit => {
            let content = annotation.content.as_deref().unwrap_or_default();
            draw_text(buf, inner, origin, content, Style::default().fg(text_color));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_map_to_page_units_through_scale() {
        let p = point_at(Cell::new(10, 2), 1.0);
        assert_eq!((p.x, p.y), (80.0, 32.0));

        let zoomed = point_at(Cell::new(10, 2), 2.0);
        assert_eq!((zoomed.x, zoomed.y), (40.0, 16.0));

        assert_eq!(cell_for(40.0, 16.0, 2.0), Cell::new(10, 2));
    }

    #[test]
    fn highlight_footprint_follows_zoom() {
        let highlight = Annotation {
            id: 1,
            kind: AnnotationKind::Highlight,
            page: 1,
            x: 0.0,
            y: 0.0,
            width: Some(HIGHLIGHT_WIDTH),
            height: Some(HIGHLIGHT_HEIGHT),
            content: None,
            color: None,
        };
        let (_, w, h) = footprint(&highlight, 1.0);
        assert_eq!((w, h), (13, 2));
        let (_, w, _) = footprint(&highlight, 0.5);
        assert_eq!(w, 7);
        assert!(contains(footprint(&highlight, 1.0), Cell::new(12, 1)));
        assert!(!contains(footprint(&highlight, 1.0), Cell::new(13, 0)));
    }

    #[test]
    fn oversized_highlight_is_clipped_to_the_page() {
        let huge = Annotation {
            id: 1,
            kind: AnnotationKind::Highlight,
            page: 1,
            x: 8.0,
            y: 16.0,
            width: Some(1e9),
            height: Some(1e9),
            content: None,
            color: None,
        };
        let palette = crate::theme::current_theme();
        let inner = Rect::new(1, 1, 10, 4);
        let mut buf = Buffer::empty(Rect::new(0, 0, 12, 6));

        draw_annotation(&mut buf, inner, &huge, 1.0, Color::Reset, palette);

        assert_eq!(buf[(1, 1)].bg, Color::Reset);
        assert_eq!(buf[(2, 2)].bg, palette.base_0a);
        assert_eq!(buf[(10, 4)].bg, palette.base_0a);
        assert_eq!(buf[(11, 5)].bg, Color::Reset);
    }

    #[test]
    fn hits_outside_the_page_are_ignored() {
        let mut canvas = PageCanvas::new();
        assert_eq!(canvas.hit(5, 5), None);

        canvas.last_area = Some(Rect::new(2, 3, 20, 10));
        assert_eq!(canvas.hit(1, 5), None);
        assert_eq!(canvas.hit(4, 4), Some(Cell::new(2, 1)));
        assert_eq!(canvas.cursor(), Cell::new(2, 1));
    }

    #[test]
    fn cursor_stays_on_the_page() {
        let mut canvas = PageCanvas::new();
        canvas.last_area = Some(Rect::new(0, 0, 5, 3));
        canvas.move_cursor(-1, -1);
        assert_eq!(canvas.cursor(), Cell::new(0, 0));
        canvas.move_cursor(10, 10);
        assert_eq!(canvas.cursor(), Cell::new(4, 2));
    }
}
