use crate::consts;
use crate::history::History;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{
        block::{Block, Padding},
        Widget,
    },
};
use std::borrow::Cow;

/// The ranked list of past games shown beside the board
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct HistoryPanel<'a> {
    history: &'a History,
}

impl<'a> HistoryPanel<'a> {
    const COMMENT_INDENT: &'static str = "    ";

    pub(crate) fn new(history: &'a History) -> Self {
        HistoryPanel { history }
    }

    fn lines(&self, width: u16) -> Vec<Line<'static>> {
        let width = usize::from(width).max(1);
        if self.history.is_empty() {
            let opts = textwrap::Options::new(width).break_words(true);
            return textwrap::wrap("No records yet. Play a game to make history!", opts)
                .into_iter()
                .map(|ln| Line::from(ln.into_owned()))
                .collect();
        }
        let mut lines = Vec::new();
        for (i, entry) in self.history.entries().iter().enumerate() {
            let style = if i == 0 {
                consts::TOP_SCORE_STYLE
            } else {
                Style::new()
            };
            lines.push(Line::from_iter([
                Span::styled(format!("{:>2}. {:>4}", i + 1, entry.score), style),
                Span::raw("  "),
                Span::raw(entry.date.clone()),
            ]));
            if let Some(ref comment) = entry.comment {
                let opts = textwrap::Options::new(width)
                    .break_words(true)
                    .initial_indent(Self::COMMENT_INDENT)
                    .subsequent_indent(Self::COMMENT_INDENT);
                lines.extend(
                    textwrap::wrap(comment, opts)
                        .into_iter()
                        .map(Cow::into_owned)
                        .map(|ln| Line::styled(ln, consts::COMMENT_STYLE)),
                );
            }
        }
        lines
    }
}

impl Widget for HistoryPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" HALL OF FAME ")
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1));
        let inner = block.inner(area);
        block.render(area, buf);
        // Entries that don't fit are cut off
        for (line, row) in self.lines(inner.width).into_iter().zip(inner.rows()) {
            line.render(row, buf);
        }
    }
}
