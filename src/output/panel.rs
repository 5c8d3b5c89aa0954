use colored::Colorize;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};

use crate::report::{Report, Tag};

const MIN_WIDTH: u16 = 48;
const TITLE: &str = " Crypto Price Tracker ";

/// Draw a report inside a bordered panel.
///
/// With `color` set, each tag keeps its own foreground colour as ANSI escapes;
/// otherwise the panel is plain text.
pub fn render_report_panel(report: &Report, color: bool) -> String {
    let lines = report_lines(report);
    let content_width = lines.iter().map(Line::width).max().unwrap_or(0);
    let width = (content_width as u16).saturating_add(4).max(MIN_WIDTH);
    let height = (lines.len() as u16).saturating_add(2);
    let area = Rect::new(0, 0, width, height);

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(TITLE)
            .borders(Borders::ALL)
            .style(Style::default().fg(FG)),
    );

    let mut buffer = Buffer::empty(area);
    paragraph.render(area, &mut buffer);
    buffer_to_string(&buffer, area, color)
}

const FG: Color = Color::Rgb(0xdc, 0xdc, 0xdc);

fn tag_style(tag: Tag) -> Style {
    match tag {
        Tag::Timestamp => Style::default().fg(FG),
        Tag::Heading => Style::default()
            .fg(Color::Rgb(0x00, 0xbf, 0xff))
            .add_modifier(Modifier::BOLD),
        Tag::Price => Style::default().fg(Color::Rgb(0x7f, 0xff, 0x00)),
        Tag::MarketCap => Style::default().fg(Color::Rgb(0xff, 0xd7, 0x00)),
        Tag::Volume => Style::default().fg(Color::Rgb(0x00, 0xce, 0xd1)),
        Tag::Change => Style::default().fg(Color::Rgb(0xff, 0x8c, 0x00)),
        Tag::Error => Style::default()
            .fg(Color::Rgb(0xff, 0x4c, 0x4c))
            .add_modifier(Modifier::BOLD),
    }
}

/// Split tagged segments into styled lines, one per `\n`.
fn report_lines(report: &Report) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();

    for segment in report.segments() {
        let style = tag_style(segment.tag);
        let mut pieces = segment.text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                current.push(Span::styled(piece.to_string(), style));
            }
            if pieces.peek().is_some() {
                lines.push(Line::from(std::mem::take(&mut current)));
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line::from(current));
    }

    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

fn buffer_to_string(buffer: &Buffer, area: Rect, color: bool) -> String {
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.y..area.y + area.height {
        let mut line = String::new();
        let mut run = String::new();
        let mut run_style: Option<(Color, bool)> = None;
        let mut skip = 0usize;

        for x in area.x..area.x + area.width {
            if skip > 0 {
                skip -= 1;
                continue;
            }

            let cell = &buffer[(x, y)];
            let symbol = cell.symbol();
            skip = Span::raw(symbol).width().saturating_sub(1);

            let style = (cell.fg, cell.modifier.contains(Modifier::BOLD));
            if run_style != Some(style) {
                flush_run(&mut line, &run, run_style, color);
                run.clear();
                run_style = Some(style);
            }
            run.push_str(symbol);
        }
        flush_run(&mut line, run.trim_end(), run_style, color);

        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

fn flush_run(line: &mut String, run: &str, style: Option<(Color, bool)>, color: bool) {
    if run.is_empty() {
        return;
    }

    match style {
        Some((Color::Rgb(r, g, b), bold)) if color => {
            let painted = run.truecolor(r, g, b);
            let painted = if bold { painted.bold() } else { painted };
            line.push_str(&painted.to_string());
        }
        _ => line.push_str(run),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{CoinQuote, Lookup, PriceProvider};
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct OneCoin;

    #[async_trait]
    impl PriceProvider for OneCoin {
        fn name(&self) -> &str {
            "one"
        }

        async fn fetch(
            &self,
            coin_ids: &[String],
            _currency: &str,
        ) -> crate::error::Result<Vec<Lookup>> {
            Ok(vec![Lookup::Found(CoinQuote {
                price: Some(42000.0),
                ..CoinQuote::empty(coin_ids[0].clone())
            })])
        }
    }

    async fn sample_report() -> Report {
        let form = crate::report::PriceForm {
            coins: "bitcoin".to_string(),
            currency: "usd".to_string(),
        };
        let now = chrono::Local
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .unwrap();
        crate::report::get_prices(&form, &OneCoin, now).await
    }

    #[tokio::test]
    async fn plain_panel_is_boxed_and_contains_report() {
        let rendered = render_report_panel(&sample_report().await, false);

        assert!(rendered.contains("Crypto Price Tracker"));
        assert!(rendered.contains("BITCOIN Price Tracker"));
        assert!(rendered.contains("42,000.00 USD"));
        assert!(rendered.contains("Market Cap: N/A USD"));
        assert!(!rendered.contains('\u{1b}'));

        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines.first().unwrap().starts_with('┌'));
        assert!(lines.last().unwrap().starts_with('└'));
    }

    #[tokio::test]
    async fn colored_panel_emits_tag_colours() {
        colored::control::set_override(true);
        let rendered = render_report_panel(&sample_report().await, true);
        colored::control::unset_override();

        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.contains("BITCOIN Price Tracker"));
    }

    #[tokio::test]
    async fn report_lines_follow_newlines() {
        let lines = report_lines(&sample_report().await);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(text[0], "📅 2024-01-02 03:04:05");
        assert_eq!(text[1], "");
        assert_eq!(text[2], "📈 BITCOIN Price Tracker");
        assert_eq!(text.last().unwrap(), "📉 24h Change: N/A");
    }

    #[test]
    fn empty_report_has_no_lines() {
        let lines = report_lines(&Report::default());
        assert!(lines.is_empty());
    }
}
