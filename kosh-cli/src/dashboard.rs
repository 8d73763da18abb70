use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kosh_finance::cibil::{CibilAnalysisRecord, MAX_SCORE, MIN_SCORE, ScoreBand};
use kosh_finance::summary::{FinancialSummary, Insight};
use kosh_finance::{TaxResult, format_inr};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{BarChart, Block, Borders, Gauge, Paragraph, Wrap},
};
use std::io::{self, Stdout};

/// Everything the dashboard shows, computed before the terminal is taken over
pub struct DashboardData {
    pub tax: TaxResult,
    pub cibil: CibilAnalysisRecord,
    pub summary: FinancialSummary,
    pub insights: Vec<Insight>,
}

pub fn run_dashboard(data: &DashboardData) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = dashboard_loop(&mut terminal, data);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn dashboard_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, data: &DashboardData) -> Result<()> {
    let mut show_insights = true;
    loop {
        terminal.draw(|f| draw(f, data, show_insights))?;

        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('i') => show_insights = !show_insights,
                _ => {}
            }
        }
    }
    Ok(())
}

fn draw(f: &mut Frame, data: &DashboardData, show_insights: bool) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Min(8),
            Constraint::Length(if show_insights { 6 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Kosh",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {} to {}  |  FY {}",
            data.summary.start, data.summary.end, data.tax.financial_year
        )),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, rows[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    draw_tax(f, middle[0], &data.tax);
    draw_cibil(f, middle[1], &data.cibil);

    draw_categories(f, rows[2], &data.summary);

    if show_insights {
        let lines: Vec<Line> = if data.insights.is_empty() {
            vec![Line::raw("Nothing needs attention.")]
        } else {
            data.insights
                .iter()
                .map(|i| {
                    Line::from(vec![
                        Span::styled(format!("{}: ", i.title), Style::default().fg(Color::Cyan)),
                        Span::raw(i.message.clone()),
                    ])
                })
                .collect()
        };
        let insights = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("insights"))
            .wrap(Wrap { trim: true });
        f.render_widget(insights, rows[3]);
    }

    let help = Paragraph::new(Span::styled(
        "q=quit  i=toggle insights",
        Style::default().fg(Color::Gray),
    ));
    f.render_widget(help, rows[4]);
}

fn draw_tax(f: &mut Frame, area: Rect, tax: &TaxResult) {
    let old = &tax.breakdown.old_regime;
    let new = &tax.breakdown.new_regime;
    let pick = |regime: kosh_finance::Regime| {
        if regime == tax.recommended_regime {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    };
    let lines = vec![
        Line::raw(format!("Gross income      {}", format_inr(tax.gross_income))),
        Line::raw(format!("Deductions        {}", format_inr(tax.total_deductions))),
        Line::raw(""),
        Line::styled(
            format!(
                "Old regime  {:>12}  (taxable {})",
                format_inr(old.total_tax),
                format_inr(old.taxable_income)
            ),
            pick(old.regime),
        ),
        Line::styled(
            format!(
                "New regime  {:>12}  (taxable {})",
                format_inr(new.total_tax),
                format_inr(new.taxable_income)
            ),
            pick(new.regime),
        ),
        Line::raw(""),
        Line::raw(format!(
            "Choose {} regime, save {}",
            tax.recommended_regime.as_str(),
            format_inr(tax.potential_savings)
        )),
    ];
    let block = Block::default().borders(Borders::ALL).title("income tax");
    f.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn band_color(band: ScoreBand) -> Color {
    match band {
        ScoreBand::Excellent => Color::Green,
        ScoreBand::Good => Color::LightGreen,
        ScoreBand::Fair => Color::Yellow,
        ScoreBand::Poor => Color::LightRed,
        ScoreBand::Bad => Color::Red,
    }
}

fn draw_cibil(f: &mut Frame, area: Rect, cibil: &CibilAnalysisRecord) {
    let block = Block::default().borders(Borders::ALL).title("cibil estimate");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(inner);

    let span = (MAX_SCORE - MIN_SCORE) as f64;
    let ratio = (cibil.predicted_score.saturating_sub(MIN_SCORE) as f64 / span).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(band_color(cibil.score_band)))
        .ratio(ratio)
        .label(format!("{} ({:?})", cibil.predicted_score, cibil.score_band));
    f.render_widget(gauge, parts[0]);

    let mut lines: Vec<Line> = cibil
        .improvement_factors
        .iter()
        .take(3)
        .map(|i| Line::raw(format!("{}: {} (+{})", i.label, i.current_grade, i.improvement_potential)))
        .collect();
    if let Some(last) = cibil.improvement_timeline.last() {
        lines.push(Line::raw(format!(
            "Projected {} in {} months",
            last.projected_score, last.month
        )));
    }
    f.render_widget(Paragraph::new(Text::from(lines)), parts[1]);
}

fn draw_categories(f: &mut Frame, area: Rect, summary: &FinancialSummary) {
    let mut totals: Vec<(&str, u64)> = summary
        .category_breakdown
        .iter()
        .map(|(c, amount)| (c.as_str(), amount.max(0.0).round() as u64))
        .collect();
    totals.sort_by(|a, b| b.1.cmp(&a.1));
    totals.truncate(8);

    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title("spending by category"))
        .data(totals.as_slice())
        .bar_width(12)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Magenta))
        .value_style(Style::default().fg(Color::Black).bg(Color::Magenta));
    f.render_widget(chart, area);
}
