pub mod charting;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use lernen::{
    clock::Clock,
    controls::LESSON_KEYS,
    lesson::{AnswerState, CourseType, LessonCatalog, LessonSession, StepDefinition},
};

use crate::App;
use charting::{activity_bars, format_label, gauge_ratio, time_shares};

const HORIZONTAL_MARGIN: u16 = 3;

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn help_line(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center)
}

pub fn draw(app: &App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    screen::current_screen(&app.state).render(app, f, chunks[0]);

    if let Some(status) = &app.status {
        let status = Paragraph::new(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ))
        .alignment(Alignment::Center);
        f.render_widget(status, chunks[1]);
    }
}

pub fn render_course_list(app: &App, f: &mut Frame, area: Rect) {
    let stats = app.store.stats();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(area);

    let goal = &stats.daily_goal;
    let summary = Line::from(vec![
        Span::styled("lernen", bold().fg(Color::Magenta)),
        Span::raw(format!(
            "   streak {} d   goal {}/{}   accuracy {}%   words {}",
            stats.day_streak,
            goal.current_points,
            goal.target_points,
            stats.accuracy_percent,
            stats.words_learned
        )),
    ]);
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    let lessons = app.catalog.lessons();
    let mut items = Vec::new();
    let mut selected = None;
    for course in CourseType::ALL {
        let in_course = app.catalog.course(course);
        if in_course.is_empty() {
            continue;
        }
        items.push(ListItem::new(Line::from(Span::styled(
            course.to_string().to_uppercase(),
            bold().fg(Color::Cyan),
        ))));

        for lesson in in_course {
            if lessons.get(app.course_cursor).map(|l| l.id) == Some(lesson.id) {
                selected = Some(items.len());
            }
            let progress = stats.lesson_progress(course, lesson.id);
            let (mark, mark_style) = if stats.is_completed(course, lesson.id) {
                ("✓", Style::default().fg(Color::Green))
            } else {
                (" ", Style::default())
            };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(format!(" {mark} "), mark_style),
                Span::styled(format!("{:<28}", lesson.title), bold()),
                Span::raw(format!("{progress:>4}%  ")),
                Span::styled(
                    format!("{} · {} min", lesson.category, lesson.duration_minutes),
                    dim(),
                ),
            ])));
        }
    }

    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(selected);
    f.render_stateful_widget(list, chunks[1], &mut state);

    if let Some(lesson) = lessons.get(app.course_cursor) {
        f.render_widget(
            Paragraph::new(Span::styled(lesson.description.as_str(), dim()))
                .wrap(Wrap { trim: true }),
            chunks[2],
        );
    }

    f.render_widget(
        help_line("(↑/↓) choose  (enter) open  (s)tats  (q)uit"),
        chunks[3],
    );
}

pub fn render_lesson(app: &App, f: &mut Frame, area: Rect) {
    let Some(session) = app.session.as_ref() else {
        return;
    };
    let lesson = session.lesson();
    let state = session.state();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    let step_no = state.current_step_index + 1;
    let total = lesson.steps.len() as u32;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(format!(" {} ", lesson.title), bold())),
        )
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(gauge_ratio(step_no as u32, total))
        .label(format!("step {step_no}/{total}"));
    f.render_widget(gauge, chunks[0]);

    let body = Paragraph::new(step_lines(session)).wrap(Wrap { trim: false });
    f.render_widget(body, chunks[1]);

    f.render_widget(help_line(LESSON_KEYS), chunks[2]);
}

fn step_lines(session: &LessonSession) -> Vec<Line<'_>> {
    let state = session.state();
    let mut lines = vec![Line::default()];

    match session.current_step() {
        StepDefinition::Intro { title, content } => {
            lines.push(Line::from(Span::styled(title.as_str(), bold())));
            lines.push(Line::default());
            lines.push(Line::from(content.as_str()));
        }
        StepDefinition::Explanation {
            title,
            content,
            examples,
        } => {
            lines.push(Line::from(Span::styled(title.as_str(), bold())));
            lines.push(Line::default());
            lines.push(Line::from(content.as_str()));
            lines.push(Line::default());

            let width = examples.iter().map(|e| e.source.width()).max().unwrap_or(0);
            for example in examples {
                let pad = " ".repeat(width - example.source.width());
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("  {}{pad}", example.source),
                        bold().fg(Color::Cyan),
                    ),
                    Span::styled(format!("   {}", example.target), dim()),
                ]));
            }
        }
        StepDefinition::Practice {
            question,
            options,
            correct_answer,
            hint,
            explanation,
        } => {
            lines.push(Line::from(Span::styled(question.as_str(), bold())));
            lines.push(Line::default());

            for (i, option) in options.iter().enumerate() {
                let chosen = state.selected_answer.as_deref() == Some(option.as_str());
                let style = match state.answer_state {
                    AnswerState::Unanswered if chosen => {
                        bold().add_modifier(Modifier::UNDERLINED)
                    }
                    AnswerState::Unanswered => Style::default(),
                    _ if option == correct_answer => bold().fg(Color::Green),
                    AnswerState::Incorrect if chosen => bold().fg(Color::Red),
                    _ => dim(),
                };
                lines.push(Line::from(Span::styled(
                    format!("  {}. {option}", i + 1),
                    style,
                )));
            }
            lines.push(Line::default());

            if !session.current_step_answerable() {
                lines.push(Line::from(Span::styled(
                    "This question cannot be answered: its correct answer is missing.",
                    bold().fg(Color::Red),
                )));
            }

            match state.answer_state {
                AnswerState::Correct => {
                    lines.push(Line::from(Span::styled("Richtig!", bold().fg(Color::Green))));
                }
                AnswerState::Incorrect => {
                    lines.push(Line::from(Span::styled(
                        format!("Not quite. The answer is \"{correct_answer}\"."),
                        bold().fg(Color::Red),
                    )));
                }
                AnswerState::Unanswered => {}
            }
            if state.answer_state != AnswerState::Unanswered && !explanation.is_empty() {
                lines.push(Line::from(explanation.as_str()));
            }
            if state.hint_visible && state.answer_state != AnswerState::Correct && !hint.is_empty()
            {
                lines.push(Line::from(Span::styled(
                    format!("Hint: {hint}"),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }
        StepDefinition::Completion {
            title,
            content,
            summary,
        } => {
            lines.push(Line::from(Span::styled(
                title.as_str(),
                bold().fg(Color::Green),
            )));
            lines.push(Line::default());
            lines.push(Line::from(content.as_str()));
            lines.push(Line::default());
            for point in summary {
                lines.push(Line::from(format!("  • {point}")));
            }
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(
                format!(
                    "{}/{} answered correctly. Press enter to finish.",
                    state.correct_answer_count, state.total_practice_step_count
                ),
                dim(),
            )));
        }
    }

    lines
}

pub fn render_not_found(lesson_id: u32, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let text = vec![
        Line::from(Span::styled(
            format!("Lesson {lesson_id} not found"),
            bold().fg(Color::Red),
        )),
        Line::default(),
        Line::from(Span::styled("(enter) back to the course list", dim())),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center),
        chunks[1],
    );
}

pub fn render_stats(app: &App, f: &mut Frame, area: Rect) {
    let stats = app.store.stats();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    let figures = [
        ("Lessons completed", stats.lessons_completed.to_string()),
        ("Words learned", stats.words_learned.to_string()),
        ("Accuracy", format!("{}%", stats.accuracy_percent)),
        ("Day streak", stats.day_streak.to_string()),
        ("Time spent", format!("{} h", format_label(stats.total_hours()))),
        ("Points earned", stats.points_earned.to_string()),
    ];
    let figure_lines: Vec<Line> = figures
        .into_iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{name:<18}"), dim()),
                Span::styled(value, bold()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(figure_lines).block(Block::default().borders(Borders::ALL).title(" Overview ")),
        top[0],
    );

    let share_lines: Vec<Line> = time_shares(stats)
        .into_iter()
        .map(|(category, minutes, share)| {
            Line::from(vec![
                Span::styled(format!("{:<12}", category.to_string()), dim()),
                Span::raw(format!("{minutes:>4} min {share:>4}%  ")),
                Span::styled(
                    format!("vocab {}%", stats.vocabulary_in(category)),
                    dim(),
                ),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(share_lines)
            .block(Block::default().borders(Borders::ALL).title(" Time by category ")),
        top[1],
    );

    let goal = &stats.daily_goal;
    let goal_label = if goal.is_reached() {
        format!("{}/{} points, goal reached", goal.current_points, goal.target_points)
    } else {
        format!(
            "{}/{} points, {} to go",
            goal.current_points,
            goal.target_points,
            goal.remaining()
        )
    };
    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Daily goal "))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(gauge_ratio(goal.current_points, goal.target_points))
            .label(goal_label),
        rows[1],
    );

    let bars = activity_bars(&stats.activity, app.store.clock().today());
    let data: Vec<(&str, u64)> = bars.iter().map(|(d, p)| (d.as_str(), *p)).collect();
    f.render_widget(
        BarChart::default()
            .block(Block::default().borders(Borders::ALL).title(" Last 7 days "))
            .data(data.as_slice())
            .bar_width(5)
            .bar_gap(2)
            .bar_style(Style::default().fg(Color::Magenta))
            .value_style(bold().fg(Color::Black).bg(Color::Magenta)),
        rows[2],
    );

    f.render_widget(help_line("(b)ack"), rows[3]);
}
