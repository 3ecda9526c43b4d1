use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::cli::state::{App, EditField, Tab};
use crate::cli::util::fmt_money;

pub fn draw(f: &mut Frame, app: &mut App) {
    let area = f.area();

    // Top tabs | main content | bottom status bar
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(area);

    let titles = ["Transactions", "Add", "Summary", "Help"]
        .into_iter()
        .map(|t| Line::from(Span::raw(t)))
        .collect::<Vec<_>>();
    let tabs = Tabs::new(titles)
        .select(match app.tab {
            Tab::Transactions => 0,
            Tab::AddTxn => 1,
            Tab::Summary => 2,
            Tab::Help => 3,
        })
        .block(Block::default().borders(Borders::ALL).title("Nonna"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Transactions => draw_txns(f, root[1], app),
        Tab::AddTxn => draw_add_txn(f, root[1], app),
        Tab::Summary => draw_summary(f, root[1], app),
        Tab::Help => draw_help(f, root[1]),
    }

    f.render_widget(Paragraph::new(app.status.clone()), root[2]);
}

// Transactions page

fn draw_txns(f: &mut Frame, area: Rect, app: &mut App) {
    let header = Row::new(vec!["Date", "Category", "Type", "Description", "Amount"]).height(1);

    let body: Vec<Row> = app
        .txn
        .table
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(t.date.to_string()),
                Cell::from(t.category.name.clone()),
                Cell::from(t.transaction_type.as_str()),
                Cell::from(t.description.clone()),
                Cell::from(fmt_money(&t.amount)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(18),
        Constraint::Length(8),
        Constraint::Percentage(50),
        Constraint::Length(12),
    ];

    let mut tsel = app.txn.tsel.clone();
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(if app.txn.loading {
            "Transactions (loading…)"
        } else {
            "Transactions  (a=add, x=delete, s=summary, r=refresh)"
        }))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(table, area, &mut tsel);
    app.txn.tsel = tsel;
}

// Add page

fn draw_add_txn(f: &mut Frame, area: Rect, app: &mut App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(cols[0]);

    let selected_name = app
        .add
        .cat_sel
        .selected()
        .and_then(|i| app.add.categories.get(i))
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "<none>".into());

    let (m_quick, m_desc, m_amount, m_date) = match app.add.editing {
        Some(EditField::Quick) => ("  <editing, Enter=parse>", "", "", ""),
        Some(EditField::Description) => ("", "  <editing>", "", ""),
        Some(EditField::Amount) => ("", "", "  <editing>", ""),
        Some(EditField::Date) => ("", "", "", "  <editing>"),
        None => ("", "", "", ""),
    };

    let form_lines = vec![
        format!("Quick   : {}{}", app.add.quick, m_quick),
        String::new(),
        format!("Desc    : {}{}", app.add.description, m_desc),
        format!(
            "Amount  : {}{}  [{}]",
            app.add.amount,
            m_amount,
            if app.add.is_expense { "Expense" } else { "Income" }
        ),
        format!("Date    : {}{}", app.add.date, m_date),
        format!("Category: {}", selected_name),
    ]
    .join("\n");

    let form_p = Paragraph::new(form_lines)
        .block(Block::default().borders(Borders::ALL).title("Add Transaction"));
    f.render_widget(form_p, left[0]);

    let help_lines = vec![
        "p: quick line (e.g. \"Starbucks $8.45\", Enter parses)".into(),
        "n/a/d: edit Desc/Amount/Date | t: expense/income".into(),
        "Up/Down: category | s: save | Esc: back".into(),
        String::new(),
        if let Some(err) = &app.add.error {
            format!("Error: {err}")
        } else if let Some(ok) = &app.add.success {
            ok.clone()
        } else {
            String::new()
        },
    ]
    .join("\n");

    let help_p = Paragraph::new(help_lines)
        .block(Block::default().borders(Borders::ALL).title("Help & Status"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_p, left[1]);

    let items: Vec<ListItem> = app
        .add
        .categories
        .iter()
        .map(|c| ListItem::new(Line::from(format!("{}  {}", c.name, c.color))))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Categories"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    f.render_stateful_widget(list, cols[1], &mut app.add.cat_sel);
}

// Summary page

fn draw_summary(f: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    let Some(summary) = &app.summary else {
        let p = Paragraph::new("No data yet - press r to refresh")
            .block(Block::default().borders(Borders::ALL).title("Summary"));
        f.render_widget(p, area);
        return;
    };

    let totals = Paragraph::new(format!(
        "Income  : {}\nExpenses: {}\nNet     : {}",
        fmt_money(&summary.total_income),
        fmt_money(&summary.total_expenses),
        fmt_money(&summary.net_balance),
    ))
    .block(Block::default().borders(Borders::ALL).title("Totals  (r=refresh, b=back)"));
    f.render_widget(totals, rows[0]);

    let header = Row::new(vec!["Category", "Total", "Count", "%"]).height(1);
    let body: Vec<Row> = summary
        .by_category
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.category_name.clone()),
                Cell::from(fmt_money(&c.total)),
                Cell::from(c.count.to_string()),
                Cell::from(format!("{:.1}", c.percentage)),
            ])
        })
        .collect();
    let widths = [
        Constraint::Percentage(40),
        Constraint::Length(14),
        Constraint::Length(8),
        Constraint::Length(8),
    ];
    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Spending by category"));
    f.render_widget(table, rows[1]);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = vec![
        "Global Keys:",
        "  q        : Quit",
        "  ?        : This help tab",
        "",
        "Transactions Tab:",
        "  Up/Down  : Navigate list",
        "  a        : Add new transaction",
        "  x/Del    : Delete selected transaction",
        "  s        : Spending summary",
        "  r        : Refresh list",
        "",
        "Add Tab:",
        "  p        : Edit the quick line, Enter sends it to the parser",
        "  n/a/d    : Edit Description / Amount / Date",
        "  t        : Toggle Expense/Income",
        "  Up/Down  : Select category",
        "  s        : Save transaction",
        "  Esc/b    : Back to the list",
    ]
    .join("\n");

    let p = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}
