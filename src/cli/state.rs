use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::{ListState, TableState};

use crate::cli::api::Client;
use crate::cli::util;
use crate::database::db::analytics::AnalyticsSummary;
use crate::database::models::{Category, NewTransaction, Transaction, TransactionType};
use crate::parser::ParsedTransaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Transactions,
    AddTxn,
    Summary,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Quick,
    Description,
    Amount,
    Date,
}

#[derive(Default)]
pub struct TxnPage {
    pub table: Vec<Transaction>,
    pub tsel: TableState,
    pub loading: bool,
}

#[derive(Default)]
pub struct AddTxnForm {
    /// Free-text line sent to /api/parse; a successful parse pre-fills
    /// the other fields.
    pub quick: String,
    pub date: String,
    pub description: String,
    pub amount: String,
    pub is_expense: bool,
    pub categories: Vec<Category>,
    pub cat_sel: ListState,
    pub editing: Option<EditField>,
    pub error: Option<String>,
    pub success: Option<String>,
}

pub struct App {
    pub api: Client,
    pub tab: Tab,
    pub status: String,
    pub quit: bool,
    pub txn: TxnPage,
    pub add: AddTxnForm,
    pub summary: Option<AnalyticsSummary>,
}

impl App {
    pub fn new(api: Client) -> Self {
        let mut add = AddTxnForm::default();
        add.date = util::iso(&util::today());
        add.is_expense = true;

        Self {
            api,
            tab: Tab::Transactions,
            status: "Press ? for help | q to quit".into(),
            quit: false,
            txn: TxnPage::default(),
            add,
            summary: None,
        }
    }

    pub async fn refresh_txns(&mut self) -> anyhow::Result<()> {
        self.txn.loading = true;
        let rows = self.api.list_transactions().await?;
        self.txn.table = rows;
        if self.txn.tsel.selected().is_none() && !self.txn.table.is_empty() {
            self.txn.tsel.select(Some(0));
        }
        self.txn.loading = false;
        Ok(())
    }

    pub async fn refresh_summary(&mut self) {
        match self.api.summary().await {
            Ok(s) => self.summary = Some(s),
            Err(e) => self.status = format!("Summary failed: {e}"),
        }
    }

    pub async fn load_categories(&mut self) {
        if self.add.categories.is_empty() {
            if let Ok(list) = self.api.list_categories().await {
                self.add.categories = list;
            }
        }
        if self.add.cat_sel.selected().is_none() && !self.add.categories.is_empty() {
            self.add.cat_sel.select(Some(0));
        }
    }

    fn current_txn_id(&self) -> Option<i64> {
        let idx = self.txn.tsel.selected()?;
        self.txn.table.get(idx).map(|t| t.id)
    }

    fn move_txn(&mut self, delta: isize) {
        let n = self.txn.table.len();
        if n == 0 {
            self.txn.tsel.select(None);
            return;
        }
        let cur = self.txn.tsel.selected().unwrap_or(0) as isize;
        let next = (cur + delta).rem_euclid(n as isize) as usize;
        self.txn.tsel.select(Some(next));
    }

    pub fn move_cat(&mut self, delta: i32) {
        let len = self.add.categories.len();
        if len == 0 {
            self.add.cat_sel.select(None);
            return;
        }
        let cur = self.add.cat_sel.selected().unwrap_or(0) as i32;
        let new = (cur + delta).rem_euclid(len as i32) as usize;
        self.add.cat_sel.select(Some(new));
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }

        if self.tab == Tab::AddTxn && self.add.editing.is_some() {
            self.handle_add_input(k).await;
            return Ok(());
        }

        if k.code == KeyCode::Char('q') {
            self.quit = true;
            return Ok(());
        }

        match self.tab {
            Tab::Transactions => match k.code {
                KeyCode::Up => self.move_txn(-1),
                KeyCode::Down => self.move_txn(1),
                KeyCode::Char('a') => {
                    self.tab = Tab::AddTxn;
                    self.add.error = None;
                    self.add.success = None;
                    self.load_categories().await;
                }
                KeyCode::Char('s') => {
                    self.tab = Tab::Summary;
                    self.refresh_summary().await;
                }
                KeyCode::Char('r') => {
                    if let Err(e) = self.refresh_txns().await {
                        self.status = format!("Refresh failed: {e}");
                    }
                }
                KeyCode::Char('x') | KeyCode::Delete => {
                    if let Some(id) = self.current_txn_id() {
                        if let Err(e) = self.api.delete_transaction(id).await {
                            self.status = format!("Delete failed: {e}");
                        } else {
                            self.refresh_txns().await.ok();
                            self.status = "Deleted.".into();
                        }
                    }
                }
                KeyCode::Char('?') => self.tab = Tab::Help,
                _ => {}
            },
            Tab::AddTxn => match k.code {
                KeyCode::Up => self.move_cat(-1),
                KeyCode::Down => self.move_cat(1),
                KeyCode::Esc | KeyCode::Char('b') => {
                    self.tab = Tab::Transactions;
                    self.add.error = None;
                }
                KeyCode::Char('t') => self.add.is_expense = !self.add.is_expense,
                KeyCode::Char('p') => self.add.editing = Some(EditField::Quick),
                KeyCode::Char('n') => self.add.editing = Some(EditField::Description),
                KeyCode::Char('a') => self.add.editing = Some(EditField::Amount),
                KeyCode::Char('d') => self.add.editing = Some(EditField::Date),
                KeyCode::Char('s') => self.submit_txn().await,
                KeyCode::Char('?') => self.tab = Tab::Help,
                _ => {}
            },
            Tab::Summary => match k.code {
                KeyCode::Char('r') => self.refresh_summary().await,
                KeyCode::Esc | KeyCode::Char('b') => self.tab = Tab::Transactions,
                KeyCode::Char('?') => self.tab = Tab::Help,
                _ => {}
            },
            Tab::Help => match k.code {
                KeyCode::Esc | KeyCode::Char('b') => self.tab = Tab::Transactions,
                _ => {}
            },
        }
        Ok(())
    }

    async fn handle_add_input(&mut self, k: KeyEvent) {
        let Some(field) = self.add.editing else { return };
        match k.code {
            KeyCode::Char(c) => {
                let s = self.field_mut(field);
                s.push(c);
            }
            KeyCode::Backspace => {
                let s = self.field_mut(field);
                s.pop();
            }
            KeyCode::Enter => {
                if field == EditField::Quick {
                    self.parse_quick().await;
                }
                self.add.editing = None;
            }
            KeyCode::Esc => self.add.editing = None,
            KeyCode::Tab => self.add.editing = Some(next_field(field)),
            _ => {}
        }
    }

    fn field_mut(&mut self, field: EditField) -> &mut String {
        match field {
            EditField::Quick => &mut self.add.quick,
            EditField::Description => &mut self.add.description,
            EditField::Amount => &mut self.add.amount,
            EditField::Date => &mut self.add.date,
        }
    }

    /// Send the quick line through /api/parse and pre-fill the form.
    async fn parse_quick(&mut self) {
        let text = self.add.quick.trim().to_string();
        if text.is_empty() {
            return;
        }
        match self.api.parse_text(&text).await {
            Ok(reply) if reply.success => {
                if let Some(parsed) = reply.data {
                    self.apply_parsed(parsed);
                    self.add.error = None;
                    self.add.success = Some("Parsed - check the fields and save".into());
                }
            }
            Ok(reply) => {
                self.add.success = None;
                self.add.error =
                    Some(reply.error.unwrap_or_else(|| "could not parse that".into()));
            }
            Err(e) => {
                self.add.success = None;
                self.add.error = Some(format!("Parse failed: {e}"));
            }
        }
    }

    fn apply_parsed(&mut self, parsed: ParsedTransaction) {
        self.add.amount = parsed.amount.to_string();
        self.add.description = parsed.description;
        self.add.is_expense = parsed.transaction_type == TransactionType::Expense;
        if let Some(i) = self
            .add
            .categories
            .iter()
            .position(|c| c.name == parsed.category)
        {
            self.add.cat_sel.select(Some(i));
        }
    }

    pub async fn submit_txn(&mut self) {
        let Some(category_id) = self
            .add
            .cat_sel
            .selected()
            .and_then(|i| self.add.categories.get(i))
            .map(|c| c.id)
        else {
            self.add.error = Some("Category is required".into());
            return;
        };

        let Some(amount) = util::parse_money(&self.add.amount) else {
            self.add.error = Some("Invalid amount format".into());
            return;
        };

        let date = if self.add.date.trim().is_empty() {
            util::today()
        } else {
            match self.add.date.trim().parse() {
                Ok(d) => d,
                Err(_) => {
                    self.add.error = Some("Format: YYYY-MM-DD".into());
                    return;
                }
            }
        };

        let req = NewTransaction {
            amount,
            description: self.add.description.trim().to_string(),
            transaction_type: if self.add.is_expense {
                TransactionType::Expense
            } else {
                TransactionType::Income
            },
            category_id,
            date,
        };

        // Validation proper (amount > 0 etc.) happens server-side.
        match self.api.create_transaction(&req).await {
            Ok(_) => {
                self.add.success = Some("Saved".into());
                self.add.error = None;
                self.add.quick.clear();
                self.add.amount.clear();
                self.add.description.clear();
                self.refresh_txns().await.ok();
            }
            Err(e) => {
                self.add.error = Some(format!("Save failed: {e}"));
                self.add.success = None;
            }
        }
    }
}

fn next_field(f: EditField) -> EditField {
    use EditField::*;
    match f {
        Quick => Description,
        Description => Amount,
        Amount => Date,
        Date => Quick,
    }
}
