use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ocr_flow::{
    catalog::{CoinListing, InstrumentCatalog},
    error::CatalogError,
};
use ratatui::widgets::ListState;
use smol_str::SmolStr;

/// Instrument catalog load state.
#[derive(Debug, Clone)]
pub enum CatalogView {
    Loading,
    Ready(InstrumentCatalog),
    Failed(String),
}

/// Request produced by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start(SmolStr),
    Stop,
    Quit,
}

/// Front end state: catalog, search term and coin selection. Session data lives in the
/// published snapshot, never here.
#[derive(Debug)]
pub struct App {
    pub catalog: CatalogView,
    pub search: String,
    pub list_state: ListState,
}

impl Default for App {
    fn default() -> Self {
        Self {
            catalog: CatalogView::Loading,
            search: String::new(),
            list_state: ListState::default(),
        }
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_catalog(&mut self, catalog: Result<InstrumentCatalog, CatalogError>) {
        self.catalog = match catalog {
            Ok(catalog) => CatalogView::Ready(catalog),
            Err(error) => CatalogView::Failed(error.to_string()),
        };
        self.reset_selection();
    }

    pub fn catalog(&self) -> Option<&InstrumentCatalog> {
        match &self.catalog {
            CatalogView::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    /// Coins matching the current search term.
    pub fn filtered(&self) -> Vec<&CoinListing> {
        self.catalog()
            .map(|catalog| catalog.search(&self.search))
            .unwrap_or_default()
    }

    pub fn selected(&self) -> Option<&CoinListing> {
        let index = self.list_state.selected()?;
        self.filtered().into_iter().nth(index)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Esc => Some(Action::Stop),
            KeyCode::Enter => self.start_selected(),
            KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.reset_selection();
                None
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.reset_selection();
                None
            }
            _ => None,
        }
    }

    fn start_selected(&self) -> Option<Action> {
        let catalog = self.catalog()?;
        let coin = &self.selected()?.coin;
        catalog.resolve_trading_symbol(coin).map(Action::Start)
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.filtered().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }

        let current = self.list_state.selected().unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(len - 1);
        self.list_state.select(Some(next));
    }

    fn reset_selection(&mut self) {
        let selected = (!self.filtered().is_empty()).then_some(0);
        self.list_state.select(selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ocr_flow::catalog::Contract;

    fn app() -> App {
        let contract = |symbol: &str, base: &str, quote: &str| {
            Contract::new(symbol.into(), base.into(), quote.into())
        };

        let mut app = App::new();
        app.set_catalog(Ok(InstrumentCatalog::from_contracts(
            vec![
                contract("BTCUSDC", "BTC", "USDC"),
                contract("BTCUSDT", "BTC", "USDT"),
                contract("ETHUSDT", "ETH", "USDT"),
                contract("SOLUSDC", "SOL", "USDC"),
            ],
            "USDT",
        )));
        app
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_starts_preferred_contract() {
        let mut app = app();
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            Some(Action::Start("BTCUSDT".into()))
        );

        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Down));
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            Some(Action::Start("SOLUSDC".into()))
        );
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut app = app();
        app.handle_key(press(KeyCode::Up));
        assert_eq!(app.list_state.selected(), Some(0));

        for _ in 0..10 {
            app.handle_key(press(KeyCode::Down));
        }
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn test_search_filters_and_resets_selection() {
        let mut app = app();
        app.handle_key(press(KeyCode::Down));

        app.handle_key(press(KeyCode::Char('e')));
        assert_eq!(app.search, "e");
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.selected().map(|l| l.coin.as_str()), Some("ETH"));

        app.handle_key(press(KeyCode::Char('x')));
        assert!(app.filtered().is_empty());
        assert_eq!(app.list_state.selected(), None);
        assert_eq!(app.handle_key(press(KeyCode::Enter)), None);

        app.handle_key(press(KeyCode::Backspace));
        app.handle_key(press(KeyCode::Backspace));
        assert_eq!(app.filtered().len(), 3);
    }

    #[test]
    fn test_moving_selection_issues_no_session_command() {
        let mut app = app();
        for code in [KeyCode::Down, KeyCode::Down, KeyCode::Up] {
            assert_eq!(app.handle_key(press(code)), None);
        }

        // Only Enter on the newly selected coin switches the session
        assert_eq!(
            app.handle_key(press(KeyCode::Enter)),
            Some(Action::Start("ETHUSDT".into()))
        );
    }

    #[test]
    fn test_control_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(press(KeyCode::Esc)), Some(Action::Stop));
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        // Plain 'c' is search input
        assert_eq!(app.handle_key(press(KeyCode::Char('c'))), None);
        assert_eq!(app.search, "c");
    }

    #[test]
    fn test_failed_catalog() {
        let mut app = App::new();
        app.set_catalog(Err(CatalogError::Status(418)));

        assert!(matches!(app.catalog, CatalogView::Failed(ref cause) if cause.contains("418")));
        assert_eq!(app.handle_key(press(KeyCode::Enter)), None);
        assert_eq!(app.list_state.selected(), None);
    }
}
