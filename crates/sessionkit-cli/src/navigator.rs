use sessionkit_core::{Navigator, Route};

/// Turns guard redirects into hints on stderr.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, route: Route) {
        match route {
            Route::Login => eprintln!("Please sign in: sessionkit login <email>"),
            Route::Home => eprintln!("Signed out."),
            Route::Dashboard => eprintln!("Signed in. Run `sessionkit profile` to view your account."),
        }
    }
}
