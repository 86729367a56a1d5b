//! Terminal implementations of the notification and navigation seams

use portal_client::{Navigator, Notice, NoticeLevel, Notifier};

/// Prints notices the way the browser client would toast them
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("✅ {}", notice.message),
            NoticeLevel::Info => println!("ℹ️  {}", notice.message),
            NoticeLevel::Warning => eprintln!("⚠️  {}", notice.message),
            NoticeLevel::Error => eprintln!("❌ {}", notice.message),
        }
    }
}

/// There is no view to switch in a terminal; the requested route is shown
/// instead
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, path: &str) {
        println!("🧭 -> {}", path);
    }
}
