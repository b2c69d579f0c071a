use bridge::alert::{Alert, AlertHistory, AlertSurface};
use colored::*;
use std::sync::Arc;

/// Prints each alert to stdout. Optionally records it for scenario checks.
#[derive(Default)]
pub struct TerminalSurface {
    history: Option<Arc<AlertHistory>>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording(history: Arc<AlertHistory>) -> Self {
        Self {
            history: Some(history),
        }
    }
}

impl AlertSurface for TerminalSurface {
    fn show(&self, alert: Alert) {
        println!("{}", render(&alert));

        if let Some(history) = &self.history {
            history.show(alert);
        }
    }
}

/// One-line-per-field rendering of an alert.
pub fn render(alert: &Alert) -> String {
    format!(
        "\n{} {}\n   {}\n   [{}] ({}s)",
        "🔔".yellow(),
        alert.title.bold(),
        alert.description.dimmed(),
        alert.action.label().cyan(),
        alert.duration.as_secs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge::NotificationEvent;

    #[test]
    fn render_contains_title_body_and_action() {
        colored::control::set_override(false);
        let alert = Alert::for_event(&NotificationEvent::new("Invoice due", "Client X"));

        let rendered = render(&alert);

        assert!(rendered.contains("Invoice due"));
        assert!(rendered.contains("Client X"));
        assert!(rendered.contains("[View]"));
    }

    #[test]
    fn recording_surface_forwards_to_history() {
        let history = Arc::new(AlertHistory::new());
        let surface = TerminalSurface::recording(history.clone());

        surface.show(Alert::for_event(&NotificationEvent::new("T1", "B1")));

        assert_eq!(history.len(), 1);
    }
}
