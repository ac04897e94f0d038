pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    #[derive(Default)]
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        /// Add a Ctrl+character key press
        pub fn press_ctrl_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key(c));
            self
        }

        /// Add any key press without modifiers
        pub fn press_key(mut self, code: KeyCode) -> Self {
            self.events
                .push(SimulatedEventSource::key_event(code, KeyModifiers::empty()));
            self
        }

        /// Press Enter
        pub fn press_enter(self) -> Self {
            self.press_key(KeyCode::Enter)
        }

        /// Press Tab
        pub fn press_tab(self) -> Self {
            self.press_key(KeyCode::Tab)
        }

        /// Press Esc
        pub fn press_esc(self) -> Self {
            self.press_key(KeyCode::Esc)
        }

        /// Type every character of `text`
        pub fn type_text(mut self, text: &str) -> Self {
            for c in text.chars() {
                self.events.push(SimulatedEventSource::char_key(c));
            }
            self
        }

        /// Press Tab n times
        pub fn tab_times(mut self, times: usize) -> Self {
            for _ in 0..times {
                self = self.press_tab();
            }
            self
        }

        /// Left click at a terminal cell
        pub fn click_at(mut self, column: u16, row: u16) -> Self {
            self.events
                .push(SimulatedEventSource::mouse_click(column, row));
            self
        }

        /// Quit the application (Ctrl+C)
        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::ctrl_char_key('c'));
            self
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            // Trim trailing whitespace from each line
            lines.push(line.trim_end().to_string());
        }

        // Remove trailing empty lines
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn test_scenario_builder() {
        let scenario = TestScenarioBuilder::new()
            .type_text("ab")
            .press_enter()
            .tab_times(2)
            .click_at(3, 4)
            .quit()
            .build();

        assert_eq!(scenario.events.len(), 7);
    }
}
