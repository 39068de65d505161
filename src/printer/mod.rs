//! Printers: JSON results on stdout, colored failures on stderr.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;

pub struct JsonPrinter {
    pub pretty: bool,
}

impl JsonPrinter {
    pub fn render<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }

    pub fn print<T: Serialize + ?Sized>(&self, value: &T) -> serde_json::Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }
}

pub struct ErrorPrinter {
    color: bool,
}

impl Default for ErrorPrinter {
    fn default() -> Self {
        Self { color: std::io::stderr().is_terminal() }
    }
}

impl ErrorPrinter {
    pub fn print(&self, label: &str, message: &str) {
        if self.color {
            eprintln!("{}: {}", label.red().bold(), message.red());
        } else {
            eprintln!("{}: {}", label, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compact_and_pretty() -> serde_json::Result<()> {
        let value = json!({"a": [1, true]});
        assert_eq!(JsonPrinter { pretty: false }.render(&value)?, r#"{"a":[1,true]}"#);
        assert!(JsonPrinter { pretty: true }.render(&value)?.contains("\n  \"a\": [\n"));
        Ok(())
    }
}
