use ratatui::style::Color;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity used as the From of replies
    pub sender: String,
    /// Query used when none is given on the command line
    pub default_query: String,
    /// Program that answers searches
    pub notmuch_command: String,
    /// Command the composed message is piped into (default: "msmtp -t")
    pub send_command: String,
    /// Editor for the `e` key; falls back to $EDITOR, then vi
    pub editor: Option<String>,
    /// Log file; defaults to mailwin.log in the config directory
    pub log_file: Option<String>,
    pub theme: ThemeConfig,
}

/// Colours of the terminal desk
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // Base colors
    pub bg_panel: String,
    pub fg: String,
    pub fg_muted: String,
    pub fg_subtle: String,

    // Border colors
    pub border: String,
    pub border_subtle: String,
    pub border_active: String,

    // Accent colors
    pub primary: String,
    pub secondary: String,

    // Semantic colors
    pub success: String,
    pub error: String,

    // UI-specific mappings
    pub selected_bg: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sender: String::new(),
            default_query: "tag:inbox".to_string(),
            notmuch_command: "notmuch".to_string(),
            send_command: "msmtp -t".to_string(),
            editor: None,
            log_file: None,
            theme: ThemeConfig::default(),
        }
    }
}

/// Warm earth tones with gold accents
impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            bg_panel: "#262422".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),
            fg_subtle: "#b8b5b0".to_string(),

            border: "#524f4c".to_string(),
            border_subtle: "#393634".to_string(),
            border_active: "#d4a366".to_string(), // primary

            primary: "#d4a366".to_string(),
            secondary: "#8fa5ae".to_string(), // blue

            success: "#52c41a".to_string(),
            error: "#ff4d4f".to_string(),

            selected_bg: "#393634".to_string(),
            url: "#8fa5ae".to_string(), // secondary (blue)
        }
    }
}

/// `<config dir>/mailwin`
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("mailwin"))
        .unwrap_or_else(|| PathBuf::from(shellexpand::tilde("~/.config/mailwin").into_owned()))
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(&config_dir().join("config.toml"))
    }

    /// Read a config file, falling back to defaults when it is missing or bad
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("Config parse error: {}", e),
                },
                Err(e) => eprintln!("Config read error: {}", e),
            }
        }

        Self::default()
    }

    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
            None => config_dir().join("mailwin.log"),
        }
    }

    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string())
    }
}

impl ThemeConfig {
    pub fn bg_panel(&self) -> Color {
        parse_color(&self.bg_panel)
    }
    pub fn fg(&self) -> Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> Color {
        parse_color(&self.fg_muted)
    }
    pub fn fg_subtle(&self) -> Color {
        parse_color(&self.fg_subtle)
    }
    pub fn border(&self) -> Color {
        parse_color(&self.border)
    }
    pub fn border_subtle(&self) -> Color {
        parse_color(&self.border_subtle)
    }
    pub fn border_active(&self) -> Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> Color {
        parse_color(&self.primary)
    }
    pub fn secondary(&self) -> Color {
        parse_color(&self.secondary)
    }
    pub fn success(&self) -> Color {
        parse_color(&self.success)
    }
    pub fn error(&self) -> Color {
        parse_color(&self.error)
    }
    pub fn selected_bg(&self) -> Color {
        parse_color(&self.selected_bg)
    }
    pub fn url(&self) -> Color {
        parse_color(&self.url)
    }
}

/// Parse color string to ratatui Color
pub fn parse_color(s: &str) -> Color {
    // Try hex first (#RRGGBB)
    if s.starts_with('#')
        && s.len() == 7
        && let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[1..3], 16),
            u8::from_str_radix(&s[3..5], 16),
            u8::from_str_radix(&s[5..7], 16),
        )
    {
        return Color::Rgb(r, g, b);
    }

    // Named colors
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "white" => Color::White,
        _ => Color::White,
    }
}
