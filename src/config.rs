//! CLI flags + TOML configuration (spec.md §6.2/§6.3).
//!
//! `CliArgs` mirrors skim's `options.rs` dual-purpose struct shape
//! (`#[derive(Builder)]` for programmatic construction, `clap::Parser`
//! behind the `cli` feature for argument parsing, one `build()` finalizer).
//! `FileConfig` is the `serde`/`toml` counterpart, grounded on the `worf`
//! example's `load_config` (`other_examples/f243c952_alexmohr-worf__worf-src-lib-config.rs.rs`):
//! read the file, `toml::from_str` it, then let CLI flags win over it field
//! by field, the same "args override config" rule skim expresses with
//! `args_override_self`.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::Deserialize;

use crate::alphabet::Alphabet;
use crate::engine::EngineConfig;
use crate::error::{ConfigError, TomlErrorShim};
use crate::table::TableConfig;
use crate::view::fullscreen::{ColorScheme, FullscreenConfig, Position};
use crate::view::list::ListConfig;
use crate::{Color, ExclusionKind, ExclusionRule, Style};

/// Where the hint label is painted, as accepted on the command line.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionArg {
    /// Overlay the first columns of the match
    Left,
    /// Overlay the last columns of the match
    Right,
    /// Paint just before the match
    OffLeft,
    /// Paint just after the match
    OffRight,
}

impl From<PositionArg> for Position {
    fn from(p: PositionArg) -> Self {
        match p {
            PositionArg::Left => Position::Left,
            PositionArg::Right => Position::Right,
            PositionArg::OffLeft => Position::OffLeft,
            PositionArg::OffRight => Position::OffRight,
        }
    }
}

fn parse_position(name: &str) -> Option<Position> {
    match name {
        "left" => Some(Position::Left),
        "right" => Some(Position::Right),
        "off_left" => Some(Position::OffLeft),
        "off_right" => Some(Position::OffRight),
        _ => None,
    }
}

/// Command-line flags (spec.md §6.2).
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(name = "final_build"))]
#[builder(default)]
#[cfg_attr(feature = "cli", derive(clap::Parser))]
#[cfg_attr(feature = "cli", command(name = "magonote", version, about))]
pub struct CliArgs {
    /// Seed alphabet name (`qwerty`, `abcd`, `dvorak`, ...) or a literal
    /// string of distinct letters
    #[cfg_attr(feature = "cli", arg(long))]
    pub alphabet: Option<String>,

    /// Output format for a chosen match: `%H` is its text, `%U` is
    /// `true`/`false` for the uppercase-hint flag
    #[cfg_attr(feature = "cli", arg(long))]
    pub format: Option<String>,

    /// Where to paint the hint label relative to its match
    #[cfg_attr(feature = "cli", arg(long, value_enum))]
    pub position: Option<PositionArg>,

    /// An extra custom regex pattern to match against, in addition to the
    /// built-in battery (repeatable)
    #[cfg_attr(feature = "cli", arg(long = "regexp"))]
    pub regexp: Vec<String>,

    /// Foreground color for an unselected match
    #[cfg_attr(feature = "cli", arg(long = "fg-color"))]
    pub fg_color: Option<String>,
    /// Background color for an unselected match
    #[cfg_attr(feature = "cli", arg(long = "bg-color"))]
    pub bg_color: Option<String>,
    /// Foreground color for a hint label
    #[cfg_attr(feature = "cli", arg(long = "hint-fg-color"))]
    pub hint_fg_color: Option<String>,
    /// Background color for a hint label
    #[cfg_attr(feature = "cli", arg(long = "hint-bg-color"))]
    pub hint_bg_color: Option<String>,
    /// Foreground color for an already-chosen match, in multi-select mode
    #[cfg_attr(feature = "cli", arg(long = "multi-fg-color"))]
    pub multi_fg_color: Option<String>,
    /// Background color for an already-chosen match, in multi-select mode
    #[cfg_attr(feature = "cli", arg(long = "multi-bg-color"))]
    pub multi_bg_color: Option<String>,
    /// Foreground color for the match under the cursor
    #[cfg_attr(feature = "cli", arg(long = "select-fg-color"))]
    pub select_fg_color: Option<String>,
    /// Background color for the match under the cursor
    #[cfg_attr(feature = "cli", arg(long = "select-bg-color"))]
    pub select_bg_color: Option<String>,

    /// Allow choosing more than one match before exiting
    #[cfg_attr(feature = "cli", arg(long))]
    pub multi: bool,

    /// Reverse the output order of chosen matches
    #[cfg_attr(feature = "cli", arg(long))]
    pub reverse: bool,

    /// `-u` dedupes equal-text matches to a single shared hint, `-uu` also
    /// spaces out representatives by `min_spacing` lines
    #[cfg_attr(feature = "cli", arg(short = 'u', long = "unique", action = clap::ArgAction::Count))]
    pub unique: u8,

    /// Wrap hint labels in `[` `]` for contrast against colored matches
    #[cfg_attr(feature = "cli", arg(long))]
    pub contrast: bool,

    /// A zsh-style PS1 template used to filter out shell-prompt regions;
    /// defaults to the `PS1` environment variable when unset
    #[cfg_attr(feature = "cli", arg(long))]
    pub ps1: Option<String>,

    /// Write the selection here instead of stdout
    #[cfg_attr(feature = "cli", arg(long))]
    pub target: Option<PathBuf>,

    /// Read captured terminal output from this file instead of stdin
    #[cfg_attr(feature = "cli", arg(long = "input-file"))]
    pub input_file: Option<PathBuf>,

    /// Use the fuzzy-filtered list view instead of the full-screen overlay
    #[cfg_attr(feature = "cli", arg(long))]
    pub list: bool,

    /// Path to a TOML config file, or the literal `NONE` to load no file
    /// at all and use built-in defaults
    #[cfg_attr(feature = "cli", arg(long))]
    pub config: Option<String>,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            alphabet: None,
            format: None,
            position: None,
            regexp: Vec::new(),
            fg_color: None,
            bg_color: None,
            hint_fg_color: None,
            hint_bg_color: None,
            multi_fg_color: None,
            multi_bg_color: None,
            select_fg_color: None,
            select_bg_color: None,
            multi: false,
            reverse: false,
            unique: 0,
            contrast: false,
            ps1: None,
            target: None,
            input_file: None,
            list: false,
            config: None,
        }
    }
}

impl CliArgsBuilder {
    /// Builds the `CliArgs` from the builder.
    pub fn build(&mut self) -> Result<CliArgs, CliArgsBuilderError> {
        self.final_build()
    }
}

/// Parsed contents of a TOML config file (spec.md §6.3), defaults applied
/// per missing section/field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// `[core]`
    pub core: CoreSection,
    /// `[regexp]`
    pub regexp: RegexpSection,
    /// `[colors]`
    pub colors: ColorsSection,
    /// `[plugins.*]`
    pub plugins: PluginsSection,
    /// Top-level `[[rules]]`, the alternate spelling of
    /// `plugins.exclusion.rules` some deployed configs use instead.
    pub rules: Vec<RuleToml>,
}

/// `[core]` (spec.md §6.3).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreSection {
    /// Seed alphabet name
    pub alphabet: String,
    /// `%H`/`%U` output format
    pub format: String,
    /// `left | right | off_left | off_right`
    pub position: String,
    /// Allow choosing more than one match
    pub multi: bool,
    /// Reverse the output order of chosen matches
    pub reverse: bool,
    /// 0 = plain, 1 = hints-unique, 2 = super-unique
    pub unique_level: u8,
    /// Wrap hint labels in brackets
    pub contrast: bool,
}

impl Default for CoreSection {
    fn default() -> Self {
        Self {
            alphabet: "qwerty".to_string(),
            format: "%H".to_string(),
            position: "left".to_string(),
            multi: false,
            reverse: false,
            unique_level: 0,
            contrast: false,
        }
    }
}

/// `[regexp]` (spec.md §6.3).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegexpSection {
    /// Custom patterns added to the built-in battery
    pub patterns: Vec<String>,
}

/// One `foreground`/`background` pair under `[colors]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorPair {
    /// Foreground color spec (named or `#RRGGBB`)
    pub foreground: String,
    /// Background color spec
    pub background: String,
}

/// `[colors]` (spec.md §6.3): four groups, each `foreground`/`background`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorsSection {
    /// An unselected match's own text
    #[serde(rename = "match")]
    pub match_colors: ColorPair,
    /// A hint label overlay
    pub hint: ColorPair,
    /// A match already chosen, in multi-select mode
    pub multi: ColorPair,
    /// The match under the cursor
    pub select: ColorPair,
}

impl Default for ColorsSection {
    fn default() -> Self {
        Self {
            match_colors: ColorPair { foreground: "green".to_string(), background: "black".to_string() },
            hint: ColorPair { foreground: "yellow".to_string(), background: "black".to_string() },
            multi: ColorPair { foreground: "yellow".to_string(), background: "black".to_string() },
            select: ColorPair { foreground: "blue".to_string(), background: "black".to_string() },
        }
    }
}

/// `[plugins.*]` (spec.md §6.3).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PluginsSection {
    /// `[plugins.tabledetection]`
    pub tabledetection: TableDetectionSection,
    /// `[plugins.colordetection]`
    pub colordetection: ColorDetectionSection,
    /// `[plugins.exclusion]`, the section-form spelling of `[[rules]]`
    pub exclusion: ExclusionSection,
}

/// `[plugins.tabledetection]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TableDetectionSection {
    /// Whether the table detector runs at all
    pub enabled: bool,
    /// See [`TableConfig::min_lines`]
    pub min_lines: usize,
    /// See [`TableConfig::min_columns`]
    pub min_columns: usize,
    /// See [`TableConfig::confidence_threshold`]
    pub confidence_threshold: f64,
}

impl Default for TableDetectionSection {
    fn default() -> Self {
        let d = TableConfig::default();
        Self { enabled: false, min_lines: d.min_lines, min_columns: d.min_columns, confidence_threshold: d.confidence_threshold }
    }
}

/// `[plugins.colordetection]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorDetectionSection {
    /// Whether style-derived matches are produced
    pub enabled: bool,
}

/// `[plugins.exclusion]`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExclusionSection {
    /// Exclusion rules, same shape as top-level `[[rules]]`
    pub rules: Vec<RuleToml>,
}

/// One `{type, pattern}` exclusion rule entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleToml {
    /// `"regex"` or `"text"`
    #[serde(rename = "type")]
    pub kind: String,
    /// The pattern text
    pub pattern: String,
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg).join("magonote/config.toml"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".config/magonote/config.toml"))
}

impl FileConfig {
    /// Loads config per spec.md §6.2 `--config`:
    ///
    /// - `Some("NONE")` skips loading entirely and returns the built-in defaults.
    /// - `Some(path)` loads exactly that file; a missing or malformed file is fatal.
    /// - `None` tries [`default_config_path`] and silently falls back to defaults
    ///   if nothing is there.
    pub fn load(config_flag: Option<&str>) -> Result<Self, ConfigError> {
        let explicit = !matches!(config_flag, None);
        let path = match config_flag {
            Some("NONE") => return Ok(Self::default()),
            Some(p) => Some(PathBuf::from(p)),
            None => default_config_path(),
        };
        let Some(path) = path else { return Ok(Self::default()) };
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Toml(TomlErrorShim(format!("{}: {e}", path.display()))))?;
        toml::from_str(&text).map_err(|e| ConfigError::Toml(TomlErrorShim(e.to_string())))
    }
}

fn rule_from_toml(rule: &RuleToml) -> ExclusionRule {
    let kind = if rule.kind.eq_ignore_ascii_case("text") { ExclusionKind::Text } else { ExclusionKind::Regex };
    ExclusionRule { kind, pattern: rule.pattern.clone() }
}

fn exclusion_rules(file: &FileConfig) -> Vec<ExclusionRule> {
    file.rules.iter().chain(file.plugins.exclusion.rules.iter()).map(rule_from_toml).collect()
}

fn style_from_pair(pair: &ColorPair) -> Result<Style, ConfigError> {
    Ok(Style { fg: Some(Color::parse(&pair.foreground)?), bg: Some(Color::parse(&pair.background)?), ..Style::default() })
}

/// Fully resolved settings for one invocation: [`CliArgs`] layered over
/// [`FileConfig`], CLI always winning (spec.md §6.3: "CLI flags override
/// file config values").
pub struct Settings {
    /// Engine configuration (battery filters, exclusions, alphabet, spacing)
    pub engine: EngineConfig,
    /// Full-screen view configuration
    pub fullscreen: FullscreenConfig,
    /// List view configuration
    pub list: ListConfig,
    /// `%H`/`%U` output format string
    pub format: String,
    /// Allow choosing more than one match
    pub multi: bool,
    /// Reverse the output order of chosen matches
    pub reverse: bool,
    /// 0, 1 or 2, passed to `MatchEngine::matches`
    pub unique_level: u8,
    /// Use the list view instead of the full-screen view
    pub list_view: bool,
    /// Write the selection here instead of stdout
    pub target: Option<PathBuf>,
    /// Read captured terminal output from this file instead of stdin
    pub input_file: Option<PathBuf>,
}

impl Settings {
    /// Resolves a [`Settings`] from parsed CLI flags and a loaded file config.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the resolved alphabet name is unknown,
    /// a color spec is malformed, or a `--regexp`/`[regexp].patterns` entry
    /// fails to compile (wrapped via [`crate::error::PatternCompileError`]
    /// is not applicable here: that error type is surfaced separately by
    /// the caller, since `add_custom_pattern` returns it directly).
    pub fn resolve(cli: &CliArgs, file: &FileConfig) -> Result<Self, ConfigError> {
        let alphabet_name = cli.alphabet.as_deref().unwrap_or(&file.core.alphabet);
        let alphabet = Alphabet::by_name(alphabet_name)?;

        let position = cli
            .position
            .map(Position::from)
            .or_else(|| parse_position(&file.core.position))
            .unwrap_or_default();

        let mut engine = EngineConfig::default();
        engine.alphabet = alphabet;
        engine.enable_color_detection = file.plugins.colordetection.enabled;
        engine.enable_table_detection = file.plugins.tabledetection.enabled;
        engine.table_config = TableConfig {
            min_lines: file.plugins.tabledetection.min_lines,
            min_columns: file.plugins.tabledetection.min_columns,
            confidence_threshold: file.plugins.tabledetection.confidence_threshold,
            ..TableConfig::default()
        };
        engine.exclusions = exclusion_rules(file);

        let mut patterns = file.regexp.patterns.clone();
        patterns.extend(cli.regexp.iter().cloned());
        for pattern in &patterns {
            engine.add_custom_pattern(pattern).map_err(|e| ConfigError::Toml(TomlErrorShim(e.to_string())))?;
        }

        let ps1_template = cli.ps1.clone().or_else(|| std::env::var("PS1").ok());
        if let Some(ps1) = ps1_template {
            engine.ps1 = Some((ps1, crate::ps1::MatchOptions::default()));
        }

        let colors = ColorScheme {
            match_style: override_style(style_from_pair(&file.colors.match_colors)?, cli.fg_color.as_deref(), cli.bg_color.as_deref())?,
            hint_style: override_style(style_from_pair(&file.colors.hint)?, cli.hint_fg_color.as_deref(), cli.hint_bg_color.as_deref())?,
            multi_style: override_style(style_from_pair(&file.colors.multi)?, cli.multi_fg_color.as_deref(), cli.multi_bg_color.as_deref())?,
            select_style: override_style(style_from_pair(&file.colors.select)?, cli.select_fg_color.as_deref(), cli.select_bg_color.as_deref())?,
        };
        let contrast = cli.contrast || file.core.contrast;
        let fullscreen = FullscreenConfig { position, contrast, colors };

        let multi = cli.multi || file.core.multi;
        let list = ListConfig { multi, select_style: colors.select_style, ..ListConfig::default() };

        Ok(Self {
            engine,
            fullscreen,
            list,
            format: cli.format.clone().unwrap_or_else(|| file.core.format.clone()),
            multi,
            reverse: cli.reverse || file.core.reverse,
            unique_level: if cli.unique > 0 { cli.unique.min(2) } else { file.core.unique_level },
            list_view: cli.list,
            target: cli.target.clone(),
            input_file: cli.input_file.clone(),
        })
    }
}

fn override_style(mut style: Style, fg: Option<&str>, bg: Option<&str>) -> Result<Style, ConfigError> {
    if let Some(fg) = fg {
        style.fg = Some(Color::parse(fg)?);
    }
    if let Some(bg) = bg {
        style.bg = Some(Color::parse(bg)?);
    }
    Ok(style)
}
