use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::StartupError;
use crate::scene::SceneLayout;

pub const USAGE: &str =
    "Usage: chess-lights [--assets <dir>] [--layout <file.xml>] [--summary-only]";

/// Command line options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    /// Directory model paths are resolved against.
    pub assets: PathBuf,
    /// XML layout replacing the built-in chessboard.
    pub layout: Option<PathBuf>,
    /// Print the resolved scene and exit without opening a window.
    pub summary_only: bool,
    pub show_help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            assets: PathBuf::from("."),
            layout: None,
            summary_only: false,
            show_help: false,
        }
    }
}

impl CliOptions {
    /// Parses arguments, excluding the program name.
    pub fn parse_from<I, S>(args: I) -> Result<Self, StartupError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--assets" => options.assets = PathBuf::from(required_value(&arg, args.next())?),
                "--layout" => {
                    options.layout = Some(PathBuf::from(required_value(&arg, args.next())?))
                }
                "--summary-only" => options.summary_only = true,
                "--help" | "-h" => options.show_help = true,
                other => {
                    return Err(StartupError::Usage(format!(
                        "Unknown argument: {other}. {USAGE}"
                    )));
                }
            }
        }
        Ok(options)
    }

    /// The layout named by `--layout`, or the built-in chessboard.
    pub fn load_layout(&self) -> Result<SceneLayout> {
        let Some(path) = &self.layout else {
            return Ok(SceneLayout::chessboard());
        };
        let xml = fs::read_to_string(path)
            .with_context(|| format!("failed to read layout {}", path.display()))?;
        SceneLayout::from_xml(&xml)
            .with_context(|| format!("failed to parse layout {}", path.display()))
    }
}

fn required_value(flag: &str, value: Option<String>) -> Result<String, StartupError> {
    value.ok_or_else(|| StartupError::Usage(format!("Missing value for {flag}. {USAGE}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_current_directory_and_builtin_layout() {
        let options = CliOptions::parse_from(Vec::<String>::new()).unwrap();
        assert_eq!(options, CliOptions::default());
        assert_eq!(options.assets, PathBuf::from("."));
        let layout = options.load_layout().unwrap();
        assert_eq!(layout, SceneLayout::chessboard());
    }

    #[test]
    fn parses_every_flag() {
        let options = CliOptions::parse_from([
            "--assets",
            "data",
            "--summary-only",
            "--layout",
            "board.xml",
        ])
        .unwrap();
        assert_eq!(options.assets, PathBuf::from("data"));
        assert_eq!(options.layout, Some(PathBuf::from("board.xml")));
        assert!(options.summary_only);
        assert!(!options.show_help);
    }

    #[test]
    fn rejects_unknown_arguments_and_missing_values() {
        let err = CliOptions::parse_from(["--fullscreen"]).unwrap_err();
        assert!(err.to_string().starts_with("Unknown argument: --fullscreen"));
        let err = CliOptions::parse_from(["--layout"]).unwrap_err();
        assert!(matches!(err, StartupError::Usage(_)));
        assert!(err.to_string().contains("--layout"));
    }

    #[test]
    fn missing_layout_file_is_reported() {
        let options = CliOptions::parse_from(["--layout", "/nonexistent/layout.xml"]).unwrap();
        let err = options.load_layout().unwrap_err();
        assert!(format!("{err:#}").contains("failed to read layout"));
    }
}
