//! This module provides facilities for coloring and styling strings.

// Source for ANSI codes: https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797

use std::env;

/// A trait to provide text styling capability to strings.
pub trait FancyText {
	/// Stylize a string with the provided options.
	/// Styling is skipped entirely when the 'NO_COLOR' environment variable is set.
	///
	/// # Parameters
	/// *style* - The text style to use, such as bold.
	/// *foreground* - The color of the text itself.
	/// *background* - The color of the text's background.
	fn stylize(
		&self,
		style: Option<TextStyle>,
		foreground: Option<TextColor>,
		background: Option<TextColor>,
	) -> String;
}

/// The ANSI escape code to reset all styles and colors.
const ANSI_RESET: &str = "\x1B[0m";

/// Various styles of text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextStyle {
	/// **Bold** text.
	Bold,
}

/// Various text colors available in the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextColor {
	Black,
	Red,
	Green,
	Yellow,
	Blue,
	Magenta,
	Cyan,
	White,
}

/// Checks if styled output is allowed, following <https://no-color.org>.
pub fn colors_enabled() -> bool {
	env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
}

impl FancyText for str {
	fn stylize(
		&self,
		style: Option<TextStyle>,
		foreground: Option<TextColor>,
		background: Option<TextColor>,
	) -> String {
		if !colors_enabled() { return self.to_owned(); }

		let style_code = style.map(|s| s.ansi()).unwrap_or_default();
		let fg_code = foreground.map(|c| c.ansi(30)).unwrap_or_default();
		let bg_code = background.map(|c| c.ansi(40)).unwrap_or_default();

		// Returns the provided string wrapped in the relevant ANSI codes.
		format!("{style_code}{fg_code}{bg_code}{self}{ANSI_RESET}")
	}
}

impl TextStyle {
	/// Returns this style's associated ANSI escape code.
	pub fn ansi(&self) -> String {
		let code = match self {
			TextStyle::Bold => 1,
		};

		format!("\x1B[{code}m")
	}
}

impl TextColor {
	/// Returns this color's ANSI escape code, offset from *base*.
	/// Foreground colors start at 30, while background colors start at 40.
	fn ansi(&self, base: u8) -> String {
		let offset = match self {
			TextColor::Black => 0,
			TextColor::Red => 1,
			TextColor::Green => 2,
			TextColor::Yellow => 3,
			TextColor::Blue => 4,
			TextColor::Magenta => 5,
			TextColor::Cyan => 6,
			TextColor::White => 7,
		};

		format!("\x1B[{}m", base + offset)
	}
}
