use clap::ValueEnum;
use supports_color::Stream;

/// Whether the report and the logs use ANSI colors.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when the stream is a terminal that supports it.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled_for(self, stream: Stream) -> bool {
        match self {
            ColorChoice::Auto => supports_color::on(stream).is_some(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }

    /// Applies the choice to everything styled with `colored` on stdout.
    pub fn apply(self) {
        colored::control::set_override(self.enabled_for(Stream::Stdout));
    }
}
