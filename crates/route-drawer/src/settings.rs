use clap::Parser;
use route_drawer_lib::MarkerInterval;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Route Drawer - Load a GPX route, summarise it and optionally write it back out
pub struct Settings {
    /// GPX file to load
    #[clap(short, long, value_name = "FILE")]
    pub gpx_file: PathBuf,

    /// Write the loaded route back out as GPX 1.1
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the summary as JSON instead of text
    #[clap(long, default_value = "false")]
    pub json: bool,

    /// Distance marker spacing: auto, off, or kilometers (e.g. 5 or 2.5km)
    #[clap(short, long, default_value = "auto")]
    pub marker_interval: MarkerInterval,

    /// Log at debug level regardless of RUST_LOG
    #[clap(short, long, default_value = "false")]
    pub verbose: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::try_parse_from(["route-drawer", "--gpx-file", "walk.gpx"]).unwrap();
        assert_eq!(settings.gpx_file, PathBuf::from("walk.gpx"));
        assert!(settings.output.is_none());
        assert!(!settings.json);
        assert!(!settings.verbose);
        assert_eq!(settings.marker_interval, MarkerInterval::Auto);
    }

    #[test]
    fn test_marker_interval_values() {
        let settings =
            Settings::try_parse_from(["route-drawer", "-g", "walk.gpx", "-m", "2.5km", "--json", "-v"]).unwrap();
        assert_eq!(settings.marker_interval, MarkerInterval::Km(2.5));
        assert!(settings.json);
        assert!(settings.verbose);

        let result = Settings::try_parse_from(["route-drawer", "-g", "walk.gpx", "-m", "sometimes"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_gpx_file_is_required() {
        assert!(Settings::try_parse_from(["route-drawer"]).is_err());
    }
}
