use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

// Configure the global logger: colored level, target and message on stdout.
// Fails if a logger was already installed for this process.
pub fn setup_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    build_dispatch(level).apply()
}

fn build_dispatch(level: LevelFilter) -> fern::Dispatch {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Cyan)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] {}",
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(logger: &dyn Log, level: Level) -> bool {
        logger.enabled(&Metadata::builder().level(level).target("aha").build())
    }

    #[test]
    fn test_dispatch_filters_below_level() {
        let (max, logger) = build_dispatch(LevelFilter::Info).into_log();

        assert_eq!(max, LevelFilter::Info);
        assert!(enabled(logger.as_ref(), Level::Warn));
        assert!(enabled(logger.as_ref(), Level::Info));
        assert!(!enabled(logger.as_ref(), Level::Debug));
    }

    #[test]
    fn test_dispatch_off_disables_everything() {
        let (max, logger) = build_dispatch(LevelFilter::Off).into_log();

        assert_eq!(max, LevelFilter::Off);
        assert!(!enabled(logger.as_ref(), Level::Error));
    }
}
