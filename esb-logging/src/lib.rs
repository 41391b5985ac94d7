use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::MakeWriter, prelude::*, registry, EnvFilter};

// --- Tee writer: console and file at once ---
struct Tee<A, B> {
    a: A,
    b: B,
}

impl<A, B> Write for Tee<A, B>
where
    A: Write,
    B: Write,
{
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let res_a = self.a.write(buf);
        let res_b = self.b.write(buf);
        res_a.or(res_b)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.a.flush()?;
        self.b.flush()
    }
}

#[derive(Clone)]
struct MakeTee<A, B> {
    make_a: A,
    make_b: B,
}

impl<'a, A, B, W1, W2> MakeWriter<'a> for MakeTee<A, B>
where
    A: MakeWriter<'a, Writer = W1>,
    B: MakeWriter<'a, Writer = W2>,
    W1: Write + 'a,
    W2: Write + 'a,
{
    type Writer = Tee<W1, W2>;
    fn make_writer(&'a self) -> Self::Writer {
        Tee {
            a: self.make_a.make_writer(),
            b: self.make_b.make_writer(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Compact,
    Json,
}

/// Logging settings, read from `ESB_LOG_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub output: LogOutput,
    pub format: LogFormat,
    pub file: PathBuf,
}

impl LogSettings {
    pub fn from_env() -> Self {
        let level = env::var("ESB_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
        let output = match env::var("ESB_LOG_OUTPUT").as_deref() {
            Ok("file") => LogOutput::File,
            Ok("both") => LogOutput::Both,
            Ok("off") | Ok("none") => LogOutput::Off,
            _ => LogOutput::Console,
        };
        let format = match env::var("ESB_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Human,
        };
        let file = env::var("ESB_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| env::temp_dir().join("esb.log"));

        Self {
            level,
            output,
            format,
            file,
        }
    }

    /// `--debug` on the command line wins over whatever the environment says.
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = "debug".to_string();
        }
        self
    }
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env("RUST_LOG")
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

macro_rules! init_with_format {
    ($subscriber:expr, $layer:expr, $format:expr) => {
        match $format {
            LogFormat::Json => $subscriber.with($layer.json()).try_init(),
            LogFormat::Compact => $subscriber.with($layer.compact()).try_init(),
            LogFormat::Human => $subscriber.with($layer.pretty()).try_init(),
        }
    };
}

/// Initializes the global tracing subscriber.
///
/// The returned guard must be held for the life of the process when file output is on,
/// otherwise buffered lines are dropped.
pub fn init_subscriber(settings: &LogSettings) -> Option<WorkerGuard> {
    let subscriber = registry().with(build_filter(&settings.level));

    let log_dir = settings.file.parent().unwrap_or_else(|| Path::new("."));
    let log_filename = settings
        .file
        .file_name()
        .unwrap_or_else(|| "esb.log".as_ref());

    let mut guard: Option<WorkerGuard> = None;
    let result = match settings.output {
        LogOutput::Both => {
            let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
            let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);
            let writer = MakeTee {
                make_a: std::io::stderr,
                make_b: non_blocking,
            };
            let layer = tracing_subscriber::fmt::layer().with_writer(writer);
            init_with_format!(subscriber, layer, settings.format)
        }
        LogOutput::Console => {
            let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            init_with_format!(subscriber, layer, settings.format)
        }
        LogOutput::File => {
            let file_appender = tracing_appender::rolling::daily(log_dir, log_filename);
            let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(file_guard);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            init_with_format!(subscriber, layer, settings.format)
        }
        LogOutput::Off => return None,
    };

    // A subscriber may already be installed (tests, embedding); keep the existing one.
    if result.is_err() {
        return None;
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear() {
        for key in ["ESB_LOG_LEVEL", "ESB_LOG_OUTPUT", "ESB_LOG_FORMAT", "ESB_LOG_FILE"] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_keep_cli_quiet() {
        clear();
        let settings = LogSettings::from_env();
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.output, LogOutput::Console);
        assert_eq!(settings.format, LogFormat::Human);
    }

    #[test]
    #[serial]
    fn test_env_overrides_and_debug_flag() {
        clear();
        env::set_var("ESB_LOG_LEVEL", "info");
        env::set_var("ESB_LOG_OUTPUT", "both");
        env::set_var("ESB_LOG_FORMAT", "json");
        env::set_var("ESB_LOG_FILE", "/var/tmp/esb-test.log");

        let settings = LogSettings::from_env();
        assert_eq!(settings.level, "info");
        assert_eq!(settings.output, LogOutput::Both);
        assert_eq!(settings.format, LogFormat::Json);
        assert_eq!(settings.file, PathBuf::from("/var/tmp/esb-test.log"));

        assert_eq!(settings.with_debug(true).level, "debug");
        clear();
    }
}
