/// Implements a local logger with colored TTY output and info/error file output.
pub mod kit_logger;
