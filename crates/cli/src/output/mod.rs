mod formatter;

pub use formatter::Formatter;
