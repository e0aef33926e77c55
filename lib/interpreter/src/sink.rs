use std::io::{self, Write};

/// Receives every line a `say` statement prints, as it is printed.
pub trait OutputSink {
    fn emit(&mut self, line: &str) -> io::Result<()>;
}

impl OutputSink for Vec<String> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        (**self).emit(line)
    }
}

/// Writes each line, newline terminated, to `W`.
#[derive(Debug)]
pub struct WriterSink<W>(pub W);

impl<W: Write> OutputSink for WriterSink<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.0, "{}", line)
    }
}

/// Forwards printed lines to the `log` facade at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        log::info!("{}", line);
        Ok(())
    }
}
