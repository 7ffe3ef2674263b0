//! file sink: appends the same layout as [`super::stdout::StdoutSink`],
//! flushing after every record so tail-followers see progress immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::Notification;
use crate::error::Result;

pub struct FileSink {
    writer: BufWriter<File>,
}

impl FileSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(FileSink {
            writer: BufWriter::new(file),
        })
    }

    pub fn show(&mut self, notification: &Notification) -> Result<()> {
        writeln!(self.writer, "id: {}", notification.id)?;
        writeln!(self.writer, "application: {}", notification.application)?;
        writeln!(self.writer, "summary: {}", notification.summary)?;
        writeln!(self.writer, "body: {}", notification.body)?;
        writeln!(
            self.writer,
            "category: {}",
            notification.category.as_deref().unwrap_or("")
        )?;
        writeln!(self.writer, "urgency: {}", notification.urgency)?;
        self.writer.flush()?;
        Ok(())
    }
}
