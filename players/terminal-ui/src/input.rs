//! Where the human's lines of text come from

use std::{
    io::{self, BufRead},
    sync::mpsc,
    thread,
};

use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};

/// One read from the human
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputLine {
    /// A line of text, without its line ending
    Line(String),
    /// There will never be more input
    Closed,
    /// The process was asked to stop while waiting for input
    Interrupted,
}

/// Something which can be asked for the next line the human typed
pub trait LineSource {
    /// Block until the next line is available
    fn next_line(&mut self) -> InputLine;
}

impl<S: LineSource + ?Sized> LineSource for &mut S {
    fn next_line(&mut self) -> InputLine {
        (**self).next_line()
    }
}

/// Reads lines straight out of a reader
///
/// Bytes which aren't UTF-8 are replaced rather than ending the input, so a garbled line is just a
/// line nobody can parse. This can't notice signals on its own. Tests feed it a
/// [`std::io::Cursor`].
#[derive(Debug)]
pub struct ReaderLineSource<R> {
    reader: R,
}

impl<R: BufRead> ReaderLineSource<R> {
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> LineSource for ReaderLineSource<R> {
    fn next_line(&mut self) -> InputLine {
        let mut buffer = Vec::new();
        match self.reader.read_until(b'\n', &mut buffer) {
            Ok(0) => InputLine::Closed,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buffer);
                InputLine::Line(line.trim_end_matches(['\r', '\n']).to_string())
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => InputLine::Interrupted,
            Err(e) => {
                log::warn!("Error reading input, treating it as closed: {e}");
                InputLine::Closed
            }
        }
    }
}

/// Receives lines from other threads
///
/// [`Self::stdin`] starts one thread reading standard input and another waiting for SIGINT and
/// SIGTERM, both feeding the same channel. Whichever happens first is what the reader gets, so an
/// interrupt wakes up a reader blocked on a line that will never come.
#[derive(Debug)]
pub struct ChannelLineSource {
    receiver: mpsc::Receiver<InputLine>,
}

impl ChannelLineSource {
    pub const fn new(receiver: mpsc::Receiver<InputLine>) -> Self {
        Self { receiver }
    }

    /// Read from standard input, reporting SIGINT and SIGTERM as [`InputLine::Interrupted`]
    ///
    /// Fails if the signal handlers couldn't be registered.
    pub fn stdin() -> io::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        thread::spawn({
            let sender = sender.clone();
            move || {
                for signal in signals.forever() {
                    log::info!("Received signal {signal}");
                    if sender.send(InputLine::Interrupted).is_err() {
                        break;
                    }
                }
            }
        });
        thread::spawn(move || {
            let mut stdin = ReaderLineSource::new(io::stdin().lock());
            loop {
                let line = stdin.next_line();
                let last = !matches!(line, InputLine::Line(_));
                if sender.send(line).is_err() || last {
                    break;
                }
            }
        });
        Ok(Self::new(receiver))
    }
}

impl LineSource for ChannelLineSource {
    fn next_line(&mut self) -> InputLine {
        // Every sender is gone, so nothing more can arrive
        self.receiver.recv().unwrap_or(InputLine::Closed)
    }
}
