mod history;
mod io;
mod options;
mod prompt;
mod timer;

pub use io::IOReader;
pub use options::Options;
pub use prompt::PromptReader;

use crate::context::{initialize, Context};
use crate::evaluator::{Evaluator, Outcome};

use anyhow::Context as _;
use std::io::Write;
use std::rc::Rc;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::oneshot;
use tokio::task::LocalSet;
use tracing::{debug, warn};

/// Where a session gets its lines from.
pub trait Reader: Sized {
    #[allow(unused_variables)]
    fn init(&mut self, options: &Options) -> anyhow::Result<()> {
        Ok(())
    }
    fn next_line(&mut self) -> anyhow::Result<Option<String>>;
    /// Reads a line that continues an unfinished chunk.
    fn more_line(&mut self) -> anyhow::Result<Option<String>> {
        self.next_line()
    }
    #[allow(unused_variables)]
    fn add_history(&mut self, entry: &str) {}
    fn finish(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A read/eval/print loop over one context.
pub struct Session<T> {
    reader: T,
    evaluator: Evaluator,
    context: Context,
    runtime: Runtime,
    local: Rc<LocalSet>,
    out: Box<dyn Write>,
    err: Box<dyn Write>,
    count: usize,
}

impl<T: Reader> Session<T> {
    pub fn new(mut reader: T, options: Options) -> anyhow::Result<Self> {
        reader.init(&options)?;

        let runtime = Builder::new_current_thread()
            .enable_time()
            .build()
            .context("Failed to build the async runtime.")?;
        let local = Rc::new(LocalSet::new());

        let mut context = Context::new();
        initialize(&mut context, &timer::prelude(&local));
        initialize(&mut context, &options.context);

        Ok(Self {
            reader,
            evaluator: options.evaluator(),
            context,
            runtime,
            local,
            out: Box::new(std::io::stdout()),
            err: Box::new(std::io::stderr()),
            count: 0,
        })
    }

    /// Sends results and errors somewhere other than stdout and stderr.
    pub fn with_output<O, E>(mut self, out: O, err: E) -> Self
    where
        O: Write + 'static,
        E: Write + 'static,
    {
        self.out = Box::new(out);
        self.err = Box::new(err);
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Runs one turn. Returns `false` once the input is exhausted.
    pub fn next(&mut self) -> anyhow::Result<bool> {
        let mut chunk = match self.reader.next_line() {
            Ok(Some(s)) => s,
            Ok(None) => return Ok(false),
            Err(e) => {
                writeln!(self.err, "Readline Error: {}", e)?;
                return Ok(true);
            }
        };

        if chunk.trim().is_empty() {
            return Ok(true);
        }

        let outcome = loop {
            match self.evaluate(&chunk) {
                Some(Outcome::Incomplete) => {
                    let additional = match self.reader.more_line() {
                        Ok(Some(s)) => s,
                        Ok(None) => {
                            debug!("discarding an unfinished chunk");
                            return Ok(true);
                        }
                        Err(e) => {
                            writeln!(self.err, "Readline Error: {}", e)?;
                            return Ok(true);
                        }
                    };
                    chunk.push('\n');
                    chunk.push_str(&additional);
                    continue;
                }
                outcome => break outcome,
            }
        };

        self.reader.add_history(&chunk);

        match outcome {
            Some(Outcome::Value(value)) => writeln!(self.out, "{}", value.inspect())?,
            Some(Outcome::Error(e)) => writeln!(self.err, "Uncaught {}", e)?,
            Some(Outcome::Incomplete) => (),
            None => {
                warn!("a promise-like result was dropped before it settled");
                writeln!(self.err, "Uncaught Error: the result was dropped before it settled")?;
            }
        }

        Ok(true)
    }

    pub fn all(&mut self) -> anyhow::Result<()> {
        loop {
            if !self.next()? {
                break;
            }
        }

        self.reader.finish()
    }

    /// Evaluates one chunk and waits for its outcome, driving any timers
    /// the chunk started in the meantime.
    fn evaluate(&mut self, chunk: &str) -> Option<Outcome> {
        self.count += 1;
        let label = format!("repl{}", self.count);

        let Self {
            evaluator,
            context,
            runtime,
            local,
            ..
        } = self;

        let (tx, rx) = oneshot::channel();
        local.block_on(runtime, async move {
            evaluator.evaluate(chunk, context, &label, move |res| {
                let _ = tx.send(Outcome::from(res));
            });
            rx.await.ok()
        })
    }
}
