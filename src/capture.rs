//! Output capture.
//!
//! [`Capture`] redirects the process's stdout and stderr file descriptors into temporary buffers until it is closed.
//! The redirect is process-wide, so it also sees output from other threads and child code that writes to the raw
//! descriptors. `print!` output inside a `cargo test` run is intercepted by the harness before it reaches the
//! descriptor; write through [`std::io::stdout`] to have it captured.
//!
//! Only one capture per stream can be active at a time. Starting a second one fails with
//! [`CaptureError::Redirect`].

use std::fmt;
use std::io::{self, Read, Write};

use gag::BufferRedirect;

use crate::error::{CaptureError, Stream};

/// Active (or closed) redirect of stdout and stderr.
pub struct Capture {
    out: Option<BufferRedirect>,
    err: Option<BufferRedirect>,
    out_buf: Vec<u8>,
    err_buf: Vec<u8>,
}

impl Capture {
    /// Start redirecting both streams.
    pub fn start() -> Result<Self, CaptureError> {
        let out = BufferRedirect::stdout().map_err(|source| CaptureError::Redirect {
            stream: Stream::Stdout,
            source,
        })?;
        let err = BufferRedirect::stderr().map_err(|source| CaptureError::Redirect {
            stream: Stream::Stderr,
            source,
        })?;

        Ok(Self {
            out: Some(out),
            err: Some(err),
            out_buf: Vec::new(),
            err_buf: Vec::new(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.out.is_some() || self.err.is_some()
    }

    /// Stop redirecting and collect what was written. Closing an already closed capture does nothing.
    pub fn close(&mut self) -> Result<(), CaptureError> {
        let out = drain(self.out.take(), &mut self.out_buf, Stream::Stdout);
        let err = drain(self.err.take(), &mut self.err_buf, Stream::Stderr);
        out.and(err)
    }

    /// Captured stdout. Complete once the capture is closed.
    pub fn out(&self) -> &[u8] {
        &self.out_buf
    }

    pub fn out_string(&self) -> String {
        String::from_utf8_lossy(&self.out_buf).into_owned()
    }

    /// Captured stderr. Complete once the capture is closed.
    pub fn err(&self) -> &[u8] {
        &self.err_buf
    }

    pub fn err_string(&self) -> String {
        String::from_utf8_lossy(&self.err_buf).into_owned()
    }
}

/// Flush the stream, read the redirect's buffer into `buf` and drop the redirect, restoring the descriptor.
fn drain(redirect: Option<BufferRedirect>, buf: &mut Vec<u8>, stream: Stream) -> Result<(), CaptureError> {
    let Some(mut redirect) = redirect else {
        return Ok(());
    };

    let flushed = match stream {
        Stream::Stdout => io::stdout().flush(),
        Stream::Stderr => io::stderr().flush(),
    };
    flushed
        .and_then(|()| redirect.read_to_end(buf))
        .map_err(|source| CaptureError::Read { stream, source })?;
    Ok(())
}

impl Drop for Capture {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(%err, "closing output capture failed");
        }
    }
}

impl fmt::Debug for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capture")
            .field("active", &self.is_active())
            .field("out", &self.out_buf.len())
            .field("err", &self.err_buf.len())
            .finish()
    }
}
