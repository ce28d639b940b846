//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Transport plumbing
//!
//! The engine works over any duplex byte stream. Opening and configuring a
//! serial port is left to the caller; a `tokio-serial` port, a TCP bridge or a
//! `tokio::io::duplex` pipe all qualify.

use pin_project_lite::pin_project;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

/// A duplex byte stream the engine can own.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}
impl<S> Transport for S where S: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

pin_project! {
    /// Pass-through wrapper that logs every read, write, flush and shutdown.
    ///
    /// Payloads are logged at `debug` level with non-printable bytes escaped,
    /// so `\r\n` and the `0x1A` body terminator stay visible. Behavior of the
    /// wrapped stream is unchanged, including errors.
    pub struct LoggingStream<S> {
        #[pin]
        inner: S,
        label: String,
    }
}

impl<S> LoggingStream<S> {
    /// Wraps `inner`, tagging log records with `label`.
    pub fn new(inner: S, label: impl Into<String>) -> Self {
        LoggingStream {
            inner,
            label: label.into(),
        }
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Consumes the wrapper, returning the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> AsyncRead for LoggingStream<S>
where
    S: AsyncRead,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.project();
        let before = buf.filled().len();
        let result = this.inner.poll_read(cx, buf);
        match &result {
            Poll::Ready(Ok(())) => {
                let read = &buf.filled()[before..];
                if read.is_empty() {
                    debug!(transport = %this.label, "read: end of stream");
                } else {
                    debug!(transport = %this.label, "read {} bytes: \"{}\"", read.len(), read.escape_ascii());
                }
            }
            Poll::Ready(Err(e)) => debug!(transport = %this.label, "read failed: {}", e),
            Poll::Pending => {}
        }
        result
    }
}

impl<S> AsyncWrite for LoggingStream<S>
where
    S: AsyncWrite,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        let this = self.project();
        let result = this.inner.poll_write(cx, buf);
        match &result {
            Poll::Ready(Ok(written)) => {
                debug!(transport = %this.label, "write {} bytes: \"{}\"", written, buf[..*written].escape_ascii());
            }
            Poll::Ready(Err(e)) => debug!(transport = %this.label, "write failed: {}", e),
            Poll::Pending => {}
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        let this = self.project();
        let result = this.inner.poll_flush(cx);
        if let Poll::Ready(outcome) = &result {
            debug!(transport = %this.label, "flush: {:?}", outcome);
        }
        result
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        let this = self.project();
        let result = this.inner.poll_shutdown(cx);
        if let Poll::Ready(outcome) = &result {
            debug!(transport = %this.label, "close: {:?}", outcome);
        }
        result
    }
}
