use crate::classifier::{Classification, Classifier, MockClassifier};
use anyhow::Result;
use log::{info, warn};
use roi_bridge::{ProtocolError, Roi};
use std::{
    io::{self, prelude::*, BufReader},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    thread,
    time::Duration,
};

pub const DEFAULT_ADDR: &str = "0.0.0.0:8888";

/// Longest request line accepted, newline included.
pub const MAX_HEADER_LEN: u64 = 256;

/// What happened to one client connection.
#[derive(Debug)]
pub struct Handled {
    pub peer: SocketAddr,
    pub outcome: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    /// The request was answered.
    Replied {
        roi: Roi,
        classification: Classification,
    },
    /// The request line was not understood. The connection was closed
    /// without a reply.
    Rejected {
        header: String,
        error: ProtocolError,
    },
    /// The connection broke while reading or replying.
    Failed(io::Error),
}

/// The server that answers ROI requests from the simulator, one connection
/// at a time.
#[derive(Debug)]
pub struct Server<C> {
    listener: TcpListener,
    classifier: C,
    processing_delay: Duration,
}

impl Server<MockClassifier> {
    /// Starts the server with a mock classifier on the default address.
    pub fn new() -> Result<Self> {
        Self::bind(DEFAULT_ADDR, MockClassifier::new())
    }
}

impl<C> Server<C>
where
    C: Classifier,
{
    /// Starts the server that binds to specified address.
    pub fn bind<A>(addrs: A, classifier: C) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addrs)?;
        Ok(Self {
            listener,
            classifier,
            processing_delay: Duration::ZERO,
        })
    }

    /// Simulated inference time spent before each reply.
    pub fn processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts one connection and answers it. Only a failed accept is an
    /// error; per-connection failures are reported in the [`Outcome`].
    pub fn serve_one(&mut self) -> Result<Handled> {
        let (stream, peer) = self.listener.accept()?;
        info!("Connection from {}", peer);

        let outcome = self.handle(stream).unwrap_or_else(Outcome::Failed);
        log_outcome(peer, &outcome);
        Ok(Handled { peer, outcome })
    }

    fn handle(&mut self, mut stream: TcpStream) -> io::Result<Outcome> {
        let mut header = String::new();
        BufReader::new((&stream).take(MAX_HEADER_LEN)).read_line(&mut header)?;

        let outcome = match header.parse::<Roi>() {
            Ok(roi) => {
                thread::sleep(self.processing_delay);
                let classification = self.classifier.classify(&roi);
                // One write, so a single read on the client gets the whole line.
                let reply = format!("{}\n", classification);
                stream.write_all(reply.as_bytes())?;
                Outcome::Replied {
                    roi,
                    classification,
                }
            }
            Err(error) => Outcome::Rejected { header, error },
        };

        Ok(outcome)
    }
}

impl<C> Iterator for Server<C>
where
    C: Classifier,
{
    type Item = Result<Handled>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.serve_one())
    }
}

pub(crate) fn log_outcome(peer: SocketAddr, outcome: &Outcome) {
    match outcome {
        Outcome::Replied {
            roi,
            classification,
        } => info!("{}: {} -> {}", peer, roi, classification),
        Outcome::Rejected { header, error } => {
            warn!("{}: rejected {:?}: {}", peer, header.trim_end(), error)
        }
        Outcome::Failed(error) => warn!("{}: connection failed: {}", peer, error),
    }
}
