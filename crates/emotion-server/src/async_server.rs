use crate::{
    classifier::{Classifier, MockClassifier},
    server::{log_outcome, Handled, Outcome, DEFAULT_ADDR, MAX_HEADER_LEN},
};
use anyhow::Result;
use async_std::{
    io::{self, BufReader},
    net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs},
    task,
};
use futures::prelude::*;
use log::info;
use roi_bridge::Roi;
use std::time::Duration;

/// The async/.await server that answers ROI requests from the simulator.
#[derive(Debug)]
pub struct AsyncServer<C> {
    listener: TcpListener,
    classifier: C,
    processing_delay: Duration,
}

impl AsyncServer<MockClassifier> {
    /// Starts the server with a mock classifier on the default address.
    pub async fn new() -> Result<Self> {
        Self::bind(DEFAULT_ADDR, MockClassifier::new()).await
    }
}

impl<C> AsyncServer<C>
where
    C: Classifier + 'static,
{
    /// Starts the server that binds to specified address.
    pub async fn bind<A>(addrs: A, classifier: C) -> Result<Self>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addrs).await?;
        Ok(Self {
            listener,
            classifier,
            processing_delay: Duration::ZERO,
        })
    }

    pub fn processing_delay(mut self, delay: Duration) -> Self {
        self.processing_delay = delay;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn serve_one(&mut self) -> Result<Handled> {
        let (stream, peer) = self.listener.accept().await?;
        info!("Connection from {}", peer);

        let outcome = self.handle(stream).await.unwrap_or_else(Outcome::Failed);
        log_outcome(peer, &outcome);
        Ok(Handled { peer, outcome })
    }

    async fn handle(&mut self, mut stream: TcpStream) -> io::Result<Outcome> {
        let mut header = String::new();
        BufReader::new((&stream).take(MAX_HEADER_LEN))
            .read_line(&mut header)
            .await?;

        let outcome = match header.parse::<Roi>() {
            Ok(roi) => {
                task::sleep(self.processing_delay).await;
                let classification = self.classifier.classify(&roi);
                let reply = format!("{}\n", classification);
                stream.write_all(reply.as_bytes()).await?;
                Outcome::Replied {
                    roi,
                    classification,
                }
            }
            Err(error) => Outcome::Rejected { header, error },
        };

        Ok(outcome)
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Handled>> + Send {
        stream::try_unfold(self, |mut server| async move {
            let handled = server.serve_one().await?;
            anyhow::Ok(Some((handled, server)))
        })
    }
}
